use crate::backend::Backend;
use crate::discovery::Discovery;
use crate::probe::Prober;
use async_trait::async_trait;
use log::warn;
use std::fmt;
use std::sync::Arc;

pub mod cooperative;
pub mod serial;
pub mod worker_pool;

pub use cooperative::CooperativeTaskProbeStrategy;
pub use serial::SerialProbeStrategy;
pub use worker_pool::WorkerPoolProbeStrategy;

/// Fans a prober across a discovery snapshot and returns one Backend
/// per candidate with `alive` annotated. A discovery failure is logged
/// and treated as an empty candidate set for this sweep; a single
/// prober failure marks only that backend dead, never aborts the
/// batch.
#[async_trait]
pub trait ProbeStrategy: Send + Sync + fmt::Debug {
  async fn probe(&self, prober: Arc<dyn Prober>, discovery: &dyn Discovery) -> Vec<Backend>;
}

/// Pulls the current candidate set from `discovery`, logging and
/// returning an empty vec on failure. Shared by every `ProbeStrategy`
/// implementation so the "discovery failure -> empty sweep" rule lives
/// in exactly one place.
async fn candidates(discovery: &dyn Discovery) -> Vec<Backend> {
  match discovery.snapshot().await {
    Ok(backends) => backends,
    Err(e) => {
      warn!("discovery failed, treating this sweep as empty: {}", e);
      Vec::new()
    }
  }
}
