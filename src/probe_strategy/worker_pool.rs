use super::{candidates, ProbeStrategy};
use crate::backend::Backend;
use crate::discovery::Discovery;
use crate::probe::Prober;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Dispatches all candidates onto a pool of Tokio tasks bounded to the
/// candidate count, so no more than one task is ever in flight per
/// candidate - the Rust analogue of the original's OS-thread-pool ping
/// strategy.
#[derive(Debug, Default)]
pub struct WorkerPoolProbeStrategy;

impl WorkerPoolProbeStrategy {
  pub fn new() -> Self {
    WorkerPoolProbeStrategy
  }
}

#[async_trait]
impl ProbeStrategy for WorkerPoolProbeStrategy {
  async fn probe(&self, prober: Arc<dyn Prober>, discovery: &dyn Discovery) -> Vec<Backend> {
    let backends = candidates(discovery).await;
    if backends.is_empty() {
      return Vec::new();
    }

    let permits = Arc::new(Semaphore::new(backends.len()));
    let mut handles = Vec::with_capacity(backends.len());

    for backend in backends {
      let prober = prober.clone();
      let permits = permits.clone();

      handles.push(tokio::spawn(async move {
        let _permit = permits.acquire_owned().await.expect("semaphore is never closed");
        let alive = prober.alive(&backend).await;
        backend.set_alive(alive);
        backend
      }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
      if let Ok(backend) = handle.await {
        results.push(backend);
      }
    }

    results
  }
}
