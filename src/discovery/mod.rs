use crate::backend::Backend;
use crate::error::DiscoveryError;
use async_trait::async_trait;
use std::fmt;

pub mod consul;
pub mod dns;
pub mod static_list;

pub use consul::ConsulDiscovery;
pub use dns::{DnsARecordDiscovery, DnsSrvDiscovery};
pub use static_list::StaticDiscovery;

/// Produces a current snapshot of candidate backends. Implementations
/// are responsible for their own timeouts; a `snapshot` call must not
/// block indefinitely.
#[async_trait]
pub trait Discovery: Send + Sync + fmt::Debug {
  async fn snapshot(&self) -> Result<Vec<Backend>, DiscoveryError>;
}
