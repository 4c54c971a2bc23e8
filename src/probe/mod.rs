use crate::backend::Backend;
use async_trait::async_trait;
use std::fmt;

pub mod http_get;
pub mod tcp_connect;
pub mod trivial;

pub use http_get::HttpGetProber;
pub use tcp_connect::TcpConnectProber;
pub use trivial::TrivialProber;

/// Classifies a single backend as alive or dead. Implementations must
/// never panic - any internal failure is reported as `false` - and must
/// honor their own configured deadline.
#[async_trait]
pub trait Prober: Send + Sync + fmt::Debug {
  async fn alive(&self, backend: &Backend) -> bool;
}
