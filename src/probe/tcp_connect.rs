use super::Prober;
use crate::backend::Backend;
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

/// Opens a TCP stream to `(address, port)` with a connect timeout,
/// closing it immediately on success.
#[derive(Debug)]
pub struct TcpConnectProber {
  timeout: Duration,
}

impl TcpConnectProber {
  pub fn new(timeout: Duration) -> Self {
    TcpConnectProber { timeout }
  }
}

#[async_trait]
impl Prober for TcpConnectProber {
  async fn alive(&self, backend: &Backend) -> bool {
    let address = format!("{}:{}", backend.address, backend.port);

    match tokio::time::timeout(self.timeout, TcpStream::connect(&address)).await {
      Ok(Ok(stream)) => {
        drop(stream);
        true
      }
      Ok(Err(_)) | Err(_) => false,
    }
  }
}
