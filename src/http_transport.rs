use crate::error::TransportError;
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_timeout::TimeoutConnector;
use std::fmt;
use std::time::Duration;

/// Builds the single connector flavor this crate uses everywhere it
/// needs to speak HTTP(S): native roots, http-or-https negotiated from
/// the request URI, wrapped in a connect/read/write timeout.
pub(crate) fn timeout_connector() -> TimeoutConnector<HttpsConnector<HttpConnector>> {
  let https = HttpsConnectorBuilder::new()
    .with_native_roots()
    .https_or_http()
    .enable_http1()
    .build();
  TimeoutConnector::new(https)
}

/// Sends a single HTTP request and honors a per-call deadline,
/// surfacing a distinguished [`TransportError`] for any transport-level
/// failure (connection refused, DNS failure, timeout, read error, ...).
/// The dispatcher and the HTTP-GET prober both speak this interface so
/// they share one notion of "send bytes, honor a deadline."
#[async_trait]
pub trait HttpTransport: Send + Sync + fmt::Debug {
  async fn execute(&self, request: Request<Body>, timeout: Duration) -> Result<Response<Body>, TransportError>;
}

/// The production transport: a `hyper::Client` over a native-TLS
/// connector with per-request connect/read/write timeouts.
#[derive(Debug, Clone)]
pub struct HyperHttpTransport {
  client: Client<TimeoutConnector<HttpsConnector<HttpConnector>>, Body>,
}

impl HyperHttpTransport {
  pub fn new() -> Self {
    HyperHttpTransport {
      client: Client::builder().build(timeout_connector()),
    }
  }
}

impl Default for HyperHttpTransport {
  fn default() -> Self {
    HyperHttpTransport::new()
  }
}

#[async_trait]
impl HttpTransport for HyperHttpTransport {
  async fn execute(&self, request: Request<Body>, timeout: Duration) -> Result<Response<Body>, TransportError> {
    match tokio::time::timeout(timeout, self.client.request(request)).await {
      Ok(Ok(response)) => Ok(response),
      Ok(Err(e)) => Err(TransportError::from_cause(e)),
      Err(_) => Err(TransportError::new(format!("request timed out after {:?}", timeout))),
    }
  }
}
