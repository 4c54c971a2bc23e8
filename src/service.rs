use crate::backend::Backend;
use crate::discovery::{Discovery, StaticDiscovery};
use crate::error::{ConfigurationError, ServiceError};
use crate::http_transport::{HttpTransport, HyperHttpTransport};
use crate::pool::PoolManager;
use crate::url_builder::UrlBuilder;
use hyper::{Body, HeaderMap, Method, Request, Response};
use log::{debug, error};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Where a [`Service`] gets its backends from. Rust's enums make these
/// variants structurally exclusive, which is the "either a pool manager
/// or a list of addresses, never both" constraint stated positionally
/// in the original.
pub enum Source {
  Pool(Arc<PoolManager>),
  Discovery(Arc<dyn Discovery>),
  Addresses(Vec<String>),
}

pub struct ServiceConfig {
  pub source: Source,
  pub use_https: bool,
  pub request_timeout: Duration,
  pub transport: Option<Arc<dyn HttpTransport>>,
}

impl ServiceConfig {
  pub fn new(source: Source) -> Self {
    ServiceConfig {
      source,
      use_https: false,
      request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
      transport: None,
    }
  }

  pub fn with_https(mut self, use_https: bool) -> Self {
    self.use_https = use_https;
    self
  }

  pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
    self.request_timeout = timeout;
    self
  }

  pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
    self.transport = Some(transport);
    self
  }
}

/// Dispatches requests across a backend pool, retrying against a
/// different backend on every transport error or 5xx response until
/// the reachable set is exhausted.
pub struct Service {
  pool: Arc<PoolManager>,
  transport: Arc<dyn HttpTransport>,
  use_https: bool,
  request_timeout: Duration,
}

impl Service {
  pub fn new(config: ServiceConfig) -> Result<Self, ConfigurationError> {
    let pool = match config.source {
      Source::Pool(pool) => pool,
      Source::Discovery(discovery) => Arc::new(PoolManager::new(discovery, None, None, None, true)),
      Source::Addresses(addresses) => {
        let discovery = StaticDiscovery::new(addresses)?;
        Arc::new(PoolManager::new(Arc::new(discovery), None, None, None, true))
      }
    };

    Ok(Service {
      pool,
      transport: config.transport.unwrap_or_else(|| Arc::new(HyperHttpTransport::new())),
      use_https: config.use_https,
      request_timeout: config.request_timeout,
    })
  }

  pub fn pool(&self) -> &Arc<PoolManager> {
    &self.pool
  }

  pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Response<Body>, ServiceError> {
    self.request(Method::GET, path, Body::empty(), params, None).await
  }

  pub async fn post(&self, path: &str, body: Body) -> Result<Response<Body>, ServiceError> {
    self.request(Method::POST, path, body, &[], None).await
  }

  pub async fn put(&self, path: &str, body: Body) -> Result<Response<Body>, ServiceError> {
    self.request(Method::PUT, path, body, &[], None).await
  }

  pub async fn patch(&self, path: &str, body: Body) -> Result<Response<Body>, ServiceError> {
    self.request(Method::PATCH, path, body, &[], None).await
  }

  pub async fn delete(&self, path: &str) -> Result<Response<Body>, ServiceError> {
    self.request(Method::DELETE, path, Body::empty(), &[], None).await
  }

  pub async fn head(&self, path: &str) -> Result<Response<Body>, ServiceError> {
    self.request(Method::HEAD, path, Body::empty(), &[], None).await
  }

  pub async fn options(&self, path: &str) -> Result<Response<Body>, ServiceError> {
    self.request(Method::OPTIONS, path, Body::empty(), &[], None).await
  }

  /// Chooses a backend, sends the request, and on any transport error
  /// or 5xx response marks that backend down and retries against a
  /// fresh one. Terminates with `NoReachableServers` once the reachable
  /// set is exhausted. `body` is cloned into a fresh `Request` on every
  /// retry attempt, since a `hyper::Body` stream can only be consumed
  /// once.
  pub async fn request(
    &self,
    method: Method,
    path: &str,
    body: Body,
    params: &[(&str, &str)],
    headers: Option<HeaderMap>,
  ) -> Result<Response<Body>, ServiceError> {
    let body_bytes = hyper::body::to_bytes(body).await.map_err(|e| {
      error!("failed to buffer request body for retry: {}", e);
      ServiceError::NoReachableServers
    })?;

    loop {
      let backend = self.pool.choose_server()?;
      let url = self.absolute_url(&backend, path, params);

      debug!("{} {}", method, url);

      let mut request_builder = Request::builder().method(method.clone()).uri(url.as_str());
      if let Some(headers) = &headers {
        for (name, value) in headers.iter() {
          request_builder = request_builder.header(name, value);
        }
      }
      let request = request_builder.body(Body::from(body_bytes.clone())).expect("request assembly is infallible here");

      match self.transport.execute(request, self.request_timeout).await {
        Ok(response) if response.status().as_u16() < 500 => return Ok(response),
        Ok(response) => {
          error!("backend {} returned {}, marking down", backend, response.status());
          self.pool.mark_server_down(&backend);
        }
        Err(e) => {
          error!("request to backend {} failed: {}", backend, e);
          self.pool.mark_server_down(&backend);
        }
      }
    }
  }

  fn absolute_url(&self, backend: &Backend, path: &str, params: &[(&str, &str)]) -> url::Url {
    let scheme = if self.use_https { "https" } else { "http" };
    let default_port = if self.use_https { 443 } else { 80 };
    let port = if backend.port == default_port { None } else { Some(backend.port) };

    let mut builder = UrlBuilder::from_parts(scheme, &backend.address, port).append_path(path);
    for (key, value) in params {
      builder = builder.add_query_param(*key, *value);
    }

    builder.build().expect("assembled URL is always well-formed")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::discovery::StaticDiscovery;
  use crate::error::TransportError;
  use crate::probe::TrivialProber;
  use crate::probe_strategy::SerialProbeStrategy;
  use crate::rule::RoundRobinRule;
  use async_trait::async_trait;
  use std::fmt;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Debug)]
  struct ScriptedTransport {
    attempts: AtomicUsize,
    statuses: Vec<u16>,
  }

  impl ScriptedTransport {
    fn new(statuses: Vec<u16>) -> Self {
      ScriptedTransport { attempts: AtomicUsize::new(0), statuses }
    }

    fn attempt_count(&self) -> usize {
      self.attempts.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl HttpTransport for ScriptedTransport {
    async fn execute(&self, _request: Request<Body>, _timeout: Duration) -> Result<Response<Body>, TransportError> {
      let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
      let status = self.statuses.get(attempt).copied().unwrap_or(503);
      Ok(Response::builder().status(status).body(Body::empty()).unwrap())
    }
  }

  #[derive(Debug)]
  struct AlwaysFailsTransport;

  #[async_trait]
  impl HttpTransport for AlwaysFailsTransport {
    async fn execute(&self, _request: Request<Body>, _timeout: Duration) -> Result<Response<Body>, TransportError> {
      Err(TransportError::new("connection refused"))
    }
  }

  async fn service_with(transport: Arc<dyn HttpTransport>, addresses: Vec<&str>) -> Service {
    let discovery: Arc<dyn Discovery> =
      Arc::new(StaticDiscovery::new(addresses.into_iter().map(String::from).collect::<Vec<_>>()).unwrap());
    let pool = Arc::new(PoolManager::new(
      discovery,
      Some(Arc::new(RoundRobinRule::new())),
      Some(Arc::new(SerialProbeStrategy::new())),
      Some(Arc::new(TrivialProber::new())),
      false,
    ));
    pool.probe_now().await;

    Service::new(ServiceConfig::new(Source::Pool(pool)).with_transport(transport)).unwrap()
  }

  #[tokio::test]
  async fn successful_response_is_returned_without_retry() {
    let transport = Arc::new(ScriptedTransport::new(vec![200]));
    let service = service_with(transport.clone(), vec!["a:1"]).await;

    let response = service.get("/health", &[]).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(transport.attempt_count(), 1);
  }

  #[tokio::test]
  async fn four_xx_is_treated_as_success() {
    let transport = Arc::new(ScriptedTransport::new(vec![404]));
    let service = service_with(transport.clone(), vec!["a:1"]).await;

    let response = service.get("/missing", &[]).await.unwrap();

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(transport.attempt_count(), 1);
  }

  #[tokio::test]
  async fn five_xx_retries_until_exhaustion() {
    let transport = Arc::new(ScriptedTransport::new(vec![503, 503, 503]));
    let service = service_with(transport.clone(), vec!["a:1", "b:2", "c:3"]).await;

    let result = service.get("/", &[]).await;

    assert!(matches!(result, Err(ServiceError::NoReachableServers)));
    assert_eq!(transport.attempt_count(), 3);
  }

  #[tokio::test]
  async fn transport_errors_retry_against_every_distinct_backend() {
    let transport: Arc<dyn HttpTransport> = Arc::new(AlwaysFailsTransport);
    let service = service_with(transport, vec!["a:1", "b:2"]).await;

    let result = service.get("/", &[]).await;

    assert!(matches!(result, Err(ServiceError::NoReachableServers)));
    assert!(service.pool().reachable_servers().is_empty());
  }

  #[tokio::test]
  async fn a_later_success_recovers_after_earlier_failures() {
    let transport = Arc::new(ScriptedTransport::new(vec![503, 200]));
    let service = service_with(transport.clone(), vec!["a:1", "b:2"]).await;

    let response = service.get("/", &[]).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(transport.attempt_count(), 2);
  }
}
