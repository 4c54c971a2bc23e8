use std::fmt;

/// Construction-time failure: invalid or contradictory inputs to a
/// [`Service`](crate::Service) or [`PoolManager`](crate::PoolManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
  message: String,
}

impl ConfigurationError {
  pub fn new(message: impl Into<String>) -> Self {
    ConfigurationError {
      message: message.into(),
    }
  }
}

impl fmt::Display for ConfigurationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "configuration error: {}", self.message)
  }
}

impl std::error::Error for ConfigurationError {}

/// Raised when a selection rule is asked to choose a backend but the
/// reachable set is empty, and as the terminal condition of dispatcher
/// retries once the reachable pool is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoReachableServers;

impl fmt::Display for NoReachableServers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "no reachable servers found")
  }
}

impl std::error::Error for NoReachableServers {}

/// A discovery adapter's lookup failed. The pool manager swallows this
/// into an empty snapshot for the current refresh; a caller invoking a
/// discovery source directly sees it raised.
#[derive(Debug)]
pub struct DiscoveryError {
  message: String,
  source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DiscoveryError {
  pub fn new(message: impl Into<String>) -> Self {
    DiscoveryError {
      message: message.into(),
      source: None,
    }
  }

  pub fn from_cause(message: impl Into<String>, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
    DiscoveryError {
      message: message.into(),
      source: Some(Box::new(cause)),
    }
  }
}

impl fmt::Display for DiscoveryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "discovery error: {}", self.message)
  }
}

impl std::error::Error for DiscoveryError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
  }
}

/// A per-request transport failure (connection refused, DNS failure,
/// timeout, read error, ...). Never surfaced directly from the
/// dispatcher; it only triggers a retry against a different backend.
#[derive(Debug)]
pub struct TransportError {
  message: String,
  source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
  pub fn new(message: impl Into<String>) -> Self {
    TransportError {
      message: message.into(),
      source: None,
    }
  }

  pub fn from_cause(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
    TransportError {
      message: cause.to_string(),
      source: Some(Box::new(cause)),
    }
  }
}

impl fmt::Display for TransportError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "transport error: {}", self.message)
  }
}

impl std::error::Error for TransportError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
  }
}

/// The only error a [`Service`](crate::Service) call can return. Transport
/// failures and 5xx responses are retried internally and never reach the
/// caller as a distinct variant; they can only ever bottom out as
/// [`ServiceError::NoReachableServers`].
#[derive(Debug)]
pub enum ServiceError {
  NoReachableServers,
  Configuration(ConfigurationError),
}

impl From<NoReachableServers> for ServiceError {
  fn from(_: NoReachableServers) -> Self {
    ServiceError::NoReachableServers
  }
}

impl From<ConfigurationError> for ServiceError {
  fn from(e: ConfigurationError) -> Self {
    ServiceError::Configuration(e)
  }
}

impl fmt::Display for ServiceError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ServiceError::NoReachableServers => write!(f, "no reachable servers found"),
      ServiceError::Configuration(e) => write!(f, "{}", e),
    }
  }
}

impl std::error::Error for ServiceError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ServiceError::NoReachableServers => None,
      ServiceError::Configuration(e) => Some(e),
    }
  }
}
