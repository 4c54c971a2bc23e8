use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Default TTL hint in seconds, used when a discovery source doesn't
/// supply one of its own.
pub const DEFAULT_TTL: u32 = 300;
/// Default priority; lower is higher priority.
pub const DEFAULT_PRIORITY: i32 = 1;
/// Default weight.
pub const DEFAULT_WEIGHT: u32 = 1;

/// An addressable endpoint plus the metadata a selection rule and a
/// prober need. Equality and hashing are on `(address, port)` only;
/// ordering is on `priority` ascending. `alive` lives behind a shared
/// atomic cell so every clone of a `Backend` observes the same
/// liveness state as the one held by the pool manager.
#[derive(Debug, Clone)]
pub struct Backend {
  pub address: String,
  pub port: u16,
  pub weight: u32,
  pub priority: i32,
  pub ttl: u32,
  alive: Arc<AtomicBool>,
}

impl Backend {
  pub fn new(address: impl Into<String>, port: u16) -> Self {
    Backend {
      address: address.into(),
      port,
      weight: DEFAULT_WEIGHT,
      priority: DEFAULT_PRIORITY,
      ttl: DEFAULT_TTL,
      alive: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn with_weight(mut self, weight: u32) -> Self {
    self.weight = weight;
    self
  }

  pub fn with_priority(mut self, priority: i32) -> Self {
    self.priority = priority;
    self
  }

  pub fn with_ttl(mut self, ttl: u32) -> Self {
    self.ttl = ttl;
    self
  }

  /// Builds a Backend that already reports alive, handy for tests and
  /// static pools that skip probing.
  pub fn alive(address: impl Into<String>, port: u16) -> Self {
    let backend = Backend::new(address, port);
    backend.set_alive(true);
    backend
  }

  pub fn is_alive(&self) -> bool {
    self.alive.load(AtomicOrdering::Acquire)
  }

  pub fn set_alive(&self, alive: bool) {
    self.alive.store(alive, AtomicOrdering::Release);
  }

  /// The ordering key used to break ties between equal-priority
  /// backends when a deterministic total order is required.
  fn sort_key(&self) -> (i32, &str, u16) {
    (self.priority, self.address.as_str(), self.port)
  }
}

impl fmt::Display for Backend {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Backend({}:{}, ttl:{}, weight:{}, priority:{}, alive:{})",
      self.address,
      self.port,
      self.ttl,
      self.weight,
      self.priority,
      self.is_alive()
    )
  }
}

impl PartialEq for Backend {
  fn eq(&self, other: &Self) -> bool {
    self.address == other.address && self.port == other.port
  }
}

impl Eq for Backend {}

impl Hash for Backend {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.address.hash(state);
    self.port.hash(state);
  }
}

impl PartialOrd for Backend {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Backend {
  fn cmp(&self, other: &Self) -> Ordering {
    self.sort_key().cmp(&other.sort_key())
  }
}
