use crate::backend::Backend;
use crate::discovery::Discovery;
use crate::error::NoReachableServers;
use crate::probe::{Prober, TcpConnectProber};
use crate::probe_strategy::{ProbeStrategy, SerialProbeStrategy};
use crate::rule::{RoundRobinRule, SelectionRule};
use arc_swap::ArcSwap;
use log::error;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

const DEFAULT_PROBE_INTERVAL_SECS: u64 = 30;
const DEFAULT_MAX_PROBE_TIME_SECS: u64 = 3;

/// Owns the mutable set of known backends, their liveness flags, and
/// the background refresh loop that keeps them current. The known set
/// is replaced wholesale on every refresh and published through a
/// single lock-free atomic swap; individual backends have only their
/// `alive` flag mutated in place, through the atomic cell each
/// `Backend` clone already shares.
pub struct PoolManager {
  discovery: Arc<dyn Discovery>,
  prober: Arc<dyn Prober>,
  probe_strategy: Arc<dyn ProbeStrategy>,
  rule: Arc<dyn SelectionRule>,
  known: Arc<ArcSwap<Vec<Backend>>>,
  refresh_lock: Arc<Mutex<()>>,
  probe_interval_secs: Arc<AtomicU64>,
  interval_changed: Arc<Notify>,
  max_probe_time: Duration,
  worker: Mutex<Option<JoinHandle<()>>>,
}

impl PoolManager {
  /// `rule`, `probe_strategy` and `prober` default to
  /// `RoundRobinRule`, `SerialProbeStrategy` and `TcpConnectProber`
  /// respectively when not supplied. The background loop starts
  /// immediately unless `start_now` is `false`.
  pub fn new(
    discovery: Arc<dyn Discovery>,
    rule: Option<Arc<dyn SelectionRule>>,
    probe_strategy: Option<Arc<dyn ProbeStrategy>>,
    prober: Option<Arc<dyn Prober>>,
    start_now: bool,
  ) -> Self {
    let manager = PoolManager {
      discovery,
      prober: prober.unwrap_or_else(|| Arc::new(TcpConnectProber::new(Duration::from_secs(DEFAULT_MAX_PROBE_TIME_SECS)))),
      probe_strategy: probe_strategy.unwrap_or_else(|| Arc::new(SerialProbeStrategy::new())),
      rule: rule.unwrap_or_else(|| Arc::new(RoundRobinRule::new())),
      known: Arc::new(ArcSwap::from_pointee(Vec::new())),
      refresh_lock: Arc::new(Mutex::new(())),
      probe_interval_secs: Arc::new(AtomicU64::new(DEFAULT_PROBE_INTERVAL_SECS)),
      interval_changed: Arc::new(Notify::new()),
      max_probe_time: Duration::from_secs(DEFAULT_MAX_PROBE_TIME_SECS),
      worker: Mutex::new(None),
    };

    if start_now {
      manager.spawn_worker();
    }

    manager
  }

  fn spawn_worker(&self) {
    let discovery = self.discovery.clone();
    let prober = self.prober.clone();
    let probe_strategy = self.probe_strategy.clone();
    let known = self.known.clone();
    let refresh_lock = self.refresh_lock.clone();
    let interval_secs = self.probe_interval_secs.clone();
    let interval_changed = self.interval_changed.clone();

    let handle = tokio::spawn(async move {
      loop {
        refresh_once(&discovery, &prober, &probe_strategy, &known, &refresh_lock).await;

        let sleep = tokio::time::sleep(Duration::from_secs(interval_secs.load(AtomicOrdering::Acquire)));
        tokio::select! {
          _ = sleep => {}
          _ = interval_changed.notified() => {}
        }
      }
    });

    // `worker` is only ever populated here, under construction, before any
    // other method can observe `self`, so a blocking try_lock always succeeds.
    if let Ok(mut guard) = self.worker.try_lock() {
      *guard = Some(handle);
    }
  }

  /// A defensive copy of the currently-known set.
  pub fn known_servers(&self) -> Vec<Backend> {
    self.known.load().as_ref().clone()
  }

  /// A defensive copy of the subset of the known set reporting alive.
  pub fn reachable_servers(&self) -> Vec<Backend> {
    self.known.load().iter().filter(|b| b.is_alive()).cloned().collect()
  }

  /// Selects one backend from the reachable set via the bound rule.
  pub fn choose_server(&self) -> Result<Backend, NoReachableServers> {
    self.rule.choose(self.reachable_servers())
  }

  /// Marks a backend dead. Idempotent; visible to subsequent readers
  /// immediately, without waiting on a refresh.
  pub fn mark_server_down(&self, backend: &Backend) {
    backend.set_alive(false);
  }

  /// Runs one probe sweep synchronously and publishes its result.
  pub async fn probe_now(&self) {
    refresh_once(&self.discovery, &self.prober, &self.probe_strategy, &self.known, &self.refresh_lock).await;
  }

  /// Probes a single backend directly, bypassing discovery and the
  /// known-set refresh, honoring `max_probe_time`.
  pub async fn probe_backend(&self, backend: &Backend) -> bool {
    let alive = tokio::time::timeout(self.max_probe_time, self.prober.alive(backend)).await.unwrap_or(false);
    backend.set_alive(alive);
    alive
  }

  /// Updates the refresh interval. If the background loop is
  /// currently sleeping, it wakes immediately so the new interval
  /// takes effect without waiting out the old one.
  pub fn set_probe_interval(&self, seconds: u64) {
    self.probe_interval_secs.store(seconds, AtomicOrdering::Release);
    self.interval_changed.notify_one();
  }

  /// Stops the background loop. Subsequent calls to `probe_now` still
  /// run synchronously; only the periodic loop is affected.
  pub async fn close(&self) {
    if let Some(handle) = self.worker.lock().await.take() {
      handle.abort();
    }
  }
}

impl Drop for PoolManager {
  fn drop(&mut self) {
    if let Ok(mut guard) = self.worker.try_lock() {
      if let Some(handle) = guard.take() {
        handle.abort();
      }
    }
  }
}

/// Runs one probe sweep under the refresh-serializing lock and
/// publishes the result via a single atomic swap. The sweep itself
/// runs on its own task so a panic inside a `Discovery`/`Prober`
/// implementation surfaces as a `JoinError` here instead of unwinding
/// the worker loop.
async fn refresh_once(
  discovery: &Arc<dyn Discovery>,
  prober: &Arc<dyn Prober>,
  probe_strategy: &Arc<dyn ProbeStrategy>,
  known: &Arc<ArcSwap<Vec<Backend>>>,
  refresh_lock: &Arc<Mutex<()>>,
) {
  let _guard = refresh_lock.lock().await;

  let discovery = discovery.clone();
  let prober = prober.clone();
  let probe_strategy = probe_strategy.clone();

  match tokio::spawn(async move { probe_strategy.probe(prober, discovery.as_ref()).await }).await {
    Ok(backends) => known.store(Arc::new(backends)),
    Err(e) => error!("pool refresh panicked; known set left unchanged: {}", e),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::discovery::StaticDiscovery;
  use crate::probe::TrivialProber;
  use std::time::Duration as StdDuration;

  fn make_manager(start_now: bool) -> PoolManager {
    let discovery: Arc<dyn Discovery> = Arc::new(StaticDiscovery::new(vec!["a:1", "b:2", "c:3"]).unwrap());
    PoolManager::new(discovery, None, None, Some(Arc::new(TrivialProber::new())), start_now)
  }

  #[tokio::test]
  async fn probe_now_populates_known_and_reachable_sets() {
    let manager = make_manager(false);
    assert!(manager.known_servers().is_empty());

    manager.probe_now().await;

    assert_eq!(manager.known_servers().len(), 3);
    assert_eq!(manager.reachable_servers().len(), 3);
  }

  #[tokio::test]
  async fn choose_server_fails_before_any_probe() {
    let manager = make_manager(false);
    assert!(manager.choose_server().is_err());
  }

  #[tokio::test]
  async fn mark_server_down_is_visible_immediately() {
    let manager = make_manager(false);
    manager.probe_now().await;

    let victim = manager.reachable_servers().into_iter().next().unwrap();
    manager.mark_server_down(&victim);

    let reachable = manager.reachable_servers();
    assert_eq!(reachable.len(), 2);
    assert!(!reachable.contains(&victim));
  }

  #[tokio::test]
  async fn mark_down_is_overridden_by_a_later_successful_refresh() {
    let manager = make_manager(false);
    manager.probe_now().await;

    let victim = manager.reachable_servers().into_iter().next().unwrap();
    manager.mark_server_down(&victim);
    assert!(!manager.reachable_servers().contains(&victim));

    manager.probe_now().await;
    assert!(manager.reachable_servers().contains(&victim));
  }

  #[tokio::test]
  async fn set_probe_interval_wakes_the_background_loop_early() {
    let manager = make_manager(true);
    manager.set_probe_interval(0);
    tokio::time::sleep(StdDuration::from_millis(50)).await;

    assert_eq!(manager.known_servers().len(), 3);
    manager.close().await;
  }

  #[tokio::test]
  async fn close_stops_the_background_loop() {
    let manager = make_manager(true);
    manager.close().await;
    assert!(manager.worker.lock().await.is_none());
  }
}
