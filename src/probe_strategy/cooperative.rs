use super::{candidates, ProbeStrategy};
use crate::backend::Backend;
use crate::discovery::Discovery;
use crate::probe::Prober;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

/// Spawns one lightweight task per candidate and joins them all - the
/// Rust analogue of the original's greenlet-based ping strategy.
#[derive(Debug, Default)]
pub struct CooperativeTaskProbeStrategy;

impl CooperativeTaskProbeStrategy {
  pub fn new() -> Self {
    CooperativeTaskProbeStrategy
  }
}

#[async_trait]
impl ProbeStrategy for CooperativeTaskProbeStrategy {
  async fn probe(&self, prober: Arc<dyn Prober>, discovery: &dyn Discovery) -> Vec<Backend> {
    let backends = candidates(discovery).await;
    if backends.is_empty() {
      return Vec::new();
    }

    let tasks = backends.into_iter().map(|backend| {
      let prober = prober.clone();
      tokio::spawn(async move {
        let alive = prober.alive(&backend).await;
        backend.set_alive(alive);
        backend
      })
    });

    join_all(tasks).await.into_iter().filter_map(Result::ok).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::discovery::StaticDiscovery;
  use crate::probe::TrivialProber;

  #[tokio::test]
  async fn probes_every_candidate_concurrently() {
    let discovery = StaticDiscovery::new(vec!["a:1", "b:2", "c:3"]).unwrap();
    let strategy = CooperativeTaskProbeStrategy::new();
    let prober: Arc<dyn Prober> = Arc::new(TrivialProber::new());

    let mut results = strategy.probe(prober, &discovery).await;
    results.sort_by(|a, b| a.address.cmp(&b.address));

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|b| b.is_alive()));
  }
}
