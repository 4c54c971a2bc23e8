use super::{candidates, ProbeStrategy};
use crate::backend::Backend;
use crate::discovery::Discovery;
use crate::probe::Prober;
use async_trait::async_trait;
use std::sync::Arc;

/// Probes candidates one at a time, in arrival order.
#[derive(Debug, Default)]
pub struct SerialProbeStrategy;

impl SerialProbeStrategy {
  pub fn new() -> Self {
    SerialProbeStrategy
  }
}

#[async_trait]
impl ProbeStrategy for SerialProbeStrategy {
  async fn probe(&self, prober: Arc<dyn Prober>, discovery: &dyn Discovery) -> Vec<Backend> {
    let backends = candidates(discovery).await;
    let mut results = Vec::with_capacity(backends.len());

    for backend in backends {
      let alive = prober.alive(&backend).await;
      backend.set_alive(alive);
      results.push(backend);
    }

    results
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::discovery::StaticDiscovery;
  use crate::probe::TrivialProber;

  #[tokio::test]
  async fn probes_every_candidate_and_preserves_order() {
    let discovery = StaticDiscovery::new(vec!["a:1", "b:2", "c:3"]).unwrap();
    let strategy = SerialProbeStrategy::new();
    let prober: Arc<dyn crate::probe::Prober> = Arc::new(TrivialProber::new());

    let results = strategy.probe(prober, &discovery).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|b| b.is_alive()));
    assert_eq!(results[0].address, "a");
    assert_eq!(results[2].address, "c");
  }

  #[tokio::test]
  async fn empty_discovery_yields_empty_result() {
    let discovery = StaticDiscovery::new(Vec::<&str>::new()).unwrap();
    let strategy = SerialProbeStrategy::new();
    let prober: Arc<dyn crate::probe::Prober> = Arc::new(TrivialProber::new());

    let results = strategy.probe(prober, &discovery).await;

    assert!(results.is_empty());
  }
}
