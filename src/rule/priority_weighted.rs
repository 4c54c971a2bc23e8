use super::{sorted_by_priority, SelectionRule};
use crate::backend::Backend;
use crate::error::NoReachableServers;

/// Stateless rule that always returns the highest-priority backend in
/// the reachable set, ties broken by `(address, port)`. Despite the
/// name it does not yet weight among equal-priority backends; see the
/// "No weighted selection" design note for why that's deferred.
#[derive(Debug, Default)]
pub struct PriorityWeightedRule;

impl PriorityWeightedRule {
  pub fn new() -> Self {
    PriorityWeightedRule
  }
}

impl SelectionRule for PriorityWeightedRule {
  fn choose(&self, reachable: Vec<Backend>) -> Result<Backend, NoReachableServers> {
    sorted_by_priority(reachable).into_iter().next().ok_or(NoReachableServers)
  }
}
