use crate::backend::Backend;
use crate::error::NoReachableServers;
use std::fmt;

pub mod priority_weighted;
pub mod round_robin;

pub use priority_weighted::PriorityWeightedRule;
pub use round_robin::RoundRobinRule;

/// Picks one backend out of a reachable snapshot handed to it by the
/// pool manager. A rule is a pure function of that snapshot - it holds
/// no reference back to the pool, sidestepping the cyclic
/// owner/rule relationship the distilled spec flagged as an Open
/// Question (see the "Cyclic owner/rule binding" design note).
pub trait SelectionRule: Send + Sync + fmt::Debug {
  fn choose(&self, reachable: Vec<Backend>) -> Result<Backend, NoReachableServers>;
}

/// Sorts by priority ascending, tie-broken by `(address, port)` for a
/// deterministic total order. Shared by every rule that needs a stable
/// ranking of the reachable set.
fn sorted_by_priority(mut backends: Vec<Backend>) -> Vec<Backend> {
  backends.sort();
  backends
}
