use super::{sorted_by_priority, SelectionRule};
use crate::backend::Backend;
use crate::error::NoReachableServers;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

/// Cycles through the reachable set in priority order, refilling its
/// internal queue whenever it runs dry. Any N consecutive `choose()`
/// calls against a stable reachable set of size N return each backend
/// exactly once, in priority-ascending order.
pub struct RoundRobinRule {
  queue: Mutex<VecDeque<Backend>>,
}

impl RoundRobinRule {
  pub fn new() -> Self {
    RoundRobinRule { queue: Mutex::new(VecDeque::new()) }
  }
}

impl Default for RoundRobinRule {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for RoundRobinRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RoundRobinRule").finish()
  }
}

impl SelectionRule for RoundRobinRule {
  fn choose(&self, reachable: Vec<Backend>) -> Result<Backend, NoReachableServers> {
    let mut queue = self.queue.lock().expect("round robin queue poisoned");
    if queue.is_empty() {
      queue.extend(sorted_by_priority(reachable));
    }

    queue.pop_front().ok_or(NoReachableServers)
  }
}
