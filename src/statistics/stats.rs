use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Stats {
    queries: usize,
    reach_checks: usize,
    pruned: usize,
    updates: usize,
}

impl Stats {
    pub fn new() -> Self {
        Stats {
            queries: 0,
            reach_checks: 0,
            pruned: 0,
            updates: 0,
        }
    }

    /// Record into the statistics object that a new profile query has started
    pub fn bump_queries(&mut self) {
        self.queries += 1
    }

    /// Record a reachability check, and whether it pruned the candidate
    pub fn bump_reach_check(&mut self, pruned: bool) {
        self.reach_checks += 1;
        if pruned {
            self.pruned += 1;
        }
    }

    /// Record into the statistics object that a label update was issued
    pub fn bump_updates(&mut self) {
        self.updates += 1
    }

    pub fn get_queries(&self) -> usize {
        self.queries
    }

    pub fn get_reach_checks(&self) -> usize {
        self.reach_checks
    }

    pub fn get_pruned(&self) -> usize {
        self.pruned
    }

    pub fn get_updates(&self) -> usize {
        self.updates
    }

    /// Share of reachability checks that pruned their candidate, 0 when nothing was checked.
    pub fn pruning_ratio(&self) -> f64 {
        if self.reach_checks == 0 {
            0.0
        } else {
            self.pruned as f64 / self.reach_checks as f64
        }
    }

    pub fn merge(self, other: &Stats) -> Stats {
        Stats {
            queries: self.queries + other.queries,
            reach_checks: self.reach_checks + other.reach_checks,
            pruned: self.pruned + other.pruned,
            updates: self.updates + other.updates,
        }
    }
}
