// src/core/policy.rs — Acceptance policy and stagnation tracking
//
// A candidate is kept when ANY of cpu, memory or time is strictly lower than
// the current best. This is not Pareto dominance: regressions in two
// dimensions are tolerated if the third improves.

use super::types::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Improved,
    Rejected,
}

/// Compare a candidate against the current best.
pub fn judge(best: &Metrics, candidate: &Metrics) -> Verdict {
    if !candidate.success {
        return Verdict::Rejected;
    }
    if candidate.cpu < best.cpu || candidate.memory < best.memory || candidate.time < best.time {
        Verdict::Improved
    } else {
        Verdict::Rejected
    }
}

/// Counts consecutive non-improving cycles against a budget.
#[derive(Debug, Clone)]
pub struct Stagnation {
    count: u32,
    budget: u32,
}

impl Stagnation {
    pub fn new(budget: u32) -> Self {
        Self { count: 0, budget }
    }

    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Improved => self.count = 0,
            Verdict::Rejected => self.count += 1,
        }
    }

    /// A failed cycle counts the same as a rejected one.
    pub fn record_failure(&mut self) {
        self.record(Verdict::Rejected);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn exhausted(&self) -> bool {
        self.count >= self.budget
    }
}
