//! per-leaf trial sampling: draws an occurrence coin flip and, on
//! occurrence, a severity quantile, landing on the trial's loss amount

use crate::distributions::{Quantile, Severity};
use crate::seed::{self, SeedHierarchy};

/// everything needed to draw trial `t`'s loss for one leaf, independent of
/// any other leaf or of trial order.
pub struct RiskSampler {
    entity_id: u64,
    occurrence_p: f64,
    severity: Severity,
    seeds: SeedHierarchy,
}

impl RiskSampler {
    pub fn new(entity_id: u64, occurrence_p: f64, severity: Severity, seeds: SeedHierarchy) -> Self {
        Self {
            entity_id,
            occurrence_p,
            severity,
            seeds,
        }
    }

    /// draw trial `trial`'s loss. `None` means the event did not occur in
    /// this trial: either the occurrence draw failed, or the severity draw
    /// rounded to zero, which is treated identically.
    pub fn sample(&self, trial: u64) -> Option<u64> {
        let occurrence_var = seed::occurrence_var(self.entity_id);
        let occurrence_draw = self.seeds.draw(trial, self.entity_id, occurrence_var);
        if occurrence_draw >= self.occurrence_p {
            return None;
        }

        let severity_var = seed::severity_var(self.entity_id);
        let severity_draw = self.seeds.draw(trial, self.entity_id, severity_var);
        let loss = self.severity.quantile(severity_draw).max(0.0);
        let rounded = loss.round_ties_even();

        if rounded <= 0.0 {
            None
        } else {
            Some(rounded as u64)
        }
    }
}
