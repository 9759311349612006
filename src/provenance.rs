//! captured inputs sufficient to bit-for-bit reproduce a simulation

use serde::{Deserialize, Serialize};

use crate::distributions::{self, SeverityParams};
use crate::error::CoreResult;
use crate::sampler::RiskSampler;
use crate::seed::{self, SeedHierarchy};
use crate::vector::SparseLossVector;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafProvenance {
    pub leaf_id: String,
    pub entity_id: u64,
    pub occurrence_var: u64,
    pub severity_var: u64,
    pub s3: u64,
    pub s4: u64,
    pub occurrence_p: f64,
    pub severity_params: SeverityParams,
    pub n_trials: u64,
}

impl LeafProvenance {
    /// re-run this leaf's simulation from captured inputs alone. used to
    /// verify bit-identical reproducibility: the resulting vector must
    /// equal the one originally produced.
    pub fn resample(&self, n_trials: u64) -> CoreResult<SparseLossVector> {
        let severity = distributions::build_severity(&self.leaf_id, &self.severity_params)?;
        let seeds = SeedHierarchy::new(self.s3, self.s4);
        let sampler = RiskSampler::new(self.entity_id, self.occurrence_p, severity, seeds);

        let mut vector = SparseLossVector::empty(n_trials);
        for trial in 0..n_trials {
            if let Some(loss) = sampler.sample(trial) {
                vector = vector.combine(SparseLossVector::single(n_trials, trial, loss))?;
            }
        }
        Ok(vector)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioProvenance {
    pub portfolio_id: String,
    pub children_ids: Vec<String>,
}

/// mirrors the shape of [`crate::evaluator::ResultNode`], so a whole tree's
/// provenance can be walked and re-derived recursively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeProvenance {
    Leaf(LeafProvenance),
    Portfolio(PortfolioProvenance, Vec<NodeProvenance>),
}

pub(crate) fn leaf_provenance(
    leaf_id: &str,
    entity_id: u64,
    seeds: &SeedHierarchy,
    occurrence_p: f64,
    severity_params: SeverityParams,
    n_trials: u64,
) -> LeafProvenance {
    LeafProvenance {
        leaf_id: leaf_id.to_string(),
        entity_id,
        occurrence_var: seed::occurrence_var(entity_id),
        severity_var: seed::severity_var(entity_id),
        s3: seeds.s3,
        s4: seeds.s4,
        occurrence_p,
        severity_params,
        n_trials,
    }
}
