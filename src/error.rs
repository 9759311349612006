use thiserror::Error;

/// Errors surfaced by the simulation core.
///
/// `Saturated` is deliberately absent here: a saturated 64-bit loss sum is
/// non-fatal and is instead reported out-of-band as a list of node ids
/// alongside a normal successful result.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("distribution construction failed for node {node}: {detail}")]
    DistributionConstruction { node: String, detail: String },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("cancelled")]
    Cancelled,
}

pub type CoreResult<T> = Result<T, CoreError>;
