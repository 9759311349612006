//! the input risk tree: a hierarchy of leaves (individual risks) and
//! portfolios (aggregations of children), mirrored 1:1 by the result tree
//! produced by [`crate::evaluator`].

use crate::distributions::SeverityParams;
use crate::error::{CoreError, CoreResult};

/// a single risk, or a portfolio aggregating other risks.
#[derive(Debug, Clone)]
pub enum RiskNode {
    Leaf(LeafSpec),
    Portfolio(PortfolioSpec),
}

impl RiskNode {
    pub fn id(&self) -> &str {
        match self {
            RiskNode::Leaf(leaf) => &leaf.id,
            RiskNode::Portfolio(portfolio) => &portfolio.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RiskNode::Leaf(leaf) => &leaf.name,
            RiskNode::Portfolio(portfolio) => &portfolio.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeafSpec {
    pub id: String,
    pub name: String,
    pub occurrence_p: f64,
    pub severity: SeverityParams,
}

impl LeafSpec {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        occurrence_p: f64,
        severity: SeverityParams,
    ) -> CoreResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::InvariantViolation("leaf id must not be empty".into()));
        }
        if !(occurrence_p > 0.0 && occurrence_p < 1.0) {
            return Err(CoreError::InvariantViolation(format!(
                "leaf {id}: occurrence_p={occurrence_p} must be in (0, 1)"
            )));
        }
        Ok(Self {
            id,
            name: name.into(),
            occurrence_p,
            severity,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PortfolioSpec {
    pub id: String,
    pub name: String,
    pub children: Vec<RiskNode>,
}

impl PortfolioSpec {
    /// note: this constructor does not enforce a maximum tree depth. the
    /// depth cap (policy max 5) is applied only at LEC-derivation
    /// time (see [`crate::lec`]), so a tree deeper than the policy allows
    /// can still be built and evaluated — it is simply clamped when its
    /// loss exceedance curve is derived.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        children: Vec<RiskNode>,
    ) -> CoreResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::InvariantViolation(
                "portfolio id must not be empty".into(),
            ));
        }
        if children.is_empty() {
            return Err(CoreError::InvariantViolation(format!(
                "portfolio {id} must have at least one child"
            )));
        }
        Ok(Self {
            id,
            name: name.into(),
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str) -> RiskNode {
        RiskNode::Leaf(
            LeafSpec::new(
                id,
                id,
                0.1,
                SeverityParams::Lognormal {
                    min_loss: 100.0,
                    max_loss: 10_000.0,
                },
            )
            .unwrap(),
        )
    }

    #[test]
    fn rejects_empty_leaf_id() {
        let err = LeafSpec::new(
            "",
            "name",
            0.1,
            SeverityParams::Lognormal {
                min_loss: 1.0,
                max_loss: 2.0,
            },
        );
        assert!(err.is_err());
    }

    #[test]
    fn rejects_occurrence_p_out_of_range() {
        let params = SeverityParams::Lognormal {
            min_loss: 1.0,
            max_loss: 2.0,
        };
        assert!(LeafSpec::new("a", "a", 0.0, params.clone()).is_err());
        assert!(LeafSpec::new("a", "a", 1.0, params.clone()).is_err());
        assert!(LeafSpec::new("a", "a", 1.5, params).is_err());
    }

    #[test]
    fn rejects_empty_portfolio_children() {
        let err = PortfolioSpec::new("p", "p", vec![]);
        assert!(err.is_err());
    }

    #[test]
    fn accepts_deep_trees_without_enforcing_a_depth_cap() {
        let mut node = leaf("l0");
        for depth in 1..=7 {
            node = RiskNode::Portfolio(
                PortfolioSpec::new(format!("p{depth}"), format!("p{depth}"), vec![node]).unwrap(),
            );
        }
        assert_eq!(node.id(), "p7");
    }
}
