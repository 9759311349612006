//! deriving a loss exceedance curve from a node's simulated loss vector

use crate::config::SimulationConfig;
use crate::evaluator::ResultNode;
use crate::vector::SparseLossVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurvePoint {
    pub threshold: u64,
    pub exceedance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantiles {
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
}

#[derive(Debug, Clone)]
pub struct LecResult {
    pub quantiles: Quantiles,
    pub curve_points: Vec<CurvePoint>,
}

/// rank-based quantile of a sorted ascending slice. `q` in `(0, 1]`.
fn rank_quantile(sorted: &[u64], total_trials: u64, q: f64) -> u64 {
    if total_trials == 0 {
        return 0;
    }
    // a trial not present in `sorted` is a zero loss; the quantile is taken
    // over all `total_trials`, not just the ones with a positive loss.
    let rank = ((q * total_trials as f64).ceil() as u64).clamp(1, total_trials);
    let zero_trials = total_trials - sorted.len() as u64;
    if rank <= zero_trials {
        0
    } else {
        sorted[(rank - zero_trials - 1) as usize]
    }
}

/// derive a node's loss exceedance curve: the standard quantile set plus up
/// to `max_points` bounded curve points spanning the observed loss range.
/// a tree deeper than [`SimulationConfig::max_tree_depth`] is clamped here,
/// not at tree-construction time.
pub fn derive(vector: &SparseLossVector, max_points: usize) -> LecResult {
    let sorted = vector.sorted_positive_losses();
    let total_trials = vector.trial_count();

    let quantiles = Quantiles {
        p50: rank_quantile(&sorted, total_trials, 0.50),
        p90: rank_quantile(&sorted, total_trials, 0.90),
        p95: rank_quantile(&sorted, total_trials, 0.95),
        p99: rank_quantile(&sorted, total_trials, 0.99),
    };

    let curve_points = match sorted.len() {
        0 => vec![CurvePoint {
            threshold: 0,
            exceedance: 0.0,
        }],
        1 => vec![
            CurvePoint {
                threshold: 0,
                exceedance: vector.prob_of_exceedance(0),
            },
            CurvePoint {
                threshold: sorted[0],
                exceedance: vector.prob_of_exceedance(sorted[0]),
            },
        ],
        _ => {
            let min = sorted[0];
            let max = *sorted.last().unwrap();
            let points = max_points.max(2);
            (0..points)
                .map(|i| {
                    let frac = i as f64 / (points - 1) as f64;
                    let threshold = min + ((max - min) as f64 * frac).round() as u64;
                    CurvePoint {
                        threshold,
                        exceedance: vector.prob_of_exceedance(threshold),
                    }
                })
                .collect()
        }
    };

    LecResult {
        quantiles,
        curve_points,
    }
}

/// depth of a tree capped at the configured policy maximum, used when
/// laying out a shared curve domain across multiple nodes.
pub fn clamp_depth(depth: usize, config: &SimulationConfig) -> usize {
    depth.min(config.max_tree_depth)
}

/// one node's LEC, tagged with its id and name for display.
#[derive(Debug, Clone)]
pub struct NodeLec {
    pub id: String,
    pub name: String,
    pub lec: LecResult,
}

/// derive LECs for every node in a result tree, root first, down to
/// whichever is smaller: `requested_depth` or the policy's configured
/// maximum. nodes past that depth are silently omitted rather than erroring.
pub fn derive_tree(
    root: &ResultNode,
    max_points: usize,
    requested_depth: usize,
    config: &SimulationConfig,
) -> Vec<NodeLec> {
    let cutoff = clamp_depth(requested_depth, config);
    let mut out = Vec::new();
    walk_tree(root, 0, cutoff, max_points, &mut out);
    out
}

fn walk_tree(
    node: &ResultNode,
    depth: usize,
    cutoff: usize,
    max_points: usize,
    out: &mut Vec<NodeLec>,
) {
    out.push(NodeLec {
        id: node.id().to_string(),
        name: node.name().to_string(),
        lec: derive(node.vector(), max_points),
    });

    if depth >= cutoff {
        return;
    }
    if let ResultNode::Portfolio { children, .. } = node {
        for child in children {
            walk_tree(child, depth + 1, cutoff, max_points, out);
        }
    }
}
