//! recursive, bottom-up evaluation of a risk tree into a result tree
//! leaves are sampled trial-by-trial; portfolios combine
//! their children's loss vectors. the whole thing is a fork/join reduction,
//! so [`EvaluationContext::parallelism`] only changes wall-clock time, never
//! the result.

use rayon::prelude::*;

use crate::cancellation::CancellationToken;
use crate::config::SimulationConfig;
use crate::distributions::build_severity;
use crate::error::{CoreError, CoreResult};
use crate::provenance::{self, LeafProvenance, NodeProvenance, PortfolioProvenance};
use crate::sampler::RiskSampler;
use crate::seed::{self, SeedHierarchy};
use crate::tree::RiskNode;
use crate::vector::SparseLossVector;

/// everything a call to [`simulate_tree`] needs beyond the tree itself.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub n_trials: u64,
    pub s3: u64,
    pub s4: u64,
    pub parallelism: usize,
    pub capture_provenance: bool,
    pub cancellation: Option<CancellationToken>,
}

impl EvaluationContext {
    pub fn new(n_trials: u64, s3: u64, s4: u64) -> Self {
        Self {
            n_trials,
            s3,
            s4,
            parallelism: SimulationConfig::default().default_parallelism,
            capture_provenance: false,
            cancellation: None,
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_provenance(mut self, capture_provenance: bool) -> Self {
        self.capture_provenance = capture_provenance;
        self
    }

    /// attach a token this evaluation checks between tree nodes and trial
    /// chunks, stopping new work from being scheduled once it fires.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = Some(cancellation);
        self
    }
}

/// the result tree: one [`SparseLossVector`] per node, mirroring the shape
/// of the input [`RiskNode`] tree 1:1.
#[derive(Debug, Clone)]
pub enum ResultNode {
    Leaf {
        id: String,
        name: String,
        vector: SparseLossVector,
        provenance: Option<LeafProvenance>,
    },
    Portfolio {
        id: String,
        name: String,
        vector: SparseLossVector,
        children: Vec<ResultNode>,
        provenance: Option<PortfolioProvenance>,
    },
}

impl ResultNode {
    pub fn vector(&self) -> &SparseLossVector {
        match self {
            ResultNode::Leaf { vector, .. } => vector,
            ResultNode::Portfolio { vector, .. } => vector,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ResultNode::Leaf { id, .. } => id,
            ResultNode::Portfolio { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ResultNode::Leaf { name, .. } => name,
            ResultNode::Portfolio { name, .. } => name,
        }
    }

    /// walk the result tree collecting a flat [`NodeProvenance`] mirror,
    /// only meaningful if the evaluation captured provenance.
    pub fn provenance(&self) -> Option<NodeProvenance> {
        match self {
            ResultNode::Leaf { provenance, .. } => {
                provenance.clone().map(NodeProvenance::Leaf)
            }
            ResultNode::Portfolio {
                provenance,
                children,
                ..
            } => {
                let portfolio = provenance.clone()?;
                let child_provenance: Option<Vec<NodeProvenance>> =
                    children.iter().map(ResultNode::provenance).collect();
                Some(NodeProvenance::Portfolio(portfolio, child_provenance?))
            }
        }
    }
}

/// a completed tree evaluation, plus any nodes whose loss sum saturated
/// `u64` (non-fatal — reported alongside a normal result).
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub result: ResultNode,
    pub saturated_nodes: Vec<String>,
}

/// a thread pool bounded to exactly `parallelism` workers, or `None` when
/// `parallelism <= 1`. in the `None` case the whole evaluation runs with no
/// rayon fan-out at all, so a caller asking for one worker never spills onto
/// the process-wide default pool.
fn build_pool(parallelism: usize) -> CoreResult<Option<rayon::ThreadPool>> {
    if parallelism <= 1 {
        return Ok(None);
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism)
        .build()
        .map(Some)
        .map_err(|e| CoreError::InvariantViolation(format!("building bounded thread pool: {e}")))
}

/// evaluate a whole risk tree against `ctx`, bottom-up. every parallel
/// fan-out triggered anywhere in the recursion — sibling children as well as
/// a single leaf's trial chunks — runs inside one pool bounded to
/// `ctx.parallelism`, so the worker cap holds across the whole request, not
/// just at the top level.
pub fn simulate_tree(tree: &RiskNode, ctx: &EvaluationContext) -> CoreResult<SimulationOutcome> {
    let pool = build_pool(ctx.parallelism)?;
    let result = match &pool {
        Some(pool) => pool.install(|| eval_node(tree, ctx))?,
        None => eval_node(tree, ctx)?,
    };
    let mut saturated_nodes = Vec::new();
    collect_saturated(&result, &mut saturated_nodes);
    Ok(SimulationOutcome {
        result,
        saturated_nodes,
    })
}

fn collect_saturated(node: &ResultNode, out: &mut Vec<String>) {
    if node.vector().is_saturated() {
        log::warn!("loss sum saturated at node {}", node.id());
        out.push(node.id().to_string());
    }
    if let ResultNode::Portfolio { children, .. } = node {
        for child in children {
            collect_saturated(child, out);
        }
    }
}

fn eval_node(node: &RiskNode, ctx: &EvaluationContext) -> CoreResult<ResultNode> {
    if let Some(token) = &ctx.cancellation {
        if token.is_cancelled() {
            log::debug!("evaluation cancelled before node {}", node.id());
            return Err(CoreError::Cancelled);
        }
    }

    match node {
        RiskNode::Leaf(leaf) => {
            log::debug!("evaluating leaf {} over {} trials", leaf.id, ctx.n_trials);
            let entity_id = seed::entity_id(&leaf.id);
            let severity = build_severity(&leaf.id, &leaf.severity)?;
            let seeds = SeedHierarchy::new(ctx.s3, ctx.s4);
            let sampler = RiskSampler::new(entity_id, leaf.occurrence_p, severity, seeds);

            let vector = evaluate_trials(&sampler, ctx)?;

            let provenance = ctx.capture_provenance.then(|| {
                provenance::leaf_provenance(
                    &leaf.id,
                    entity_id,
                    &seeds,
                    leaf.occurrence_p,
                    leaf.severity.clone(),
                    ctx.n_trials,
                )
            });

            Ok(ResultNode::Leaf {
                id: leaf.id.clone(),
                name: leaf.name.clone(),
                vector,
                provenance,
            })
        }
        RiskNode::Portfolio(portfolio) => {
            let children: Vec<ResultNode> = if ctx.parallelism > 1 {
                portfolio
                    .children
                    .par_iter()
                    .map(|child| eval_node(child, ctx))
                    .collect::<CoreResult<Vec<_>>>()?
            } else {
                portfolio
                    .children
                    .iter()
                    .map(|child| eval_node(child, ctx))
                    .collect::<CoreResult<Vec<_>>>()?
            };

            // fold over clones so each child keeps its own vector for its
            // own LEC, while the portfolio's combine still consumes two
            // owned operands per merge step.
            let combined = children.iter().try_fold(
                SparseLossVector::empty(ctx.n_trials),
                |acc, child| acc.combine(child.vector().clone()),
            )?;

            let provenance = ctx.capture_provenance.then(|| PortfolioProvenance {
                portfolio_id: portfolio.id.clone(),
                children_ids: children.iter().map(|c| c.id().to_string()).collect(),
            });

            Ok(ResultNode::Portfolio {
                id: portfolio.id.clone(),
                name: portfolio.name.clone(),
                vector: combined,
                children,
                provenance,
            })
        }
    }
}

/// draw every trial for one leaf and fold the per-trial losses into a
/// single vector. chunked and reduced through rayon when `ctx.parallelism >
/// 1`, so this is the actual parallel fan-out point within a single leaf's
/// workload; otherwise the chunks are folded in the calling thread, with no
/// rayon involvement at all. cancellation is checked once per chunk so a
/// fired token stops further chunks from starting.
fn evaluate_trials(sampler: &RiskSampler, ctx: &EvaluationContext) -> CoreResult<SparseLossVector> {
    const CHUNK: u64 = 4_096;
    let n_trials = ctx.n_trials;

    let chunks: Vec<(u64, u64)> = (0..n_trials)
        .step_by(CHUNK as usize)
        .map(|start| (start, (start + CHUNK).min(n_trials)))
        .collect();

    let process_chunk = |start: u64, end: u64| -> CoreResult<SparseLossVector> {
        if let Some(token) = &ctx.cancellation {
            if token.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
        }
        let mut vector = SparseLossVector::empty(n_trials);
        for trial in start..end {
            if let Some(loss) = sampler.sample(trial) {
                vector = vector.combine(SparseLossVector::single(n_trials, trial, loss))?;
            }
        }
        Ok(vector)
    };

    if ctx.parallelism > 1 {
        chunks
            .into_par_iter()
            .map(|(start, end)| process_chunk(start, end))
            .try_reduce(|| SparseLossVector::empty(n_trials), SparseLossVector::combine)
    } else {
        chunks.into_iter().try_fold(
            SparseLossVector::empty(n_trials),
            |acc, (start, end)| acc.combine(process_chunk(start, end)?),
        )
    }
}
