use riskcore::distributions::SeverityParams;
use riskcore::evaluator::{simulate_tree, EvaluationContext};
use riskcore::lec;
use riskcore::tree::{LeafSpec, PortfolioSpec, RiskNode};

criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        evaluating_single_leaf,
        evaluating_wide_portfolio,
        deriving_loss_exceedance_curve,
}

fn leaf(id: &str) -> RiskNode {
    RiskNode::Leaf(
        LeafSpec::new(
            id,
            id,
            0.15,
            SeverityParams::Lognormal {
                min_loss: 1_000.0,
                max_loss: 1_000_000.0,
            },
        )
        .expect("valid leaf"),
    )
}

fn evaluating_single_leaf(c: &mut criterion::Criterion) {
    let tree = leaf("bench-leaf");
    let ctx = EvaluationContext::new(50_000, 1, 2);
    c.bench_function("simulate a single leaf, 50k trials", |b| {
        b.iter(|| simulate_tree(&tree, &ctx).unwrap())
    });
}

fn evaluating_wide_portfolio(c: &mut criterion::Criterion) {
    let children: Vec<RiskNode> = (0..32).map(|i| leaf(&format!("leaf-{i}"))).collect();
    let tree =
        RiskNode::Portfolio(PortfolioSpec::new("bench-portfolio", "bench", children).unwrap());
    let ctx = EvaluationContext::new(10_000, 1, 2).with_parallelism(8);
    c.bench_function("simulate a 32-leaf portfolio, 10k trials", |b| {
        b.iter(|| simulate_tree(&tree, &ctx).unwrap())
    });
}

fn deriving_loss_exceedance_curve(c: &mut criterion::Criterion) {
    let tree = leaf("bench-leaf");
    let ctx = EvaluationContext::new(50_000, 1, 2);
    let outcome = simulate_tree(&tree, &ctx).unwrap();
    c.bench_function("derive LEC over 50k trials", |b| {
        b.iter(|| lec::derive(outcome.result.vector(), 100))
    });
}
