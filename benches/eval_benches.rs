use RustedAutoDiff::expression::graph_engine::ExprGraph;
use RustedAutoDiff::expression::graph_engine_eval::Environment;
use criterion::{Criterion, criterion_group, criterion_main};

// a deep diamond: 2^20 paths to the innermost subexpression, 21 additions per call
// thanks to the per-call memoization
fn diamond() -> (ExprGraph, Environment, RustedAutoDiff::expression::graph_engine::Expr) {
    let g = ExprGraph::new();
    let x = g.var("x");
    let mut s = x.clone() + 1.0;
    for _ in 0..20 {
        s = s.clone() + s.clone();
    }
    let mut env = Environment::new();
    env.bind(&x, 1.0);
    (g, env, s)
}

fn bench_diamond_eval(c: &mut Criterion) {
    let (_g, env, s) = diamond();
    c.bench_function("diamond eval", |b| b.iter(|| s.eval(&env).unwrap()));
}

fn bench_diamond_d(c: &mut Criterion) {
    let (_g, env, s) = diamond();
    c.bench_function("diamond d", |b| b.iter(|| s.d(&env).unwrap()));
}

criterion_group!(benches, bench_diamond_eval, bench_diamond_d);
criterion_main!(benches);
