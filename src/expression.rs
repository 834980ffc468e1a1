/// a module that builds arithmetic expressions as a computational graph (DAG) of nodes
/// kept in an arena and addressed by stable integer handles, then evaluates the graph
/// numerically under a variable-binding environment and computes forward-mode derivatives
///
///# Example
/// ```
/// use RustedAutoDiff::expression::graph_engine::ExprGraph;
/// use RustedAutoDiff::expression::graph_engine_eval::Environment;
/// let g = ExprGraph::new();
/// let x = g.var("x");
/// let y = x.clone() * x.clone() + 1.0;
/// let mut env = Environment::new();
/// env.bind(&x, 3.0);
/// assert_eq!(y.eval(&env).unwrap(), 10.0);
/// // forward derivative: d(x*x + 1) = 2*x = 6
/// assert_eq!(y.d(&env).unwrap(), 6.0);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod graph_engine;
///____________________________________________________________________________________________________________________________
/// # Graph evaluation and differentiation
/// a module that
/// 1) evaluates the expression graph under a variable-binding environment with per-call memoization
/// 2) computes the total forward-mode derivative with its own per-call cache
/// 3) validates the analytical derivative against a numerical one on a linspace
///# Example#
/// ```
/// use RustedAutoDiff::expression::graph_engine::ExprGraph;
/// use RustedAutoDiff::expression::graph_engine_eval::Environment;
/// let g = ExprGraph::new();
/// let x = g.var("x");
/// // shared subexpression: s is referenced by two parents, evaluated once per call
/// let s = x.clone() * x.clone();
/// let y = s.clone() + s.clone();
/// let mut env = Environment::new();
/// env.bind(&x, 2.0);
/// let (res, stats) = y.eval_with_stats(&env).unwrap();
/// assert_eq!(res, 8.0);
/// assert_eq!(stats.ops_applied, 2); // one Mul, one Add - not two Muls
/// ```
pub mod graph_engine_eval;
mod graph_engine_tests;
///______________________________________________________________________________________________________________________________________________
/// the collection of utility functions: linspace, numerical derivative, norm of difference
/// _____________________________________________________________________________________________________________________________________________
pub mod utils;
