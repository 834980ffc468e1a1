//! # Graph Evaluation and Differentiation Module
//!
//! This module extends the graph engine with numeric evaluation, forward-mode
//! differentiation and numerical validation. It is the computational backbone of the
//! crate: both operations are single recursive passes over the immutable arena,
//! memoized per call so that a shared subexpression is computed once no matter how
//! many parents reference it.
//!
//! ## Key Methods
//!
//! ### Evaluation
//! - `eval(env)` - numeric value of the graph under a variable-binding environment
//! - `eval_with_stats(env)` - same, plus operator-application and cache-hit counters
//!
//! ### Differentiation
//! - `d(env)` - total forward-mode derivative at the bound point
//! - `d_with_stats(env)` - same, plus counters
//!
//! ### Numerical Analysis
//! - `compare_num1D()` - validate the forward derivative against a numerical one
//! - `lambdify1D()` - closure over the unique variable of a 1D graph
//! - `calc_from_linspace()` / `calc_from_linspace_d()` - sample curves for plotting
//!
//! ## Semantics
//!
//! The differentiator computes the **total derivative treating every bound variable
//! as the single active variable** (derivative of any variable is 1.0). For a graph
//! with more than one distinct variable the result is the sum of sensitivities to all
//! of them simultaneously - forward mode with one effective independent variable, not
//! a partial derivative with respect to a named variable. Intended for
//! single-variable use; the multi-variable behavior is a known limitation.
//!
//! Division by zero is not special-cased: IEEE infinity/NaN propagate to the caller,
//! during evaluation and through the quotient rule alike.
//!
//! ## Caches
//!
//! Each call allocates a fresh `value_cache` (and, for `d`, a fresh independent
//! `derivative_cache`), both keyed by `NodeId`. Caches never outlive a single call
//! and must never be reused across calls or environments - reuse would silently
//! return stale values for the wrong binding. Because the caches are private to the
//! call, concurrent evaluation of one graph under different environments from
//! different threads needs no locking beyond the arena read lock.

use crate::expression::graph_engine::{BinopKind, Expr, GraphStore, Node, NodeId, UnaryFun};
use crate::expression::utils::{linspace, norm, numerical_derivative};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;

/// The single error taxonomy of the crate.
///
/// Anything numeric (division by zero, overflow) is NOT converted into an error kind;
/// it propagates as infinity/NaN and is the caller's responsibility to detect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// A variable's identity and name were both absent from the environment.
    /// Carries the offending variable's name.
    UnboundVariable(String),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExprError::UnboundVariable(name) => write!(f, "Unbound variable {}", name),
        }
    }
}

impl std::error::Error for ExprError {}

/// Variable bindings supplied at call time.
///
/// Keys are either variable handles (instance bindings, keyed by `NodeId`) or
/// variable-name strings. On lookup the instance binding is checked first, then the
/// name binding. Every variable reachable from the root must be resolvable one way
/// or the other, or the whole call fails.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    by_instance: HashMap<NodeId, f64>,
    by_name: HashMap<String, f64>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a variable by instance identity. Takes precedence over a name binding.
    pub fn bind(&mut self, var: &Expr, value: f64) {
        self.by_instance.insert(var.id(), value);
    }

    /// Binds a variable by name.
    pub fn bind_name(&mut self, name: &str, value: f64) {
        self.by_name.insert(name.to_string(), value);
    }

    /// Instance binding first, name binding second.
    pub(crate) fn resolve(&self, id: NodeId, name: &str) -> Option<f64> {
        self.by_instance
            .get(&id)
            .copied()
            .or_else(|| self.by_name.get(name).copied())
    }

    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        let mut env = Environment::new();
        for (name, value) in pairs {
            env.bind_name(name, *value);
        }
        env
    }
}

impl From<HashMap<String, f64>> for Environment {
    fn from(by_name: HashMap<String, f64>) -> Self {
        Environment {
            by_instance: HashMap::new(),
            by_name,
        }
    }
}

/// Call counters of one `eval`/`d` call. `ops_applied` counts operator and function
/// applications actually performed, `cache_hits` counts lookups answered from the
/// per-call cache - together they make the shared-subexpression memoization
/// observable in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalStats {
    pub ops_applied: usize,
    pub cache_hits: usize,
}

impl GraphStore {
    /// Recursive evaluation helper. Consults `value_cache` by node id before
    /// recursing; without this a DAG with k paths to a shared subexpression would
    /// re-evaluate it up to 2^k times in deeply nested diamonds.
    pub(crate) fn eval_node(
        &self,
        id: NodeId,
        env: &Environment,
        value_cache: &mut HashMap<NodeId, f64>,
        stats: &mut EvalStats,
    ) -> Result<f64, ExprError> {
        if let Some(&cached) = value_cache.get(&id) {
            stats.cache_hits += 1;
            return Ok(cached);
        }
        let res = match self.node(id) {
            Node::Const { val } => *val,
            Node::Var { name, .. } => env
                .resolve(id, name)
                .ok_or_else(|| ExprError::UnboundVariable(name.clone()))?,
            Node::Binop { kind, lhs, rhs, .. } => {
                let res1 = self.eval_node(*lhs, env, value_cache, stats)?;
                let res2 = self.eval_node(*rhs, env, value_cache, stats)?;
                stats.ops_applied += 1;
                match kind {
                    BinopKind::Add => res1 + res2,
                    BinopKind::Sub => res1 - res2,
                    BinopKind::Mul => res1 * res2,
                    // division by zero propagates as inf/NaN, not as an error
                    BinopKind::Div => res1 / res2,
                }
            }
            Node::Unary { fun, arg, .. } => {
                let inner = self.eval_node(*arg, env, value_cache, stats)?;
                stats.ops_applied += 1;
                match fun {
                    UnaryFun::Exp => inner.exp(),
                    UnaryFun::Ln => inner.ln(),
                    UnaryFun::sin => inner.sin(),
                    UnaryFun::cos => inner.cos(),
                }
            }
        };
        value_cache.insert(id, res);
        Ok(res)
    }

    /// Recursive differentiation helper, same memoization discipline as `eval_node`
    /// with its own cache. The product/quotient/chain rules need operand values as
    /// well, which come through `value_cache` - a second, independent cache instance
    /// local to the same call.
    pub(crate) fn diff_node(
        &self,
        id: NodeId,
        env: &Environment,
        value_cache: &mut HashMap<NodeId, f64>,
        derivative_cache: &mut HashMap<NodeId, f64>,
        stats: &mut EvalStats,
    ) -> Result<f64, ExprError> {
        if let Some(&cached) = derivative_cache.get(&id) {
            stats.cache_hits += 1;
            return Ok(cached);
        }
        let res = match self.node(id) {
            // rate of change of the active variable with respect to itself
            Node::Var { .. } => 1.0,
            Node::Const { .. } => 0.0,
            Node::Binop { kind, lhs, rhs, .. } => {
                let d1 = self.diff_node(*lhs, env, value_cache, derivative_cache, stats)?;
                let d2 = self.diff_node(*rhs, env, value_cache, derivative_cache, stats)?;
                stats.ops_applied += 1;
                match kind {
                    BinopKind::Add => d1 + d2,
                    BinopKind::Sub => d1 - d2,
                    BinopKind::Mul => {
                        let v1 = self.eval_node(*lhs, env, value_cache, stats)?;
                        let v2 = self.eval_node(*rhs, env, value_cache, stats)?;
                        v1 * d2 + v2 * d1
                    }
                    BinopKind::Div => {
                        let v1 = self.eval_node(*lhs, env, value_cache, stats)?;
                        let v2 = self.eval_node(*rhs, env, value_cache, stats)?;
                        d1 / v2 - d2 * v1 / (v2 * v2)
                    }
                }
            }
            Node::Unary { fun, arg, .. } => {
                let du = self.diff_node(*arg, env, value_cache, derivative_cache, stats)?;
                let u = self.eval_node(*arg, env, value_cache, stats)?;
                stats.ops_applied += 1;
                match fun {
                    UnaryFun::Exp => u.exp() * du,
                    UnaryFun::Ln => du / u,
                    UnaryFun::sin => u.cos() * du,
                    UnaryFun::cos => -u.sin() * du,
                }
            }
        };
        derivative_cache.insert(id, res);
        Ok(res)
    }
}

impl Expr {
    /// Evaluates the graph under the given environment.
    ///
    /// A fresh value cache is created for this call and discarded at the end, so two
    /// calls with the same environment on the same root yield identical results and
    /// two calls with different environments cannot contaminate each other.
    ///
    /// # Errors
    /// `ExprError::UnboundVariable` if a reachable variable is absent from the
    /// environment both by instance and by name.
    pub fn eval(&self, env: &Environment) -> Result<f64, ExprError> {
        let (res, _) = self.eval_with_stats(env)?;
        Ok(res)
    }

    /// Same as [`eval`](Expr::eval) but also returns the call counters, which is how
    /// the shared-subexpression memoization can be observed from the outside.
    pub fn eval_with_stats(&self, env: &Environment) -> Result<(f64, EvalStats), ExprError> {
        let store = self.store.read().unwrap();
        let mut value_cache: HashMap<NodeId, f64> = HashMap::new();
        let mut stats = EvalStats::default();
        let res = store.eval_node(self.id, env, &mut value_cache, &mut stats)?;
        Ok((res, stats))
    }

    /// Evaluates the total forward-mode derivative at the bound point.
    ///
    /// Every bound variable contributes with derivative 1 - for a single-variable
    /// graph this is df/dx at the point, for a multi-variable graph the sum of all
    /// sensitivities (see the module documentation). Both caches are created fresh
    /// for this call.
    ///
    /// # Errors
    /// `ExprError::UnboundVariable` - the product, quotient and chain rules evaluate
    /// operand values, so a variable unresolvable by instance and by name fails the
    /// whole call here exactly as it does in `eval`.
    pub fn d(&self, env: &Environment) -> Result<f64, ExprError> {
        let (res, _) = self.d_with_stats(env)?;
        Ok(res)
    }

    /// Same as [`d`](Expr::d) but also returns the call counters.
    pub fn d_with_stats(&self, env: &Environment) -> Result<(f64, EvalStats), ExprError> {
        let store = self.store.read().unwrap();
        let mut value_cache: HashMap<NodeId, f64> = HashMap::new();
        let mut derivative_cache: HashMap<NodeId, f64> = HashMap::new();
        let mut stats = EvalStats::default();
        let res = store.diff_node(
            self.id,
            env,
            &mut value_cache,
            &mut derivative_cache,
            &mut stats,
        )?;
        Ok((res, stats))
    }

    //___________________________________________________________________________________________________________________
    //                    1D FUNCTION PROCESSING - Single Variable Functions y = f(x)
    // _________________________________________________________________________________________________________________

    /// Converts a single-variable graph into an executable closure.
    ///
    /// The variable is found automatically; a constant-only graph gives a closure
    /// ignoring its argument.
    ///
    /// # Panics
    /// Panics if the graph contains more than one distinct variable, or if
    /// evaluation fails inside the closure.
    pub fn lambdify1D(&self) -> Box<dyn Fn(f64) -> f64> {
        let names = self.variable_names();
        assert!(
            names.len() <= 1,
            "lambdify1D expects at most one variable, got {:?}",
            names
        );
        let name = names.into_iter().next();
        let expr = self.clone();
        Box::new(move |x| {
            let mut env = Environment::new();
            if let Some(name) = &name {
                env.bind_name(name, x);
            }
            expr.eval(&env).unwrap()
        })
    }

    /// Closure evaluating the forward derivative of a single-variable graph.
    ///
    /// # Panics
    /// Same contract as [`lambdify1D`](Expr::lambdify1D).
    pub fn lambdify1D_d(&self) -> Box<dyn Fn(f64) -> f64> {
        let names = self.variable_names();
        assert!(
            names.len() <= 1,
            "lambdify1D_d expects at most one variable, got {:?}",
            names
        );
        let name = names.into_iter().next();
        let expr = self.clone();
        Box::new(move |x| {
            let mut env = Environment::new();
            if let Some(name) = &name {
                env.bind_name(name, x);
            }
            expr.d(&env).unwrap()
        })
    }

    /// Evaluates a 1D function over a vector of input values.
    pub fn calc_vector1D(&self, x: &[f64]) -> Vec<f64> {
        let f = self.lambdify1D();
        x.iter().map(|&xi| f(xi)).collect()
    }

    /// Evaluates a 1D function over a linearly spaced domain.
    pub fn calc_from_linspace(&self, start: f64, end: f64, num_values: usize) -> Vec<f64> {
        self.calc_vector1D(&linspace(start, end, num_values))
    }

    /// Evaluates the forward derivative over a vector of input values.
    pub fn calc_vector1D_d(&self, x: &[f64]) -> Vec<f64> {
        let df = self.lambdify1D_d();
        x.iter().map(|&xi| df(xi)).collect()
    }

    /// Evaluates the forward derivative over a linearly spaced domain.
    pub fn calc_from_linspace_d(&self, start: f64, end: f64, num_values: usize) -> Vec<f64> {
        self.calc_vector1D_d(&linspace(start, end, num_values))
    }

    /// Parallel version of [`calc_vector1D`](Expr::calc_vector1D).
    ///
    /// Nodes are immutable after construction, so one graph may be evaluated from
    /// many threads concurrently as long as each call keeps its own caches - which
    /// every call does. Each point gets its own environment and its own caches.
    ///
    /// # Panics
    /// Same contract as [`lambdify1D`](Expr::lambdify1D).
    pub fn calc_vector1D_parallel(&self, x: &[f64]) -> Vec<f64> {
        let names = self.variable_names();
        assert!(
            names.len() <= 1,
            "calc_vector1D_parallel expects at most one variable, got {:?}",
            names
        );
        let name = names.into_iter().next();
        x.par_iter()
            .map(|&xi| {
                let mut env = Environment::new();
                if let Some(name) = &name {
                    env.bind_name(name, xi);
                }
                self.eval(&env).unwrap()
            })
            .collect()
    }

    /// Compares the forward derivative with a central-difference numerical derivative
    /// over a linspace.
    ///
    /// Returns the norm of the difference and whether it is below `max_norm`.
    pub fn compare_num1D(
        &self,
        start: f64,
        end: f64,
        num_values: usize,
        max_norm: f64,
    ) -> (f64, bool) {
        let analytical_derivative = self.calc_from_linspace_d(start, end, num_values); // values of the forward derivative on the linspace
        let analytical_function = self.lambdify1D();
        let step = (1.0 / 1e4) * (end - start) / (num_values as f64 - 1.0);
        let domain = linspace(start, end, num_values);
        let numerical = numerical_derivative(analytical_function, domain, step);
        let norma_val = norm(analytical_derivative, numerical);

        if max_norm > norma_val {
            (norma_val, true)
        } else {
            (norma_val, false)
        }
    }
}
