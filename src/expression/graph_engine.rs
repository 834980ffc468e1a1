//! # Graph Engine Module
//!
//! This module provides the expression-graph engine: arithmetic expressions are built
//! as a directed acyclic graph (DAG) of typed nodes kept in an arena, so that one
//! subexpression may be referenced by several parents without being copied. It is the
//! core foundation for numeric evaluation and forward-mode differentiation in the
//! RustedAutoDiff crate.
//!
//! ## Purpose
//!
//! The graph engine allows users to:
//! - Create leaf nodes: variables (resolved at call time) and numeric constants
//! - Compose expressions with builder methods or natural operator syntax: `x + y * z`
//! - Coerce raw numeric literals to constant nodes automatically, on either side
//! - Share subexpressions between parents, forming a DAG instead of a tree
//! - Track a `needs_grad` flag propagated at construction time
//!
//! ## Main Structures
//!
//! ### `ExprGraph`
//! The arena owning all nodes. Nodes are pushed during construction, addressed by
//! stable integer handles (`NodeId`) and never mutated or removed afterwards.
//!
//! ### `Expr`
//! A cheap clonable handle (shared arena + `NodeId`). Node identity is the handle id:
//! two variables with the same name are distinct nodes.
//!
//! ### `Node` enum
//! The closed set of node variants, matched exhaustively by the evaluator:
//! - **Variables**: `Var` - named leaves like "x", "x1"
//! - **Constants**: `Const` - fixed numeric values
//! - **Binary operations**: `Binop` with kind `Add`, `Sub`, `Mul`, `Div`
//! - **Functions**: `Unary` with `Exp`, `Ln`, `sin`, `cos`
//!
//! ## Interesting Code Features
//!
//! 1. **Arena representation**: children are stored as `NodeId` handles rather than
//!    boxed subtrees, so per-call caches can be keyed by a plain integer and a shared
//!    subexpression occupies one slot no matter how many parents reference it
//!
//! 2. **Operator Overloading**: Implements std::ops traits (Add, Sub, Mul, Div, Neg)
//!    between expressions and between an expression and an f64 literal in both orders
//!
//! 3. **Literal normalization**: a single `Operand` coercion step turns raw numbers
//!    into `Const` nodes before any node is constructed
//!
//! 4. **Acyclic by construction**: a node can only reference already-constructed
//!    children, never itself or an ancestor, so recursion always terminates
//!
//! 5. **Macro System**: Provides the `symbols!(g; x, y, z)` macro for ergonomic
//!    variable creation

#![allow(non_camel_case_types)]

use std::fmt;
use std::sync::{Arc, RwLock};
use strum_macros::Display;

/// Stable integer handle of a node in the arena.
///
/// The handle, not the node value, is the identity of a node: per-call caches and
/// instance bindings in the environment are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Kind of a binary operation node.
///
/// Left and right operands stay distinguishable in the interface: the contract does
/// not assume commutativity of `Mul` (a future non-scalar operand type would break it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BinopKind {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
}

/// Kind of a unary function node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnaryFun {
    #[strum(serialize = "exp")]
    Exp,
    #[strum(serialize = "ln")]
    Ln,
    #[strum(serialize = "sin")]
    sin,
    #[strum(serialize = "cos")]
    cos,
}

/// A single arena slot. Children are ids of already-constructed nodes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    /// Named variable leaf, resolved against the environment at call time
    Var { name: String, needs_grad: bool },
    /// Numerical constant leaf
    Const { val: f64 },
    /// Binary operation: lhs op rhs
    Binop {
        kind: BinopKind,
        lhs: NodeId,
        rhs: NodeId,
        needs_grad: bool,
    },
    /// Unary function: fun(arg)
    Unary {
        fun: UnaryFun,
        arg: NodeId,
        needs_grad: bool,
    },
}

/// The node arena. Grows during construction, slots are immutable once pushed.
#[derive(Debug, Default)]
pub(crate) struct GraphStore {
    pub(crate) nodes: Vec<Node>,
}

impl GraphStore {
    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn needs_grad(&self, id: NodeId) -> bool {
        match self.node(id) {
            Node::Var { needs_grad, .. } => *needs_grad,
            Node::Const { .. } => false,
            Node::Binop { needs_grad, .. } => *needs_grad,
            Node::Unary { needs_grad, .. } => *needs_grad,
        }
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter) -> fmt::Result {
        match self.node(id) {
            Node::Var { name, .. } => write!(f, "{}", name),
            Node::Const { val } => write!(f, "{}", val),
            Node::Binop { kind, lhs, rhs, .. } => {
                write!(f, "(")?;
                self.fmt_node(*lhs, f)?;
                write!(f, " {} ", kind)?;
                self.fmt_node(*rhs, f)?;
                write!(f, ")")
            }
            Node::Unary { fun, arg, .. } => {
                write!(f, "{}(", fun)?;
                self.fmt_node(*arg, f)?;
                write!(f, ")")
            }
        }
    }
}

/// The expression graph: an arena of immutable nodes behind a shared handle.
///
/// All leaves and compositions belonging to one graph share the same arena; handles
/// created from different graphs must not be composed together. The arena only grows -
/// nodes live as long as the graph itself.
///
/// # Examples
/// ```
/// use RustedAutoDiff::expression::graph_engine::ExprGraph;
/// let g = ExprGraph::new();
/// let x = g.var("x");
/// let expr = x.clone() + 2.0;
/// assert_eq!(format!("{}", expr), "(x + 2)");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExprGraph {
    store: Arc<RwLock<GraphStore>>,
}

impl ExprGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a variable leaf with the given name, `needs_grad = true`.
    ///
    /// The returned handle is the variable's identity: a second `var("x")` call makes
    /// a distinct node that only happens to share the name.
    pub fn var(&self, name: &str) -> Expr {
        let id = self.store.write().unwrap().push(Node::Var {
            name: name.to_string(),
            needs_grad: true,
        });
        Expr {
            store: Arc::clone(&self.store),
            id,
        }
    }

    /// Creates a variable leaf with gradient tracking turned off.
    pub fn var_no_grad(&self, name: &str) -> Expr {
        let id = self.store.write().unwrap().push(Node::Var {
            name: name.to_string(),
            needs_grad: false,
        });
        Expr {
            store: Arc::clone(&self.store),
            id,
        }
    }

    /// Creates a constant leaf, `needs_grad = false`.
    pub fn constant(&self, val: f64) -> Expr {
        let id = self.store.write().unwrap().push(Node::Const { val });
        Expr {
            store: Arc::clone(&self.store),
            id,
        }
    }

    /// Creates multiple variables from a comma-separated string.
    ///
    /// Whitespace is trimmed, empty items are skipped.
    ///
    /// # Examples
    /// ```
    /// use RustedAutoDiff::expression::graph_engine::ExprGraph;
    /// let g = ExprGraph::new();
    /// let vars = g.Symbols("x, y, z");
    /// assert_eq!(vars.len(), 3);
    /// ```
    pub fn Symbols(&self, symbols: &str) -> Vec<Expr> {
        symbols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| self.var(s))
            .collect()
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.store.read().unwrap().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A handle to one node of an [`ExprGraph`].
///
/// Cloning a handle is cheap and does not copy the node; a cloned handle refers to
/// the same node, which is what makes shared subexpressions (`s.clone() + s.clone()`)
/// a DAG rather than a duplicated tree. Equality of handles is node identity, not
/// structural equality.
#[derive(Clone)]
pub struct Expr {
    pub(crate) store: Arc<RwLock<GraphStore>>,
    pub(crate) id: NodeId,
}

/// Right-hand side of a composition before normalization: either an existing node
/// handle or a raw literal about to be coerced into a `Const` node.
pub enum Operand {
    Expression(Expr),
    Literal(f64),
}

impl From<Expr> for Operand {
    fn from(e: Expr) -> Self {
        Operand::Expression(e)
    }
}

impl From<&Expr> for Operand {
    fn from(e: &Expr) -> Self {
        Operand::Expression(e.clone())
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Literal(v)
    }
}

impl Expr {
    /// The stable arena handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The `needs_grad` flag recorded at construction.
    ///
    /// Informational only: evaluation and differentiation do not consult it to skip
    /// work in the current design.
    pub fn needs_grad(&self) -> bool {
        self.store.read().unwrap().needs_grad(self.id)
    }

    /// The graph this handle belongs to.
    pub fn graph(&self) -> ExprGraph {
        ExprGraph {
            store: Arc::clone(&self.store),
        }
    }

    fn push_into_own_store(&self, node: Node) -> Expr {
        let id = self.store.write().unwrap().push(node);
        Expr {
            store: Arc::clone(&self.store),
            id,
        }
    }

    /// The single normalization step: a literal becomes a `Const` node in this
    /// handle's arena, an expression is checked to belong to the same arena.
    ///
    /// # Panics
    /// Panics if the other expression was built on a different graph.
    fn normalize(&self, operand: Operand) -> Expr {
        match operand {
            Operand::Expression(e) => {
                assert!(
                    Arc::ptr_eq(&self.store, &e.store),
                    "operands belong to different expression graphs"
                );
                e
            }
            Operand::Literal(v) => self.push_into_own_store(Node::Const { val: v }),
        }
    }

    /// Composes a binary operation node. `needs_grad` of the new node is the logical
    /// AND of both children's flags. Construction never evaluates; the only side
    /// effect is arena allocation.
    pub fn binop(&self, kind: BinopKind, rhs: impl Into<Operand>) -> Expr {
        let rhs = self.normalize(rhs.into());
        let needs_grad = {
            let store = self.store.read().unwrap();
            store.needs_grad(self.id) && store.needs_grad(rhs.id)
        };
        self.push_into_own_store(Node::Binop {
            kind,
            lhs: self.id,
            rhs: rhs.id,
            needs_grad,
        })
    }

    /// Builder form of `self + rhs`.
    pub fn add(&self, rhs: impl Into<Operand>) -> Expr {
        self.binop(BinopKind::Add, rhs)
    }

    /// Builder form of `self - rhs`.
    pub fn sub(&self, rhs: impl Into<Operand>) -> Expr {
        self.binop(BinopKind::Sub, rhs)
    }

    /// Builder form of `self * rhs`.
    pub fn mul(&self, rhs: impl Into<Operand>) -> Expr {
        self.binop(BinopKind::Mul, rhs)
    }

    /// Builder form of `self / rhs`.
    pub fn div(&self, rhs: impl Into<Operand>) -> Expr {
        self.binop(BinopKind::Div, rhs)
    }

    fn unary(&self, fun: UnaryFun) -> Expr {
        let needs_grad = self.needs_grad();
        self.push_into_own_store(Node::Unary {
            fun,
            arg: self.id,
            needs_grad,
        })
    }

    /// Creates exponential function e^(self).
    pub fn exp(&self) -> Expr {
        self.unary(UnaryFun::Exp)
    }

    /// Creates natural logarithm ln(self).
    pub fn ln(&self) -> Expr {
        self.unary(UnaryFun::Ln)
    }

    /// Creates sine function sin(self).
    pub fn sin(&self) -> Expr {
        self.unary(UnaryFun::sin)
    }

    /// Creates cosine function cos(self).
    pub fn cos(&self) -> Expr {
        self.unary(UnaryFun::cos)
    }

    /// Extracts all unique variable names reachable from this node.
    ///
    /// Returns a sorted, deduplicated list.
    pub fn variable_names(&self) -> Vec<String> {
        let store = self.store.read().unwrap();
        let mut vars = Vec::new();
        collect_variables(&store, self.id, &mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        self.variable_names().iter().any(|v| v == var_name)
    }
}

fn collect_variables(store: &GraphStore, id: NodeId, vars: &mut Vec<String>) {
    match store.node(id) {
        Node::Var { name, .. } => vars.push(name.clone()),
        Node::Const { .. } => {}
        Node::Binop { lhs, rhs, .. } => {
            collect_variables(store, *lhs, vars);
            collect_variables(store, *rhs, vars);
        }
        Node::Unary { arg, .. } => collect_variables(store, *arg, vars),
    }
}

/// Handle equality is node identity: same arena, same id.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store) && self.id == other.id
    }
}

/// Display implementation for pretty printing expressions.
///
/// Renders infix mathematical notation with parentheses. A shared subexpression is
/// printed once per reference, so the textual form may be larger than the graph.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.store.read().unwrap().fmt_node(self.id, f)
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Expr[{}] {}", self.id.0, self)
    }
}

//___________________________________OPERATOR OVERLOADS____________________________________

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.binop(BinopKind::Add, rhs)
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.binop(BinopKind::Sub, rhs)
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.binop(BinopKind::Mul, rhs)
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        self.binop(BinopKind::Div, rhs)
    }
}

impl std::ops::Add<f64> for Expr {
    type Output = Expr;

    fn add(self, rhs: f64) -> Expr {
        self.binop(BinopKind::Add, rhs)
    }
}

impl std::ops::Sub<f64> for Expr {
    type Output = Expr;

    fn sub(self, rhs: f64) -> Expr {
        self.binop(BinopKind::Sub, rhs)
    }
}

impl std::ops::Mul<f64> for Expr {
    type Output = Expr;

    fn mul(self, rhs: f64) -> Expr {
        self.binop(BinopKind::Mul, rhs)
    }
}

impl std::ops::Div<f64> for Expr {
    type Output = Expr;

    fn div(self, rhs: f64) -> Expr {
        self.binop(BinopKind::Div, rhs)
    }
}

impl std::ops::Add<Expr> for f64 {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        let lhs = rhs.normalize(Operand::Literal(self));
        lhs.binop(BinopKind::Add, rhs)
    }
}

impl std::ops::Sub<Expr> for f64 {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        let lhs = rhs.normalize(Operand::Literal(self));
        lhs.binop(BinopKind::Sub, rhs)
    }
}

impl std::ops::Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        let lhs = rhs.normalize(Operand::Literal(self));
        lhs.binop(BinopKind::Mul, rhs)
    }
}

impl std::ops::Div<Expr> for f64 {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        let lhs = rhs.normalize(Operand::Literal(self));
        lhs.binop(BinopKind::Div, rhs)
    }
}

impl std::ops::AddAssign for Expr {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.binop(BinopKind::Add, rhs);
    }
}

impl std::ops::SubAssign for Expr {
    fn sub_assign(&mut self, rhs: Self) {
        *self = self.binop(BinopKind::Sub, rhs);
    }
}

impl std::ops::MulAssign for Expr {
    fn mul_assign(&mut self, rhs: Self) {
        *self = self.binop(BinopKind::Mul, rhs);
    }
}

impl std::ops::DivAssign for Expr {
    fn div_assign(&mut self, rhs: Self) {
        *self = self.binop(BinopKind::Div, rhs);
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        let minus_one = self.push_into_own_store(Node::Const { val: -1.0 });
        minus_one.binop(BinopKind::Mul, self)
    }
}

//___________________________________MACROS____________________________________

/// Macro to create variables on a graph from a comma-separated list
/// Usage: symbols!(g; x, y, z) -> creates variables x, y, z
#[macro_export]
macro_rules! symbols {
    ($graph:expr; $($var:ident),+ $(,)?) => {
        {
            let var_names = stringify!($($var),+);
            let vars = $graph.Symbols(var_names);
            let mut iter = vars.into_iter();
            ($(
                {
                    let $var = iter.next().unwrap();
                    $var
                }
            ),+)
        }
    };
}
