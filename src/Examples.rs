//! examples of usage of RustedAutoDiff
/// Expression graph construction, evaluation and differentiation examples
pub mod graph_examples;
