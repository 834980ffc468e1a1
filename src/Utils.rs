//! different utility modules used throughout the project
/// tiny module to save sampled function and derivative curves into file
pub mod logger;
/// tiny module to plot an expression and its derivative over a linspace
pub mod plots;
