//! Finite-domain constraint solver
//!
//! Problems are declared through [`ProblemBuilder`] and solved by a bounded
//! backtracking search with forward checking.

pub mod expr;
pub mod problem;
pub mod search;


pub use expr::{Expr, Value, ValueKind};
pub use problem::{Assertion, Domain, Model, Problem, ProblemBuilder, Variable};
pub use search::{solve, SolveResult, SolveStats, SolveStatus};
