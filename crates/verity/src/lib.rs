//! Verity: an embedded reasoning engine for grounding agent decisions
//!
//! This library provides a Prolog-style logic engine, a finite-domain
//! constraint solver, and a plan validator/simulator with safety
//! invariants, behind one [`Engine`] facade.

pub mod config;
pub mod engine;
pub mod error;
pub mod logic;
pub mod planning;
pub mod solver;

pub use config::{EngineConfig, ResolutionConfig, SolveOptions};
pub use engine::{Engine, EngineBuilder, Outcome};
pub use error::{Result, VerityError};

// Re-export commonly used types from logic
pub use logic::{
    ConsultReport, Goal, KbStats, KnowledgeBase, ParseError, QueryOutcome, Solution, Term,
};

// Re-export solver types
pub use solver::{solve, Expr, Model, Problem, ProblemBuilder, SolveResult, SolveStatus, Value};

// Re-export planning types
pub use planning::{
    simulate_plan, validate_plan, Action, ActionRegistry, ActionSchema, ComparisonOp, Condition,
    Effect, InvariantChecker, InvariantResult, Plan, PlanError, PlanErrorKind, PlanState,
    PropertyKind, SafetyProperty, SimulationResult, ValidationResult,
};
