//! Action planning: schemas, registry, simulation, validation and safety
//! invariants

pub mod action;
pub mod registry;
pub mod safety;
pub mod simulation;

pub use action::{Action, ActionSchema, ComparisonOp, Condition, Effect, Parameter, Plan, PlanState};
pub use registry::ActionRegistry;
pub use safety::{InvariantChecker, InvariantResult, PropertyKind, SafetyProperty};
pub use simulation::{
    simulate_plan, validate_plan, PlanError, PlanErrorKind, SimulationResult, TraceStep, ValidationResult,
};
