//! Engine facade: one entry point over the logic engine, the constraint
//! solver and the planner.
//!
//! Every fallible call returns an [`Outcome`] instead of an error, so a
//! caller can branch on `success` and still inspect the payload of a
//! failed call (the violations of an invalid plan, the status of an
//! unsatisfiable problem).
//!
//! ```
//! use verity::{Engine, EngineConfig};
//!
//! let mut engine = Engine::builder(EngineConfig::default())
//!     .program("parent(tom, bob). parent(bob, ann).")
//!     .build()
//!     .unwrap();
//!
//! let outcome = engine.query_logic("parent(tom, X)");
//! assert!(outcome.success);
//! assert!(engine.prove_logic("parent(bob, ann)").data.unwrap());
//! # engine.load_logic_program("male(tom).");
//! ```

use crate::config::{EngineConfig, SolveOptions};
use crate::error::{Result, VerityError};
use crate::logic::{ConsultReport, KbStats, KnowledgeBase, QueryOutcome, Term};
use crate::planning::{
    simulate_plan, validate_plan, Action, ActionRegistry, ActionSchema, InvariantChecker, InvariantResult, Plan,
    SafetyProperty, SimulationResult, ValidationResult,
};
use crate::solver::{solve, Problem, ProblemBuilder, SolveResult, SolveStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Uniform result of a facade call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Outcome {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A domain failure that still carries its result
    pub fn failed(data: T, error: impl Into<String>) -> Self {
        Outcome {
            success: false,
            data: Some(data),
            error: Some(error.into()),
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Outcome {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.error.unwrap_or_else(|| "no result".to_string())),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Outcome::ok(data),
            Err(e) => Outcome::err(e.to_string()),
        }
    }
}

/// Session-scoped reasoning engine.
///
/// The knowledge base, the action registry and the safety properties
/// accumulate across calls; everything else is recomputed per call.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    knowledge_base: KnowledgeBase,
    registry: ActionRegistry,
    invariants: InvariantChecker,
}

impl Engine {
    /// Create a builder for constructing an engine
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            programs: Vec::new(),
            actions: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn new() -> Self {
        Engine::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    // Logic

    /// Consult program text. Valid clauses are kept even when others fail
    /// to parse; `success` is false if any statement was rejected.
    pub fn load_logic_program(&mut self, text: &str) -> Outcome<ConsultReport> {
        let report = self.knowledge_base.consult(text);
        if report.success() {
            Outcome::ok(report)
        } else {
            let message = report
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            Outcome::failed(report, message)
        }
    }

    pub fn assert_fact(&mut self, predicate: &str, args: Vec<Term>) -> Outcome<()> {
        self.knowledge_base.assert_fact(predicate, args).into()
    }

    /// Enumerate the solutions of a query; `success` is true when there is
    /// at least one
    pub fn query_logic(&self, query: &str) -> Outcome<QueryOutcome> {
        match self.knowledge_base.query(query) {
            Ok(outcome) if outcome.success() => Outcome::ok(outcome),
            Ok(outcome) if outcome.exhausted => Outcome::failed(outcome, "search bound reached with no solution"),
            Ok(outcome) => Outcome::failed(outcome, "no solution"),
            Err(e) => Outcome::err(e.to_string()),
        }
    }

    /// Whether a query has a solution; `data` holds the answer and `success`
    /// only reports that the query was well formed
    pub fn prove_logic(&self, query: &str) -> Outcome<bool> {
        self.knowledge_base.prove(query).into()
    }

    pub fn stats(&self) -> KbStats {
        self.knowledge_base.stats()
    }

    // Constraints

    pub fn create_constraint_problem(&self, name: &str) -> ProblemBuilder {
        ProblemBuilder::new(name)
    }

    /// Solve with `options`, or the configured budgets when `None`.
    /// `success` is true only for `sat`.
    pub fn solve(&self, problem: &Problem, options: Option<SolveOptions>) -> Outcome<SolveResult> {
        let result = solve(problem, options.unwrap_or(self.config.solver));
        match result.status {
            SolveStatus::Sat => Outcome::ok(result),
            SolveStatus::Unsat => {
                let message = match &result.refuted {
                    Some(label) => format!("unsatisfiable: '{}' cannot hold", label),
                    None => "unsatisfiable".to_string(),
                };
                Outcome::failed(result, message)
            }
            SolveStatus::Timeout => Outcome::failed(result, "search budget exhausted before a result"),
        }
    }

    // Planning

    pub fn register_action(&mut self, schema: ActionSchema) -> Outcome<()> {
        self.registry.register(schema).into()
    }

    /// Register a schema given as JSON
    pub fn register_action_json(&mut self, json: &str) -> Outcome<()> {
        ActionSchema::from_json(json)
            .and_then(|schema| self.registry.register(schema))
            .into()
    }

    pub fn create_action(&self, schema_name: &str, arguments: Vec<(String, Value)>) -> Outcome<Action> {
        self.registry.create_action(schema_name, arguments).into()
    }

    /// `success` is true when the plan is valid
    pub fn validate_plan(&self, plan: &Plan) -> Outcome<ValidationResult> {
        let result = validate_plan(plan, &self.registry);
        if result.valid {
            Outcome::ok(result)
        } else {
            let message = format!("plan '{}' has {} error(s)", plan.id, result.errors.len());
            Outcome::failed(result, message)
        }
    }

    /// `success` is true when every action applied and the goals hold
    pub fn simulate_plan(&self, plan: &Plan) -> Outcome<SimulationResult> {
        let result = simulate_plan(plan, &self.registry);
        if result.success {
            Outcome::ok(result)
        } else {
            let message = format!("plan '{}' did not reach its goal", plan.id);
            Outcome::failed(result, message)
        }
    }

    pub fn add_safety_property(&mut self, property: SafetyProperty) -> Outcome<()> {
        self.invariants.add_property(property).into()
    }

    /// `success` is true when no property is violated
    pub fn check_invariants(&self, plan: &Plan) -> Outcome<Vec<InvariantResult>> {
        let results = self.invariants.check(plan, &self.registry);
        let violated = results.iter().filter(|r| !r.satisfied).count();
        debug!(plan = %plan.id, properties = results.len(), violated, "checked invariants");
        if violated == 0 {
            Outcome::ok(results)
        } else {
            Outcome::failed(results, format!("{} safety property violation(s)", violated))
        }
    }
}

/// Builder for [`Engine`]
pub struct EngineBuilder {
    config: EngineConfig,
    programs: Vec<String>,
    actions: Vec<ActionSchema>,
    properties: Vec<SafetyProperty>,
}

impl EngineBuilder {
    /// Consult program text when the engine is built
    pub fn program(mut self, text: impl Into<String>) -> Self {
        self.programs.push(text.into());
        self
    }

    pub fn action(mut self, schema: ActionSchema) -> Self {
        self.actions.push(schema);
        self
    }

    pub fn safety_property(mut self, property: SafetyProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.resolution.max_depth = max_depth;
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.config.resolution.max_steps = max_steps;
        self
    }

    pub fn solve_options(mut self, options: SolveOptions) -> Self {
        self.config.solver = options;
        self
    }

    /// Build the engine. Program text must parse cleanly and action and
    /// property names must be unique.
    pub fn build(self) -> Result<Engine> {
        let mut engine = Engine {
            config: self.config.clone(),
            knowledge_base: KnowledgeBase::with_config(self.config.resolution),
            registry: ActionRegistry::new(),
            invariants: InvariantChecker::new(),
        };
        for text in &self.programs {
            let report = engine.knowledge_base.consult(text);
            if let Some(error) = report.errors.into_iter().next() {
                return Err(VerityError::Parse(error));
            }
        }
        for schema in self.actions {
            engine.registry.register(schema)?;
        }
        for property in self.properties {
            engine.invariants.add_property(property)?;
        }
        Ok(engine)
    }
}
