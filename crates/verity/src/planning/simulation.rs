//! Deterministic plan replay, simulation and validation
//!
//! Replay starts from the plan's initial state and visits the actions in
//! order. An action applies only when its schema exists, its required
//! arguments are bound and every precondition holds in the running state.
//! A failing action leaves the running state untouched, so one violation
//! does not cascade into the actions after it.

use super::action::{resolve_value, Condition, Effect, Plan, PlanState};
use super::registry::ActionRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanErrorKind {
    UnknownAction,
    MissingArgument,
    PreconditionViolated,
    GoalNotSatisfied,
}

impl fmt::Display for PlanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PlanErrorKind::UnknownAction => "unknown_action",
            PlanErrorKind::MissingArgument => "missing_argument",
            PlanErrorKind::PreconditionViolated => "precondition_violated",
            PlanErrorKind::GoalNotSatisfied => "goal_not_satisfied",
        };
        write!(f, "{}", name)
    }
}

/// One problem found while replaying a plan.
///
/// `action_index` is the 0-based position of the offending action; goal
/// failures use the number of actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanError {
    #[serde(rename = "type")]
    pub kind: PlanErrorKind,
    pub action_index: usize,
    pub detail: String,
}

impl PlanError {
    fn new(kind: PlanErrorKind, action_index: usize, detail: impl Into<String>) -> Self {
        PlanError {
            kind,
            action_index,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at action {}: {}", self.kind, self.action_index, self.detail)
    }
}

/// What happened to one action during replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    pub action_index: usize,
    pub schema_name: String,
    pub applied: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<PlanError>,
    /// Running state after the action
    pub state: PlanState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Every action applied and every goal condition holds at the end
    pub success: bool,
    pub final_state: PlanState,
    pub trace: Vec<TraceStep>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub unmet_goals: Vec<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<PlanError>,
}

impl ValidationResult {
    pub fn errors_of(&self, kind: PlanErrorKind) -> impl Iterator<Item = &PlanError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

/// The full trajectory of a replay
#[derive(Debug, Clone)]
pub(crate) struct Replay {
    /// `states[0]` is the initial state, `states[i + 1]` follows action `i`
    pub states: Vec<PlanState>,
    pub steps: Vec<TraceStep>,
}

pub(crate) fn replay(plan: &Plan, registry: &ActionRegistry) -> Replay {
    let mut current = plan.initial_state.clone();
    let mut states = Vec::with_capacity(plan.actions.len() + 1);
    let mut steps = Vec::with_capacity(plan.actions.len());
    states.push(current.clone());

    for (index, action) in plan.actions.iter().enumerate() {
        let failures = match registry.get(&action.schema_name) {
            None => vec![PlanError::new(
                PlanErrorKind::UnknownAction,
                index,
                format!("no action schema named '{}'", action.schema_name),
            )],
            Some(schema) => {
                let mut failures = Vec::new();
                let mut missing = Vec::new();
                for param in schema.missing_arguments(&action.arguments) {
                    push_missing(&mut failures, &mut missing, index, &schema.name, param.to_string());
                }

                for precondition in &schema.preconditions {
                    match precondition.resolve(&action.arguments) {
                        Ok(condition) if condition.holds(&current) => {}
                        Ok(condition) => failures.push(PlanError::new(
                            PlanErrorKind::PreconditionViolated,
                            index,
                            format!(
                                "'{}' requires {} but {} is {}",
                                schema.name,
                                condition,
                                condition.variable(),
                                current.get(condition.variable())
                            ),
                        )),
                        Err(param) => push_missing(&mut failures, &mut missing, index, &schema.name, param),
                    }
                }

                if failures.is_empty() {
                    let mut next = current.clone();
                    for effect in &schema.effects {
                        match effect {
                            Effect::Assign { variable, value } => {
                                match resolve_value(value, &action.arguments) {
                                    Ok(value) => next.set(variable.clone(), value),
                                    Err(param) => push_missing(&mut failures, &mut missing, index, &schema.name, param),
                                }
                            }
                        }
                    }
                    if failures.is_empty() {
                        next.id = format!("{}/{}", plan.initial_state.id, index + 1);
                        current = next;
                    }
                }
                failures
            }
        };

        let applied = failures.is_empty();
        if !applied {
            debug!(plan = %plan.id, action = index, failures = failures.len(), "action not applied");
        }
        steps.push(TraceStep {
            action_index: index,
            schema_name: action.schema_name.clone(),
            applied,
            failures,
            state: current.clone(),
        });
        states.push(current.clone());
    }

    Replay { states, steps }
}

/// Record a missing argument once per parameter
fn push_missing(
    failures: &mut Vec<PlanError>,
    missing: &mut Vec<String>,
    index: usize,
    schema: &str,
    param: String,
) {
    if missing.contains(&param) {
        return;
    }
    failures.push(PlanError::new(
        PlanErrorKind::MissingArgument,
        index,
        format!("'{}' requires argument '{}'", schema, param),
    ));
    missing.push(param);
}

impl Replay {
    pub fn final_state(&self) -> &PlanState {
        // states always holds the initial state
        &self.states[self.states.len() - 1]
    }

    pub fn unmet_goals(&self, plan: &Plan) -> Vec<Condition> {
        let last = self.final_state();
        plan.goal_conditions
            .iter()
            .filter(|c| !c.holds(last))
            .cloned()
            .collect()
    }
}

/// Replay a plan and report the trajectory
pub fn simulate_plan(plan: &Plan, registry: &ActionRegistry) -> SimulationResult {
    let replay = replay(plan, registry);
    let unmet_goals = replay.unmet_goals(plan);
    let success = unmet_goals.is_empty() && replay.steps.iter().all(|s| s.applied);
    debug!(plan = %plan.id, success, "simulated plan");

    SimulationResult {
        success,
        final_state: replay.final_state().clone(),
        trace: replay.steps,
        unmet_goals,
    }
}

/// Replay a plan and collect every error in one pass
pub fn validate_plan(plan: &Plan, registry: &ActionRegistry) -> ValidationResult {
    let replay = replay(plan, registry);
    let last = replay.final_state();
    let goal_errors: Vec<PlanError> = replay
        .unmet_goals(plan)
        .iter()
        .map(|goal| {
            PlanError::new(
                PlanErrorKind::GoalNotSatisfied,
                plan.actions.len(),
                format!("goal {} not met, {} is {}", goal, goal.variable(), last.get(goal.variable())),
            )
        })
        .collect();

    let mut errors: Vec<PlanError> = replay.steps.into_iter().flat_map(|s| s.failures).collect();
    errors.extend(goal_errors);

    if !errors.is_empty() {
        warn!(plan = %plan.id, errors = errors.len(), "plan failed validation");
    }
    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::action::{Action, ActionSchema, ComparisonOp};

    fn registry() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry
            .register(
                ActionSchema::new("unlock")
                    .precondition(Condition::simple("has_key", true))
                    .effect(Effect::assign("locked", false)),
            )
            .unwrap();
        registry
            .register(
                ActionSchema::new("open")
                    .precondition(Condition::simple("locked", false))
                    .effect(Effect::assign("door", "open")),
            )
            .unwrap();
        registry
            .register(
                ActionSchema::new("go")
                    .parameter("to", "room")
                    .precondition(Condition::simple("door", "open"))
                    .precondition(Condition::comparison("location", ComparisonOp::Ne, "?to"))
                    .effect(Effect::assign("location", "?to")),
            )
            .unwrap();
        registry
    }

    fn start() -> PlanState {
        PlanState::new("s0")
            .with("has_key", true)
            .with("locked", true)
            .with("door", "closed")
            .with("location", "hall")
    }

    #[test]
    fn test_valid_plan_reaches_goal() {
        let plan = Plan::new("p", start())
            .action(Action::named("unlock"))
            .action(Action::named("open"))
            .action(Action::new("go", [("to", "garden")]))
            .goal(Condition::simple("location", "garden"));

        let result = simulate_plan(&plan, &registry());
        assert!(result.success);
        assert_eq!(result.final_state.get("location"), &serde_json::json!("garden"));
        assert_eq!(result.final_state.id, "s0/3");
        assert!(plan.goal_conditions.iter().all(|c| c.holds(&result.final_state)));
        assert!(validate_plan(&plan, &registry()).valid);
    }

    #[test]
    fn test_failed_action_does_not_apply_effects() {
        let plan = Plan::new("p", start())
            .action(Action::named("open"))
            .action(Action::named("unlock"))
            .action(Action::named("open"));

        let result = simulate_plan(&plan, &registry());
        assert!(!result.success);
        assert!(!result.trace[0].applied);
        assert_eq!(result.trace[0].state.get("door"), &serde_json::json!("closed"));
        assert!(result.trace[2].applied);
        assert_eq!(result.final_state.get("door"), &serde_json::json!("open"));
    }

    #[test]
    fn test_validation_collects_every_error() {
        let plan = Plan::new("p", start().with("has_key", false))
            .action(Action::named("unlock"))
            .action(Action::named("teleport"))
            .action(Action::named("go"))
            .goal(Condition::simple("door", "open"));

        let result = validate_plan(&plan, &registry());
        assert!(!result.valid);
        let kinds: Vec<_> = result.errors.iter().map(|e| (e.kind, e.action_index)).collect();
        assert_eq!(
            kinds,
            vec![
                (PlanErrorKind::PreconditionViolated, 0),
                (PlanErrorKind::UnknownAction, 1),
                (PlanErrorKind::MissingArgument, 2),
                (PlanErrorKind::PreconditionViolated, 2),
                (PlanErrorKind::GoalNotSatisfied, 3),
            ]
        );
    }

    #[test]
    fn test_missing_arguments_reported_once_each() {
        let mut registry = ActionRegistry::new();
        registry
            .register(
                ActionSchema::new("swap")
                    .parameter("a'b", "slot")
                    .precondition(Condition::simple("left", "?a'b"))
                    .precondition(Condition::simple("right", "?b"))
                    .precondition(Condition::comparison("left", ComparisonOp::Ne, "?b"))
                    .effect(Effect::assign("left", "?b")),
            )
            .unwrap();
        let plan = Plan::new("p", start()).action(Action::named("swap"));

        let result = validate_plan(&plan, &registry);
        let details: Vec<_> = result
            .errors_of(PlanErrorKind::MissingArgument)
            .map(|e| e.detail.as_str())
            .collect();
        assert_eq!(
            details,
            vec![
                "'swap' requires argument 'a'b'",
                "'swap' requires argument 'b'",
            ]
        );
    }

    #[test]
    fn test_error_serializes_with_type_tag() {
        let error = PlanError::new(PlanErrorKind::PreconditionViolated, 2, "x");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "precondition_violated", "actionIndex": 2, "detail": "x"})
        );
    }
}
