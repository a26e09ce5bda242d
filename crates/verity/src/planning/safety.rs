//! Safety invariants over a replayed trajectory

use super::action::{Condition, Plan};
use super::registry::ActionRegistry;
use super::simulation::replay;
use crate::error::{Result, VerityError};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// The condition must hold in every state
    Always,
    /// The condition must hold in no state
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyProperty {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub condition: Condition,
}

impl SafetyProperty {
    pub fn always(id: impl Into<String>, name: impl Into<String>, condition: Condition) -> Self {
        SafetyProperty {
            id: id.into(),
            name: name.into(),
            kind: PropertyKind::Always,
            condition,
        }
    }

    pub fn never(id: impl Into<String>, name: impl Into<String>, condition: Condition) -> Self {
        SafetyProperty {
            id: id.into(),
            name: name.into(),
            kind: PropertyKind::Never,
            condition,
        }
    }

    fn violated_by(&self, holds: bool) -> bool {
        match self.kind {
            PropertyKind::Always => !holds,
            PropertyKind::Never => holds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvariantResult {
    pub property_id: String,
    pub property_name: String,
    pub satisfied: bool,
    /// First offending state: 0 is the initial state, `i + 1` the state
    /// after action `i`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violating_state_index: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct InvariantChecker {
    properties: Vec<SafetyProperty>,
}

impl InvariantChecker {
    pub fn new() -> Self {
        InvariantChecker::default()
    }

    /// Register a property; ids must be unique
    pub fn add_property(&mut self, property: SafetyProperty) -> Result<()> {
        if self.properties.iter().any(|p| p.id == property.id) {
            return Err(VerityError::InvalidInput(format!(
                "safety property '{}' is already registered",
                property.id
            )));
        }
        self.properties.push(property);
        Ok(())
    }

    pub fn properties(&self) -> &[SafetyProperty] {
        &self.properties
    }

    /// Replay `plan` and evaluate every property on every state, the initial
    /// state included. Results follow registration order.
    pub fn check(&self, plan: &Plan, registry: &ActionRegistry) -> Vec<InvariantResult> {
        let states = replay(plan, registry).states;
        self.properties
            .iter()
            .map(|property| {
                let violating_state_index = states
                    .iter()
                    .position(|state| property.violated_by(property.condition.holds(state)));
                if let Some(index) = violating_state_index {
                    warn!(plan = %plan.id, property = %property.id, state = index, "safety property violated");
                }
                InvariantResult {
                    property_id: property.id.clone(),
                    property_name: property.name.clone(),
                    satisfied: violating_state_index.is_none(),
                    violating_state_index,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::action::{Action, ActionSchema, ComparisonOp, Effect, PlanState};

    fn registry() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry
            .register(
                ActionSchema::new("heat")
                    .parameter("to", "number")
                    .effect(Effect::assign("temperature", "?to")),
            )
            .unwrap();
        registry
    }

    fn plan(steps: &[i64]) -> Plan {
        let mut plan = Plan::new("heating", PlanState::new("s0").with("temperature", 20));
        for &t in steps {
            plan = plan.action(Action::new("heat", [("to", t)]));
        }
        plan
    }

    #[test]
    fn test_never_reports_first_offending_state() {
        let mut checker = InvariantChecker::new();
        checker
            .add_property(SafetyProperty::never(
                "overheat",
                "no overheating",
                Condition::comparison("temperature", ComparisonOp::Gt, 90),
            ))
            .unwrap();

        let results = checker.check(&plan(&[50, 95, 40, 99]), &registry());
        assert_eq!(results.len(), 1);
        assert!(!results[0].satisfied);
        assert_eq!(results[0].property_name, "no overheating");
        assert_eq!(results[0].violating_state_index, Some(2));

        let results = checker.check(&plan(&[50, 60]), &registry());
        assert!(results[0].satisfied);
        assert_eq!(results[0].violating_state_index, None);
    }

    #[test]
    fn test_always_checks_initial_state() {
        let mut checker = InvariantChecker::new();
        checker
            .add_property(SafetyProperty::always(
                "warm",
                "stays warm",
                Condition::comparison("temperature", ComparisonOp::Ge, 25),
            ))
            .unwrap();
        let results = checker.check(&plan(&[30]), &registry());
        assert_eq!(results[0].violating_state_index, Some(0));
    }

    #[test]
    fn test_duplicate_property_id_rejected() {
        let mut checker = InvariantChecker::new();
        let p = SafetyProperty::never("p", "p", Condition::simple("x", 1));
        checker.add_property(p.clone()).unwrap();
        assert!(checker.add_property(p).is_err());
        assert_eq!(checker.properties().len(), 1);
    }

    #[test]
    fn test_property_from_json() {
        let p: SafetyProperty = serde_json::from_str(
            r#"{"id": "s1", "name": "door shut", "type": "always",
                "condition": {"type": "simple", "variable": "door", "value": "closed"}}"#,
        )
        .unwrap();
        assert_eq!(p.kind, PropertyKind::Always);
    }
}
