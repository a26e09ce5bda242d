//! Action schemas, bound actions, plan states and plans
//!
//! Every type here (de)serializes in camelCase so that plans and schemas
//! written as JSON can be loaded directly.

use super::registry::ActionRegistry;
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Prefix marking a value as a reference to an action argument
pub const PLACEHOLDER_PREFIX: char = '?';

static NULL: Value = Value::Null;

fn default_type() -> String {
    "any".to_string()
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default = "default_type")]
    pub param_type: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl ComparisonOp {
    /// Apply the operator. Ordering operators compare numbers numerically
    /// and strings lexically; any other pairing is false.
    pub fn apply(&self, actual: &Value, expected: &Value) -> bool {
        match self {
            ComparisonOp::Eq => values_equal(actual, expected),
            ComparisonOp::Ne => !values_equal(actual, expected),
            ComparisonOp::Lt => ordering(actual, expected).is_some_and(|o| o.is_lt()),
            ComparisonOp::Le => ordering(actual, expected).is_some_and(|o| o.is_le()),
            ComparisonOp::Gt => ordering(actual, expected).is_some_and(|o| o.is_gt()),
            ComparisonOp::Ge => ordering(actual, expected).is_some_and(|o| o.is_ge()),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }
}

/// JSON equality, treating `1` and `1.0` as the same number
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn ordering(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Parameter named by a `?param` placeholder
pub fn placeholder(value: &Value) -> Option<&str> {
    value.as_str()?.strip_prefix(PLACEHOLDER_PREFIX)
}

/// Replace a `?param` placeholder by the bound argument; a placeholder with
/// no binding yields the parameter name as the error
pub fn resolve_value(value: &Value, arguments: &IndexMap<String, Value>) -> std::result::Result<Value, String> {
    match placeholder(value) {
        Some(param) => arguments.get(param).cloned().ok_or_else(|| param.to_string()),
        None => Ok(value.clone()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    /// Equality between a state variable and a value
    Simple { variable: String, value: Value },
    Comparison {
        variable: String,
        operator: ComparisonOp,
        value: Value,
    },
}

impl Condition {
    pub fn simple(variable: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Simple {
            variable: variable.into(),
            value: value.into(),
        }
    }

    pub fn comparison(variable: impl Into<String>, operator: ComparisonOp, value: impl Into<Value>) -> Self {
        Condition::Comparison {
            variable: variable.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn variable(&self) -> &str {
        match self {
            Condition::Simple { variable, .. } | Condition::Comparison { variable, .. } => variable,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Condition::Simple { value, .. } | Condition::Comparison { value, .. } => value,
        }
    }

    pub fn operator(&self) -> ComparisonOp {
        match self {
            Condition::Simple { .. } => ComparisonOp::Eq,
            Condition::Comparison { operator, .. } => *operator,
        }
    }

    /// Copy of the condition with its `?param` placeholder resolved
    pub fn resolve(&self, arguments: &IndexMap<String, Value>) -> std::result::Result<Condition, String> {
        let value = resolve_value(self.value(), arguments)?;
        Ok(match self {
            Condition::Simple { variable, .. } => Condition::Simple {
                variable: variable.clone(),
                value,
            },
            Condition::Comparison { variable, operator, .. } => Condition::Comparison {
                variable: variable.clone(),
                operator: *operator,
                value,
            },
        })
    }

    /// Whether the condition holds; an absent variable reads as `null`
    pub fn holds(&self, state: &PlanState) -> bool {
        self.operator().apply(state.get(self.variable()), self.value())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.variable(), self.operator().symbol(), self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Effect {
    Assign { variable: String, value: Value },
}

impl Effect {
    pub fn assign(variable: impl Into<String>, value: impl Into<Value>) -> Self {
        Effect::Assign {
            variable: variable.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Effect::Assign { variable, value } => write!(f, "{} := {}", variable, value),
        }
    }
}

/// Template for an action: typed parameters, preconditions and effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub preconditions: Vec<Condition>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub cost: f64,
}

impl ActionSchema {
    pub fn new(name: impl Into<String>) -> Self {
        ActionSchema {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            preconditions: Vec::new(),
            effects: Vec::new(),
            cost: 0.0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a required parameter
    pub fn parameter(mut self, name: impl Into<String>, param_type: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            param_type: param_type.into(),
            required: true,
        });
        self
    }

    pub fn optional_parameter(mut self, name: impl Into<String>, param_type: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            param_type: param_type.into(),
            required: false,
        });
        self
    }

    pub fn precondition(mut self, condition: Condition) -> Self {
        self.preconditions.push(condition);
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Required parameters with no binding in `arguments`
    pub fn missing_arguments<'a>(&'a self, arguments: &'a IndexMap<String, Value>) -> impl Iterator<Item = &'a str> + 'a {
        self.parameters
            .iter()
            .filter(move |p| p.required && !arguments.contains_key(&p.name))
            .map(|p| p.name.as_str())
    }
}

/// A schema instance with bound arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(alias = "schema", alias = "name")]
    pub schema_name: String,
    #[serde(default)]
    pub arguments: IndexMap<String, Value>,
}

impl Action {
    pub fn new<I, K, V>(schema_name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Action {
            schema_name: schema_name.into(),
            arguments: arguments.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// An action with no arguments
    pub fn named(schema_name: impl Into<String>) -> Self {
        Action {
            schema_name: schema_name.into(),
            arguments: IndexMap::new(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.schema_name)?;
        for (i, (name, value)) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

/// A snapshot of the world: variable name to JSON value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanState {
    pub id: String,
    #[serde(default)]
    pub variables: IndexMap<String, Value>,
}

impl PlanState {
    pub fn new(id: impl Into<String>) -> Self {
        PlanState {
            id: id.into(),
            variables: IndexMap::new(),
        }
    }

    pub fn with(mut self, variable: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(variable, value);
        self
    }

    /// Value of a variable, `null` when absent
    pub fn get(&self, variable: &str) -> &Value {
        self.variables.get(variable).unwrap_or(&NULL)
    }

    pub fn set(&mut self, variable: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(variable.into(), value.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub initial_state: PlanState,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub goal_conditions: Vec<Condition>,
}

impl Plan {
    pub fn new(id: impl Into<String>, initial_state: PlanState) -> Self {
        Plan {
            id: id.into(),
            initial_state,
            actions: Vec::new(),
            goal_conditions: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn goal(mut self, condition: Condition) -> Self {
        self.goal_conditions.push(condition);
        self
    }

    /// Summed cost of the plan's actions; unknown schemas cost nothing
    pub fn total_cost(&self, registry: &ActionRegistry) -> f64 {
        self.actions
            .iter()
            .filter_map(|a| registry.get(&a.schema_name))
            .map(|s| s.cost)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_from_json() {
        let schema = ActionSchema::from_json(
            r#"{
                "name": "move",
                "parameters": [{"name": "to", "type": "room"}],
                "preconditions": [
                    {"type": "simple", "variable": "door_open", "value": true},
                    {"type": "comparison", "variable": "battery", "operator": ">=", "value": 10}
                ],
                "effects": [{"type": "assign", "variable": "location", "value": "?to"}],
                "cost": 2.5
            }"#,
        )
        .unwrap();
        assert_eq!(schema.parameters[0].param_type, "room");
        assert!(schema.parameters[0].required);
        assert_eq!(schema.preconditions[1].operator(), ComparisonOp::Ge);
        assert_eq!(schema.effects[0], Effect::assign("location", "?to"));
        assert_eq!(schema.cost, 2.5);
        assert!(schema.description.is_empty());
    }

    #[test]
    fn test_comparisons() {
        assert!(ComparisonOp::Eq.apply(&json!(1), &json!(1.0)));
        assert!(ComparisonOp::Lt.apply(&json!(3), &json!(7.5)));
        assert!(ComparisonOp::Ge.apply(&json!("b"), &json!("a")));
        assert!(!ComparisonOp::Lt.apply(&json!(null), &json!(1)));
        assert!(!ComparisonOp::Gt.apply(&json!("10"), &json!(2)));
        assert!(ComparisonOp::Ne.apply(&json!("on"), &json!(true)));
    }

    #[test]
    fn test_condition_on_absent_variable_reads_null() {
        let state = PlanState::new("s0").with("a", 1);
        assert!(Condition::simple("b", Value::Null).holds(&state));
        assert!(!Condition::simple("b", 1).holds(&state));
        assert!(Condition::comparison("a", ComparisonOp::Le, 1).holds(&state));
    }

    #[test]
    fn test_placeholder_resolution() {
        let args: IndexMap<String, Value> = [("to".to_string(), json!("kitchen"))].into_iter().collect();
        let c = Condition::simple("location", "?to").resolve(&args).unwrap();
        assert_eq!(c, Condition::simple("location", "kitchen"));
        assert_eq!(Condition::simple("x", "?from").resolve(&args), Err("from".to_string()));
        assert_eq!(resolve_value(&json!("plain"), &args), Ok(json!("plain")));
    }

    #[test]
    fn test_plan_from_json_camel_case() {
        let plan = Plan::from_json(
            r#"{
                "id": "p1",
                "initialState": {"id": "s0", "variables": {"location": "hall", "holding": null}},
                "actions": [{"schemaName": "move", "arguments": {"to": "kitchen"}}],
                "goalConditions": [{"type": "simple", "variable": "location", "value": "kitchen"}]
            }"#,
        )
        .unwrap();
        assert_eq!(plan.initial_state.get("holding"), &Value::Null);
        assert_eq!(plan.actions[0].to_string(), "move(to=\"kitchen\")");
        assert_eq!(plan.goal_conditions[0].to_string(), "location == \"kitchen\"");
    }
}
