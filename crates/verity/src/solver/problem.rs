//! Constraint problems and their builder

use super::expr::{Expr, Value, ValueKind};
use crate::error::{Result, VerityError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Domain of a declared variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Domain {
    Bool,
    Int { min: i64, max: i64 },
}

impl Domain {
    pub fn kind(&self) -> ValueKind {
        match self {
            Domain::Bool => ValueKind::Bool,
            Domain::Int { .. } => ValueKind::Int,
        }
    }

    /// Number of values, saturating for very wide integer ranges
    pub fn size(&self) -> u64 {
        match self {
            Domain::Bool => 2,
            Domain::Int { min, max } if max < min => 0,
            Domain::Int { min, max } => (*max as i128 - *min as i128 + 1).min(u64::MAX as i128) as u64,
        }
    }

    /// Values in ascending order (`false` before `true`)
    pub fn values(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        match *self {
            Domain::Bool => Box::new([false, true].into_iter().map(Value::Bool)),
            Domain::Int { min, max } => Box::new((min..=max).map(Value::Int)),
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Domain::Bool, Value::Bool(_)) => true,
            (Domain::Int { min, max }, Value::Int(n)) => min <= n && n <= max,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub domain: Domain,
}

/// A labelled constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub expr: Expr,
    pub label: String,
}

/// An immutable, type-checked constraint problem
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub name: String,
    variables: Vec<Variable>,
    assertions: Vec<Assertion>,
    #[serde(skip)]
    index: IndexMap<String, usize>,
}

impl Problem {
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    /// Declaration position of a variable
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Labels of the assertions a model violates; an assertion over a
    /// variable missing from the model counts as violated
    pub fn check(&self, model: &Model) -> Vec<String> {
        let lookup = |name: &str| model.get(name);
        self.assertions
            .iter()
            .filter(|a| a.expr.eval(&lookup) != Some(Value::Bool(true)))
            .map(|a| a.label.clone())
            .collect()
    }
}

/// A satisfying assignment, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model {
    pub values: IndexMap<String, Value>,
}

impl Model {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).copied()
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.as_int())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.as_bool())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builder for [`Problem`].
///
/// ```
/// use verity::solver::ProblemBuilder;
///
/// let mut b = ProblemBuilder::new("ordering");
/// let x = b.int("x", 0, 3);
/// let y = b.int("y", 0, 3);
/// b.assert(x.lt(&y), "x before y");
/// let problem = b.build().unwrap();
/// assert_eq!(problem.variables().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    name: String,
    variables: Vec<Variable>,
    assertions: Vec<Assertion>,
}

impl ProblemBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        ProblemBuilder {
            name: name.into(),
            variables: Vec::new(),
            assertions: Vec::new(),
        }
    }

    /// Declare an integer variable with domain `[min, max]`
    pub fn int(&mut self, name: impl Into<String>, min: i64, max: i64) -> Expr {
        self.declare(name.into(), Domain::Int { min, max })
    }

    /// Declare a boolean variable
    pub fn bool(&mut self, name: impl Into<String>) -> Expr {
        self.declare(name.into(), Domain::Bool)
    }

    fn declare(&mut self, name: String, domain: Domain) -> Expr {
        self.variables.push(Variable {
            name: name.clone(),
            domain,
        });
        Expr::Var(name)
    }

    /// Build the global constraint over already declared variables.
    ///
    /// Non-variable expressions are rejected at `build()`.
    pub fn all_different(&self, vars: &[Expr]) -> Expr {
        Expr::AllDifferent(
            vars.iter()
                .map(|v| match v {
                    Expr::Var(name) => name.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )
    }

    /// Add a constraint; an empty label is replaced by the expression text
    pub fn assert(&mut self, expr: Expr, label: impl Into<String>) -> &mut Self {
        let mut label = label.into();
        if label.is_empty() {
            label = expr.to_string();
        }
        self.assertions.push(Assertion { expr, label });
        self
    }

    /// Validate and freeze the problem
    pub fn build(self) -> Result<Problem> {
        let mut index = IndexMap::new();
        for (i, var) in self.variables.iter().enumerate() {
            if index.insert(var.name.clone(), i).is_some() {
                return Err(VerityError::InvalidProblem(format!(
                    "variable '{}' declared twice",
                    var.name
                )));
            }
            if var.domain.size() == 0 {
                return Err(VerityError::InvalidProblem(format!(
                    "variable '{}' has an empty domain",
                    var.name
                )));
            }
        }

        let kinds = |name: &str| index.get(name).map(|&i| self.variables[i].domain.kind());
        for assertion in &self.assertions {
            match assertion.expr.kind(&kinds) {
                Ok(ValueKind::Bool) => {}
                Ok(kind) => {
                    return Err(VerityError::InvalidProblem(format!(
                        "assertion '{}' has type {:?}, expected a boolean",
                        assertion.label, kind
                    )))
                }
                Err(e) => {
                    return Err(VerityError::InvalidProblem(format!(
                        "assertion '{}': {}",
                        assertion.label, e
                    )))
                }
            }
        }

        Ok(Problem {
            name: self.name,
            variables: self.variables,
            assertions: self.assertions,
            index,
        })
    }
}
