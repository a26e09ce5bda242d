//! Terms and goals of the clause language

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker that only engine-generated variable names contain.
///
/// The clause grammar never produces it, so renamed and anonymous variables
/// cannot collide with user variables.
pub(crate) const GENERATED_MARK: char = '#';

/// A term: atom, variable or integer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Term {
    Atom(String),
    Variable(String),
    Number(i64),
}

impl Term {
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(name.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    pub fn number(value: i64) -> Self {
        Term::Number(value)
    }

    /// Create the n-th anonymous variable (`_` in source text)
    pub(crate) fn anonymous(n: usize) -> Self {
        Term::Variable(format!("_{}{}", GENERATED_MARK, n))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_ground(&self) -> bool {
        !self.is_variable()
    }

    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Term::Variable(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Term::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Number(value)
    }
}

/// Whether a variable name came from the caller's text (as opposed to
/// renaming or an anonymous `_`)
pub(crate) fn is_user_variable(name: &str) -> bool {
    !name.contains(GENERATED_MARK)
}

fn is_anonymous(name: &str) -> bool {
    name.strip_prefix('_')
        .is_some_and(|rest| rest.starts_with(GENERATED_MARK))
}

fn needs_quotes(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => {
            !chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => true,
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(name) if needs_quotes(name) => {
                write!(f, "'{}'", name.replace('\'', "''"))
            }
            // generated names print as text the clause grammar reads back
            Term::Variable(name) if is_anonymous(name) => write!(f, "_"),
            Term::Variable(name) if !is_user_variable(name) => {
                write!(f, "{}", name.replace(GENERATED_MARK, "_"))
            }
            Term::Atom(name) | Term::Variable(name) => write!(f, "{}", name),
            Term::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Predicate indicator: name and arity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PredicateKey {
    pub name: String,
    pub arity: usize,
}

impl fmt::Display for PredicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// A predicate applied to arguments: the unit of facts, rule heads, rule
/// bodies and queries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Goal {
    pub predicate: String,
    pub args: Vec<Term>,
}

impl Goal {
    pub fn new(predicate: impl Into<String>, args: Vec<Term>) -> Self {
        Goal {
            predicate: predicate.into(),
            args,
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn key(&self) -> PredicateKey {
        PredicateKey {
            name: self.predicate.clone(),
            arity: self.args.len(),
        }
    }

    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_ground)
    }

    /// Append variable names not yet in `vars`, in order of first appearance
    pub fn collect_variables(&self, vars: &mut Vec<String>) {
        for arg in &self.args {
            if let Term::Variable(name) = arg {
                if !vars.contains(name) {
                    vars.push(name.clone());
                }
            }
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Term::Atom(self.predicate.clone()))?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
