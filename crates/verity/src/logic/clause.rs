//! Clauses and the indexed program store

use super::term::{Goal, PredicateKey, Term, GENERATED_MARK};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A definite clause: a fact when the body is empty, a rule otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub head: Goal,
    pub body: Vec<Goal>,
}

impl Clause {
    pub fn fact(head: Goal) -> Self {
        Clause {
            head,
            body: Vec::new(),
        }
    }

    pub fn rule(head: Goal, body: Vec<Goal>) -> Self {
        Clause { head, body }
    }

    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }

    /// Copy of this clause with every variable suffixed by a fresh id
    pub fn rename(&self, fresh: usize) -> Clause {
        let rename_goal = |goal: &Goal| Goal {
            predicate: goal.predicate.clone(),
            args: goal
                .args
                .iter()
                .map(|arg| match arg {
                    Term::Variable(name) => {
                        Term::Variable(format!("{}{}{}", name, GENERATED_MARK, fresh))
                    }
                    other => other.clone(),
                })
                .collect(),
        };
        Clause {
            head: rename_goal(&self.head),
            body: self.body.iter().map(rename_goal).collect(),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if !self.body.is_empty() {
            write!(f, " :- ")?;
            for (i, goal) in self.body.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", goal)?;
            }
        }
        write!(f, ".")
    }
}

/// Clauses in insertion order, indexed by predicate indicator
#[derive(Debug, Clone, Default)]
pub struct Program {
    clauses: Vec<Clause>,
    index: IndexMap<PredicateKey, Vec<usize>>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn add(&mut self, clause: Clause) {
        let idx = self.clauses.len();
        self.index.entry(clause.head.key()).or_default().push(idx);
        self.clauses.push(clause);
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn clause(&self, idx: usize) -> &Clause {
        &self.clauses[idx]
    }

    /// Indices of clauses whose head could match `goal`, in program order
    pub fn candidates(&self, goal: &Goal) -> &[usize] {
        self.index
            .get(&goal.key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Predicates in order of first definition
    pub fn predicates(&self) -> impl Iterator<Item = &PredicateKey> {
        self.index.keys()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clear(&mut self) {
        self.clauses.clear();
        self.index.clear();
    }
}
