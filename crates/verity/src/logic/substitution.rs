//! Variable substitutions

use super::term::{is_user_variable, Goal, Term};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A substitution mapping variable names to terms.
///
/// Bindings are stored unresolved (a variable may be bound to another
/// variable) and dereferenced on lookup. Every `bind` is recorded on a trail
/// so that resolution can undo bindings with `mark()`/`backtrack()`.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    map: HashMap<String, Term>,
    trail: Vec<String>,
}

impl Substitution {
    /// Create a new empty substitution
    pub fn new() -> Self {
        Substitution {
            map: HashMap::new(),
            trail: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Bind variable, recording on trail for backtracking
    #[inline]
    pub fn bind(&mut self, var: &str, term: Term) {
        self.trail.push(var.to_string());
        self.map.insert(var.to_string(), term);
    }

    /// Save current position for later backtrack
    #[inline]
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Undo bindings back to saved position
    #[inline]
    pub fn backtrack(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some(var) = self.trail.pop() {
                self.map.remove(&var);
            }
        }
    }

    /// Get the direct binding of a variable, if any
    pub fn get(&self, var: &str) -> Option<&Term> {
        self.map.get(var)
    }

    pub fn contains(&self, var: &str) -> bool {
        self.map.contains_key(var)
    }

    /// Follow variable bindings until reaching a non-variable or an unbound
    /// variable
    pub fn resolve(&self, term: &Term) -> Term {
        let mut current = term;
        let mut hops = 0;
        while let Term::Variable(name) = current {
            match self.map.get(name) {
                Some(next) => {
                    current = next;
                    hops += 1;
                    if hops > self.map.len() {
                        panic!("substitution contains a binding cycle through '{}'", name);
                    }
                }
                None => break,
            }
        }
        current.clone()
    }

    /// Apply this substitution to every argument of a goal
    pub fn apply(&self, goal: &Goal) -> Goal {
        Goal {
            predicate: goal.predicate.clone(),
            args: goal.args.iter().map(|arg| self.resolve(arg)).collect(),
        }
    }

    /// Restrict to the given variables, fully dereferenced.
    ///
    /// Engine-generated variables (anonymous `_`, renamed clause variables)
    /// are skipped. A query variable left bound to an unbound generated
    /// variable reports the first query variable sharing it instead, so
    /// `same(A, B)` against `same(X, X).` answers `B = A`.
    pub fn restrict(&self, vars: &[String]) -> Solution {
        let mut aliases: HashMap<String, Term> = HashMap::new();
        let mut bindings = IndexMap::new();
        for var in vars.iter().filter(|v| is_user_variable(v)) {
            let value = match self.resolve(&Term::Variable(var.clone())) {
                Term::Variable(name) if !is_user_variable(&name) => aliases
                    .entry(name)
                    .or_insert_with(|| Term::Variable(var.clone()))
                    .clone(),
                value => value,
            };
            bindings.insert(var.clone(), value);
        }
        Solution { bindings }
    }
}

/// One answer to a query: bindings for the query's variables in order of
/// first appearance
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Solution {
    pub bindings: IndexMap<String, Term>,
}

impl Solution {
    pub fn get(&self, var: &str) -> Option<&Term> {
        self.bindings.get(var)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}
