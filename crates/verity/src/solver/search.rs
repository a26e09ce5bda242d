//! Bounded backtracking search with forward checking
//!
//! Variables are assigned in declaration order, values in ascending order.
//! After each assignment, the assertions that mention the assigned variable
//! are evaluated under the partial assignment; a branch dies as soon as one
//! of them is false. Budgets are checked once per node.

use super::expr::{Expr, Value};
use super::problem::{Domain, Model, Problem};
use crate::config::SolveOptions;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Sat,
    Unsat,
    /// A budget ran out before the search was exhaustive
    Timeout,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Number of value assignments tried
    pub nodes: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
    pub stats: SolveStats,
    /// Label of the assertion found unsatisfiable before search started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refuted: Option<String>,
}

impl SolveResult {
    pub fn is_sat(&self) -> bool {
        self.status == SolveStatus::Sat
    }

    pub fn is_unsat(&self) -> bool {
        self.status == SolveStatus::Unsat
    }

    pub fn is_timeout(&self) -> bool {
        self.status == SolveStatus::Timeout
    }
}

/// Why the search stopped early
enum Stop {
    Found,
    Budget,
}

struct Search<'a> {
    problem: &'a Problem,
    options: SolveOptions,
    start: Instant,
    nodes: usize,
    /// Assertions to re-check after assigning each variable
    watches: Vec<Vec<usize>>,
    assignment: Vec<Option<Value>>,
}

impl<'a> Search<'a> {
    fn new(problem: &'a Problem, options: SolveOptions, start: Instant) -> Self {
        let n = problem.variables().len();
        let mut watches = vec![Vec::new(); n];
        let mut vars = Vec::new();
        for (i, assertion) in problem.assertions().iter().enumerate() {
            vars.clear();
            assertion.expr.collect_variables(&mut vars);
            for name in &vars {
                if let Some(pos) = problem.position(name) {
                    watches[pos].push(i);
                }
            }
        }
        Search {
            problem,
            options,
            start,
            nodes: 0,
            watches,
            assignment: vec![None; n],
        }
    }

    fn budget_exhausted(&self) -> bool {
        (self.options.max_iterations > 0 && self.nodes >= self.options.max_iterations)
            || self.start.elapsed() >= self.options.timeout
    }

    fn consistent(&self, var: usize) -> bool {
        let problem = self.problem;
        let assignment = &self.assignment;
        let lookup = |name: &str| problem.position(name).and_then(|i| assignment[i]);
        self.watches[var].iter().all(|&a| {
            problem.assertions()[a].expr.eval(&lookup) != Some(Value::Bool(false))
        })
    }

    fn search(&mut self, var: usize) -> Result<(), Stop> {
        let problem = self.problem;
        let Some(variable) = problem.variables().get(var) else {
            return Err(Stop::Found);
        };
        for value in variable.domain.values() {
            if self.budget_exhausted() {
                return Err(Stop::Budget);
            }
            self.nodes += 1;
            self.assignment[var] = Some(value);
            if self.consistent(var) {
                self.search(var + 1)?;
            }
        }
        self.assignment[var] = None;
        Ok(())
    }

    fn model(&self) -> Model {
        let mut model = Model::default();
        for (variable, value) in self.problem.variables().iter().zip(&self.assignment) {
            match value {
                Some(value) => {
                    model.values.insert(variable.name.clone(), *value);
                }
                None => unreachable!("complete assignment has unassigned '{}'", variable.name),
            }
        }
        model
    }
}

/// Search for a model of `problem` within the budgets in `options`
pub fn solve(problem: &Problem, options: SolveOptions) -> SolveResult {
    let start = Instant::now();

    if let Some(label) = refute_statically(problem) {
        debug!(problem = %problem.name, assertion = %label, "refuted before search");
        return SolveResult {
            status: SolveStatus::Unsat,
            model: None,
            stats: SolveStats {
                nodes: 0,
                elapsed: start.elapsed(),
            },
            refuted: Some(label),
        };
    }

    let mut search = Search::new(problem, options, start);
    let (status, model) = match search.search(0) {
        Err(Stop::Found) => (SolveStatus::Sat, Some(search.model())),
        Err(Stop::Budget) => (SolveStatus::Timeout, None),
        Ok(()) => (SolveStatus::Unsat, None),
    };
    let stats = SolveStats {
        nodes: search.nodes,
        elapsed: start.elapsed(),
    };
    debug!(
        problem = %problem.name,
        status = ?status,
        nodes = stats.nodes,
        elapsed_us = stats.elapsed.as_micros() as u64,
        "solve finished"
    );

    SolveResult {
        status,
        model,
        stats,
        refuted: None,
    }
}

/// Label of the first assertion that no assignment can satisfy: one that is
/// false with nothing assigned, or an `allDifferent` over more variables
/// than the union of their domains holds
fn refute_statically(problem: &Problem) -> Option<String> {
    let nothing = |_: &str| -> Option<Value> { None };
    problem
        .assertions()
        .iter()
        .find(|assertion| {
            if assertion.expr.eval(&nothing) == Some(Value::Bool(false)) {
                return true;
            }
            match &assertion.expr {
                Expr::AllDifferent(vars) => {
                    let domains: Vec<Domain> = vars
                        .iter()
                        .filter_map(|name| problem.position(name))
                        .map(|i| problem.variables()[i].domain)
                        .collect();
                    union_size(&domains) < vars.len() as u64
                }
                _ => false,
            }
        })
        .map(|assertion| assertion.label.clone())
}

/// Number of distinct values across a set of domains
fn union_size(domains: &[Domain]) -> u64 {
    let mut has_bool = false;
    let mut ranges: Vec<(i64, i64)> = Vec::new();
    for domain in domains {
        match *domain {
            Domain::Bool => has_bool = true,
            Domain::Int { min, max } if min <= max => ranges.push((min, max)),
            Domain::Int { .. } => {}
        }
    }
    ranges.sort_unstable();

    let mut total: u64 = if has_bool { 2 } else { 0 };
    let mut current: Option<(i64, i64)> = None;
    for (min, max) in ranges {
        current = match current {
            Some((lo, hi)) if min <= hi.saturating_add(1) => Some((lo, hi.max(max))),
            Some(done) => {
                total = total.saturating_add(Domain::Int { min: done.0, max: done.1 }.size());
                Some((min, max))
            }
            None => Some((min, max)),
        };
    }
    if let Some((lo, hi)) = current {
        total = total.saturating_add(Domain::Int { min: lo, max: hi }.size());
    }
    total
}
