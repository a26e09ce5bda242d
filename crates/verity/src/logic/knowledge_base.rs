//! The knowledge base: a session-scoped, growing program
//!
//! This is the one mutable object of the engine. It is meant to be owned by
//! a single caller; concurrent writers must be serialized externally.

use super::clause::{Clause, Program};
use super::parser::{parse_fact, parse_program, parse_query, ParseError};
use super::resolution::{QueryOutcome, Resolver};
use super::term::{Goal, Term};
use crate::config::ResolutionConfig;
use crate::error::{Result, VerityError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Outcome of consulting program text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsultReport {
    pub clauses_added: usize,
    pub errors: Vec<ParseError>,
}

impl ConsultReport {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Summary counts of the stored program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbStats {
    pub fact_count: usize,
    pub rule_count: usize,
    /// `name/arity` indicators in order of first definition
    pub predicates: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    program: Program,
    config: ResolutionConfig,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        KnowledgeBase::default()
    }

    pub fn with_config(config: ResolutionConfig) -> Self {
        KnowledgeBase {
            program: Program::new(),
            config,
        }
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ResolutionConfig) {
        self.config = config;
    }

    /// Parse program text and append every well-formed clause.
    ///
    /// Malformed statements are reported in the returned report; the valid
    /// ones are kept.
    pub fn consult(&mut self, text: &str) -> ConsultReport {
        let parsed = parse_program(text);
        let clauses_added = parsed.clauses.len();
        for clause in parsed.clauses {
            self.program.add(clause);
        }
        if parsed.errors.is_empty() {
            debug!(clauses = clauses_added, "consulted program");
        } else {
            warn!(
                clauses = clauses_added,
                errors = parsed.errors.len(),
                "consulted program with parse errors"
            );
        }
        ConsultReport {
            clauses_added,
            errors: parsed.errors,
        }
    }

    /// Append one ground fact without going through the parser
    pub fn assert_fact(&mut self, predicate: &str, args: Vec<Term>) -> Result<()> {
        let goal = Goal::new(predicate, args);
        if !is_valid_predicate_name(predicate) {
            return Err(VerityError::InvalidInput(format!(
                "'{}' is not a valid predicate name",
                predicate
            )));
        }
        self.add_ground_fact(goal)
    }

    /// Append one ground fact written in the clause language
    pub fn assert_text(&mut self, fact: &str) -> Result<()> {
        let goal = parse_fact(fact)?;
        self.add_ground_fact(goal)
    }

    fn add_ground_fact(&mut self, goal: Goal) -> Result<()> {
        if !goal.is_ground() {
            return Err(VerityError::InvalidInput(format!(
                "fact '{}' contains variables",
                goal
            )));
        }
        self.program.add(Clause::fact(goal));
        Ok(())
    }

    /// Enumerate every solution of a query
    pub fn query(&self, query: &str) -> Result<QueryOutcome> {
        let goals = parse_query(query)?;
        Ok(Resolver::new(&self.program, self.config).solve(&goals, None))
    }

    /// Enumerate at most `limit` solutions of a query
    pub fn query_limit(&self, query: &str, limit: usize) -> Result<QueryOutcome> {
        let goals = parse_query(query)?;
        Ok(Resolver::new(&self.program, self.config).solve(&goals, Some(limit)))
    }

    /// Whether the query has at least one solution; search stops at the
    /// first one
    pub fn prove(&self, query: &str) -> Result<bool> {
        Ok(self.query_limit(query, 1)?.success())
    }

    pub fn stats(&self) -> KbStats {
        let fact_count = self.program.clauses().iter().filter(|c| c.is_fact()).count();
        KbStats {
            fact_count,
            rule_count: self.program.len() - fact_count,
            predicates: self.program.predicates().map(|p| p.to_string()).collect(),
        }
    }

    /// Clause texts in program order
    pub fn listing(&self) -> Vec<String> {
        self.program.clauses().iter().map(|c| c.to_string()).collect()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn clear(&mut self) {
        self.program.clear();
    }
}

fn is_valid_predicate_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with(|c: char| c.is_uppercase() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILY: &str = "
        parent(tom, bob).
        parent(bob, ann).
        male(tom).
        father(X, Y) :- parent(X, Y), male(X).
    ";

    #[test]
    fn test_consult_and_stats() {
        let mut kb = KnowledgeBase::new();
        let report = kb.consult(FAMILY);
        assert!(report.success());
        assert_eq!(report.clauses_added, 4);

        let stats = kb.stats();
        assert_eq!(stats.fact_count, 3);
        assert_eq!(stats.rule_count, 1);
        assert_eq!(stats.predicates, vec!["parent/2", "male/1", "father/2"]);
    }

    #[test]
    fn test_assert_fact_rejects_variables() {
        let mut kb = KnowledgeBase::new();
        assert!(kb.assert_fact("likes", vec![Term::atom("mary"), Term::var("X")]).is_err());
        assert!(kb.assert_fact("Likes", vec![Term::atom("mary")]).is_err());
        assert!(kb.assert_text("likes(mary, X).").is_err());
        assert!(kb.assert_text("likes(mary, wine)").is_ok());
        assert_eq!(kb.stats().fact_count, 1);
    }

    #[test]
    fn test_prove_and_query_agree() {
        let mut kb = KnowledgeBase::new();
        kb.consult(FAMILY);
        for q in ["father(X, bob)", "father(bob, X)", "parent(X, Y)", "male(ann)"] {
            let outcome = kb.query(q).unwrap();
            assert_eq!(kb.prove(q).unwrap(), !outcome.solutions.is_empty(), "{}", q);
        }
    }

    #[test]
    fn test_listing_and_clear() {
        let mut kb = KnowledgeBase::new();
        kb.consult(FAMILY);
        assert_eq!(kb.listing()[3], "father(X,Y) :- parent(X,Y), male(X).");
        kb.clear();
        assert_eq!(kb.stats(), KbStats::default());
    }

    #[test]
    fn test_listing_consults_back() {
        let mut kb = KnowledgeBase::new();
        kb.consult("same(X, X). any(_). pick(_, Y) :- same(Y, _).");
        let listing = kb.listing();
        assert_eq!(listing[1], "any(_).");

        let mut copy = KnowledgeBase::new();
        let report = copy.consult(&listing.join("\n"));
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(copy.listing(), listing);
    }
}
