//! Prolog-style logic engine
//!
//! This module provides the term model, the clause-language parser,
//! unification, SLD resolution and the session knowledge base.

pub mod builtins;
pub mod clause;
pub mod knowledge_base;
pub mod parser;
pub mod resolution;
pub mod substitution;
pub mod term;
pub mod unification;

#[cfg(test)]
mod proptest_tests;

// Re-export commonly used types
pub use clause::{Clause, Program};
pub use knowledge_base::{ConsultReport, KbStats, KnowledgeBase};
pub use parser::{parse_fact, parse_program, parse_query, ParseError, ParsedProgram};
pub use resolution::{QueryOutcome, Resolver};
pub use substitution::{Solution, Substitution};
pub use term::{Goal, PredicateKey, Term};
pub use unification::{unify, unify_goals, unify_terms, UnificationError, UnificationResult};
