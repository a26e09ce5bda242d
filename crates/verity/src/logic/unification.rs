//! Unification of terms and goals

use super::substitution::Substitution;
use super::term::{Goal, Term};

/// Result of a unification attempt
pub type UnificationResult = Result<Substitution, UnificationError>;

/// Reasons two terms or goals fail to unify.
///
/// Only used to drive backtracking; never reported to callers of the
/// knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnificationError {
    /// Predicate names differ
    PredicateClash(String, String),
    /// Arities don't match
    ArityMismatch(usize, usize),
    /// Two distinct ground terms
    Clash(Term, Term),
}

/// Unify two terms, returning the most general unifier if one exists
pub fn unify(term1: &Term, term2: &Term) -> UnificationResult {
    let mut subst = Substitution::new();
    unify_terms(term1, term2, &mut subst)?;
    Ok(subst)
}

/// Unify two terms under an existing substitution, extending it.
///
/// On failure the substitution may hold partial bindings; callers that need
/// to retry take a `mark()` first and `backtrack()` to it.
pub fn unify_terms(
    term1: &Term,
    term2: &Term,
    subst: &mut Substitution,
) -> Result<(), UnificationError> {
    let t1 = subst.resolve(term1);
    let t2 = subst.resolve(term2);

    match (&t1, &t2) {
        _ if t1 == t2 => Ok(()),
        (Term::Variable(v), t) | (t, Term::Variable(v)) => {
            subst.bind(v, t.clone());
            Ok(())
        }
        _ => Err(UnificationError::Clash(t1, t2)),
    }
}

/// Unify two goals argument by argument under an existing substitution
pub fn unify_goals(
    goal1: &Goal,
    goal2: &Goal,
    subst: &mut Substitution,
) -> Result<(), UnificationError> {
    if goal1.predicate != goal2.predicate {
        return Err(UnificationError::PredicateClash(
            goal1.predicate.clone(),
            goal2.predicate.clone(),
        ));
    }
    if goal1.args.len() != goal2.args.len() {
        return Err(UnificationError::ArityMismatch(
            goal1.args.len(),
            goal2.args.len(),
        ));
    }
    for (arg1, arg2) in goal1.args.iter().zip(goal2.args.iter()) {
        unify_terms(arg1, arg2, subst)?;
    }
    Ok(())
}
