//! Built-in comparison predicates
//!
//! `eq/2` unifies its arguments. `neq/2` succeeds when both arguments are
//! bound and different. `lt/2`, `gt/2`, `le/2` and `ge/2` compare bound
//! numbers. A comparison over an unbound variable fails rather than
//! delaying.

use super::substitution::Substitution;
use super::term::{Goal, Term};
use super::unification::unify_terms;

/// Whether a goal is handled by a built-in instead of program clauses
pub fn is_builtin(goal: &Goal) -> bool {
    goal.args.len() == 2
        && matches!(
            goal.predicate.as_str(),
            "eq" | "neq" | "lt" | "gt" | "le" | "ge"
        )
}

/// Evaluate a built-in goal, extending `subst` on success.
///
/// Returns false (with `subst` unchanged) when the goal fails.
pub fn evaluate(goal: &Goal, subst: &mut Substitution) -> bool {
    let (left, right) = (&goal.args[0], &goal.args[1]);
    match goal.predicate.as_str() {
        "eq" => {
            let mark = subst.mark();
            if unify_terms(left, right, subst).is_ok() {
                true
            } else {
                subst.backtrack(mark);
                false
            }
        }
        "neq" => {
            let (l, r) = (subst.resolve(left), subst.resolve(right));
            l.is_ground() && r.is_ground() && l != r
        }
        op => {
            let (l, r) = match (subst.resolve(left), subst.resolve(right)) {
                (Term::Number(l), Term::Number(r)) => (l, r),
                _ => return false,
            };
            match op {
                "lt" => l < r,
                "gt" => l > r,
                "le" => l <= r,
                "ge" => l >= r,
                _ => unreachable!("'{}' is not a built-in comparison", op),
            }
        }
    }
}
