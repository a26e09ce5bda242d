//! Property-based tests for unification using proptest.

use super::substitution::Substitution;
use super::term::{Goal, Term};
use super::unification::{unify, unify_goals};
use proptest::prelude::*;
use std::collections::HashMap;

/// Terms drawn from a small pool so that clashes and shared variables are common
fn arb_term() -> BoxedStrategy<Term> {
    prop_oneof![
        3 => (0..4u8).prop_map(|i| Term::var(format!("X{}", i))),
        2 => (0..3u8).prop_map(|i| Term::atom(format!("c{}", i))),
        1 => (-1..2i64).prop_map(Term::number),
    ]
    .boxed()
}

fn arb_goal_pair() -> impl Strategy<Value = (Goal, Goal)> {
    (1..4usize).prop_flat_map(|arity| {
        (
            proptest::collection::vec(arb_term(), arity),
            proptest::collection::vec(arb_term(), arity),
        )
            .prop_map(|(a, b)| (Goal::new("p", a), Goal::new("p", b)))
    })
}

/// Two goals are variants if a consistent one-to-one variable renaming maps
/// one onto the other
fn is_variant(a: &Goal, b: &Goal) -> bool {
    if a.predicate != b.predicate || a.args.len() != b.args.len() {
        return false;
    }
    let mut forward: HashMap<&str, &str> = HashMap::new();
    let mut backward: HashMap<&str, &str> = HashMap::new();
    for (x, y) in a.args.iter().zip(b.args.iter()) {
        match (x, y) {
            (Term::Variable(vx), Term::Variable(vy)) => {
                let (vx, vy) = (vx.as_str(), vy.as_str());
                if *forward.entry(vx).or_insert(vy) != vy {
                    return false;
                }
                if *backward.entry(vy).or_insert(vx) != vx {
                    return false;
                }
            }
            _ if x == y => {}
            _ => return false,
        }
    }
    true
}

fn unify_fresh(a: &Goal, b: &Goal) -> Option<Substitution> {
    let mut subst = Substitution::new();
    unify_goals(a, b, &mut subst).ok().map(|_| subst)
}

proptest! {
    /// Symmetry: unify(s, t) succeeds iff unify(t, s) succeeds
    #[test]
    fn term_unification_symmetry(t1 in arb_term(), t2 in arb_term()) {
        prop_assert_eq!(unify(&t1, &t2).is_ok(), unify(&t2, &t1).is_ok());
    }

    /// Symmetry over goals, with bindings equivalent up to renaming
    #[test]
    fn goal_unification_symmetry((g1, g2) in arb_goal_pair()) {
        let forward = unify_fresh(&g1, &g2);
        let backward = unify_fresh(&g2, &g1);
        prop_assert_eq!(forward.is_some(), backward.is_some());

        if let (Some(s1), Some(s2)) = (forward, backward) {
            let u1 = s1.apply(&g1);
            let u2 = s2.apply(&g1);
            prop_assert!(is_variant(&u1, &u2), "{} is not a variant of {}", u1, u2);
        }
    }

    /// Soundness: if unify(s, t) = σ, then sσ = tσ
    #[test]
    fn goal_unification_soundness((g1, g2) in arb_goal_pair()) {
        if let Some(sigma) = unify_fresh(&g1, &g2) {
            prop_assert_eq!(sigma.apply(&g1), sigma.apply(&g2));
        }
    }

    /// Identity: a goal always unifies with itself without binding anything
    #[test]
    fn goal_unification_identity((g, _) in arb_goal_pair()) {
        let sigma = unify_fresh(&g, &g);
        prop_assert!(sigma.is_some());
        prop_assert!(sigma.unwrap().is_empty());
    }
}
