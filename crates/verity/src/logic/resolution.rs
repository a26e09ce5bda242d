//! SLD resolution with depth-first backtracking
//!
//! To prove the leftmost pending goal, every program clause with a matching
//! predicate indicator is tried in program order. The clause is renamed
//! apart with a fresh suffix, its head unified with the goal, and its body
//! pushed in front of the remaining goals. Bindings are undone through the
//! substitution trail when a branch is abandoned.
//!
//! Search is bounded by proof-tree depth and by the total number of
//! resolution steps. Hitting either bound stops the whole search and marks
//! the outcome as exhausted, keeping any solutions already found.

use super::builtins;
use super::clause::Program;
use super::substitution::{Solution, Substitution};
use super::term::Goal;
use super::unification::unify_goals;
use crate::config::ResolutionConfig;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::{debug, trace};

/// Answers to a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub solutions: Vec<Solution>,
    /// True when a depth or step bound cut the search short, so the
    /// solution list may be incomplete
    pub exhausted: bool,
    pub steps: usize,
}

impl QueryOutcome {
    pub fn success(&self) -> bool {
        !self.solutions.is_empty()
    }
}

/// A goal waiting to be proved, with its depth in the proof tree
#[derive(Debug, Clone)]
struct PendingGoal {
    goal: Goal,
    depth: usize,
}

/// A goal with clauses still to try. `rest` holds the goals that follow it,
/// innermost last, and `mark` the trail position to undo to before each try.
struct ChoicePoint<'a> {
    goal: PendingGoal,
    rest: Vec<PendingGoal>,
    candidates: &'a [usize],
    next: usize,
    mark: usize,
}

/// One resolution run over a borrowed program
pub struct Resolver<'a> {
    program: &'a Program,
    config: ResolutionConfig,
    steps: usize,
    fresh: usize,
    exhausted: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(program: &'a Program, config: ResolutionConfig) -> Self {
        Resolver {
            program,
            config,
            steps: 0,
            fresh: 0,
            exhausted: false,
        }
    }

    /// Enumerate solutions of a conjunction of goals, stopping after `limit`
    /// solutions when given
    pub fn solve(mut self, goals: &[Goal], limit: Option<usize>) -> QueryOutcome {
        let mut vars = Vec::new();
        for goal in goals {
            goal.collect_variables(&mut vars);
        }

        // the next goal to prove sits at the end
        let pending: Vec<PendingGoal> = goals
            .iter()
            .rev()
            .map(|goal| PendingGoal {
                goal: goal.clone(),
                depth: 0,
            })
            .collect();

        let mut solutions = Vec::new();
        let mut subst = Substitution::new();
        let mut on_solution = |subst: &Substitution| {
            solutions.push(subst.restrict(&vars));
            match limit {
                Some(n) if solutions.len() >= n => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        };
        self.run(pending, &mut subst, &mut on_solution);

        if self.exhausted {
            debug!(
                steps = self.steps,
                found = solutions.len(),
                "resolution stopped at search bound"
            );
        }

        QueryOutcome {
            solutions,
            exhausted: self.exhausted,
            steps: self.steps,
        }
    }

    /// Depth-first search over an explicit choice-point stack. Proof depth
    /// and branching live on the heap, so only the configured bounds limit
    /// how far a search goes.
    fn run(
        &mut self,
        mut goals: Vec<PendingGoal>,
        subst: &mut Substitution,
        on_solution: &mut dyn FnMut(&Substitution) -> ControlFlow<()>,
    ) {
        let mut choices: Vec<ChoicePoint<'a>> = Vec::new();
        loop {
            let Some(first) = goals.pop() else {
                if on_solution(subst).is_break() {
                    return;
                }
                match self.retry(&mut choices, subst) {
                    Some(next) => {
                        goals = next;
                        continue;
                    }
                    None => return,
                }
            };

            if first.depth > self.config.max_depth {
                self.exhausted = true;
                return;
            }

            if builtins::is_builtin(&first.goal) {
                // bindings made here are undone by the next backtrack
                if builtins::evaluate(&first.goal, subst) {
                    continue;
                }
            } else {
                choices.push(ChoicePoint {
                    candidates: self.program.candidates(&first.goal),
                    goal: first,
                    rest: goals,
                    next: 0,
                    mark: subst.mark(),
                });
            }

            match self.retry(&mut choices, subst) {
                Some(next) => goals = next,
                None => return,
            }
        }
    }

    /// Resume the newest choice point with an untried clause. Returns the
    /// goals left after resolving against it, or `None` once the search
    /// space or the step bound is used up.
    fn retry(
        &mut self,
        choices: &mut Vec<ChoicePoint<'a>>,
        subst: &mut Substitution,
    ) -> Option<Vec<PendingGoal>> {
        let program = self.program;
        while let Some(choice) = choices.last_mut() {
            subst.backtrack(choice.mark);
            while let Some(&idx) = choice.candidates.get(choice.next) {
                choice.next += 1;
                if self.steps >= self.config.max_steps {
                    self.exhausted = true;
                    return None;
                }
                self.steps += 1;
                self.fresh += 1;

                let clause = program.clause(idx).rename(self.fresh);
                if unify_goals(&choice.goal.goal, &clause.head, subst).is_err() {
                    subst.backtrack(choice.mark);
                    continue;
                }
                trace!(goal = %choice.goal.goal, clause = idx, depth = choice.goal.depth, "resolved");

                let depth = choice.goal.depth + 1;
                let spent = choice.next >= choice.candidates.len();
                let mut next = if spent {
                    std::mem::take(&mut choice.rest)
                } else {
                    choice.rest.clone()
                };
                if spent {
                    // an older choice point's mark covers these bindings
                    choices.pop();
                }
                next.extend(
                    clause
                        .body
                        .into_iter()
                        .rev()
                        .map(|goal| PendingGoal { goal, depth }),
                );
                return Some(next);
            }
            choices.pop();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::parser::{parse_program, parse_query};
    use crate::logic::term::Term;

    fn program(text: &str) -> Program {
        let parsed = parse_program(text);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let mut program = Program::new();
        for clause in parsed.clauses {
            program.add(clause);
        }
        program
    }

    fn run(program: &Program, query: &str, config: ResolutionConfig) -> QueryOutcome {
        let goals = parse_query(query).unwrap();
        Resolver::new(program, config).solve(&goals, None)
    }

    #[test]
    fn test_solutions_in_program_order() {
        let p = program("color(red). color(green). color(blue).");
        let outcome = run(&p, "color(C)", ResolutionConfig::default());
        let colors: Vec<_> = outcome
            .solutions
            .iter()
            .map(|s| s.get("C").cloned().unwrap())
            .collect();
        assert_eq!(
            colors,
            vec![Term::atom("red"), Term::atom("green"), Term::atom("blue")]
        );
        assert!(!outcome.exhausted);
    }

    #[test]
    fn test_conjunction_shares_bindings() {
        let p = program("p(a). p(b). q(b). q(c).");
        let outcome = run(&p, "p(X), q(X)", ResolutionConfig::default());
        assert_eq!(outcome.solutions.len(), 1);
        assert_eq!(outcome.solutions[0].get("X"), Some(&Term::atom("b")));
    }

    #[test]
    fn test_same_clause_used_twice_is_renamed_apart() {
        let p = program("edge(a,b). edge(b,c). path2(X,Z) :- edge(X,Y), edge(Y,Z).");
        let outcome = run(&p, "path2(A, B), path2(B2, C2)", ResolutionConfig::default());
        assert_eq!(outcome.solutions.len(), 1);
        let s = &outcome.solutions[0];
        assert_eq!(s.get("A"), Some(&Term::atom("a")));
        assert_eq!(s.get("B"), Some(&Term::atom("c")));
        assert_eq!(s.get("C2"), Some(&Term::atom("c")));
    }

    #[test]
    fn test_left_recursion_is_bounded() {
        let p = program("loop(X) :- loop(X).");
        let config = ResolutionConfig {
            max_depth: 50,
            max_steps: 10_000,
        };
        let outcome = run(&p, "loop(a)", config);
        assert!(outcome.solutions.is_empty());
        assert!(outcome.exhausted);
    }

    #[test]
    fn test_step_bound_keeps_found_solutions() {
        let p = program("n(z). n(s) :- n(s). n(t).");
        let config = ResolutionConfig {
            max_depth: 1_000,
            max_steps: 20,
        };
        let outcome = run(&p, "n(X)", config);
        assert!(outcome.exhausted);
        assert_eq!(outcome.solutions.len(), 1);
        assert_eq!(outcome.steps, 20);
    }

    #[test]
    fn test_builtin_comparison_in_rule_body() {
        let p = program("age(ann, 31). age(bob, 17). adult(P) :- age(P, A), ge(A, 18).");
        let outcome = run(&p, "adult(Who)", ResolutionConfig::default());
        assert_eq!(outcome.solutions.len(), 1);
        assert_eq!(outcome.solutions[0].get("Who"), Some(&Term::atom("ann")));
    }

    #[test]
    fn test_limit_stops_early() {
        let p = program("color(red). color(green). color(blue).");
        let goals = parse_query("color(C)").unwrap();
        let outcome = Resolver::new(&p, ResolutionConfig::default()).solve(&goals, Some(1));
        assert_eq!(outcome.solutions.len(), 1);
        assert_eq!(outcome.steps, 1);
        assert!(!outcome.exhausted);
    }

    /// `d0 :- d1, d1. d1 :- d2, d2. ... dN.` needs 2^(N+1) - 1 steps
    fn doubling(levels: usize) -> Program {
        let mut text = String::new();
        for i in 0..levels {
            text.push_str(&format!("d{0} :- d{1}, d{1}.\n", i, i + 1));
        }
        text.push_str(&format!("d{}.", levels));
        program(&text)
    }

    #[test]
    fn test_wide_proof_within_bounds() {
        let p = doubling(13);
        let outcome = run(&p, "d0", ResolutionConfig::default());
        assert_eq!(outcome.solutions.len(), 1);
        assert!(!outcome.exhausted);
        assert_eq!(outcome.steps, (1 << 14) - 1);
    }

    #[test]
    fn test_wide_proof_beyond_step_bound_is_exhausted() {
        let p = doubling(18);
        let outcome = run(&p, "d0", ResolutionConfig::default());
        assert!(outcome.solutions.is_empty());
        assert!(outcome.exhausted);
        assert_eq!(outcome.steps, ResolutionConfig::default().max_steps);
    }

    #[test]
    fn test_builtin_bindings_undone_on_backtrack() {
        let p = program("n(1). n(2). n(3).");
        let outcome = run(&p, "n(X), eq(Y, X), ge(Y, 2)", ResolutionConfig::default());
        let ys: Vec<_> = outcome
            .solutions
            .iter()
            .map(|s| s.get("Y").cloned().unwrap())
            .collect();
        assert_eq!(ys, vec![Term::number(2), Term::number(3)]);
    }
}
