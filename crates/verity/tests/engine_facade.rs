//! Integration tests for the engine facade

use serde_json::json;
use verity::{
    ActionSchema, ComparisonOp, Condition, Effect, Engine, EngineConfig, Plan, PlanState,
    SafetyProperty, SolveOptions, SolveStatus, Term,
};

fn engine() -> Engine {
    Engine::builder(EngineConfig::default())
        .program("parent(tom, bob). parent(bob, ann). male(tom).")
        .program("father(X, Y) :- parent(X, Y), male(X).")
        .action(
            ActionSchema::new("deploy")
                .parameter("version", "string")
                .precondition(Condition::simple("tests", "green"))
                .effect(Effect::assign("live", "?version")),
        )
        .action(
            ActionSchema::new("break_tests").effect(Effect::assign("tests", "red")),
        )
        .safety_property(SafetyProperty::never(
            "red-deploy",
            "never live while tests are red",
            Condition::simple("tests", "red"),
        ))
        .build()
        .unwrap()
}

#[test]
fn test_logic_round_trip() {
    let mut engine = engine();
    let outcome = engine.query_logic("father(X, bob)");
    assert!(outcome.success);
    let data = outcome.data.unwrap();
    assert_eq!(data.solutions.len(), 1);
    assert_eq!(data.solutions[0].get("X"), Some(&Term::atom("tom")));

    assert!(engine.assert_fact("male", vec![Term::atom("bob")]).success);
    assert_eq!(engine.prove_logic("father(bob, ann)").data, Some(true));
    assert!(!engine.assert_fact("male", vec![Term::var("Who")]).success);

    let stats = engine.stats();
    assert_eq!(stats.fact_count, 4);
    assert_eq!(stats.rule_count, 1);
}

#[test]
fn test_no_solution_is_not_an_error() {
    let engine = engine();
    let outcome = engine.query_logic("father(ann, X)");
    assert!(!outcome.success);
    assert!(outcome.data.unwrap().solutions.is_empty());

    let proved = engine.prove_logic("father(ann, X)");
    assert!(proved.success);
    assert_eq!(proved.data, Some(false));
}

#[test]
fn test_solve_through_facade() {
    let engine = engine();
    let mut b = engine.create_constraint_problem("toggle");
    let a = b.bool("a");
    b.assert(a.clone(), "a");
    b.assert(a.not(), "not a");
    let problem = b.build().unwrap();

    let outcome = engine.solve(&problem, None);
    assert!(!outcome.success);
    assert_eq!(outcome.data.unwrap().status, SolveStatus::Unsat);

    let mut b = engine.create_constraint_problem("range");
    let x = b.int("x", 0, 50);
    let y = b.int("y", 0, 50);
    b.assert(x.clone().gt(&y).and(y.gt(40)), "x above y above forty");
    let problem = b.build().unwrap();

    let outcome = engine.solve(&problem, Some(SolveOptions::default().with_max_iterations(3)));
    assert!(!outcome.success);
    assert_eq!(outcome.data.unwrap().status, SolveStatus::Timeout);

    let outcome = engine.solve(&problem, None);
    assert!(outcome.success);
    let model = outcome.data.unwrap().model.unwrap();
    assert_eq!(model.get_int("x"), Some(42));
    assert_eq!(model.get_int("y"), Some(41));
}

#[test]
fn test_planning_and_invariants_through_facade() {
    let mut engine = engine();
    let start = PlanState::new("s0").with("tests", "green").with("live", "v1");

    let good = Plan::new("release", start.clone())
        .action(engine.create_action("deploy", vec![("version".into(), json!("v2"))]).into_result().unwrap())
        .goal(Condition::simple("live", "v2"));
    assert!(engine.validate_plan(&good).success);
    assert!(engine.simulate_plan(&good).success);
    assert!(engine.check_invariants(&good).success);

    let bad = Plan::new("reckless", start)
        .action(engine.create_action("break_tests", vec![]).into_result().unwrap())
        .action(engine.create_action("deploy", vec![("version".into(), json!("v3"))]).into_result().unwrap())
        .goal(Condition::simple("live", "v3"));

    let validation = engine.validate_plan(&bad);
    assert!(!validation.success);
    let errors = validation.data.unwrap().errors;
    assert_eq!(errors[0].action_index, 1);

    let invariants = engine.check_invariants(&bad);
    assert!(!invariants.success);
    assert_eq!(invariants.data.unwrap()[0].violating_state_index, Some(1));

    assert!(engine
        .add_safety_property(SafetyProperty::always(
            "versioned",
            "something is live",
            Condition::comparison("live", ComparisonOp::Ne, serde_json::Value::Null),
        ))
        .success);
    assert_eq!(engine.check_invariants(&good).data.unwrap().len(), 2);
    assert!(!engine.create_action("rollback", vec![]).success);
}

#[test]
fn test_outcomes_serialize_uniformly() {
    let mut engine = engine();
    let outcome = engine.load_logic_program("ok(a). broken(");
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["clauses_added"], 1);
    assert!(json["error"].as_str().unwrap().contains("missing terminating"));

    let json = serde_json::to_value(engine.register_action(ActionSchema::new("deploy"))).unwrap();
    assert_eq!(json["success"], false);
    assert!(json.get("data").is_none());
}
