//! End-to-end scenarios exercised directly against the public API, the way an external
//! collaborator (a parser, a REPL, an RPC frontend) would use the crate: build terms through a
//! `Factory`, load facts/rules/methods/operators, then resolve or plan.

use std::sync::atomic::AtomicBool;

use plexus_engine::domain::{Domain, Method, MethodKind, Operator};
use plexus_engine::planner::{Planner, PlannerConfig};
use plexus_engine::prelude;
use plexus_engine::resolver::Resolver;
use plexus_engine::ruleset::{Rule, RuleSet};
use plexus_engine::term::{Factory, FactoryConfig, Term};
use plexus_engine::unify::Unifier;
use enumflags2::BitFlags;

fn factory() -> Factory {
  Factory::new(FactoryConfig::default())
}

#[test]
fn recursive_range_generator_enumerates_in_order() {
  let factory = factory();
  let mut rule_set = RuleSet::new();

  // gen(C,T,C) :- =<(C,T).
  rule_set.add_rule(Rule {
    head: factory.create_compound("gen", vec![factory.create_variable("C"), factory.create_variable("T"), factory.create_variable("C")]),
    body: vec![factory.create_compound("=<", vec![factory.create_variable("C"), factory.create_variable("T")])],
  });
  // gen(C,T,N) :- =<(C,T), is(C1,+(C,1)), gen(C1,T,N).
  rule_set.add_rule(Rule {
    head: factory.create_compound("gen", vec![factory.create_variable("C"), factory.create_variable("T"), factory.create_variable("N")]),
    body: vec![
      factory.create_compound("=<", vec![factory.create_variable("C"), factory.create_variable("T")]),
      factory.create_compound("is", vec![factory.create_variable("C1"), factory.create_compound("+", vec![factory.create_variable("C"), factory.create_int(1)])]),
      factory.create_compound("gen", vec![factory.create_variable("C1"), factory.create_variable("T"), factory.create_variable("N")]),
    ],
  });

  let goal = factory.create_compound("gen", vec![factory.create_int(0), factory.create_int(4), factory.create_variable("N")]);
  let mut resolver = Resolver::new(&mut rule_set, &factory);
  let solutions = resolver.solve_all(&goal, &Unifier::new());

  let values: Vec<i64> = solutions
    .iter()
    .map(|u| match u.apply(&factory.create_variable("N"), &factory) {
      Term::Int(n) => n,
      other => panic!("expected an integer binding, got {other}"),
    })
    .collect();
  assert_eq!(values, vec![0, 1, 2, 3, 4]);
}

#[test]
fn taxi_walk_plans_a_single_operator_and_updates_location() {
  let factory = factory();
  let mut domain = Domain::new();

  domain
    .add_method(Method {
      head: factory.create_compound("travel-to", vec![factory.create_variable("Q")]),
      precondition: vec![
        factory.create_compound("at", vec![factory.create_variable("P")]),
        factory.create_compound("distance", vec![factory.create_variable("P"), factory.create_variable("Q"), factory.create_variable("D")]),
        factory.create_compound("=<", vec![factory.create_variable("D"), factory.create_int(3)]),
      ],
      subtasks: vec![factory.create_compound("walk", vec![factory.create_variable("P"), factory.create_variable("Q")])],
      kind: MethodKind::Normal,
      is_default: false,
    })
    .unwrap();

  domain
    .add_operator(Operator {
      head: factory.create_compound("walk", vec![factory.create_variable("From"), factory.create_variable("To")]),
      deletions: vec![factory.create_compound("at", vec![factory.create_variable("From")])],
      additions: vec![factory.create_compound("at", vec![factory.create_variable("To")])],
      attributes: BitFlags::empty(),
    })
    .unwrap();

  let mut state = RuleSet::new();
  state.add_fact(factory.create_compound("at", vec![factory.create_atom("downtown")]));
  state.add_fact(factory.create_compound("distance", vec![factory.create_atom("downtown"), factory.create_atom("park"), factory.create_int(2)]));
  state.add_fact(factory.create_compound("weather-is", vec![factory.create_atom("good")]));

  let mut planner = Planner::new(&domain, &factory, PlannerConfig::default());
  let task = factory.create_compound("travel-to", vec![factory.create_atom("park")]);
  let solution = planner.find_first_plan(&state, &[task]).expect("taxi walk should plan");

  assert_eq!(solution.operators, vec![factory.create_compound("walk", vec![factory.create_atom("downtown"), factory.create_atom("park")])]);

  let mut final_state = solution.final_state.clone();
  let mut checker = Resolver::new(&mut final_state, &factory);
  assert!(checker.solve_first(&factory.create_compound("at", vec![factory.create_atom("park")]), &Unifier::new()).is_some());
  assert!(checker.solve_first(&factory.create_compound("at", vec![factory.create_atom("downtown")]), &Unifier::new()).is_none());
}

fn build_travel_domain(factory: &Factory) -> Domain {
  let mut domain = Domain::new();
  domain
    .add_operator(Operator {
      head: factory.create_compound("drive", vec![factory.create_variable("D")]),
      deletions: vec![],
      additions: vec![factory.create_compound("moved", vec![factory.create_variable("D")])],
      attributes: BitFlags::empty(),
    })
    .unwrap();
  domain
    .add_operator(Operator {
      head: factory.create_compound("walk", vec![factory.create_variable("D")]),
      deletions: vec![],
      additions: vec![factory.create_compound("moved", vec![factory.create_variable("D")])],
      attributes: BitFlags::empty(),
    })
    .unwrap();
  domain
    .add_method(Method {
      head: factory.create_compound("travel", vec![factory.create_variable("D")]),
      precondition: vec![factory.create_atom("has_car")],
      subtasks: vec![factory.create_compound("drive", vec![factory.create_variable("D")])],
      kind: MethodKind::Normal,
      is_default: false,
    })
    .unwrap();
  domain
    .add_method(Method {
      head: factory.create_compound("travel", vec![factory.create_variable("D")]),
      precondition: vec![],
      subtasks: vec![factory.create_compound("walk", vec![factory.create_variable("D")])],
      kind: MethodKind::Normal,
      is_default: true,
    })
    .unwrap();
  domain
}

#[test]
fn else_method_only_fires_when_every_earlier_sibling_fails() {
  let factory = factory();
  let domain = build_travel_domain(&factory);
  let task = factory.create_compound("travel", vec![factory.create_atom("home")]);

  let without_car = RuleSet::new();
  let mut planner = Planner::new(&domain, &factory, PlannerConfig::default());
  let fallback = planner.find_first_plan(&without_car, &[task.clone()]).expect("else method should plan");
  assert_eq!(fallback.operators[0].functor_arity().map(|(f, _)| f.to_string()), Some("walk".to_string()));

  let mut with_car = RuleSet::new();
  with_car.add_fact(factory.create_atom("has_car"));
  let mut planner = Planner::new(&domain, &factory, PlannerConfig::default());
  let primary = planner.find_first_plan(&with_car, &[task]).expect("primary method should plan");
  assert_eq!(primary.operators[0].functor_arity().map(|(f, _)| f.to_string()), Some("drive".to_string()));
}

#[test]
fn any_of_attacks_every_enemy_the_precondition_finds() {
  let factory = factory();
  let mut domain = Domain::new();
  domain
    .add_operator(Operator {
      head: factory.create_compound("attack", vec![factory.create_variable("E")]),
      deletions: vec![factory.create_compound("enemy", vec![factory.create_variable("E")])],
      additions: vec![factory.create_compound("defeated", vec![factory.create_variable("E")])],
      attributes: BitFlags::empty(),
    })
    .unwrap();
  domain
    .add_method(Method {
      head: factory.create_compound("attack_all", vec![]),
      precondition: vec![factory.create_compound("enemy", vec![factory.create_variable("E")])],
      subtasks: vec![factory.create_compound("attack", vec![factory.create_variable("E")])],
      kind: MethodKind::AnyOf,
      is_default: false,
    })
    .unwrap();

  let mut state = RuleSet::new();
  state.add_fact(factory.create_compound("enemy", vec![factory.create_atom("a")]));
  state.add_fact(factory.create_compound("enemy", vec![factory.create_atom("b")]));

  let mut planner = Planner::new(&domain, &factory, PlannerConfig::default());
  let solution = planner
    .find_first_plan(&state, &[factory.create_compound("attack_all", vec![])])
    .expect("anyOf should plan when at least one branch applies");

  let attacked: Vec<Term> = solution.operators.iter().map(|t| t.args()[0].clone()).collect();
  assert_eq!(attacked.len(), 2);
  assert!(attacked.contains(&factory.create_atom("a")));
  assert!(attacked.contains(&factory.create_atom("b")));

  // A precondition that finds nothing fails the whole method.
  let empty_domain = {
    let mut d = Domain::new();
    d.add_method(Method {
      head: factory.create_compound("attack_all", vec![]),
      precondition: vec![factory.create_compound("enemy", vec![factory.create_variable("E")])],
      subtasks: vec![factory.create_compound("attack", vec![factory.create_variable("E")])],
      kind: MethodKind::AnyOf,
      is_default: false,
    })
    .unwrap();
    d
  };
  let mut planner = Planner::new(&empty_domain, &factory, PlannerConfig::default());
  let result = planner.find_first_plan(&RuleSet::new(), &[factory.create_compound("attack_all", vec![])]);
  assert!(result.is_none());
}

#[test]
fn cut_commits_to_the_first_matching_classification() {
  let factory = factory();
  let mut rule_set = RuleSet::new();

  // cls(X,pos) :- >(X,0), !.
  rule_set.add_rule(Rule {
    head: factory.create_compound("cls", vec![factory.create_variable("X"), factory.create_atom("pos")]),
    body: vec![factory.create_compound(">", vec![factory.create_variable("X"), factory.create_int(0)]), factory.create_atom("!")],
  });
  // cls(X,zero) :- ==(X,0), !.
  rule_set.add_rule(Rule {
    head: factory.create_compound("cls", vec![factory.create_variable("X"), factory.create_atom("zero")]),
    body: vec![factory.create_compound("==", vec![factory.create_variable("X"), factory.create_int(0)]), factory.create_atom("!")],
  });
  // cls(X,neg) :- <(X,0).
  rule_set.add_rule(Rule {
    head: factory.create_compound("cls", vec![factory.create_variable("X"), factory.create_atom("neg")]),
    body: vec![factory.create_compound("<", vec![factory.create_variable("X"), factory.create_int(0)])],
  });

  let goal = factory.create_compound("cls", vec![factory.create_int(3), factory.create_variable("C")]);
  let mut resolver = Resolver::new(&mut rule_set, &factory);
  let solutions = resolver.solve_all(&goal, &Unifier::new());

  assert_eq!(solutions.len(), 1);
  assert_eq!(solutions[0].apply(&factory.create_variable("C"), &factory), factory.create_atom("pos"));
}

#[test]
fn append_enumerates_every_split_of_a_three_element_list() {
  let factory = factory();
  let mut rule_set = RuleSet::new();
  prelude::install(&mut rule_set, &factory);

  let whole = Term::list_from(vec![factory.create_atom("a"), factory.create_atom("b"), factory.create_atom("c")]);
  let goal = factory.create_compound("append", vec![factory.create_variable("L"), factory.create_variable("R"), whole.clone()]);
  let mut resolver = Resolver::new(&mut rule_set, &factory);
  let solutions = resolver.solve_all(&goal, &Unifier::new());

  let splits: Vec<(Term, Term)> = solutions
    .iter()
    .map(|u| (u.apply(&factory.create_variable("L"), &factory), u.apply(&factory.create_variable("R"), &factory)))
    .collect();

  let nil = Term::Atom(Term::nil_atom());
  let a = factory.create_atom("a");
  let b = factory.create_atom("b");
  let c = factory.create_atom("c");
  assert_eq!(
    splits,
    vec![
      (nil.clone(), whole.clone()),
      (Term::list_from(vec![a.clone()]), Term::list_from(vec![b.clone(), c.clone()])),
      (Term::list_from(vec![a.clone(), b.clone()]), Term::list_from(vec![c.clone()])),
      (Term::list_from(vec![a, b, c]), nil),
    ]
  );
}

#[test]
fn member_enumerates_list_elements_in_order() {
  let factory = factory();
  let mut rule_set = RuleSet::new();
  prelude::install(&mut rule_set, &factory);

  let list = Term::list_from(vec![factory.create_atom("a"), factory.create_atom("b"), factory.create_atom("c")]);
  let goal = factory.create_compound("member", vec![factory.create_variable("X"), list]);
  let mut resolver = Resolver::new(&mut rule_set, &factory);
  let solutions = resolver.solve_all(&goal, &Unifier::new());

  let values: Vec<Term> = solutions.iter().map(|u| u.apply(&factory.create_variable("X"), &factory)).collect();
  assert_eq!(values, vec![factory.create_atom("a"), factory.create_atom("b"), factory.create_atom("c")]);
}

#[test]
fn find_all_plans_honors_a_tight_memory_budget() {
  let factory = Factory::new(FactoryConfig { memory_budget_bytes: 64 });
  let mut domain = Domain::new();
  domain
    .add_operator(Operator {
      head: factory.create_compound("step", vec![factory.create_variable("N")]),
      deletions: vec![],
      additions: vec![factory.create_compound("done", vec![factory.create_variable("N")])],
      attributes: BitFlags::empty(),
    })
    .unwrap();

  let state = RuleSet::new();
  let mut planner = Planner::new(&domain, &factory, PlannerConfig::default());
  let tasks: Vec<Term> = (0..50).map(|i| factory.create_compound("step", vec![factory.create_int(i)])).collect();
  let result = planner.find_all_plans(&state, &tasks, &AtomicBool::new(false));

  assert!(result.out_of_memory || result.solutions.len() <= 1);
}
