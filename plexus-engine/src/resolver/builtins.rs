//! The built-in predicate catalog (spec.md §4.4). Every built-in here is semidet or multi-solution
//! but never itself introduces a choice point over *user* clauses — that's the resolver main
//! loop's job.

use plexus_abs::IString;

use crate::term::{eval, numeric_value, Factory, Term};
use crate::unify::{unify, Unifier};

/// The result of attempting a built-in call.
pub enum BuiltinOutcome {
  /// The built-in failed; backtrack.
  Fail,
  /// The built-in succeeded exactly once, extending the unifier.
  One(Unifier),
  /// The built-in succeeded with more than one extension (e.g. `distinct/2` re-enumerating a
  /// goal's unique solutions, or `sortBy/3` re-enumerating them in sorted order); each is tried in
  /// order on backtracking.
  Many(Vec<Unifier>),
}

/// Everything a built-in needs from the resolver that's driving it: recursive sub-solving for the
/// meta-predicates (`findall`, `forall`, `not`, `first`, `distinct`, `sortBy`), the shared term
/// factory, and mutable access to the knowledge base for `assert`/`retract`/`retractall`. Routing
/// all of this through one trait object (instead of passing `&mut RuleSet` and `&Factory`
/// alongside a `&mut dyn SubSolve` into the same call) keeps there from ever being two live
/// mutable borrows of the same `Resolver`.
pub trait SubSolve {
  /// Returns every unifier extending `unifier` that solves `goal`, in search order.
  fn solve_all(&mut self, goal: &Term, unifier: &Unifier) -> Vec<Unifier>;

  /// Returns the first unifier extending `unifier` that solves `goal`, if any, without exploring
  /// the rest.
  fn solve_first(&mut self, goal: &Term, unifier: &Unifier) -> Option<Unifier> {
    self.solve_all(goal, unifier).into_iter().next()
  }

  fn factory(&self) -> &Factory;
  fn assert_fact(&mut self, fact: Term);
  fn retract(&mut self, template: &Term) -> bool;
  fn retract_all(&mut self, template: &Term) -> usize;

  /// Records a `failureContext/2` annotation at the current point in the search. Purely
  /// diagnostic (spec.md §4.4): it never affects whether the enclosing goal succeeds.
  fn note_failure_context(&mut self, _key: Term, _value: Term) {}
}

pub fn is_builtin(functor: &str, arity: usize) -> bool {
  matches!(
    (functor, arity),
    ("=", 2)
      | ("==", 2)
      | ("\\==", 2)
      | ("<", 2)
      | (">", 2)
      | ("=<", 2)
      | (">=", 2)
      | ("is", 2)
      | ("not", 1)
      | ("\\+", 1)
      | ("first", 1)
      | ("forall", 2)
      | ("findall", 3)
      | ("count", 2)
      | ("distinct", 2)
      | ("sortBy", 3)
      | ("assert", 1)
      | ("retract", 1)
      | ("retractall", 1)
      | ("atom_chars", 2)
      | ("atom_concat", 3)
      | ("downcase_atom", 2)
      | ("atomic", 1)
      | ("failureContext", 2)
  )
}

pub fn dispatch(functor: &str, args: &[Term], unifier: &Unifier, solver: &mut dyn SubSolve) -> BuiltinOutcome {
  match (functor, args.len()) {
    ("=", 2) => unify_outcome(&args[0], &args[1], unifier),
    ("==", 2) => {
      let factory = solver.factory();
      if unifier.apply(&args[0], factory) == unifier.apply(&args[1], factory) {
        BuiltinOutcome::One(unifier.clone())
      } else {
        BuiltinOutcome::Fail
      }
    }
    ("\\==", 2) => {
      let factory = solver.factory();
      if unifier.apply(&args[0], factory) != unifier.apply(&args[1], factory) {
        BuiltinOutcome::One(unifier.clone())
      } else {
        BuiltinOutcome::Fail
      }
    }
    ("<", 2) | (">", 2) | ("=<", 2) | (">=", 2) => {
      let left = unifier.apply(&args[0], solver.factory());
      let right = unifier.apply(&args[1], solver.factory());
      compare(functor, &left, &right, unifier)
    }
    ("is", 2) => {
      let expr = unifier.apply(&args[1], solver.factory());
      match eval(&expr) {
        Ok(value) => unify_outcome(&args[0], &value, unifier),
        Err(_) => BuiltinOutcome::Fail,
      }
    }
    ("not", 1) | ("\\+", 1) => {
      if solver.solve_first(&args[0], unifier).is_some() {
        BuiltinOutcome::Fail
      } else {
        BuiltinOutcome::One(unifier.clone())
      }
    }
    ("first", 1) => match solver.solve_first(&args[0], unifier) {
      Some(extended) => BuiltinOutcome::One(extended),
      None => BuiltinOutcome::Fail,
    },
    ("forall", 2) => {
      let conditions = solver.solve_all(&args[0], unifier);
      for condition_unifier in &conditions {
        if solver.solve_first(&args[1], condition_unifier).is_none() {
          return BuiltinOutcome::Fail;
        }
      }
      BuiltinOutcome::One(unifier.clone())
    }
    ("findall", 3) => {
      let solutions = solver.solve_all(&args[1], unifier);
      let factory = solver.factory();
      let items: Vec<Term> = solutions.iter().map(|sol| sol.apply(&args[0], factory)).collect();
      let list = Term::list_from(items);
      unify_outcome(&args[2], &list, unifier)
    }
    ("count", 2) => {
      let count = solver.solve_all(&args[0], unifier).len() as i64;
      unify_outcome(&args[1], &Term::Int(count), unifier)
    }
    // distinct(K, G): re-enumerate G's solutions, keeping the first with each distinct
    // instantiation of the key term K (spec.md §4.4) rather than deduping on G's own bindings.
    ("distinct", 2) => {
      let solutions = solver.solve_all(&args[1], unifier);
      let factory = solver.factory();
      let mut seen = Vec::new();
      let mut unique = Vec::new();
      for candidate in solutions {
        let key = candidate.apply(&args[0], factory);
        if !seen.contains(&key) {
          seen.push(key);
          unique.push(candidate);
        }
      }
      if unique.is_empty() {
        BuiltinOutcome::Fail
      } else {
        BuiltinOutcome::Many(unique)
      }
    }
    // sortBy(K, Cmp, G): re-enumerate G's solutions ordered by the key term K, under comparator
    // Cmp (the atom '<' or '>') rather than binding an output list.
    ("sortBy", 3) => {
      let solutions = solver.solve_all(&args[2], unifier);
      let factory = solver.factory();
      let descending = matches!(unifier.apply(&args[1], factory), Term::Atom(name) if name == IString::from(">"));
      let mut keyed: Vec<(Term, Unifier)> = solutions.into_iter().map(|sol| (sol.apply(&args[0], factory), sol)).collect();
      keyed.sort_by(|a, b| if descending { b.0.cmp(&a.0) } else { a.0.cmp(&b.0) });
      let sorted: Vec<Unifier> = keyed.into_iter().map(|(_, sol)| sol).collect();
      if sorted.is_empty() {
        BuiltinOutcome::Fail
      } else {
        BuiltinOutcome::Many(sorted)
      }
    }
    ("assert", 1) => {
      let fact = unifier.apply(&args[0], solver.factory());
      solver.assert_fact(fact);
      BuiltinOutcome::One(unifier.clone())
    }
    ("retract", 1) => {
      let template = unifier.apply(&args[0], solver.factory());
      solver.retract(&template);
      BuiltinOutcome::One(unifier.clone())
    }
    ("retractall", 1) => {
      let template = unifier.apply(&args[0], solver.factory());
      solver.retract_all(&template);
      BuiltinOutcome::One(unifier.clone())
    }
    ("atom_chars", 2) => {
      let atom_value = unifier.apply(&args[0], solver.factory());
      match &atom_value {
        Term::Atom(name) => {
          let chars: Vec<Term> = name.chars().map(|c| solver.factory().create_atom(c.to_string())).collect();
          let list = Term::list_from(chars);
          unify_outcome(&args[1], &list, unifier)
        }
        _ => BuiltinOutcome::Fail,
      }
    }
    ("atom_concat", 3) => {
      let a_value = unifier.apply(&args[0], solver.factory());
      let b_value = unifier.apply(&args[1], solver.factory());
      match (&a_value, &b_value) {
        (Term::Atom(left), Term::Atom(right)) => {
          let joined = solver.factory().create_atom(format!("{}{}", left, right));
          unify_outcome(&args[2], &joined, unifier)
        }
        // Reverse/split mode (both outputs unbound) is unsupported, per DESIGN.md.
        _ => BuiltinOutcome::Fail,
      }
    }
    ("downcase_atom", 2) => {
      let source = unifier.apply(&args[0], solver.factory());
      match &source {
        Term::Atom(name) => {
          let lowered = solver.factory().create_atom(name.to_lowercase());
          unify_outcome(&args[1], &lowered, unifier)
        }
        _ => BuiltinOutcome::Fail,
      }
    }
    ("atomic", 1) => {
      if unifier.apply(&args[0], solver.factory()).is_atomic() {
        BuiltinOutcome::One(unifier.clone())
      } else {
        BuiltinOutcome::Fail
      }
    }
    // Diagnostic hint only (see DESIGN.md): always succeeds without binding. `failureContext/2`
    // exists so a domain author can annotate *why* a branch might fail for tooling, not to change
    // control flow; the resolver records the (k, v) pair as the current "farthest failure"
    // context whenever this goal lies on the deepest prefix reached so far (see `Resolver`).
    ("failureContext", 2) => {
      let key = unifier.apply(&args[0], solver.factory());
      let value = unifier.apply(&args[1], solver.factory());
      solver.note_failure_context(key, value);
      BuiltinOutcome::One(unifier.clone())
    }
    _ => BuiltinOutcome::Fail,
  }
}

fn unify_outcome(a: &Term, b: &Term, unifier: &Unifier) -> BuiltinOutcome {
  match unify(a, b, unifier) {
    Some(extended) => BuiltinOutcome::One(extended),
    None => BuiltinOutcome::Fail,
  }
}

fn compare(op: &str, lhs: &Term, rhs: &Term, unifier: &Unifier) -> BuiltinOutcome {
  // spec.md §4.4: "Evaluate both sides, compare numerically" — `numeric_value` promotes both
  // operands to `f64` rather than using `Term`'s standard order (`term::order`), which ranks every
  // `Float` below every `Int` regardless of value and would make e.g. `<(2, 2.5)` fail.
  let (Ok(left), Ok(right)) = (eval(lhs).and_then(|t| numeric_value(&t)), eval(rhs).and_then(|t| numeric_value(&t))) else {
    return BuiltinOutcome::Fail;
  };
  let holds = match op {
    "<" => left < right,
    ">" => left > right,
    "=<" => left <= right,
    ">=" => left >= right,
    _ => unreachable!("compare only called for the four arithmetic comparators"),
  };
  if holds {
    BuiltinOutcome::One(unifier.clone())
  } else {
    BuiltinOutcome::Fail
  }
}
