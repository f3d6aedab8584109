/*!

The goal resolver (spec.md §4.4): stackless SLD resolution with cut and negation-as-failure, over a
[`RuleSet`](crate::ruleset::RuleSet) and the built-in predicate catalog in [`builtins`].

The search itself is an explicit stack of [`Frame`]s rather than a recursive function, so a
resolution in progress is a plain, ownable value the planner can suspend, inspect, and resume
(spec.md §5's "resumable, never recurses unboundedly" requirement) instead of living on the Rust
call stack where only a `panic` or unwinding could interrupt it.

*/

pub mod builtins;

use plexus_abs::log::trace;

use crate::ruleset::RuleSet;
use crate::term::{Factory, Term};
use crate::unify::{compose, make_variables_unique, unify, Unifier};
use crate::util::PersistentList;

use std::rc::Rc;

/// A pending alternative in the search: the goals still to prove, the unifier accumulated to
/// reach this point, and (lazily) the rule candidates still untried for the frame's current goal.
struct Frame {
  goals:       Rc<PersistentList<Term>>,
  unifier:     Unifier,
  candidates:  Option<Vec<Rc<crate::ruleset::Rule>>>,
  /// Stack depth (length of the choice-point stack) at the moment this frame's current goal was
  /// first dispatched. A `!` encountered while solving this goal's body truncates the stack back
  /// to this depth, discarding sibling candidates and any choice points opened while solving
  /// earlier goals in the same clause body (spec.md §4.4 cut semantics).
  cut_barrier: usize,
  /// Monotonically increasing tag used to rename apart each rule application so recursive calls
  /// to the same rule never collide on variable names.
  rename_tag:  u64,
  /// Number of goals already proven to reach this frame, used to track the `furthest_failure`
  /// diagnostic (spec.md §4.4): whichever abandoned branch proved the longest prefix of goals
  /// before running out of alternatives is the one surfaced to the caller.
  depth:       usize,
}

/// Enumerates solutions to `goal` against `rule_set`, threading `factory` for term construction
/// and a monotonically increasing rename counter for variable hygiene. Used both as the top-level
/// entry point (spec.md §6) and recursively by meta-predicates (`findall`, `forall`, `not`, ...).
pub struct Resolver<'a> {
  pub rule_set: &'a mut RuleSet,
  pub factory:  &'a Factory,
  next_tag:     u64,
  /// Longest prefix of goals proven by any abandoned branch so far this call, and the
  /// `failureContext/2` annotations recorded along that branch (spec.md §4.4).
  furthest_failure_index:   usize,
  farthest_failure_context: Vec<(Term, Term)>,
  pending_failure_context:  Vec<(Term, Term)>,
}

impl<'a> Resolver<'a> {
  pub fn new(rule_set: &'a mut RuleSet, factory: &'a Factory) -> Self {
    Resolver {
      rule_set,
      factory,
      next_tag: 0,
      furthest_failure_index: 0,
      farthest_failure_context: Vec::new(),
      pending_failure_context: Vec::new(),
    }
  }

  fn fresh_tag(&mut self) -> u64 {
    self.next_tag += 1;
    self.next_tag
  }

  /// The deepest prefix of goals proven by any abandoned branch, and the diagnostic context
  /// recorded along that branch via `failureContext/2` (spec.md §4.4, §6).
  pub fn furthest_failure(&self) -> (usize, &[(Term, Term)]) {
    (self.furthest_failure_index, &self.farthest_failure_context)
  }

  fn note_backtrack(&mut self, depth: usize) {
    if depth >= self.furthest_failure_index {
      self.furthest_failure_index = depth;
      self.farthest_failure_context = self.pending_failure_context.clone();
    }
  }

  /// Returns every unifier extending `start` that satisfies `goal`, in search order.
  pub fn solve_all(&mut self, goal: &Term, start: &Unifier) -> Vec<Unifier> {
    self.solve_all_conjunction(std::slice::from_ref(goal), start)
  }

  /// Returns the first unifier extending `start` that satisfies `goal`, if any.
  pub fn solve_first(&mut self, goal: &Term, start: &Unifier) -> Option<Unifier> {
    self.solve_first_conjunction(std::slice::from_ref(goal), start)
  }

  /// `true` iff `goal` has at least one solution against the current rule set (spec.md §4.3:
  /// `RuleSet::query(goal, resolver) -> bool`). A convenience over `solve_first` for callers that
  /// only care whether a solution exists, not what it binds.
  pub fn query(&mut self, goal: &Term) -> bool {
    self.solve_first(goal, &Unifier::new()).is_some()
  }

  /// Returns every unifier extending `start` that satisfies the left-to-right conjunction
  /// `goals`, in search order. Used directly by the planner to resolve a method's precondition
  /// (spec.md §4.6), which is a goal list rather than a single goal.
  pub fn solve_all_conjunction(&mut self, goals: &[Term], start: &Unifier) -> Vec<Unifier> {
    let mut resolution = self.resolve(goals, start);
    let mut solutions = Vec::new();
    while let Some(unifier) = resolution.resolve_next(self) {
      solutions.push(unifier);
    }
    solutions
  }

  /// Returns the first unifier extending `start` that satisfies the conjunction `goals`, if any.
  pub fn solve_first_conjunction(&mut self, goals: &[Term], start: &Unifier) -> Option<Unifier> {
    self.resolve(goals, start).resolve_next(self)
  }

  /// Begins a resumable resolution of `goals` against `start` (spec.md §4.4, §6): the returned
  /// [`Resolution`] owns the explicit choice-point stack and is driven one solution at a time by
  /// [`Resolution::resolve_next`], exactly as `resolver.resolve_next(state_ref, resume_token)` is
  /// specified — here `Resolution` *is* the resume token, borrowed back into `self` on each call
  /// rather than threaded as a separate argument, since a `&mut Resolver` already carries the
  /// `RuleSet`/`Factory` the continuation needs.
  pub fn resolve(&mut self, goals: &[Term], start: &Unifier) -> Resolution {
    Resolution {
      stack: vec![Frame {
        goals:       PersistentList::from_vec(goals.to_vec()),
        unifier:     start.clone(),
        candidates:  None,
        cut_barrier: 0,
        rename_tag:  0,
        depth:       0,
      }],
    }
  }
}

/// A suspended SLD search: the explicit choice-point stack left behind the moment a solution was
/// last emitted (or the search began). Calling [`resolve_next`](Resolution::resolve_next) again
/// resumes exactly where the previous call left off, trying the next alternative on backtracking
/// rather than starting over — this is what makes resolution "resumable" per spec.md §4.4/§6
/// instead of an eager all-solutions collector.
pub struct Resolution {
  stack: Vec<Frame>,
}

impl Resolution {
  /// `true` once every alternative has been exhausted and no further call can produce a solution.
  pub fn is_exhausted(&self) -> bool {
    self.stack.is_empty()
  }

  /// Resumes the search, returning the next unifier that satisfies the resolution's goals, or
  /// `None` once every alternative has been exhausted. `resolver` supplies the `RuleSet`/`Factory`
  /// and the `furthest_failure` bookkeeping the continuation reads and writes as it runs.
  pub fn resolve_next(&mut self, resolver: &mut Resolver<'_>) -> Option<Unifier> {
    let stack = &mut self.stack;

    while let Some(mut frame) = stack.pop() {
      let Some((current_goal, rest)) = PersistentList::split_first(&frame.goals) else {
        // Empty resolvent: every goal has been proven. The stack (now holding whatever
        // alternatives remain) is left exactly as-is, so the next `resolve_next` call resumes by
        // backtracking into them rather than re-deriving this solution.
        return Some(frame.unifier);
      };
      let next_depth = frame.depth + 1;

      let resolved_goal = frame.unifier.apply(&current_goal, resolver.factory);
      trace!(goal = %resolved_goal, depth = frame.depth, "resolve node dispatch");

      if let Term::Atom(name) = &resolved_goal {
        if name.as_ref() == "!" {
          stack.truncate(frame.cut_barrier);
          stack.push(Frame {
            goals:       rest,
            unifier:     frame.unifier,
            candidates:  None,
            cut_barrier: frame.cut_barrier,
            rename_tag:  frame.rename_tag,
            depth:       next_depth,
          });
          continue;
        }
        if name.as_ref() == "true" {
          stack.push(Frame {
            goals:       rest,
            unifier:     frame.unifier,
            candidates:  None,
            cut_barrier: frame.cut_barrier,
            rename_tag:  frame.rename_tag,
            depth:       next_depth,
          });
          continue;
        }
        if name.as_ref() == "false" || name.as_ref() == "fail" {
          resolver.note_backtrack(frame.depth);
          continue;
        }
      }

      let Some((functor, arity)) = resolved_goal.functor_arity() else {
        // A variable or number in goal position can never succeed.
        resolver.note_backtrack(frame.depth);
        continue;
      };

      if builtins::is_builtin(&functor, arity) {
        let current_barrier = stack.len();
        let args = resolved_goal.args().to_vec();
        let outcome = builtins::dispatch(&functor, &args, &frame.unifier, &mut ResolverSubSolve { resolver: &mut *resolver });
        match outcome {
          builtins::BuiltinOutcome::Fail => {
            resolver.note_backtrack(frame.depth);
          }
          builtins::BuiltinOutcome::One(extended) => {
            stack.push(Frame {
              goals: rest,
              unifier: extended,
              candidates: None,
              cut_barrier: current_barrier,
              rename_tag: frame.rename_tag,
              depth: next_depth,
            });
          }
          builtins::BuiltinOutcome::Many(extensions) => {
            for extended in extensions.into_iter().rev() {
              stack.push(Frame {
                goals: rest.clone(),
                unifier: extended,
                candidates: None,
                cut_barrier: current_barrier,
                rename_tag: frame.rename_tag,
                depth: next_depth,
              });
            }
          }
        }
        continue;
      }

      if frame.candidates.is_none() {
        // Reversed so `.pop()` below (which takes from the end) yields the first-registered rule
        // first, preserving the document-order search spec.md §4.3 requires.
        let mut matches = resolver.rule_set.all_rules_that_could_unify(&resolved_goal);
        matches.reverse();
        trace!(goal = %resolved_goal, candidate_count = matches.len(), "rule candidates gathered");
        frame.candidates = Some(matches);
      }
      let mut candidates = frame.candidates.take().unwrap();
      let Some(rule) = candidates.pop() else {
        // Out of candidates for this goal: backtrack.
        resolver.note_backtrack(frame.depth);
        continue;
      };
      let barrier_for_this_goal = stack.len();
      stack.push(Frame {
        goals:       frame.goals.clone(),
        unifier:     frame.unifier.clone(),
        candidates:  Some(candidates),
        cut_barrier: frame.cut_barrier,
        rename_tag:  frame.rename_tag,
        depth:       frame.depth,
      });

      let tag = resolver.fresh_tag();
      let renamed_head = make_variables_unique(&rule.head, &format!("{}", tag), resolver.factory);
      let Some(extended) = unify(&renamed_head, &resolved_goal, &frame.unifier) else {
        continue;
      };
      let renamed_body: Vec<Term> =
        rule.body.iter().map(|goal| make_variables_unique(goal, &format!("{}", tag), resolver.factory)).collect();
      let new_goals = PersistentList::prepend_vec(renamed_body, rest);
      stack.push(Frame {
        goals:       new_goals,
        unifier:     extended,
        candidates:  None,
        cut_barrier: barrier_for_this_goal,
        rename_tag:  tag,
        depth:       next_depth,
      });
    }

    None
  }
}

struct ResolverSubSolve<'a, 'b> {
  resolver: &'a mut Resolver<'b>,
}

impl<'a, 'b> builtins::SubSolve for ResolverSubSolve<'a, 'b> {
  fn solve_all(&mut self, goal: &Term, unifier: &Unifier) -> Vec<Unifier> {
    self.resolver.solve_all(goal, unifier)
  }

  fn solve_first(&mut self, goal: &Term, unifier: &Unifier) -> Option<Unifier> {
    self.resolver.solve_first(goal, unifier)
  }

  fn factory(&self) -> &Factory {
    self.resolver.factory
  }

  fn assert_fact(&mut self, fact: Term) {
    self.resolver.rule_set.add_fact(fact);
  }

  fn retract(&mut self, template: &Term) -> bool {
    self.resolver.rule_set.retract(template)
  }

  fn retract_all(&mut self, template: &Term) -> usize {
    self.resolver.rule_set.retract_all(template)
  }

  fn note_failure_context(&mut self, key: Term, value: Term) {
    self.resolver.pending_failure_context.push((key, value));
  }
}

/// Combines a fresh solve's resulting unifier back onto an outer one, used by callers that
/// resolve a subgoal against an already partly-bound unifier and need the combination (rather
/// than the subgoal's unifier alone) to carry forward. Exposed for `planner`'s condition checks.
pub fn combine(outer: &Unifier, inner: &Unifier, factory: &Factory) -> Unifier {
  compose(outer, inner, factory)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ruleset::Rule;
  use crate::term::FactoryConfig;

  fn setup() -> (RuleSet, Factory) {
    (RuleSet::new(), Factory::new(FactoryConfig::default()))
  }

  #[test]
  fn solves_a_simple_fact() {
    let (mut rule_set, factory) = setup();
    rule_set.add_fact(factory.create_compound("likes", vec![factory.create_atom("alice"), factory.create_atom("bob")]));

    let goal = factory.create_compound("likes", vec![factory.create_variable("X"), factory.create_atom("bob")]);
    let mut resolver = Resolver::new(&mut rule_set, &factory);
    let solutions = resolver.solve_all(&goal, &Unifier::new());
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].apply(&factory.create_variable("X"), &factory), factory.create_atom("alice"));
  }

  #[test]
  fn recursive_rule_enumerates_all_matches() {
    let (mut rule_set, factory) = setup();
    rule_set.add_rule(Rule {
      head: factory.create_compound("member", vec![factory.create_variable("X"), Term::cons(factory.create_variable("X"), factory.create_variable("_T"))]),
      body: vec![],
    });
    rule_set.add_rule(Rule {
      head: factory.create_compound("member", vec![factory.create_variable("X"), Term::cons(factory.create_variable("_H"), factory.create_variable("T"))]),
      body: vec![factory.create_compound("member", vec![factory.create_variable("X"), factory.create_variable("T")])],
    });

    let list = Term::list_from(vec![factory.create_atom("a"), factory.create_atom("b"), factory.create_atom("c")]);
    let goal = factory.create_compound("member", vec![factory.create_variable("X"), list]);
    let mut resolver = Resolver::new(&mut rule_set, &factory);
    let solutions = resolver.solve_all(&goal, &Unifier::new());
    assert_eq!(solutions.len(), 3);
  }

  #[test]
  fn cut_discards_remaining_alternatives() {
    let (mut rule_set, factory) = setup();
    rule_set.add_fact(factory.create_compound("color", vec![factory.create_atom("red")]));
    rule_set.add_fact(factory.create_compound("color", vec![factory.create_atom("green")]));
    rule_set.add_rule(Rule {
      head: factory.create_compound("first_color", vec![factory.create_variable("X")]),
      body: vec![factory.create_compound("color", vec![factory.create_variable("X")]), factory.create_atom("!")],
    });

    let goal = factory.create_compound("first_color", vec![factory.create_variable("X")]);
    let mut resolver = Resolver::new(&mut rule_set, &factory);
    let solutions = resolver.solve_all(&goal, &Unifier::new());
    assert_eq!(solutions.len(), 1);
  }

  #[test]
  fn negation_as_failure() {
    let (mut rule_set, factory) = setup();
    rule_set.add_fact(factory.create_compound("bird", vec![factory.create_atom("tweety")]));

    let goal = factory.create_compound("not", vec![factory.create_compound("bird", vec![factory.create_atom("rex")])]);
    let mut resolver = Resolver::new(&mut rule_set, &factory);
    assert!(resolver.solve_first(&goal, &Unifier::new()).is_some());

    let goal2 = factory.create_compound("not", vec![factory.create_compound("bird", vec![factory.create_atom("tweety")])]);
    assert!(resolver.solve_first(&goal2, &Unifier::new()).is_none());
  }

  #[test]
  fn resolution_resumes_one_solution_at_a_time() {
    let (mut rule_set, factory) = setup();
    rule_set.add_fact(factory.create_compound("color", vec![factory.create_atom("red")]));
    rule_set.add_fact(factory.create_compound("color", vec![factory.create_atom("green")]));
    rule_set.add_fact(factory.create_compound("color", vec![factory.create_atom("blue")]));

    let goal = factory.create_compound("color", vec![factory.create_variable("X")]);
    let mut resolver = Resolver::new(&mut rule_set, &factory);
    let mut resolution = resolver.resolve(std::slice::from_ref(&goal), &Unifier::new());

    let first = resolution.resolve_next(&mut resolver).expect("first solution");
    assert_eq!(first.apply(&factory.create_variable("X"), &factory), factory.create_atom("red"));
    assert!(!resolution.is_exhausted());

    let second = resolution.resolve_next(&mut resolver).expect("second solution");
    assert_eq!(second.apply(&factory.create_variable("X"), &factory), factory.create_atom("green"));

    let third = resolution.resolve_next(&mut resolver).expect("third solution");
    assert_eq!(third.apply(&factory.create_variable("X"), &factory), factory.create_atom("blue"));

    assert!(resolution.resolve_next(&mut resolver).is_none());
    assert!(resolution.is_exhausted());
  }

  #[test]
  fn arithmetic_is_and_comparison() {
    let (mut rule_set, factory) = setup();
    let goal = factory.create_compound(
      "is",
      vec![factory.create_variable("X"), factory.create_compound("+", vec![factory.create_int(2), factory.create_int(3)])],
    );
    let mut resolver = Resolver::new(&mut rule_set, &factory);
    let solution = resolver.solve_first(&goal, &Unifier::new()).expect("arithmetic should succeed");
    assert_eq!(solution.apply(&factory.create_variable("X"), &factory), factory.create_int(5));
  }
}
