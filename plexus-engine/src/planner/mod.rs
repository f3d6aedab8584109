/*!

The HTN planner (spec.md §4.6): a stackless state machine that decomposes compound tasks via
methods, applies primitive operators, and handles the `try`/`anyOf`/`allOf`/`else` constructs under
a memory budget.

Like [`crate::resolver::Resolver`], the search is an explicit `Vec<Frame>` rather than native
recursion, so a deep decomposition chain costs heap, not call-stack depth. The task queue itself is
a [`crate::util::PersistentList`] of [`PlanStep`]s — real domain tasks plus a handful of
planner-injected bookkeeping steps (`MarkSuccess`, `RequireAny`, `RestoreCutBarrier`, `TryBranch`)
that implement `try`/`anyOf`'s soft-cut semantics without needing a second, parallel control
mechanism: popping one of these steps is just as cheap as popping an ordinary task.

*/

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use plexus_abs::log::{debug, error, trace, warn};

use crate::domain::{Domain, Method, MethodKind, Operator};
use crate::error::EngineError;
use crate::resolver::Resolver;
use crate::ruleset::RuleSet;
use crate::term::{Factory, Term};
use crate::unify::{make_variables_unique, unify, Unifier};
use crate::util::PersistentList;

/// Opt-in bookkeeping (spec.md §4.6: "decomposition tree"). Recording it costs an `O(depth)` clone
/// per step when enabled — see [`Planner::extend_trail`] — so it's off unless
/// [`PlannerConfig::emit_decomposition_tree`] asks for it, and the type collapses to a
/// zero-size `()` entirely when the `decomposition_tree` Cargo feature is off, so the bookkeeping
/// cost disappears from the binary rather than merely going unused.
#[cfg(feature = "decomposition_tree")]
type Trail = Rc<Vec<DecompositionNode>>;
#[cfg(not(feature = "decomposition_tree"))]
type Trail = ();

#[cfg(feature = "decomposition_tree")]
#[derive(Debug, Clone)]
pub struct DecompositionNode {
  pub node_id:   usize,
  pub parent_id: Option<usize>,
  pub task:      Term,
  pub choice:    DecompositionChoice,
  pub bindings:  Unifier,
}

#[cfg(feature = "decomposition_tree")]
#[derive(Debug, Clone)]
pub enum DecompositionChoice {
  Method { head: Term, kind: MethodKind },
  Operator { head: Term },
}

#[cfg(feature = "decomposition_tree")]
#[derive(Debug, Clone, Default)]
pub struct DecompositionTree {
  pub nodes: Vec<DecompositionNode>,
}

#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
  /// Gated on the `decomposition_tree` Cargo feature as well as this flag: both must agree before
  /// a trail is recorded.
  #[cfg(feature = "decomposition_tree")]
  pub emit_decomposition_tree: bool,
  /// Ergonomic cap so `find_all_plans` has a non-streaming terminal case distinct from
  /// `find_first_plan`'s implicit cap of one.
  pub max_solutions: Option<usize>,
}

impl Default for PlannerConfig {
  fn default() -> Self {
    PlannerConfig {
      #[cfg(feature = "decomposition_tree")]
      emit_decomposition_tree: false,
      max_solutions: None,
    }
  }
}

/// One completed decomposition (spec.md §3): the ground operators applied, in order, and the
/// resulting world state. Doesn't derive `Debug` because [`RuleSet`] doesn't — printing a solution
/// for diagnostics should go through `operators`/`final_state` directly rather than a dump of the
/// COW delta's internals.
#[derive(Clone)]
pub struct Solution {
  pub operators:   Vec<Term>,
  pub final_state: RuleSet,
  #[cfg(feature = "decomposition_tree")]
  pub tree: Option<DecompositionTree>,
}

/// The return shape of [`Planner::find_all_plans`] (spec.md §6).
pub struct FindPlansResult {
  pub solutions:     Vec<Solution>,
  pub out_of_memory: bool,
  pub aborted:       bool,
  /// The longest prefix of ground operators reached by any abandoned branch before it ran out of
  /// alternatives, and that prefix itself — the planner's analogue of the resolver's
  /// `furthest_failure` (spec.md §4.4, §6).
  pub furthest_failure: (usize, Vec<Term>),
  /// `LogicError` conditions (spec.md §7): a domain-referenced task head with neither a method nor
  /// an operator, or an operator whose deletions/additions didn't come out ground. Each abandons
  /// only the branch it occurred on — the search still backtracks and keeps looking for other
  /// solutions — but, unlike an ordinary `UnificationFail`/`NoMatchingRule`, it's collected here so
  /// a caller can tell "nothing matched this task anywhere in the domain" apart from "every branch
  /// that did match still failed downstream."
  pub logic_errors: Vec<EngineError>,
}

/// A step in a plan node's task queue. `Task` is an ordinary domain task (an operator call, a
/// method head, `!`, or a domain-authored `try(...)`); the rest are injected by `try`/`anyOf`
/// expansion and never appear in domain text.
enum PlanStep {
  Task(Term),
  /// Injected at the tail of a `try`/`anyOf` branch's own task list: reaching it means the branch
  /// ran to completion, so its private success flag flips before falling through to whatever
  /// follows.
  MarkSuccess(Rc<Cell<bool>>),
  /// Injected after an `anyOf` method's concatenated branches: fails the whole chain unless at
  /// least one branch's flag is set.
  RequireAny(Rc<Vec<Rc<Cell<bool>>>>),
  /// Injected at the point a method's own subtask stretch ends, restoring the cut barrier `!`
  /// should honor once execution moves from this method's body into whatever follows it.
  RestoreCutBarrier(usize),
  /// Injected in place of a popped `try(T)` task: reifies `T`'s wrapped items plus a fresh private
  /// success flag as a single step so the generic handling below runs uniformly whether the
  /// branch came from domain-authored `try` or planner-generated `anyOf` expansion.
  TryBranch(Vec<Term>, Rc<Cell<bool>>),
}

type Steps = PersistentList<PlanStep>;

struct TaskFrame {
  state:       RuleSet,
  steps:       Rc<Steps>,
  operators:   Vec<Term>,
  /// Stack length to truncate back to on `!` (spec.md §4.6: cut discards both the enclosing
  /// method's remaining candidates and its remaining precondition-resolution alternatives).
  cut_barrier: usize,
  trail:       Trail,
}

/// The continuation left on the stack while a task's method candidates are tried one at a time —
/// the planner's analogue of the resolver's rule-candidate frame.
struct MethodFrame<'a> {
  state:        RuleSet,
  rest:         Rc<Steps>,
  operators:    Vec<Term>,
  cut_barrier:  usize,
  task:         Term,
  /// Remaining candidates, popped from the end; stored reversed (like the resolver's rule
  /// candidates) so `.pop()` yields the earliest-registered method first.
  candidates:   Vec<&'a Method>,
  /// Did any earlier non-`else` candidate's precondition resolve to at least one solution? An
  /// `else` candidate is skipped once this is true (spec.md §4.6, §8 scenario 3).
  had_solution: bool,
  trail:        Trail,
}

/// Sits below a `try`/`anyOf` branch's own exploration; popped only once that entire subtree has
/// been exhausted by backtracking, at which point the branch's flag tells us whether the no-op
/// fallback is still owed.
struct TryFallbackFrame {
  state:       RuleSet,
  rest:        Rc<Steps>,
  operators:   Vec<Term>,
  cut_barrier: usize,
  flag:        Rc<Cell<bool>>,
  trail:       Trail,
}

enum Frame<'a> {
  Task(TaskFrame),
  Method(MethodFrame<'a>),
  TryFallback(TryFallbackFrame),
}

enum OperatorApplyError {
  HeadMismatch,
  NonGroundInstantiation,
}

/// Decomposes tasks against a [`Domain`], resolving method preconditions through a
/// [`Resolver`] built fresh over each plan node's own [`RuleSet`] (spec.md §4.6).
pub struct Planner<'a> {
  domain: &'a Domain,
  factory: &'a Factory,
  config: PlannerConfig,
  next_tag: u64,
  furthest_failure_index: usize,
  furthest_failure_tasks: Vec<Term>,
}

impl<'a> Planner<'a> {
  pub fn new(domain: &'a Domain, factory: &'a Factory, config: PlannerConfig) -> Self {
    Planner { domain, factory, config, next_tag: 0, furthest_failure_index: 0, furthest_failure_tasks: Vec::new() }
  }

  fn fresh_tag(&mut self) -> u64 {
    self.next_tag += 1;
    self.next_tag
  }

  fn note_backtrack(&mut self, operators: &[Term]) {
    let depth = operators.len();
    if depth >= self.furthest_failure_index {
      self.furthest_failure_index = depth;
      self.furthest_failure_tasks = operators.to_vec();
    }
  }

  #[cfg(feature = "decomposition_tree")]
  fn extend_trail(&self, trail: &Trail, task: &Term, choice: DecompositionChoice, bindings: &Unifier) -> Trail {
    if !self.config.emit_decomposition_tree {
      return trail.clone();
    }
    let node_id = trail.len();
    let parent_id = if node_id == 0 { None } else { Some(node_id - 1) };
    let mut nodes = trail.as_ref().clone();
    nodes.push(DecompositionNode { node_id, parent_id, task: task.clone(), choice, bindings: bindings.clone() });
    Rc::new(nodes)
  }

  #[cfg(not(feature = "decomposition_tree"))]
  fn extend_trail(&self, trail: &Trail, _task: &Term, _choice: (), _bindings: &Unifier) -> Trail {
    *trail
  }

  /// Applies `operator` against `task` (spec.md §4.5, §4.6): renames the operator apart, unifies
  /// its head with `task`, instantiates its deletions/additions, and rejects a non-ground result
  /// rather than mutating `state` with an unbound variable in it.
  fn apply_operator(&mut self, state: &mut RuleSet, operator: &Operator, task: &Term) -> Result<Option<Term>, OperatorApplyError> {
    let tag = self.fresh_tag();
    let tagged = format!("op{}", tag);
    let renamed_head = make_variables_unique(&operator.head, &tagged, self.factory);
    let Some(unifier) = unify(&renamed_head, task, &Unifier::new()) else {
      return Err(OperatorApplyError::HeadMismatch);
    };

    let deletions: Vec<Term> = operator
      .deletions
      .iter()
      .map(|t| make_variables_unique(t, &tagged, self.factory))
      .map(|t| unifier.apply(&t, self.factory))
      .collect();
    let additions: Vec<Term> = operator
      .additions
      .iter()
      .map(|t| make_variables_unique(t, &tagged, self.factory))
      .map(|t| unifier.apply(&t, self.factory))
      .collect();
    if !deletions.iter().all(Term::is_ground) || !additions.iter().all(Term::is_ground) {
      return Err(OperatorApplyError::NonGroundInstantiation);
    }

    state.update(&deletions, &additions);
    Ok(if operator.is_hidden() { None } else { Some(task.clone()) })
  }

  /// Drives the explicit-stack search. `max_solutions` overrides `self.config.max_solutions` for
  /// this call only (`find_first_plan` asks for exactly one without mutating the planner's own
  /// configuration).
  fn run(&mut self, initial_state: &RuleSet, tasks: &[Term], abort: Option<&AtomicBool>, max_solutions: Option<usize>) -> FindPlansResult {
    let mut solutions: Vec<Solution> = Vec::new();
    let mut out_of_memory = false;
    let mut aborted = false;
    let mut logic_errors: Vec<EngineError> = Vec::new();

    let steps = PersistentList::from_vec(tasks.iter().cloned().map(PlanStep::Task).collect());
    let mut stack: Vec<Frame<'a>> =
      vec![Frame::Task(TaskFrame { state: initial_state.fork(), steps, operators: Vec::new(), cut_barrier: 0, trail: Trail::default() })];

    while let Some(frame) = stack.pop() {
      if self.factory.out_of_memory() {
        debug!("factory memory budget exceeded; returning best partial result");
        out_of_memory = true;
        break;
      }
      if let Some(flag) = abort {
        if flag.load(Ordering::Relaxed) {
          debug!("planning aborted by caller; returning best partial result");
          aborted = true;
          break;
        }
      }

      match frame {
        Frame::Task(tf) => {
          let TaskFrame { mut state, steps, mut operators, cut_barrier, trail } = tf;
          let Some((step, rest)) = PersistentList::split_first(&steps) else {
            trace!(operator_count = operators.len(), "plan complete");
            let solution = Solution {
              operators: operators.clone(),
              final_state: state.clone(),
              #[cfg(feature = "decomposition_tree")]
              tree: if self.config.emit_decomposition_tree { Some(DecompositionTree { nodes: trail.as_ref().clone() }) } else { None },
            };
            solutions.push(solution);
            if let Some(limit) = max_solutions {
              if solutions.len() >= limit {
                break;
              }
            }
            continue;
          };

          match step {
            PlanStep::MarkSuccess(flag) => {
              flag.set(true);
              stack.push(Frame::Task(TaskFrame { state, steps: rest, operators, cut_barrier, trail }));
            }
            PlanStep::RequireAny(flags) => {
              if flags.iter().any(|f| f.get()) {
                stack.push(Frame::Task(TaskFrame { state, steps: rest, operators, cut_barrier, trail }));
              } else {
                self.note_backtrack(&operators);
              }
            }
            PlanStep::RestoreCutBarrier(barrier) => {
              stack.push(Frame::Task(TaskFrame { state, steps: rest, operators, cut_barrier: barrier, trail }));
            }
            PlanStep::TryBranch(items, flag) => {
              let branch_state = state.fork();
              let branch_operators = operators.clone();
              let branch_trail = trail.clone();
              stack.push(Frame::TryFallback(TryFallbackFrame { state, rest: rest.clone(), operators, cut_barrier, flag: flag.clone(), trail }));

              let mut branch_steps: Vec<PlanStep> = items.into_iter().map(PlanStep::Task).collect();
              branch_steps.push(PlanStep::MarkSuccess(flag));
              let combined = PersistentList::prepend_vec(branch_steps, rest);
              stack.push(Frame::Task(TaskFrame { state: branch_state, steps: combined, operators: branch_operators, cut_barrier, trail: branch_trail }));
            }
            PlanStep::Task(term) => {
              trace!(task = %term, "plan node dispatch");

              if let Term::Atom(name) = &term {
                if name.as_ref() == "!" {
                  stack.truncate(cut_barrier.min(stack.len()));
                  stack.push(Frame::Task(TaskFrame { state, steps: rest, operators, cut_barrier, trail }));
                  continue;
                }
              }

              if let Some((functor, arity)) = term.functor_arity() {
                if functor.as_ref() == "try" && arity == 1 {
                  let wrapped = &term.args()[0];
                  let items = wrapped.as_list().unwrap_or_else(|| vec![wrapped.clone()]);
                  let flag = Rc::new(Cell::new(false));
                  let reentry = PersistentList::prepend_vec(vec![PlanStep::TryBranch(items, flag)], rest);
                  stack.push(Frame::Task(TaskFrame { state, steps: reentry, operators, cut_barrier, trail }));
                  continue;
                }
              }

              if let Some(operator) = self.domain.operator_for(&term) {
                match self.apply_operator(&mut state, operator, &term) {
                  Ok(ground_task) => {
                    if let Some(ground_task) = ground_task {
                      operators.push(ground_task);
                    }
                    let operator_head = operator.head.clone();
                    let trail = self.extend_trail(&trail, &term, DecompositionChoice::Operator { head: operator_head }, &Unifier::new());
                    stack.push(Frame::Task(TaskFrame { state, steps: rest, operators, cut_barrier, trail }));
                  }
                  Err(OperatorApplyError::HeadMismatch) => {
                    warn!(task = %term, "operator head did not unify with ground task");
                    self.note_backtrack(&operators);
                  }
                  Err(OperatorApplyError::NonGroundInstantiation) => {
                    warn!(task = %term, "operator rejected a non-ground deletion/addition instantiation");
                    if let Some(functor) = term.functor() {
                      logic_errors.push(EngineError::OperatorInstantiationFailed(functor, term.to_string()));
                    }
                    self.note_backtrack(&operators);
                  }
                }
                continue;
              }

              let methods = self.domain.methods_for(&term);
              if !methods.is_empty() {
                let mut candidates: Vec<&'a Method> = methods.iter().collect();
                candidates.reverse();
                stack.push(Frame::Method(MethodFrame { state, rest, operators, cut_barrier, task: term, candidates, had_solution: false, trail }));
                continue;
              }

              error!(task = %term, "domain has no method or operator for this task head");
              if let Some((functor, arity)) = term.functor_arity() {
                logic_errors.push(EngineError::UndefinedTaskHead(functor, arity));
              }
              self.note_backtrack(&operators);
            }
          }
        }

        Frame::Method(mut mf) => {
          let Some(method) = mf.candidates.pop() else {
            self.note_backtrack(&mf.operators);
            continue;
          };

          if method.is_default && mf.had_solution {
            debug!(task = %mf.task, "skipping else method: an earlier sibling already applied");
            stack.push(Frame::Method(mf));
            continue;
          }

          let tag = self.fresh_tag();
          let tagged = format!("m{}", tag);
          let renamed_head = make_variables_unique(&method.head, &tagged, self.factory);
          let Some(head_unifier) = unify(&renamed_head, &mf.task, &Unifier::new()) else {
            stack.push(Frame::Method(mf));
            continue;
          };
          let renamed_precondition: Vec<Term> = method.precondition.iter().map(|g| make_variables_unique(g, &tagged, self.factory)).collect();
          let renamed_subtasks: Vec<Term> = method.subtasks.iter().map(|t| make_variables_unique(t, &tagged, self.factory)).collect();

          let condition_resolutions = {
            let mut resolver = Resolver::new(&mut mf.state, self.factory);
            resolver.solve_all_conjunction(&renamed_precondition, &head_unifier)
          };
          if !condition_resolutions.is_empty() {
            mf.had_solution = true;
          }

          let MethodFrame { state, rest, operators, cut_barrier, task, candidates, had_solution, trail } = mf;

          let barrier = stack.len();
          stack.push(Frame::Method(MethodFrame {
            state: state.clone(),
            rest: rest.clone(),
            operators: operators.clone(),
            cut_barrier,
            task: task.clone(),
            candidates,
            had_solution,
            trail: trail.clone(),
          }));

          if condition_resolutions.is_empty() {
            continue;
          }

          match method.kind {
            MethodKind::Normal => {
              for resolution in condition_resolutions.iter().rev() {
                let forked = state.fork();
                let mut steps_vec: Vec<PlanStep> = renamed_subtasks.iter().map(|t| PlanStep::Task(resolution.apply(t, self.factory))).collect();
                steps_vec.push(PlanStep::RestoreCutBarrier(cut_barrier));
                let combined = PersistentList::prepend_vec(steps_vec, rest.clone());
                let branch_trail =
                  self.extend_trail(&trail, &task, DecompositionChoice::Method { head: method.head.clone(), kind: method.kind }, resolution);
                stack.push(Frame::Task(TaskFrame { state: forked, steps: combined, operators: operators.clone(), cut_barrier: barrier, trail: branch_trail }));
              }
            }
            MethodKind::AllOf => {
              let forked = state.fork();
              let mut steps_vec: Vec<PlanStep> = Vec::new();
              for resolution in &condition_resolutions {
                for t in &renamed_subtasks {
                  steps_vec.push(PlanStep::Task(resolution.apply(t, self.factory)));
                }
              }
              steps_vec.push(PlanStep::RestoreCutBarrier(cut_barrier));
              let combined = PersistentList::prepend_vec(steps_vec, rest.clone());
              let branch_trail =
                self.extend_trail(&trail, &task, DecompositionChoice::Method { head: method.head.clone(), kind: method.kind }, &head_unifier);
              stack.push(Frame::Task(TaskFrame { state: forked, steps: combined, operators: operators.clone(), cut_barrier: barrier, trail: branch_trail }));
            }
            MethodKind::AnyOf => {
              let forked = state.fork();
              let mut steps_vec: Vec<PlanStep> = Vec::new();
              let mut flags = Vec::with_capacity(condition_resolutions.len());
              for resolution in &condition_resolutions {
                let flag = Rc::new(Cell::new(false));
                let items: Vec<Term> = renamed_subtasks.iter().map(|t| resolution.apply(t, self.factory)).collect();
                steps_vec.push(PlanStep::TryBranch(items, flag.clone()));
                flags.push(flag);
              }
              steps_vec.push(PlanStep::RequireAny(Rc::new(flags)));
              steps_vec.push(PlanStep::RestoreCutBarrier(cut_barrier));
              let combined = PersistentList::prepend_vec(steps_vec, rest.clone());
              let branch_trail =
                self.extend_trail(&trail, &task, DecompositionChoice::Method { head: method.head.clone(), kind: method.kind }, &head_unifier);
              stack.push(Frame::Task(TaskFrame { state: forked, steps: combined, operators: operators.clone(), cut_barrier: barrier, trail: branch_trail }));
            }
          }
        }

        Frame::TryFallback(tr) => {
          if !tr.flag.get() {
            stack.push(Frame::Task(TaskFrame { state: tr.state, steps: tr.rest, operators: tr.operators, cut_barrier: tr.cut_barrier, trail: tr.trail }));
          }
        }
      }
    }

    FindPlansResult {
      solutions,
      out_of_memory,
      aborted,
      furthest_failure: (self.furthest_failure_index, self.furthest_failure_tasks.clone()),
      logic_errors,
    }
  }

  /// Enumerates every plan for `tasks` starting at `initial_state`, polling `abort` cooperatively
  /// (spec.md §5) and honoring `self.config.max_solutions` as a non-streaming terminal case.
  pub fn find_all_plans(&mut self, initial_state: &RuleSet, tasks: &[Term], abort: &AtomicBool) -> FindPlansResult {
    self.run(initial_state, tasks, Some(abort), self.config.max_solutions)
  }

  /// The first plan for `tasks`, without exploring the rest of the search space.
  pub fn find_first_plan(&mut self, initial_state: &RuleSet, tasks: &[Term]) -> Option<Solution> {
    self.run(initial_state, tasks, None, Some(1)).solutions.into_iter().next()
  }

  /// Commits `solution` onto `state` by replaying its ground operators (spec.md §6). Unlike the
  /// planning run that produced `solution`, this never forks on alternatives — each operator is
  /// applied exactly once, in order, to the same growing `RuleSet`.
  pub fn apply_solution(&mut self, state: &RuleSet, solution: &Solution) -> RuleSet {
    let mut result = state.fork();
    for operator_term in &solution.operators {
      if let Some(operator) = self.domain.operator_for(operator_term) {
        let _ = self.apply_operator(&mut result, operator, operator_term);
      }
    }
    result
  }
}

#[cfg(feature = "decomposition_tree")]
impl Solution {
  pub fn decomposition_tree(&self) -> Option<&DecompositionTree> {
    self.tree.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::OperatorAttribute;
  use crate::term::FactoryConfig;
  use enumflags2::BitFlags;

  fn setup() -> Factory {
    Factory::new(FactoryConfig::default())
  }

  #[test]
  fn a_single_applicable_operator_produces_one_plan() {
    let factory = setup();
    let mut domain = Domain::new();
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

    let mut planner = Planner::new(&domain, &factory, PlannerConfig::default());
    let task = factory.create_compound("walk", vec![factory.create_atom("downtown"), factory.create_atom("park")]);
    let solution = planner.find_first_plan(&state, &[task.clone()]).expect("operator should apply");

    assert_eq!(solution.operators, vec![task]);
    assert!(!solution.final_state.is_empty());
  }

  #[test]
  fn else_method_is_skipped_once_a_sibling_succeeds() {
    let factory = setup();
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
        subtasks: vec![factory.create_compound("moved", vec![factory.create_variable("D")])],
        kind: MethodKind::Normal,
        is_default: true,
      })
      .unwrap();

    let mut with_car = RuleSet::new();
    with_car.add_fact(factory.create_atom("has_car"));
    let mut planner = Planner::new(&domain, &factory, PlannerConfig::default());
    let task = factory.create_compound("travel", vec![factory.create_atom("home")]);
    let solution = planner.find_first_plan(&with_car, &[task]).expect("has_car branch should plan");
    assert_eq!(solution.operators.len(), 1);
    assert_eq!(solution.operators[0].functor_arity().map(|(f, _)| f.to_string()), Some("drive".to_string()));
  }

  #[test]
  fn cut_discards_remaining_method_candidates() {
    let factory = setup();
    let mut domain = Domain::new();
    domain
      .add_operator(Operator {
        head: factory.create_compound("mark", vec![factory.create_variable("X")]),
        deletions: vec![],
        additions: vec![factory.create_compound("marked", vec![factory.create_variable("X")])],
        attributes: BitFlags::empty(),
      })
      .unwrap();
    let head = factory.create_compound("choose", vec![]);
    domain
      .add_method(Method {
        head: head.clone(),
        precondition: vec![],
        subtasks: vec![factory.create_atom("!"), factory.create_compound("mark", vec![factory.create_atom("a")])],
        kind: MethodKind::Normal,
        is_default: false,
      })
      .unwrap();
    domain
      .add_method(Method {
        head,
        precondition: vec![],
        subtasks: vec![factory.create_compound("mark", vec![factory.create_atom("b")])],
        kind: MethodKind::Normal,
        is_default: false,
      })
      .unwrap();

    let state = RuleSet::new();
    let mut planner = Planner::new(&domain, &factory, PlannerConfig { max_solutions: None, ..PlannerConfig::default() });
    let result = planner.find_all_plans(&state, &[factory.create_compound("choose", vec![])], &AtomicBool::new(false));
    assert_eq!(result.solutions.len(), 1);
    assert_eq!(result.solutions[0].operators[0].args()[0], factory.create_atom("a"));
  }

  #[test]
  fn any_of_succeeds_when_at_least_one_branch_applies() {
    let factory = setup();
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
      .expect("anyOf should find at least one branch");
    assert_eq!(solution.operators.len(), 2);
  }

  #[test]
  fn undefined_task_head_fails_locally_without_a_plan() {
    let factory = setup();
    let domain = Domain::new();
    let state = RuleSet::new();
    let mut planner = Planner::new(&domain, &factory, PlannerConfig::default());
    let result = planner.find_first_plan(&state, &[factory.create_compound("mystery", vec![factory.create_atom("x")])]);
    assert!(result.is_none());
  }

  #[test]
  fn undefined_task_head_is_reported_as_a_logic_error() {
    let factory = setup();
    let domain = Domain::new();
    let state = RuleSet::new();
    let mut planner = Planner::new(&domain, &factory, PlannerConfig::default());
    let task = factory.create_compound("mystery", vec![factory.create_atom("x")]);
    let result = planner.find_all_plans(&state, &[task], &AtomicBool::new(false));
    assert!(result.solutions.is_empty());
    assert!(matches!(result.logic_errors.as_slice(), [EngineError::UndefinedTaskHead(functor, 1)] if functor.as_ref() == "mystery"));
  }
}
