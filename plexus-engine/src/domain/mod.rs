/*!

The planning domain (spec.md §4.5): the fixed catalog of methods and operators a planner
decomposes tasks against. Unlike the `RuleSet`, a `Domain` is not copy-on-write — it is built once
before planning starts and read-only for the lifetime of a `find_all_plans`/`find_first_plan` call.

*/

use enumflags2::{bitflags, BitFlags};
use plexus_abs::{HashMap, IString};

use crate::term::Term;

/// The control-construct kind attached to a method (spec.md §3: `kind ∈ {Normal, AllOf, AnyOf}`).
/// All three share the same shape — one precondition, one subtask template — and differ only in
/// how the planner combines the precondition's *multiple* solutions (spec.md §4.6):
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
  /// Each precondition solution is an independent alternative: the planner tries the subtask
  /// template instantiated under the first solution, then (on backtracking) the second, and so
  /// on, each as its own candidate plan.
  Normal,
  /// Every precondition solution's instantiated subtasks are concatenated into one sequential
  /// task list, each wrapped so an individual instantiation's failure doesn't abort the others;
  /// the method as a whole fails only if *none* of them succeeded (spec.md §4.6 scenario 4).
  AnyOf,
  /// Every precondition solution's instantiated subtasks are concatenated into one sequential
  /// task list with no failure tolerance: any one of them failing fails the whole method.
  AllOf,
}

#[derive(Debug, Clone)]
pub struct Method {
  pub head:        Term,
  /// Conjunction of goals resolved against the current state before this method applies.
  pub precondition: Vec<Term>,
  /// The subtask template, instantiated once per precondition solution per `kind`'s combination
  /// rule above.
  pub subtasks:    Vec<Term>,
  pub kind:        MethodKind,
  /// Marks an `else` (fallback) method: attempted only if every earlier non-`else` method
  /// registered for the same task head failed to produce a complete plan (spec.md §4.6, §8).
  pub is_default:  bool,
}

#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorAttribute {
  /// Hidden operators are applied to the knowledge base like any other but omitted from the
  /// `operators` list of a returned `Solution` (spec.md §6) — used for bookkeeping-only effects.
  Hidden,
}

#[derive(Debug, Clone)]
pub struct Operator {
  pub head:       Term,
  pub deletions:  Vec<Term>,
  pub additions:  Vec<Term>,
  pub attributes: BitFlags<OperatorAttribute>,
}

impl Operator {
  pub fn is_hidden(&self) -> bool {
    self.attributes.contains(OperatorAttribute::Hidden)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskHeadError {
  /// A task head is registered as both a method family and an operator, which spec.md §4.5
  /// forbids ("a task name is either a method family or an operator, never both").
  MixedMethodAndOperator,
}

enum TaskEntry {
  Methods(Vec<Method>),
  Operator(Operator),
}

/// The domain registry: every method/operator keyed by its head's functor/arity, returned to
/// callers in insertion order (spec.md §4.6's deterministic method-ordering requirement).
#[derive(Default)]
pub struct Domain {
  entries: HashMap<(IString, usize), TaskEntry>,
}

impl Domain {
  pub fn new() -> Self {
    Domain::default()
  }

  fn key_of(head: &Term) -> Option<(IString, usize)> {
    head.functor_arity()
  }

  pub fn add_method(&mut self, method: Method) -> Result<(), TaskHeadError> {
    let Some(key) = Domain::key_of(&method.head) else {
      return Ok(());
    };
    match self.entries.entry(key) {
      std::collections::hash_map::Entry::Occupied(mut entry) => match entry.get_mut() {
        TaskEntry::Methods(methods) => {
          methods.push(method);
          Ok(())
        }
        TaskEntry::Operator(_) => Err(TaskHeadError::MixedMethodAndOperator),
      },
      std::collections::hash_map::Entry::Vacant(entry) => {
        entry.insert(TaskEntry::Methods(vec![method]));
        Ok(())
      }
    }
  }

  pub fn add_operator(&mut self, operator: Operator) -> Result<(), TaskHeadError> {
    let Some(key) = Domain::key_of(&operator.head) else {
      return Ok(());
    };
    match self.entries.entry(key) {
      std::collections::hash_map::Entry::Occupied(_) => Err(TaskHeadError::MixedMethodAndOperator),
      std::collections::hash_map::Entry::Vacant(entry) => {
        entry.insert(TaskEntry::Operator(operator));
        Ok(())
      }
    }
  }

  /// Returns the methods registered for `task`'s functor/arity, in registration (document) order
  /// — the order spec.md §4.6's "method ordering" testable property and `else`-skip logic both
  /// depend on. The planner, not this lookup, is responsible for skipping an `is_default` (`else`)
  /// method when an earlier sibling already produced a solution.
  pub fn methods_for(&self, task: &Term) -> &[Method] {
    let Some(key) = Domain::key_of(task) else {
      return &[];
    };
    match self.entries.get(&key) {
      Some(TaskEntry::Methods(methods)) => methods,
      _ => &[],
    }
  }

  pub fn operator_for(&self, task: &Term) -> Option<&Operator> {
    let key = Domain::key_of(task)?;
    match self.entries.get(&key) {
      Some(TaskEntry::Operator(operator)) => Some(operator),
      _ => None,
    }
  }

  pub fn is_operator(&self, task: &Term) -> bool {
    self.operator_for(task).is_some()
  }

  pub fn is_defined(&self, task: &Term) -> bool {
    Domain::key_of(task).map(|key| self.entries.contains_key(&key)).unwrap_or(false)
  }
}
