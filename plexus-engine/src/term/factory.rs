//! The `Factory` (spec.md §4.1): the single entry point for constructing terms, owning the
//! compound-interning cache and the memory-budget accounting described in spec.md §5.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ordered_float::OrderedFloat;
use plexus_abs::{byte_size, ByteSize, IString};

use super::{ArgList, CompoundTerm, Term};

#[derive(Debug, Clone, Copy)]
pub struct FactoryConfig {
  /// Soft cap on heap bytes attributed to interned compounds. Hitting it does not panic: it flips
  /// `Factory::out_of_memory()` and every subsequent construction call fails closed (spec.md §5).
  pub memory_budget_bytes: ByteSize,
}

impl Default for FactoryConfig {
  fn default() -> Self {
    FactoryConfig { memory_budget_bytes: 64 * 1024 * 1024 }
  }
}

struct FactoryInner {
  config:           FactoryConfig,
  interned:         HashMap<(IString, ArgList), Rc<CompoundTerm>>,
  dynamic_bytes:    ByteSize,
  out_of_memory:    bool,
}

/// Constructs and interns terms under a shared memory budget.
///
/// A `Factory` is cheap to clone (`Rc`-backed interior mutability) so it can be threaded through a
/// resolver/planner run without lifetime gymnastics, mirroring how the teacher's module-level
/// caches (`HashConsSet`) are shared across a rewriting session.
#[derive(Clone)]
pub struct Factory {
  inner: Rc<RefCell<FactoryInner>>,
}

impl Factory {
  pub fn new(config: FactoryConfig) -> Self {
    Factory {
      inner: Rc::new(RefCell::new(FactoryInner {
        config,
        interned: HashMap::new(),
        dynamic_bytes: 0,
        out_of_memory: false,
      })),
    }
  }

  pub fn create_variable(&self, name: impl AsRef<str>) -> Term {
    Term::Variable(IString::from(name.as_ref()))
  }

  pub fn create_int(&self, value: i64) -> Term {
    Term::Int(value)
  }

  pub fn create_float(&self, value: f64) -> Term {
    Term::Float(OrderedFloat(value))
  }

  pub fn create_atom(&self, name: impl AsRef<str>) -> Term {
    Term::Atom(IString::from(name.as_ref()))
  }

  /// Classifies a bare textual atom per spec.md §4.1: all-digits (with an optional leading `-`)
  /// becomes an `Int`; exactly one interior `.` between digit runs becomes a `Float`; anything else
  /// is an `Atom`. Used when building ground facts from literal text rather than a parser, since
  /// parsing itself is out of scope.
  pub fn create_atomic_from_text(&self, text: impl AsRef<str>) -> Term {
    let text = text.as_ref();
    if let Ok(i) = text.parse::<i64>() {
      return Term::Int(i);
    }
    if text.matches('.').count() == 1 && text.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
      if let Ok(f) = text.parse::<f64>() {
        return Term::Float(OrderedFloat(f));
      }
    }
    Term::Atom(IString::from(text))
  }

  /// Constructs (and interns) a compound term. Two calls with an equal functor and equal argument
  /// list return structurally-equal terms backed by the same `Rc` allocation, so repeated calls
  /// inside a tight resolver loop don't multiply heap use.
  pub fn create_compound(&self, functor: impl AsRef<str>, args: impl Into<ArgList>) -> Term {
    let functor = IString::from(functor.as_ref());
    let args: ArgList = args.into();
    if args.is_empty() {
      return Term::Atom(functor);
    }

    let key = (functor.clone(), args.clone());
    let mut inner = self.inner.borrow_mut();
    if let Some(existing) = inner.interned.get(&key) {
      return Term::Compound(existing.clone());
    }

    let payload = Rc::new(CompoundTerm { functor, args });
    let added_bytes = byte_size::<CompoundTerm>(payload.args.len() * std::mem::size_of::<Term>());
    inner.dynamic_bytes += added_bytes;
    if inner.dynamic_bytes > inner.config.memory_budget_bytes {
      inner.out_of_memory = true;
    }
    inner.interned.insert(key, payload.clone());
    Term::Compound(payload)
  }

  pub fn true_term(&self) -> Term {
    self.create_atom("true")
  }

  pub fn false_term(&self) -> Term {
    self.create_atom("false")
  }

  pub fn out_of_memory(&self) -> bool {
    self.inner.borrow().out_of_memory
  }

  pub fn dynamic_bytes(&self) -> ByteSize {
    self.inner.borrow().dynamic_bytes
  }

  pub fn config(&self) -> FactoryConfig {
    self.inner.borrow().config
  }
}
