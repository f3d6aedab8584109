/*!

The term model (spec.md §3, §4.1): immutable, interned, first-order terms with variables, atoms,
integers, floats, and compounds.

A `Term` is cheap to clone (an `IString` is a reference-counted interned atom; a `Compound`'s
payload is behind an `Rc`), and equality/hashing/ordering are always structural — two terms built
from the same shape compare equal and hash equal regardless of which `Factory` call produced them,
which is what lets the `Factory` deduplicate ("two calls with equal inputs return equal-by-pointer
interned terms").

*/

mod eval;
mod factory;
mod order;

pub use eval::{eval, numeric_value, EvalError};
pub use factory::{Factory, FactoryConfig};

use std::fmt::Write as _;
use std::rc::Rc;

use ordered_float::OrderedFloat;
use plexus_abs::{smallvec, IString, SmallVec};

use crate::format::{FormatStyle, Formattable};
use crate::impl_display_debug_for_formattable;

/// Inline capacity for a compound's argument list before it spills to the heap. Most symbolic
/// terms in planning domains (`at(X, Y)`, `walk(From, To)`) have two or three arguments.
pub type ArgList = SmallVec<[Term; 4]>;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CompoundTerm {
  pub functor: IString,
  pub args:    ArgList,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Term {
  Variable(IString),
  Int(i64),
  Float(OrderedFloat<f64>),
  Atom(IString),
  Compound(Rc<CompoundTerm>),
}

impl Term {
  #[inline]
  pub fn is_variable(&self) -> bool {
    matches!(self, Term::Variable(_))
  }

  #[inline]
  pub fn is_atomic(&self) -> bool {
    matches!(self, Term::Int(_) | Term::Float(_) | Term::Atom(_))
  }

  #[inline]
  pub fn is_compound(&self) -> bool {
    matches!(self, Term::Compound(_))
  }

  pub fn functor(&self) -> Option<IString> {
    match self {
      Term::Atom(name) => Some(name.clone()),
      Term::Compound(c) => Some(c.functor.clone()),
      _ => None,
    }
  }

  /// Functor/arity key used to index rules, methods, and operators (spec.md §4.3, §4.5).
  pub fn functor_arity(&self) -> Option<(IString, usize)> {
    match self {
      Term::Atom(name) => Some((name.clone(), 0)),
      Term::Compound(c) => Some((c.functor.clone(), c.args.len())),
      _ => None,
    }
  }

  pub fn args(&self) -> &[Term] {
    match self {
      Term::Compound(c) => &c.args,
      _ => &[],
    }
  }

  /// `true` iff no descendant of `self` is a `Variable` (spec.md §3 invariant).
  pub fn is_ground(&self) -> bool {
    match self {
      Term::Variable(_) => false,
      Term::Int(_) | Term::Float(_) | Term::Atom(_) => true,
      Term::Compound(c) => c.args.iter().all(Term::is_ground),
    }
  }

  /// Collects every distinct variable name occurring in `self`, in first-occurrence order.
  pub fn variables(&self) -> Vec<IString> {
    let mut found = Vec::new();
    self.collect_variables(&mut found);
    found
  }

  fn collect_variables(&self, found: &mut Vec<IString>) {
    match self {
      Term::Variable(name) => {
        if !found.contains(name) {
          found.push(name.clone());
        }
      }
      Term::Compound(c) => {
        for arg in &c.args {
          arg.collect_variables(found);
        }
      }
      _ => {}
    }
  }

  pub fn true_atom() -> IString {
    IString::from("true")
  }

  pub fn false_atom() -> IString {
    IString::from("false")
  }

  pub fn nil_atom() -> IString {
    IString::from("nil")
  }

  /// Builds the conventional Prolog cons-cell compound `'.'(head, tail)` used to represent list
  /// terms (SPEC_FULL.md §0.6); `[]` itself is the atom `nil`.
  pub fn cons(head: Term, tail: Term) -> Term {
    Term::Compound(Rc::new(CompoundTerm { functor: IString::from("."), args: smallvec![head, tail] }))
  }

  pub fn list_from(items: impl IntoIterator<Item = Term, IntoIter: DoubleEndedIterator>) -> Term {
    let mut list = Term::Atom(Term::nil_atom());
    for item in items.into_iter().rev() {
      list = Term::cons(item, list);
    }
    list
  }

  /// Decomposes a list term into its elements, returning `None` if `self` isn't a proper
  /// (nil-terminated, fully ground spine) list.
  pub fn as_list(&self) -> Option<Vec<Term>> {
    let mut items = Vec::new();
    let mut cursor = self.clone();
    loop {
      match &cursor {
        Term::Atom(name) if *name == Term::nil_atom() => return Some(items),
        Term::Compound(c) if c.functor == IString::from(".") && c.args.len() == 2 => {
          items.push(c.args[0].clone());
          cursor = c.args[1].clone();
        }
        _ => return None,
      }
    }
  }
}

impl Formattable for Term {
  fn repr(&self, out: &mut dyn std::fmt::Write, style: FormatStyle) -> std::fmt::Result {
    match self {
      Term::Variable(name) => {
        if style == FormatStyle::Canonical || style == FormatStyle::Default {
          write!(out, "?{}", name)
        } else {
          write!(out, "Variable({})", name)
        }
      }
      Term::Int(value) => write!(out, "{}", value),
      Term::Float(value) => write!(out, "{}", value.0),
      Term::Atom(name) => write!(out, "{}", name),
      Term::Compound(c) => {
        write!(out, "{}(", c.functor)?;
        for (i, arg) in c.args.iter().enumerate() {
          if i > 0 {
            write!(out, ", ")?;
          }
          arg.repr(out, style)?;
        }
        write!(out, ")")
      }
    }
  }
}
impl_display_debug_for_formattable!(Term);
