/*!

Robinson-style unification (spec.md §4.2) with an occurs check, and the variable-renaming
machinery SLD resolution needs before each rule application.

*/

use std::collections::HashMap;

use plexus_abs::IString;

use crate::term::{Factory, Term};

/// A finite map from variable name to replacement term, built up incrementally as unification
/// walks two terms. Kept as a plain `HashMap` rather than a `Vec` indexed by a compiler-assigned
/// slot (as the teacher's `Substitution` does for its DAG nodes): goal variables here are named at
/// the API boundary (spec.md §6) and an index would just be a second name for the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unifier {
  bindings: HashMap<IString, Term>,
}

impl Unifier {
  pub fn new() -> Self {
    Unifier::default()
  }

  pub fn is_empty(&self) -> bool {
    self.bindings.is_empty()
  }

  pub fn len(&self) -> usize {
    self.bindings.len()
  }

  pub fn get(&self, name: &IString) -> Option<&Term> {
    self.bindings.get(name)
  }

  pub fn bind(&mut self, name: IString, value: Term) {
    self.bindings.insert(name, value);
  }

  pub fn iter(&self) -> impl Iterator<Item = (&IString, &Term)> {
    self.bindings.iter()
  }

  /// Recursively replaces every bound variable in `term` with its binding, walking through chains
  /// of variable-to-variable bindings until a fixed point, ground term, or unbound variable is
  /// reached. Rebuilt compounds are interned through `factory` so repeated substitution doesn't
  /// fragment the cache the rest of the run shares.
  pub fn apply(&self, term: &Term, factory: &Factory) -> Term {
    match term {
      Term::Variable(name) => match self.bindings.get(name) {
        Some(bound) => self.apply(bound, factory),
        None => term.clone(),
      },
      Term::Compound(c) => {
        let new_args = c.args.iter().map(|arg| self.apply(arg, factory)).collect::<Vec<_>>();
        if new_args.iter().zip(c.args.iter()).all(|(new, old)| new == old) {
          term.clone()
        } else {
          factory.create_compound(c.functor.as_ref(), new_args)
        }
      }
      _ => term.clone(),
    }
  }
}

fn occurs(name: &IString, term: &Term, unifier: &Unifier) -> bool {
  match term {
    Term::Variable(other) => {
      if other == name {
        true
      } else if let Some(bound) = unifier.get(other) {
        occurs(name, bound, unifier)
      } else {
        false
      }
    }
    Term::Compound(c) => c.args.iter().any(|arg| occurs(name, arg, unifier)),
    _ => false,
  }
}

fn walk<'a>(term: &'a Term, unifier: &'a Unifier) -> &'a Term {
  let mut current = term;
  while let Term::Variable(name) = current {
    match unifier.get(name) {
      Some(bound) => current = bound,
      None => break,
    }
  }
  current
}

/// Attempts to unify `left` and `right` under an (optional) pre-existing `unifier`, returning an
/// extended unifier on success. Fails (returns `None`) on a symbol/arity mismatch or an occurs-
/// check violation; per spec.md §7 this is the `UnificationFail` local-failure kind and is never
/// materialized as anything richer than this `Option`.
pub fn unify(left: &Term, right: &Term, unifier: &Unifier) -> Option<Unifier> {
  let mut result = unifier.clone();
  if unify_into(left, right, &mut result) {
    Some(result)
  } else {
    None
  }
}

fn unify_into(left: &Term, right: &Term, unifier: &mut Unifier) -> bool {
  let left = walk(left, unifier).clone();
  let right = walk(right, unifier).clone();

  match (&left, &right) {
    (Term::Variable(a), Term::Variable(b)) if a == b => true,
    (Term::Variable(name), _) => {
      if occurs(name, &right, unifier) {
        false
      } else {
        unifier.bind(name.clone(), right);
        true
      }
    }
    (_, Term::Variable(name)) => {
      if occurs(name, &left, unifier) {
        false
      } else {
        unifier.bind(name.clone(), left);
        true
      }
    }
    (Term::Int(a), Term::Int(b)) => a == b,
    (Term::Float(a), Term::Float(b)) => a == b,
    (Term::Atom(a), Term::Atom(b)) => a == b,
    (Term::Compound(a), Term::Compound(b)) => {
      if a.functor != b.functor || a.args.len() != b.args.len() {
        return false;
      }
      a.args.iter().zip(b.args.iter()).all(|(x, y)| unify_into(x, y, unifier))
    }
    _ => false,
  }
}

/// Composes an `inner` unifier (produced resolving one goal) on top of an `outer` one (accumulated
/// so far), so that later bindings see earlier ones. `outer`'s bindings are re-walked through
/// `inner` so chains collapse rather than needing a second pass at read time.
pub fn compose(outer: &Unifier, inner: &Unifier, factory: &Factory) -> Unifier {
  let mut composed = inner.clone();
  for (name, term) in outer.iter() {
    if composed.get(name).is_none() {
      composed.bind(name.clone(), inner.apply(term, factory));
    }
  }
  composed
}

/// Renames every variable in `term` by appending `tag` to its name, so that two uses of the same
/// rule in the same derivation never collide (spec.md §4.3: "rules are renamed apart before each
/// application").
pub fn make_variables_unique(term: &Term, tag: &str, factory: &Factory) -> Term {
  rename(term, tag, factory)
}

fn rename(term: &Term, tag: &str, factory: &Factory) -> Term {
  match term {
    Term::Variable(name) => Term::Variable(IString::from(format!("{}#{}", name, tag))),
    Term::Compound(c) => {
      let renamed_args = c.args.iter().map(|arg| rename(arg, tag, factory)).collect::<Vec<_>>();
      factory.create_compound(c.functor.as_ref(), renamed_args)
    }
    _ => term.clone(),
  }
}
