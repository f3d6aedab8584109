//! The standard order of terms (spec.md §3): `Variable < Float < Int < Atom < Compound`, with
//! variables ordered by name, numbers by value, atoms by name, and compounds first by arity, then
//! by functor name, then left-to-right by argument.

use std::cmp::Ordering;

use super::Term;

fn rank(term: &Term) -> u8 {
  match term {
    Term::Variable(_) => 0,
    Term::Float(_) => 1,
    Term::Int(_) => 2,
    Term::Atom(_) => 3,
    Term::Compound(_) => 4,
  }
}

impl PartialOrd for Term {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Term {
  fn cmp(&self, other: &Self) -> Ordering {
    let rank_order = rank(self).cmp(&rank(other));
    if rank_order != Ordering::Equal {
      return rank_order;
    }

    match (self, other) {
      (Term::Variable(a), Term::Variable(b)) => a.cmp(b),
      (Term::Float(a), Term::Float(b)) => a.cmp(b),
      (Term::Int(a), Term::Int(b)) => a.cmp(b),
      (Term::Atom(a), Term::Atom(b)) => a.cmp(b),
      (Term::Compound(a), Term::Compound(b)) => a
        .args
        .len()
        .cmp(&b.args.len())
        .then_with(|| a.functor.cmp(&b.functor))
        .then_with(|| a.args.iter().zip(b.args.iter()).map(|(x, y)| x.cmp(y)).find(|o| *o != Ordering::Equal).unwrap_or(Ordering::Equal)),
      _ => unreachable!("rank_order already distinguished differing variants"),
    }
  }
}
