/*!

A `NatSet` is a dense set of small natural numbers backed by a bitset. It is used anywhere a handle
space is small, monotonically assigned, and densely packed: rule ids within a `RuleSet` delta,
variable indices within a single unification, or scope ids within a resolver run.

A `HashSet<usize>` would work too, but for these use cases the bitset is both smaller and faster,
and it is the representation the matching/rewriting literature this project descends from
consistently uses for the same purpose.

*/

use bit_set::BitSet;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NatSet {
  bits: BitSet,
}

impl NatSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self { bits: BitSet::with_capacity(capacity) }
  }

  #[inline(always)]
  pub fn insert(&mut self, value: usize) -> bool {
    self.bits.insert(value)
  }

  #[inline(always)]
  pub fn remove(&mut self, value: usize) -> bool {
    self.bits.remove(value)
  }

  #[inline(always)]
  pub fn contains(&self, value: usize) -> bool {
    self.bits.contains(value)
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.bits.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.bits.is_empty()
  }

  #[inline(always)]
  pub fn clear(&mut self) {
    self.bits.clear();
  }

  #[inline(always)]
  pub fn union_in_place(&mut self, other: &NatSet) {
    self.bits.union_with(&other.bits);
  }

  #[inline(always)]
  pub fn intersect_in_place(&mut self, other: &NatSet) {
    self.bits.intersect_with(&other.bits);
  }

  #[inline(always)]
  pub fn difference_in_place(&mut self, other: &NatSet) {
    self.bits.difference_with(&other.bits);
  }

  pub fn iter(&self) -> bit_set::Iter<'_, u32> {
    self.bits.iter()
  }
}

impl FromIterator<usize> for NatSet {
  fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
    let mut set = NatSet::new();
    for v in iter {
      set.insert(v);
    }
    set
  }
}
