/*!

The small list prelude SPEC_FULL.md §0.6 supplements the distilled spec with: `member/2`,
`append/3`, `length/2`, and `reverse/2`, defined exactly as ordinary Prolog practice (and as
spec.md §8 scenario 6 assumes already exist) over the cons-cell list representation `Term::cons`
already supports with no new term variant.

This isn't wired into `RuleSet::new()` itself, since building these rules needs a `Factory` to
intern their terms and spec.md §6's `RuleSet::new()` takes none; callers that want the prelude
available call [`install`] once against a fresh `RuleSet` before loading their own facts/rules.

*/

use crate::ruleset::{Rule, RuleSet};
use crate::term::Factory;

/// Adds `member/2`, `append/3`, `length/2`, and `reverse/2` to `rule_set`.
pub fn install(rule_set: &mut RuleSet, factory: &Factory) {
  for rule in standard_rules(factory) {
    rule_set.add_rule(rule);
  }
}

/// Builds the prelude rules without installing them, for callers that want to inspect or compose
/// them (e.g. a test fixture that wants a `RuleSet` made exactly of the prelude, no base facts).
pub fn standard_rules(factory: &Factory) -> Vec<Rule> {
  let v = |name: &str| factory.create_variable(name);
  let cons = |head: crate::term::Term, tail: crate::term::Term| crate::term::Term::cons(head, tail);

  vec![
    // member(X, [X|_]).
    Rule::fact(factory.create_compound("member", vec![v("X"), cons(v("X"), v("_Tail"))])),
    // member(X, [_|T]) :- member(X, T).
    Rule {
      head: factory.create_compound("member", vec![v("X"), cons(v("_Head"), v("T"))]),
      body: vec![factory.create_compound("member", vec![v("X"), v("T")])],
    },
    // append([], L, L).
    Rule::fact(factory.create_compound("append", vec![factory.create_atom("nil"), v("L"), v("L")])),
    // append([H|T], L, [H|R]) :- append(T, L, R).
    Rule {
      head: factory.create_compound("append", vec![cons(v("H"), v("T")), v("L"), cons(v("H"), v("R"))]),
      body: vec![factory.create_compound("append", vec![v("T"), v("L"), v("R")])],
    },
    // length([], 0).
    Rule::fact(factory.create_compound("length", vec![factory.create_atom("nil"), factory.create_int(0)])),
    // length([_|T], N) :- length(T, N1), is(N, +(N1, 1)).
    Rule {
      head: factory.create_compound("length", vec![cons(v("_Head"), v("T")), v("N")]),
      body: vec![
        factory.create_compound("length", vec![v("T"), v("N1")]),
        factory.create_compound("is", vec![v("N"), factory.create_compound("+", vec![v("N1"), factory.create_int(1)])]),
      ],
    },
    // reverse(L, R) :- reverse_(L, [], R).
    Rule {
      head: factory.create_compound("reverse", vec![v("L"), v("R")]),
      body: vec![factory.create_compound("reverse_", vec![v("L"), factory.create_atom("nil"), v("R")])],
    },
    // reverse_([], Acc, Acc).
    Rule::fact(factory.create_compound("reverse_", vec![factory.create_atom("nil"), v("Acc"), v("Acc")])),
    // reverse_([H|T], Acc, R) :- reverse_(T, [H|Acc], R).
    Rule {
      head: factory.create_compound("reverse_", vec![cons(v("H"), v("T")), v("Acc"), v("R")]),
      body: vec![factory.create_compound("reverse_", vec![v("T"), cons(v("H"), v("Acc")), v("R")])],
    },
  ]
}
