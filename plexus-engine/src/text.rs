/*!

The bit-exact textual representations spec.md §6 documents for tests and diagnostics: failure is
the literal `null`, a unifier is `(?X = v1, ?Y = v2)` (empty success is `()`), a sequence of
unifiers from one query is `((...), (...))`, and a plan list groups each solution's operators in
its own `{ ... }` brace, e.g. `[ { walk(downtown, park) } ]`.

These are a *display* convention layered over the already-`Display`-able [`Term`]; nothing here
changes term identity or equality (spec.md §6: "this is a display-level convention and does not
alter term identity").

*/

use plexus_abs::IString;

use crate::planner::Solution;
use crate::term::{Factory, Term};
use crate::unify::Unifier;

/// The literal textual form of a failed query or plan (spec.md §6).
pub const FAILURE: &str = "null";

/// Renders one unifier as `(?X = v1, ?Y = v2)`, restricted to (and ordered by) `query_vars` — the
/// variables of interest, typically every variable occurring in the original query in
/// first-occurrence order (see [`Term::variables`]). An empty `query_vars` (or a unifier binding
/// none of them) renders as `()`, matching spec.md §6's "Empty success (true, no bindings)".
pub fn format_unifier(unifier: &Unifier, query_vars: &[IString], factory: &Factory) -> String {
  if query_vars.is_empty() {
    return "()".to_string();
  }
  let bindings: Vec<String> = query_vars
    .iter()
    .map(|name| format!("?{} = {}", name, unifier.apply(&Term::Variable(name.clone()), factory)))
    .collect();
  format!("({})", bindings.join(", "))
}

/// Renders a sequence of unifiers (the enumerated solutions to one query) as
/// `((?X = v1, ?Y = v2), (?X = v3, ?Y = v4))` — spec.md §6's "Unifier sequence" form. A single
/// empty-bindings solution renders as `(())`, matching spec.md §6's worked example exactly.
pub fn format_unifier_sequence(unifiers: &[Unifier], query_vars: &[IString], factory: &Factory) -> String {
  let rendered: Vec<String> = unifiers.iter().map(|u| format_unifier(u, query_vars, factory)).collect();
  format!("({})", rendered.join(", "))
}

/// Collects every variable occurring in `goals`, in first-occurrence order across the whole
/// conjunction — the natural `query_vars` to pass to [`format_unifier`]/[`format_unifier_sequence`]
/// when rendering the result of resolving that conjunction.
pub fn query_variables(goals: &[Term]) -> Vec<IString> {
  let mut found = Vec::new();
  for goal in goals {
    for name in goal.variables() {
      if !found.contains(&name) {
        found.push(name);
      }
    }
  }
  found
}

/// Renders one plan solution as `{ op1(...), op2(...) }` (hidden operators are already absent from
/// `solution.operators`, per spec.md §6); an operator-free solution renders as `{ () }`.
pub fn format_solution(solution: &Solution) -> String {
  if solution.operators.is_empty() {
    return "{ () }".to_string();
  }
  let rendered: Vec<String> = solution.operators.iter().map(|op| op.to_string()).collect();
  format!("{{ {} }}", rendered.join(", "))
}

/// Renders a full plan list as `[ { op1(...), op2(...) }, { op3(...) } ]` — spec.md §6's "Plan
/// list" form, one brace group per returned solution. No solutions at all (as opposed to one
/// solution with an empty operator list) renders as `[ ]`.
pub fn format_plan_list(solutions: &[Solution]) -> String {
  if solutions.is_empty() {
    return "[ ]".to_string();
  }
  let rendered: Vec<String> = solutions.iter().map(format_solution).collect();
  format!("[ {} ]", rendered.join(", "))
}
