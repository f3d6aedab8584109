/*!

Error taxonomy (spec.md §7). Only the *global* kinds are modeled as a Rust error type: the local
kinds (`UnificationFail`, `NoMatchingRule`, `ArithmeticUndefined`) are ordinary resolution failures
that drive backtracking and are never materialized as a value — doing so on every failed
unification attempt would mean allocating on the hot path for a condition that isn't exceptional.

`OutOfMemory` and `UserAbort` are reported as flags on the result structs described in spec.md §6
(`out_of_memory`, `aborted`), not as `Err(EngineError::...)`, because a partial result still
accompanies them. The remaining two variants model spec.md §7's `LogicError` kind — a task head
with neither a method nor an operator, or an operator that rejects a non-ground instantiation — and
are collected into `planner::FindPlansResult::logic_errors` as the search runs, rather than aborting
the whole `find_all_plans` call: each abandons only the branch it occurred on, same as any other
backtrack, but is distinguishable from an ordinary `UnificationFail`/`NoMatchingRule` because it
means the domain itself is missing something, not that this particular branch didn't pan out.

*/

use plexus_abs::IString;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  #[error("factory memory budget exceeded")]
  OutOfMemory,

  #[error("planning aborted by caller")]
  UserAbort,

  #[error("domain references undefined task head {0}/{1}")]
  UndefinedTaskHead(IString, usize),

  #[error("operator {0} rejected ground instantiation: {1}")]
  OperatorInstantiationFailed(IString, String),
}

pub type EngineResult<T> = Result<T, EngineError>;
