/*!

A thin shim over `tracing` so the rest of the workspace depends on a handful of macros rather than
the logging crate directly. The resolver and planner log through these at `trace`/`debug` level on
every loop iteration when the corresponding level is enabled; callers that don't install a
subscriber pay essentially nothing.

*/

pub use tracing::{debug, error, info, trace, warn};

/// Installs a `tracing-subscriber` `fmt` subscriber reading its filter from `RUST_LOG`
/// (defaulting to `warn`). Intended for binaries/tests, not for library code, which should never
/// install a global subscriber on a caller's behalf.
pub fn init_default_subscriber() {
  use tracing_subscriber::EnvFilter;

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
