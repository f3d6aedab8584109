/*!

There are several text representations we want for the same value depending on context: the bare
`functor(args)` shown in a plan, the `?Var = value` shown in a unifier, the fully bracketed debug
form used in tests. `Formattable` is a `Display`-like trait that isn't sealed to the standard
library, so it can be implemented for types we don't own the blanket impl for, with a style flag
selecting the representation.

*/

use std::fmt::Debug;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum FormatStyle {
  #[default]
  Default,
  /// The bit-exact textual form documented in spec.md §6 (used by tests/diagnostics).
  Canonical,
  /// Extra internal detail (interning ids, node ids), not for user-facing output.
  Debug,
}

pub trait Formattable {
  fn repr(&self, out: &mut dyn std::fmt::Write, style: FormatStyle) -> std::fmt::Result;
}

#[macro_export]
macro_rules! impl_display_debug_for_formattable {
    ($t:ty) => {
        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                <$t as $crate::format::Formattable>::repr(self, f, $crate::format::FormatStyle::Default)
            }
        }

        impl std::fmt::Debug for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                <$t as $crate::format::Formattable>::repr(self, f, $crate::format::FormatStyle::Debug)
            }
        }
    };
}
pub use impl_display_debug_for_formattable;
