#![allow(unused)]
/*!

Types/type aliases that abstract over the implementing backing type.

A motivating example is the `IString` type, an interned string. A number of external crates could
provide this functionality; this module redirects to whichever implementation we've chosen so the
rest of the workspace never names the backing crate directly. To switch from
[`string_cache`](https://crates.io/crates/string_cache) to, say, `ustr`, only this module changes.

*/

mod memory;
mod nat_set;
pub mod log;

// Interned string, shared globally across the process.
pub use string_cache::DefaultAtom as IString;

// For argument lists that are almost always small.
pub use smallvec::{smallvec, SmallVec};

// Hashing data structures. A thin alias so call sites don't need to pick a
// hasher; swap the right-hand side to change the implementation everywhere.
pub use std::collections::{HashMap, HashSet};

pub use memory::{byte_size, ByteSize};
pub use nat_set::NatSet;

pub use tracing;
