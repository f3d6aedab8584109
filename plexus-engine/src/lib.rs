//! Plexus fuses a Prolog-style goal resolver with an HTN task planner over a shared,
//! copy-on-write knowledge base: [`term`] is the interned first-order term model, [`unify`] is
//! Robinson unification, [`ruleset`] is the knowledge base, [`resolver`] is stackless SLD
//! resolution with cut/negation/built-ins, [`domain`] is the method/operator registry, and
//! [`planner`] is the stackless HTN decomposition loop built on top of all of the above.
//!
//! The only thing external collaborators (a parser, a REPL, an RPC frontend) need to touch is:
//! build terms through a [`term::Factory`], load facts/rules into a [`ruleset::RuleSet`] and
//! methods/operators into a [`domain::Domain`], then call [`planner::Planner::find_all_plans`] or
//! [`planner::Planner::find_first_plan`]. [`text`] renders resolver/planner results into the
//! fixed diagnostic strings tests and REPL-style frontends expect.

pub mod domain;
pub mod error;
pub mod format;
pub mod planner;
pub mod prelude;
pub mod resolver;
pub mod ruleset;
pub mod term;
pub mod text;
pub mod unify;

mod util;
