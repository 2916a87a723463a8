//! Term matching and structural rewriting core for a proof assistant.
//!
//! Every tactic that has to find something in a goal or a program
//! (rewriting, application, generalization, case analysis, code-position
//! targeted program transformations) is built from four pieces:
//!
//! * [`position`]: sets of sub-term positions, numbered occurrences and
//!   occurrence selectors, with `map`/`topattern` to edit or abstract them;
//! * [`zipper`]: cursors into nested statements addressed by a [`CodePos`];
//! * [`evmap`]: domain-fixed maps from placeholders to optional bindings;
//! * [`matcher`]: a backtracking pattern matcher whose control stack is an
//!   explicit data structure.
//!
//! [`fmatch`] drives these together with type unification ([`unify`]) and
//! reduction ([`reduce`]) for formula-level matching.

// rust lints we want
#![warn(bare_trait_objects, elided_lifetimes_in_paths,
  missing_copy_implementations, missing_debug_implementations, future_incompatible,
  rust_2018_idioms, trivial_numeric_casts, variant_size_differences, unreachable_pub,
  unused, missing_docs)]
// all the clippy
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
// all the clippy::restriction lints we want
#![warn(clippy::float_arithmetic,
  clippy::get_unwrap, clippy::integer_division,
  clippy::rc_buffer, clippy::rest_pat_in_fully_bound_structs,
  clippy::string_add, clippy::unwrap_used)]
// all the clippy lints we don't want
#![allow(clippy::cognitive_complexity, clippy::comparison_chain,
  clippy::default_trait_access, clippy::enum_glob_use, clippy::inline_always,
  clippy::manual_map, clippy::map_err_ignore, clippy::missing_const_for_fn,
  clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::module_name_repetitions,
  clippy::multiple_crate_versions, clippy::option_if_let_else, clippy::redundant_pub_crate,
  clippy::semicolon_if_nothing_returned, clippy::shadow_unrelated, clippy::too_many_lines,
  clippy::use_self)]

#[macro_use] extern crate bitflags;
#[macro_use] extern crate if_chain;
#[macro_use] extern crate log;

pub mod error;
pub mod types;
pub mod registry;
pub mod evmap;
pub mod position;
pub mod zipper;
pub mod pattern;
pub mod matcher;
pub mod unify;
pub mod reduce;
pub mod fmatch;
#[cfg(feature = "cli")] pub mod cli;

use std::sync::atomic::{AtomicUsize, Ordering};

pub use ecm_util::{BoxError, Symbol, intern};
pub use error::{MatchError, Result};
pub use types::*;
pub use evmap::{EvarMap, Kind, MEvarMap, Obj};
pub use position::{Occ, Polarity, Pos, PosSet, Select};
pub use zipper::{Branch, CodePos, Zipper};
pub use pattern::Pattern;
pub use matcher::{Matches, search};
pub use unify::UnifyEnv;
pub use reduce::{Env, Hyps, RedInfo};
pub use fmatch::{FMatchOpts, f_match, f_match_core};

static DELTA_FUEL: AtomicUsize = AtomicUsize::new(64);
pub(crate) fn get_delta_fuel() -> usize { DELTA_FUEL.load(Ordering::Relaxed) }

/// Set the number of head-reduction steps a single conversion check or
/// matching attempt may take before giving up. Definitions are unfolded only
/// on demand, so this bounds the work done on recursive definitions.
pub fn set_delta_fuel(n: usize) { DELTA_FUEL.store(n, Ordering::Relaxed) }
