//! The term, type and statement algebra the matching core operates on.
//!
//! These are the already elaborated, type checked values handed over by the
//! surrounding system. All of them are immutable and compared and hashed
//! structurally; edits always build new values, sharing untouched parts.

pub mod ty;
pub mod term;
pub mod stmt;

use std::fmt;
use std::sync::Arc;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use crate::Symbol;

pub use ty::{Ty, TyKind, UnivarId};
pub use term::{Ident, Memory, ModPath, ProgVar, Quant, Subst, Term, TermKind};
pub use stmt::{Instr, LValue, Stmt};

/// A qualified name, such as `Int.add` or `List.(::)`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path(Arc<[Symbol]>);

impl Path {
  /// Build a path from its components, outermost first.
  #[must_use] pub fn new(parts: &[&str]) -> Self {
    Self(ecm_util::Interner::with(|i| parts.iter().map(|s| i.intern(s)).collect()))
  }

  /// The components of the path.
  #[must_use] pub fn parts(&self) -> &[Symbol] { &self.0 }
}

impl fmt::Display for Path {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.iter().format("."))
  }
}

impl fmt::Debug for Path {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self}") }
}
