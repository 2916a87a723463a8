//! Well-known operator and type paths.
//!
//! The table is built the first time it is asked for and never changes
//! afterwards, so every consumer sees the same paths.

use std::sync::LazyLock;
use crate::types::Path;

/// The paths of the core operators and types the matching core needs to
/// recognize: booleans for conditional reduction, and the usual notation
/// operators so that callers can build and recognize terms.
#[derive(Debug)]
pub struct CoreOps {
  /// `bool`
  pub tbool: Path,
  /// `int`
  pub tint: Path,
  /// `true`
  pub true_: Path,
  /// `false`
  pub false_: Path,
  /// `=`
  pub eq: Path,
  /// `/\`
  pub and: Path,
  /// `\/`
  pub or: Path,
  /// `!`
  pub not: Path,
  /// `+`
  pub add: Path,
  /// `*`
  pub mul: Path,
  /// `[-]`, unary minus
  pub opp: Path,
  /// `::`, list cons
  pub cons: Path,
  /// `[]`, the empty list
  pub nil: Path,
  /// `.[_]`, map lookup
  pub get: Path,
  /// `.[_<-_]`, map update
  pub set: Path,
}

static CORE: LazyLock<CoreOps> = LazyLock::new(|| CoreOps {
  tbool: Path::new(&["Top", "Pervasive", "bool"]),
  tint: Path::new(&["Top", "Pervasive", "int"]),
  true_: Path::new(&["Top", "Pervasive", "true"]),
  false_: Path::new(&["Top", "Pervasive", "false"]),
  eq: Path::new(&["Top", "Pervasive", "="]),
  and: Path::new(&["Top", "Logic", "/\\"]),
  or: Path::new(&["Top", "Logic", "\\/"]),
  not: Path::new(&["Top", "Logic", "!"]),
  add: Path::new(&["Top", "CoreInt", "+"]),
  mul: Path::new(&["Top", "CoreInt", "*"]),
  opp: Path::new(&["Top", "CoreInt", "[-]"]),
  cons: Path::new(&["Top", "List", "::"]),
  nil: Path::new(&["Top", "List", "[]"]),
  get: Path::new(&["Top", "SmtMap", ".[_]"]),
  set: Path::new(&["Top", "SmtMap", ".[_<-_]"]),
});

/// The core operator table.
#[must_use] pub fn core() -> &'static CoreOps { &CORE }
