//! The error type shared by the matching core.

use std::fmt;
use itertools::Itertools;
use crate::types::Ty;
use crate::zipper::CodePos;

/// The ways a matching, selection or zipper operation can fail.
///
/// Structural failures (`MatchFailure`, `NoMatches`) are expected and drive
/// backtracking or become a "nothing to rewrite" message at the tactic
/// boundary. Addressing failures (`InvalidCPos`, `InvalidPosition`,
/// `InvalidOccurence`) are always reported, never clamped. `CannotUnify`
/// comes from type unification and is passed through unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchError {
  /// The pattern does not match the term.
  MatchFailure,
  /// No sub-term of the target matched the pattern.
  NoMatches,
  /// A keyed position does not sit on an application with enough arguments,
  /// or a position set does not fit the shape of the term it is applied to.
  InvalidPosition,
  /// The requested occurrences (1-based) are out of range for the position set.
  InvalidOccurence(Vec<usize>),
  /// The code position does not address an instruction of the statement.
  InvalidCPos(CodePos),
  /// Two types could not be unified.
  CannotUnify(Ty, Ty),
}

impl fmt::Display for MatchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MatchError::MatchFailure => write!(f, "the pattern does not match"),
      MatchError::NoMatches => write!(f, "nothing matches the pattern"),
      MatchError::InvalidPosition => write!(f, "invalid position"),
      MatchError::InvalidOccurence(occs) =>
        write!(f, "invalid occurrence selection: {}", occs.iter().format(", ")),
      MatchError::InvalidCPos(pos) => write!(f, "invalid code position {pos}"),
      MatchError::CannotUnify(t1, t2) => write!(f, "cannot unify {t1} and {t2}"),
    }
  }
}

impl std::error::Error for MatchError {}

/// Result type for the matching core.
pub type Result<T> = std::result::Result<T, MatchError>;
