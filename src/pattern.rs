//! The pattern language of the [`matcher`](crate::matcher).

use std::fmt;
use num::BigInt;
use serde::{Deserialize, Serialize};
use crate::Symbol;
use crate::evmap::{Kind, MEvarMap};
use crate::types::{Ident, Path, ProgVar, Ty};

/// A template over terms, memories and modules.
///
/// The structural shapes match nodes of the same shape whose children match
/// pairwise. Captures are named with [`Symbol`]s; a name used twice must
/// capture equal values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
  /// Anything.
  Wildcard,
  /// Whatever the inner pattern matches, captured under the name.
  Named(Box<Pattern>, Symbol),
  /// The inner pattern, matched at this node or anywhere below it. The
  /// value of a `Sub` is the node it is placed at.
  Sub(Box<Pattern>),
  /// The first alternative that matches.
  Or(Vec<Pattern>),
  /// A memory, captured under the name.
  Memory(Symbol),
  /// A module, captured under the name.
  Module(Symbol),
  /// `if c then t else e`
  If(Box<Pattern>, Box<Pattern>, Box<Pattern>),
  /// This integer literal.
  Int(BigInt),
  /// This local variable.
  Local(Ident),
  /// This operator. An empty type list accepts any instantiation.
  Op(Path, Box<[Ty]>),
  /// An application. If the term has more arguments than the pattern, the
  /// extra leading ones go to the head.
  App(Box<Pattern>, Vec<Pattern>),
  /// A tuple of this size.
  Tuple(Vec<Pattern>),
  /// A projection on this component.
  Proj(Box<Pattern>, u32),
  /// A datatype match with this many branches.
  Match(Box<Pattern>, Vec<Pattern>),
  /// This program variable, in a memory matching the inner pattern.
  Pvar(ProgVar, Box<Pattern>),
  /// The globals of a module matching the first pattern, in a memory
  /// matching the second.
  Glob(Box<Pattern>, Box<Pattern>),
}

impl Pattern {
  /// `p as x`
  #[must_use] pub fn named(p: Pattern, x: &str) -> Self { Pattern::Named(Box::new(p), crate::intern(x)) }

  /// Anything, captured as `x`.
  #[must_use] pub fn var(x: &str) -> Self { Self::named(Pattern::Wildcard, x) }

  /// `p` somewhere at or below this node.
  #[must_use] pub fn sub(p: Pattern) -> Self { Pattern::Sub(Box::new(p)) }

  /// An operator at any instantiation.
  #[must_use] pub fn op(p: Path) -> Self { Pattern::Op(p, Box::new([])) }

  /// An integer literal.
  #[must_use] pub fn int(n: impl Into<BigInt>) -> Self { Pattern::Int(n.into()) }

  /// An application.
  #[must_use] pub fn app(f: Pattern, args: Vec<Pattern>) -> Self { Pattern::App(Box::new(f), args) }

  /// `op a b`
  #[must_use] pub fn binop(op: Path, a: Pattern, b: Pattern) -> Self {
    Self::app(Self::op(op), vec![a, b])
  }

  /// The capture names of the pattern and their kinds, all unset.
  ///
  /// # Panics
  /// If a name is used for captures of different kinds.
  #[must_use] pub fn captures(&self) -> MEvarMap<Symbol> {
    fn rec(p: &Pattern, kind: Kind, ev: MEvarMap<Symbol>) -> MEvarMap<Symbol> {
      match p {
        Pattern::Wildcard | Pattern::Int(_) | Pattern::Local(_) | Pattern::Op(..) => ev,
        Pattern::Named(p, x) => rec(p, kind, ev.add(*x, kind)),
        Pattern::Sub(p) => rec(p, kind, ev),
        Pattern::Or(ps) | Pattern::Tuple(ps) => ps.iter().fold(ev, |ev, p| rec(p, kind, ev)),
        Pattern::Memory(x) => ev.add(*x, Kind::Mem),
        Pattern::Module(x) => ev.add(*x, Kind::Mod),
        Pattern::If(c, t, e) => rec(e, kind, rec(t, kind, rec(c, kind, ev))),
        Pattern::Proj(p, _) => rec(p, kind, ev),
        Pattern::App(p, ps) | Pattern::Match(p, ps) =>
          ps.iter().fold(rec(p, kind, ev), |ev, p| rec(p, kind, ev)),
        Pattern::Pvar(_, m) => rec(m, Kind::Mem, ev),
        Pattern::Glob(mp, m) => rec(m, Kind::Mem, rec(mp, Kind::Mod, ev)),
      }
    }
    rec(self, Kind::Form, MEvarMap::new())
  }
}

impl fmt::Display for Pattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fn list(f: &mut fmt::Formatter<'_>, ps: &[Pattern], sep: &str) -> fmt::Result {
      for (i, p) in ps.iter().enumerate() {
        if i != 0 { write!(f, "{sep}")? }
        write!(f, "{p}")?
      }
      Ok(())
    }
    match self {
      Pattern::Wildcard => write!(f, "_"),
      Pattern::Named(p, x) => write!(f, "({p} as {x})"),
      Pattern::Sub(p) => write!(f, "sub({p})"),
      Pattern::Or(ps) => { write!(f, "(")?; list(f, ps, " | ")?; write!(f, ")") }
      Pattern::Memory(x) => write!(f, "&{x}"),
      Pattern::Module(x) => write!(f, "module {x}"),
      Pattern::If(c, t, e) => write!(f, "(if {c} then {t} else {e})"),
      Pattern::Int(n) => write!(f, "{n}"),
      Pattern::Local(x) => write!(f, "{x}"),
      Pattern::Op(p, _) => write!(f, "{p}"),
      Pattern::App(p, ps) => { write!(f, "({p} ")?; list(f, ps, " ")?; write!(f, ")") }
      Pattern::Tuple(ps) => { write!(f, "(")?; list(f, ps, ", ")?; write!(f, ")") }
      Pattern::Proj(p, i) => write!(f, "{p}.`{}", i + 1),
      Pattern::Match(p, ps) => { write!(f, "(match {p} with ")?; list(f, ps, " | ")?; write!(f, ")") }
      Pattern::Pvar(x, m) => write!(f, "{}{{{m}}}", x.0),
      Pattern::Glob(mp, m) => write!(f, "(glob {mp}){{{m}}}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::intern;

  #[test]
  fn captures_are_sorted_by_position() {
    let p = Pattern::Tuple(vec![
      Pattern::var("a"),
      Pattern::Pvar(ProgVar(intern("x")), Box::new(Pattern::Memory(intern("m")))),
      Pattern::Glob(Box::new(Pattern::var("M")), Box::new(Pattern::var("m"))),
    ]);
    let ev = p.captures();
    assert!(ev.is_form(&intern("a")));
    assert!(ev.is_mem(&intern("m")));
    assert!(ev.is_mod(&intern("M")));
    assert!(!ev.filled());
  }

  #[test]
  #[should_panic(expected = "another kind")]
  fn captures_reject_mixed_kinds() {
    let p = Pattern::Tuple(vec![
      Pattern::var("m"),
      Pattern::Pvar(ProgVar(intern("x")), Box::new(Pattern::Memory(intern("m")))),
    ]);
    let _ = p.captures();
  }
}
