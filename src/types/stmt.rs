//! Program statements.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use serde::{Deserialize, Serialize};
use super::{Path, ProgVar, Term};

/// The left-hand side of an assignment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LValue {
  /// A single variable.
  Var(ProgVar),
  /// A tuple of variables.
  Tuple(Box<[ProgVar]>),
}

/// A single instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instr {
  /// `x <- e`
  Assign(LValue, Term),
  /// `x <$ d`
  Sample(LValue, Term),
  /// `x <@ f(args)`, or a call whose result is dropped.
  Call(Option<LValue>, Path, Box<[Term]>),
  /// `assert e`
  Assert(Term),
  /// `if c { s1 } else { s2 }`
  If(Term, Stmt, Stmt),
  /// `while c { s }`
  While(Term, Stmt),
}

/// A sequence of instructions.
///
/// The instructions are shared, so cloning a statement or keeping the parts
/// of it that an edit did not touch costs no copying.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stmt(Rc<[Instr]>);

impl Stmt {
  /// The empty statement.
  #[must_use] pub fn skip() -> Self { Self(Rc::new([])) }

  /// Are these two statements the same allocation?
  #[must_use] pub fn ptr_eq(&self, other: &Stmt) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl Deref for Stmt {
  type Target = [Instr];
  fn deref(&self) -> &[Instr] { &self.0 }
}

impl From<Vec<Instr>> for Stmt {
  fn from(v: Vec<Instr>) -> Self { Self(v.into()) }
}

impl FromIterator<Instr> for Stmt {
  fn from_iter<I: IntoIterator<Item = Instr>>(iter: I) -> Self { Self(iter.into_iter().collect()) }
}

impl Instr {
  /// `x <- e` for a single variable.
  #[must_use] pub fn assign(x: &str, e: Term) -> Self {
    Instr::Assign(LValue::Var(ProgVar(crate::intern(x))), e)
  }
}

impl fmt::Display for LValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LValue::Var(x) => write!(f, "{}", x.0),
      LValue::Tuple(xs) => {
        write!(f, "(")?;
        for (i, x) in xs.iter().enumerate() {
          if i != 0 { write!(f, ", ")? }
          write!(f, "{}", x.0)?
        }
        write!(f, ")")
      }
    }
  }
}

impl fmt::Display for Instr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Instr::Assign(lv, e) => write!(f, "{lv} <- {e};"),
      Instr::Sample(lv, e) => write!(f, "{lv} <$ {e};"),
      Instr::Call(lv, p, args) => {
        if let Some(lv) = lv { write!(f, "{lv} <@ ")? }
        write!(f, "{p}(")?;
        for (i, a) in args.iter().enumerate() {
          if i != 0 { write!(f, ", ")? }
          write!(f, "{a}")?
        }
        write!(f, ");")
      }
      Instr::Assert(e) => write!(f, "assert {e};"),
      Instr::If(c, s1, s2) => write!(f, "if ({c}) {{{s1}}} else {{{s2}}}"),
      Instr::While(c, s) => write!(f, "while ({c}) {{{s}}}"),
    }
  }
}

impl fmt::Display for Stmt {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, instr) in self.iter().enumerate() {
      if i != 0 { write!(f, " ")? }
      write!(f, "{instr}")?
    }
    Ok(())
  }
}

impl fmt::Debug for Stmt {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self}") }
}
