//! Cursors into nested statements.
//!
//! A [`Zipper`] splits the block containing the addressed instruction into
//! what comes before the cursor and what starts at it, and remembers for
//! every enclosing `if`/`while` how to put the block back. Zipping up
//! rebuilds only the blocks on the path; every other block of the original
//! statement is reused as is.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{MatchError, Result};
use crate::types::{Instr, Stmt, Term};

/// Which block of a branching instruction to descend into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
  /// The `then` block of an `if`, or the body of a `while`.
  Then,
  /// The `else` block of an `if`.
  Else,
}

/// The address of an instruction inside a statement.
///
/// Written `i` for the `i`th instruction (from `0`) of the block, or
/// `i.b.rest` for the position `rest` inside block `b` (`0` for `then` and
/// loop bodies, `1` for `else`) of the `i`th instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodePos {
  /// An instruction of the current block.
  At(usize),
  /// A position inside a block of a branching instruction.
  Into {
    /// The index of the branching instruction.
    index: usize,
    /// The block to enter.
    branch: Branch,
    /// The position inside that block.
    pos: Box<CodePos>,
  },
}

impl CodePos {
  /// `index.branch.pos`
  #[must_use] pub fn into_branch(index: usize, branch: Branch, pos: CodePos) -> Self {
    CodePos::Into { index, branch, pos: Box::new(pos) }
  }
}

impl fmt::Display for CodePos {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CodePos::At(i) => write!(f, "{i}"),
      CodePos::Into { index, branch, pos } => {
        let b = match branch { Branch::Then => 0, Branch::Else => 1 };
        write!(f, "{index}.{b}.{pos}")
      }
    }
  }
}

impl FromStr for CodePos {
  type Err = String;
  fn from_str(s: &str) -> std::result::Result<Self, String> {
    let parts = s.split('.')
      .map(|p| p.trim().parse::<usize>().map_err(|e| format!("bad code position {s:?}: {e}")))
      .collect::<std::result::Result<Vec<_>, _>>()?;
    let [steps @ .., last] = &*parts else { return Err(format!("empty code position {s:?}")) };
    if steps.len() % 2 != 0 {
      return Err(format!("bad code position {s:?}: expected `i` or `i.b.pos`"))
    }
    steps.chunks_exact(2).rev().try_fold(CodePos::At(*last), |pos, step| {
      let branch = match step[1] {
        0 => Branch::Then,
        1 => Branch::Else,
        b => return Err(format!("bad code position {s:?}: no branch {b}")),
      };
      Ok(CodePos::into_branch(step[0], branch, pos))
    })
  }
}

/// The instruction a zipper descended through, with the parts of it that
/// were left behind.
#[derive(Clone, Debug)]
pub enum Hole {
  /// In the `then` block; the condition and the `else` block.
  IfThen(Term, Stmt),
  /// In the `else` block; the condition and the `then` block.
  IfElse(Term, Stmt),
  /// In the loop body; the condition.
  While(Term),
}

/// One level of the path from a zipper's block up to the root.
#[derive(Clone, Debug)]
pub struct Frame {
  /// The instructions before the branching one, in program order.
  pub head: Vec<Instr>,
  /// The instructions after the branching one.
  pub tail: Vec<Instr>,
  /// The branching instruction itself.
  pub hole: Hole,
}

impl Frame {
  fn branch(&self) -> Branch {
    match self.hole {
      Hole::IfThen(..) | Hole::While(_) => Branch::Then,
      Hole::IfElse(..) => Branch::Else,
    }
  }

  fn plug(self, s: Stmt) -> Stmt {
    let instr = match self.hole {
      Hole::IfThen(c, e) => Instr::If(c, s, e),
      Hole::IfElse(c, t) => Instr::If(c, t, s),
      Hole::While(c) => Instr::While(c, s),
    };
    self.head.into_iter().chain(std::iter::once(instr)).chain(self.tail).collect()
  }
}

/// A cursor on an instruction of a statement.
#[derive(Clone, Debug)]
pub struct Zipper {
  /// The instructions of the current block before the cursor, in program order.
  pub head: Vec<Instr>,
  /// The instructions of the current block from the cursor on.
  pub tail: Vec<Instr>,
  /// The enclosing levels, outermost first.
  pub path: Vec<Frame>,
}

impl Zipper {
  /// The instruction under the cursor.
  #[must_use] pub fn instr(&self) -> Option<&Instr> { self.tail.first() }

  /// The code position of the cursor. `zipper_of_cpos(&z.cpos(), s)` gives
  /// back the same cursor on the statement `z` was made from.
  #[must_use] pub fn cpos(&self) -> CodePos {
    self.path.iter().rev().fold(CodePos::At(self.head.len()), |pos, f| {
      CodePos::into_branch(f.head.len(), f.branch(), pos)
    })
  }
}

/// Put the cursor on the instruction at `pos`.
///
/// Fails with [`MatchError::InvalidCPos`] if an index is out of range, or if
/// the position enters an instruction that is not an `if`/`while` or a block
/// it does not have.
pub fn zipper_of_cpos(pos: &CodePos, stmt: &Stmt) -> Result<Zipper> {
  let invalid = || {
    debug!("invalid code position {pos} in {stmt}");
    MatchError::InvalidCPos(pos.clone())
  };
  let mut path = vec![];
  let mut s = stmt.clone();
  let mut p = pos;
  loop {
    match p {
      &CodePos::At(i) => {
        if i >= s.len() { return Err(invalid()) }
        return Ok(Zipper { head: s[..i].to_vec(), tail: s[i..].to_vec(), path })
      }
      &CodePos::Into { index, branch, pos: ref rest } => {
        let (hole, inner) = match (s.get(index), branch) {
          (Some(Instr::If(c, t, e)), Branch::Then) => (Hole::IfThen(c.clone(), e.clone()), t.clone()),
          (Some(Instr::If(c, t, e)), Branch::Else) => (Hole::IfElse(c.clone(), t.clone()), e.clone()),
          (Some(Instr::While(c, body)), Branch::Then) => (Hole::While(c.clone()), body.clone()),
          _ => return Err(invalid()),
        };
        path.push(Frame { head: s[..index].to_vec(), tail: s[index + 1..].to_vec(), hole });
        s = inner;
        p = &**rest;
      }
    }
  }
}

/// Rebuild the whole statement from a zipper.
#[must_use] pub fn zip(z: Zipper) -> Stmt {
  let s: Stmt = z.head.into_iter().chain(z.tail).collect();
  z.path.into_iter().rev().fold(s, |s, f| f.plug(s))
}

/// The instructions that follow the cursor, level by level from the
/// innermost block to the outermost. Unless `strict`, the innermost level
/// starts with the instruction under the cursor.
#[must_use] pub fn after(strict: bool, z: &Zipper) -> Vec<Vec<Instr>> {
  let first = if strict { z.tail.get(1..).unwrap_or_default() } else { &z.tail[..] };
  std::iter::once(first.to_vec()).chain(z.path.iter().rev().map(|f| f.tail.clone())).collect()
}

/// Edit the instruction at `pos`.
///
/// `f` gets `extra`, the `state` and the instruction, and returns the new
/// state and the instructions to put in its place: none to delete it, one
/// to replace it, several to splice. An error from `f` leaves nothing edited
/// and is returned as is.
pub fn fold<X, S, E: From<MatchError>>(
  extra: X, pos: &CodePos,
  f: impl FnOnce(X, S, &Instr) -> std::result::Result<(S, Vec<Instr>), E>,
  state: S, stmt: &Stmt,
) -> std::result::Result<(S, Stmt), E> {
  let mut z = zipper_of_cpos(pos, stmt)?;
  let mut tail = std::mem::take(&mut z.tail).into_iter();
  let Some(instr) = tail.next() else { return Err(MatchError::InvalidCPos(pos.clone()).into()) };
  let (state, new) = f(extra, state, &instr)?;
  z.tail = new.into_iter().chain(tail).collect();
  Ok((state, zip(z)))
}

/// [`fold`] without the extra argument or state.
pub fn map(pos: &CodePos, f: impl FnOnce(&Instr) -> Result<Vec<Instr>>, stmt: &Stmt) -> Result<Stmt> {
  fold((), pos, |(), (), i| Ok(((), f(i)?)), (), stmt).map(|p| p.1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{Ident, Path};

  fn b() -> Term { Term::local(Ident::fresh("b")) }

  // if b then x <- 1 else y <- 2; w <- 3
  fn sample() -> Stmt {
    vec![
      Instr::If(b(), vec![Instr::assign("x", Term::int(1))].into(),
        vec![Instr::assign("y", Term::int(2))].into()),
      Instr::assign("w", Term::int(3)),
    ].into()
  }

  #[test]
  fn edit_inside_then_branch() {
    let s = sample();
    let pos = "0.0.0".parse::<CodePos>().unwrap();
    let z = zipper_of_cpos(&pos, &s).unwrap();
    assert_eq!(z.instr(), Some(&Instr::assign("x", Term::int(1))));
    let s2 = map(&pos, |_| Ok(vec![Instr::assign("x", Term::int(5))]), &s).unwrap();
    let Instr::If(c, t, e) = &s2[0] else { panic!("expected an if") };
    let Instr::If(c0, _, e0) = &s[0] else { panic!("expected an if") };
    assert_eq!(c, c0);
    assert_eq!(**t, [Instr::assign("x", Term::int(5))]);
    assert!(e.ptr_eq(e0));
    assert_eq!(s2[1], s[1]);
    assert_eq!(s2.len(), 2);
  }

  #[test]
  fn zip_without_edit_is_lossless() {
    let s: Stmt = vec![
      Instr::assign("a", Term::int(0)),
      Instr::While(b(), sample()),
      Instr::Assert(b()),
    ].into();
    for p in ["0", "1", "2", "1.0.0", "1.0.1", "1.0.0.0.0", "1.0.0.1.0"] {
      let pos = p.parse::<CodePos>().unwrap();
      let z = zipper_of_cpos(&pos, &s).unwrap();
      assert_eq!(z.cpos(), pos);
      assert_eq!(zip(z), s);
    }
  }

  #[test]
  fn invalid_positions() {
    let s = sample();
    for p in ["2", "1.0.0", "0.1.1", "0.0.0.0.0"] {
      let pos = p.parse::<CodePos>().unwrap();
      assert_eq!(zipper_of_cpos(&pos, &s).map(|_| ()), Err(MatchError::InvalidCPos(pos)));
    }
    let w: Stmt = vec![Instr::While(b(), Stmt::skip())].into();
    let pos = "0.1.0".parse::<CodePos>().unwrap();
    assert!(zipper_of_cpos(&pos, &w).is_err());
  }

  #[test]
  fn code_position_syntax() {
    assert_eq!("3".parse::<CodePos>(), Ok(CodePos::At(3)));
    let p = CodePos::into_branch(1, Branch::Else, CodePos::into_branch(0, Branch::Then, CodePos::At(2)));
    assert_eq!(p.to_string(), "1.1.0.0.2");
    assert_eq!("1.1.0.0.2".parse::<CodePos>(), Ok(p));
    assert!("1.2.0".parse::<CodePos>().is_err());
    assert!("1.0".parse::<CodePos>().is_err());
    assert!("x".parse::<CodePos>().is_err());
  }

  #[test]
  fn after_lists_each_level() {
    let s = sample();
    let z = zipper_of_cpos(&"0.1.0".parse().unwrap(), &s).unwrap();
    let strict = after(true, &z);
    assert_eq!(strict, vec![vec![], vec![Instr::assign("w", Term::int(3))]]);
    let loose = after(false, &z);
    assert_eq!(loose[0], vec![Instr::assign("y", Term::int(2))]);
  }

  #[test]
  fn fold_threads_state_and_splices() {
    let s = sample();
    let call = Instr::Call(None, Path::new(&["M", "f"]), Box::new([]));
    let (n, s2) = fold(7_usize, &CodePos::At(1), |extra, n: usize, i| {
      Ok::<_, MatchError>((n + extra, vec![call.clone(), i.clone()]))
    }, 1, &s).unwrap();
    assert_eq!(n, 8);
    assert_eq!(s2.len(), 3);
    assert_eq!(s2[1], call);
    let (_, s3) = fold((), &CodePos::At(0), |(), (), _| Ok::<_, MatchError>(((), vec![])), (), &s).unwrap();
    assert_eq!(*s3, s[1..]);
  }

  #[test]
  fn fold_propagates_errors() {
    let s = sample();
    let r = fold((), &CodePos::At(0), |(), (), _| Err::<((), Vec<Instr>), _>(MatchError::NoMatches), (), &s);
    assert_eq!(r.map(|p| p.1), Err(MatchError::NoMatches));
  }
}
