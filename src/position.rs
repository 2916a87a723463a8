//! Sets of sub-term positions and occurrence selectors.
//!
//! A [`PosSet`] records where a predicate matched inside a term. It is a
//! tree mirroring the term: each level maps a child index (in the order of
//! [`Term::children`]) either to a [`Pos::Select`] leaf, tagged with its
//! discovery ordinal, or to a [`Pos::Sub`] level below it. The outermost level
//! has a single slot, index `0`, standing for the term itself.
//!
//! Ordinals are dense from `0` in pre-order, so iterating a `PosSet` in key
//! order visits the leaves in ordinal order. Empty levels are never stored.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize};
use ecm_util::StackList;
use crate::error::{MatchError, Result};
use crate::reduce::{self, Env, RedInfo};
use crate::types::{Ident, Term, Ty};

/// The verdict of a selection predicate on one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Select {
  /// Select this node and do not look below it. A negative key selects the
  /// node itself; a key `k >= 0` selects the application with its last `k`
  /// arguments dropped.
  Accept(i32),
  /// Do not select this node; look at its children.
  Continue,
}

/// One slot of a [`PosSet`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pos {
  /// The sub-term at this slot was selected.
  Select {
    /// The discovery ordinal, from `0`.
    ord: usize,
    /// The key of the [`Select::Accept`] that selected it.
    drop: i32,
  },
  /// Some sub-terms below this slot were selected.
  Sub(PosSet),
}

/// A set of positions inside a term.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosSet(pub BTreeMap<usize, Pos>);

impl PosSet {
  /// The empty set.
  #[must_use] pub fn empty() -> Self { Self::default() }

  /// Does the set contain no position?
  #[must_use] pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// The set containing just the root of the term.
  #[must_use] pub fn root() -> Self {
    Self(BTreeMap::from([(0, Pos::Select { ord: 0, drop: -1 })]))
  }

  /// Visit the selected positions in ordinal order, as child index paths
  /// from the root (the leading `0` of the root slot included).
  pub fn for_each_path(&self, mut f: impl FnMut(&[usize], usize, i32)) {
    fn rec(s: &PosSet, path: &mut Vec<usize>, f: &mut impl FnMut(&[usize], usize, i32)) {
      for (&i, p) in &s.0 {
        path.push(i);
        match *p {
          Pos::Select { ord, drop } => f(path, ord, drop),
          Pos::Sub(ref s) => rec(s, path, f),
        }
        path.pop();
      }
    }
    rec(self, &mut vec![], &mut f)
  }
}

/// The variables bound between the root and the node being visited,
/// innermost binder group first.
pub type Binders<'a> = StackList<'a, &'a [(Ident, Ty)]>;

/// Is `x` bound by one of the enclosing binders?
#[must_use] pub fn is_bound(bs: Binders<'_>, x: Ident) -> bool {
  bs.iter().any(|b| b.iter().any(|&(y, _)| y == x))
}

/// Whether an [`Occ`] lists the occurrences to keep or to drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
  /// Keep only the listed occurrences.
  Inclusive,
  /// Keep everything but the listed occurrences.
  Exclusive,
}

/// An occurrence selector: a polarity and a set of 1-based occurrence numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occ {
  /// How to read `occs`.
  pub polarity: Polarity,
  /// The 1-based occurrence numbers.
  pub occs: BTreeSet<usize>,
}

impl Occ {
  /// Keep only `occs`.
  #[must_use] pub fn inclusive(occs: impl IntoIterator<Item = usize>) -> Self {
    Self { polarity: Polarity::Inclusive, occs: occs.into_iter().collect() }
  }

  /// Keep everything except `occs`.
  #[must_use] pub fn exclusive(occs: impl IntoIterator<Item = usize>) -> Self {
    Self { polarity: Polarity::Exclusive, occs: occs.into_iter().collect() }
  }

  /// Does the selector keep the `n`th (1-based) occurrence?
  #[must_use] pub fn admits(&self, n: usize) -> bool {
    match self.polarity {
      Polarity::Inclusive => self.occs.contains(&n),
      Polarity::Exclusive => !self.occs.contains(&n),
    }
  }
}

/// Walk `t` in pre-order, asking `accept` about every node, and collect the
/// accepted positions. Accepted nodes are not looked into. Nothing accepted
/// gives the empty set.
pub fn select(mut accept: impl FnMut(Binders<'_>, &Term) -> Select, t: &Term) -> PosSet {
  fn rec<F: FnMut(Binders<'_>, &Term) -> Select>(
    accept: &mut F, bs: Binders<'_>, next: &mut usize, t: &Term,
  ) -> Option<Pos> {
    match accept(bs, t) {
      Select::Accept(drop) => {
        let ord = *next;
        *next += 1;
        Some(Pos::Select { ord, drop })
      }
      Select::Continue => {
        let mut sub = BTreeMap::new();
        for (i, c) in t.children().iter().enumerate() {
          let b = t.binders_of_child(i);
          let frame;
          let bs = if b.is_empty() { bs } else {
            frame = (bs, b);
            StackList(Some(&frame))
          };
          if let Some(p) = rec(accept, bs, next, c) { sub.insert(i, p); }
        }
        if sub.is_empty() { None } else { Some(Pos::Sub(PosSet(sub))) }
      }
    }
  }
  let mut next = 0;
  match rec(&mut accept, StackList(None), &mut next, t) {
    Some(p) => PosSet(BTreeMap::from([(0, p)])),
    None => PosSet::empty(),
  }
}

/// Keep the positions whose occurrence number `occ` admits, renumbering the
/// survivors densely from `0`.
#[must_use] pub fn filter(occ: &Occ, set: &PosSet) -> PosSet {
  fn rec(occ: &Occ, next: &mut usize, s: &PosSet) -> PosSet {
    let mut out = BTreeMap::new();
    for (&i, p) in &s.0 {
      match *p {
        Pos::Select { ord, drop } => if occ.admits(ord + 1) {
          out.insert(i, Pos::Select { ord: *next, drop });
          *next += 1;
        }
        Pos::Sub(ref s) => {
          let s = rec(occ, next, s);
          if !s.is_empty() { out.insert(i, Pos::Sub(s)); }
        }
      }
    }
    PosSet(out)
  }
  rec(occ, &mut 0, set)
}

/// The number of selected positions.
#[must_use] pub fn occurrences(set: &PosSet) -> usize {
  set.0.values().map(|p| match p {
    Pos::Select { .. } => 1,
    Pos::Sub(s) => occurrences(s),
  }).sum()
}

/// Are all the 1-based occurrence numbers `occs` in range for `set`?
#[must_use] pub fn is_occurences_valid(occs: &BTreeSet<usize>, set: &PosSet) -> bool {
  let n = occurrences(set);
  occs.iter().all(|&o| 1 <= o && o <= n)
}

/// Apply `f` at the selected positions of `t`, rebuilding only the nodes on
/// the way to them.
///
/// Fails with [`MatchError::InvalidPosition`] if the set does not fit the
/// shape of `t`, including a keyed position on something that is not an
/// application with enough arguments.
pub fn map(set: &PosSet, f: &mut impl FnMut(&Term) -> Term, t: &Term) -> Result<Term> {
  fn keyed(drop: i32, f: &mut impl FnMut(&Term) -> Term, t: &Term) -> Result<Term> {
    let Ok(k) = usize::try_from(drop) else { return Ok(f(t)) };
    if k == 0 { return Ok(f(t)) }
    let (head, args) = t.destr_app();
    if args.len() < k { return Err(MatchError::InvalidPosition) }
    let (pre, post) = args.split_at(args.len() - k);
    Ok(Term::app(f(&Term::app(head.clone(), pre.to_vec())), post.to_vec()))
  }
  fn rec(p: &Pos, f: &mut impl FnMut(&Term) -> Term, t: &Term) -> Result<Term> {
    match *p {
      Pos::Select { drop, .. } => keyed(drop, f, t),
      Pos::Sub(ref s) => {
        let mut cs = t.children();
        for (&i, p) in &s.0 {
          let c = cs.get(i).cloned().ok_or(MatchError::InvalidPosition)?;
          cs[i] = rec(p, f, &c)?;
        }
        Ok(t.with_children(cs))
      }
    }
  }
  let mut root = None;
  for (&i, p) in &set.0 {
    if i != 0 { return Err(MatchError::InvalidPosition) }
    root = Some(p);
  }
  match root {
    Some(p) => rec(p, f, t),
    None => Ok(t.clone()),
  }
}

/// Abstract the selected positions of `t` into a fresh variable, returning
/// the variable and the abstracted term.
pub fn topattern(set: &PosSet, t: &Term) -> Result<(Ident, Term)> {
  let x = Ident::fresh("_p");
  let body = map(set, &mut |_| Term::local(x), t)?;
  Ok((x, body))
}

/// How [`select_form`] compares candidate sub-terms with the pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvMode {
  /// Structural equality.
  Syntactic,
  /// Convertibility under full reduction.
  Conv,
}

/// Select the occurrences of the closed term `p` in `target`, keep those
/// `occ` admits, and return them.
///
/// Sub-terms mentioning a variable bound inside `target` are never selected.
/// With `keyed`, an application whose head is the head of `p` is also
/// selected when dropping some trailing arguments makes it equal to `p`.
///
/// Fails with [`MatchError::InvalidOccurence`] if `occ` names occurrences
/// that do not exist.
pub fn select_form(
  env: &dyn Env, occ: Option<&Occ>, conv: ConvMode, keyed: bool, p: &Term, target: &Term,
) -> Result<PosSet> {
  let same = |a: &Term, b: &Term| a == b ||
    (conv == ConvMode::Conv && reduce::is_conv(env, RedInfo::all(), a, b));
  let (phead, pargs) = p.destr_app();
  let set = select(|bs, t| {
    if bs.0.is_some() && t.fv().iter().any(|&x| is_bound(bs, x)) { return Select::Continue }
    if keyed {
      let (head, args) = t.destr_app();
      if head == phead && args.len() >= pargs.len() {
        let k = args.len() - pargs.len();
        if k == 0 {
          if same(t, p) { return Select::Accept(-1) }
        } else if let Ok(k32) = i32::try_from(k) {
          if same(&Term::app(head.clone(), args[..pargs.len()].to_vec()), p) {
            return Select::Accept(k32)
          }
        }
      }
      Select::Continue
    } else if same(t, p) { Select::Accept(-1) } else { Select::Continue }
  }, target);
  let Some(occ) = occ else { return Ok(set) };
  if !is_occurences_valid(&occ.occs, &set) {
    let n = occurrences(&set);
    return Err(MatchError::InvalidOccurence(
      occ.occs.iter().copied().filter(|&o| o == 0 || o > n).collect()))
  }
  Ok(filter(occ, &set))
}
