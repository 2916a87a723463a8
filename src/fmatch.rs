//! Matching formulas against formulas with unification variables.
//!
//! A formula pattern is an ordinary [`Term`] whose placeholders are locals
//! (and memories, and module parameters) declared in an [`MEvarMap`]. The
//! types in the pattern may contain unification variables, which are
//! assigned in a [`UnifyEnv`] along the way.
//!
//! The match is structural, up to renaming of bound variables. The
//! [`FMatchOpts`] relax it: `DELTA` reduces the subject (then the pattern)
//! when the shapes differ, `CONV` accepts a convertible subject once the
//! pattern is fully instantiated, and `HORDER` lets a placeholder applied
//! to distinct bound variables stand for a function of them.

use std::collections::HashSet;
use crate::error::{MatchError, Result};
use crate::evmap::{MEvarMap, Obj};
use crate::position::{self, ConvMode, Occ};
use crate::reduce::{self, Env, RedInfo};
use crate::types::{Ident, Memory, ModPath, Term, TermKind, Ty, UnivarId};
use crate::unify::UnifyEnv;

bitflags! {
  /// The ways a formula match may go beyond syntactic equality.
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
  pub struct FMatchOpts: u8 {
    /// Unfold definitions and reduce when the shapes differ.
    const DELTA = 1;
    /// Accept convertible terms where the pattern has no placeholders left.
    const CONV = 2;
    /// Solve placeholders applied to distinct bound variables.
    const HORDER = 4;
  }
}

/// Placeholders of a formula pattern.
pub type EvMap = MEvarMap<Ident>;

/// A pattern binder, the subject binder it is matched with, and the type
/// of the latter.
type Bound = Vec<(Ident, Ident, Ty)>;

struct FMatcher<'a> {
  opts: FMatchOpts,
  env: &'a dyn Env,
  ue: UnifyEnv,
  ev: EvMap,
  fuel: usize,
}

fn subject_bound(bs: &Bound, y: Ident) -> bool { bs.iter().any(|b| b.1 == y) }

impl FMatcher<'_> {
  fn unify_ty(&mut self, t1: &Ty, t2: &Ty) -> Result<()> { self.ue.unify(t1, t2) }

  fn unify_tys(&mut self, t1: &[Ty], t2: &[Ty]) -> Result<()> {
    if t1.len() != t2.len() { return Err(MatchError::MatchFailure) }
    t1.iter().zip(t2).try_for_each(|(a, b)| self.unify_ty(a, b))
  }

  fn all(&mut self, bs: &mut Bound, ps: &[Term], ss: &[Term]) -> Result<()> {
    if ps.len() != ss.len() { return Err(MatchError::MatchFailure) }
    ps.iter().zip(ss).try_for_each(|(p, s)| self.doit(bs, p, s))
  }

  /// Is `p` free of unset form placeholders?
  fn closed(&self, p: &Term) -> bool {
    p.fv().iter().all(|x| !self.ev.is_form(x) || self.ev.is_set(x))
  }

  /// `p` with the placeholders set so far and the bound variables of the
  /// subject in place of the pattern's.
  fn instantiate(&mut self, bs: &Bound, p: &Term) -> Term {
    let mut s = self.ev.assubst();
    for &(x, y, _) in bs { s.bind(x, Term::local(y)) }
    let ue = &mut self.ue;
    s.apply(p).map_ty(&mut |t| ue.resolve(t))
  }

  /// Match `p` against `s`, trying the relaxations when the structural
  /// match fails. On failure nothing is assigned, and the first error is
  /// returned.
  fn doit(&mut self, bs: &mut Bound, p: &Term, s: &Term) -> Result<()> {
    let snap = (self.ue.clone(), self.ev.clone());
    let err = match self.structural(bs, p, s) {
      Ok(()) => return Ok(()),
      Err(e @ (MatchError::MatchFailure | MatchError::CannotUnify(..))) => e,
      Err(e) => return Err(e),
    };
    (self.ue, self.ev) = snap;
    if self.opts.contains(FMatchOpts::CONV) && self.closed(p) {
      let p2 = self.instantiate(bs, p);
      if reduce::is_conv(self.env, RedInfo::all(), &p2, s) { return Ok(()) }
    }
    if self.opts.contains(FMatchOpts::DELTA) && self.fuel > 0 {
      self.fuel -= 1;
      if let Some(s2) = reduce::h_red(self.env, RedInfo::all(), s) {
        debug!("reducing the subject {s} to {s2}");
        return self.doit(bs, p, &s2).map_err(|_| err)
      }
      let head_is_evar = p.destr_app().0.as_local().is_some_and(|x| self.ev.is_form(&x));
      if !head_is_evar {
        if let Some(p2) = reduce::h_red(self.env, RedInfo::all(), p) {
          debug!("reducing the pattern {p} to {p2}");
          return self.doit(bs, &p2, s).map_err(|_| err)
        }
      }
    }
    Err(err)
  }

  /// Bind the form placeholder `x` to `s`, or check `s` against its value.
  fn assign(&mut self, bs: &Bound, x: Ident, s: &Term) -> Result<()> {
    if s.fv().iter().any(|&y| subject_bound(bs, y)) {
      trace!("{s} would escape its binder through ?{x}");
      return Err(MatchError::MatchFailure)
    }
    match self.ev.get_form(&x) {
      Some(v) if v == s => Ok(()),
      Some(v) if self.opts.contains(FMatchOpts::CONV) &&
        reduce::is_conv(self.env, RedInfo::all(), v, s) => Ok(()),
      Some(_) => Err(MatchError::MatchFailure),
      None => {
        self.ev = self.ev.set(x, Obj::Form(s.clone()));
        Ok(())
      }
    }
  }

  fn match_mem(&mut self, m: Memory, m2: Memory) -> Result<()> {
    if !self.ev.is_mem(&m.0) {
      return if m == m2 { Ok(()) } else { Err(MatchError::MatchFailure) }
    }
    match self.ev.get_mem(&m.0) {
      Some(v) if v == m2 => Ok(()),
      Some(_) => Err(MatchError::MatchFailure),
      None => { self.ev = self.ev.set(m.0, Obj::Mem(m2)); Ok(()) }
    }
  }

  fn match_mod(&mut self, mp: &ModPath, mp2: &ModPath) -> Result<()> {
    match mp {
      ModPath::Local(x) if self.ev.is_mod(x) => match self.ev.get_mod(x) {
        Some(v) if v == mp2 => Ok(()),
        Some(_) => Err(MatchError::MatchFailure),
        None => { self.ev = self.ev.set(*x, Obj::Mod(mp2.clone())); Ok(()) }
      },
      _ if mp == mp2 => Ok(()),
      _ => Err(MatchError::MatchFailure),
    }
  }

  /// The subject binders the arguments of a placeholder application stand
  /// for, if they are distinct pattern-bound variables.
  fn miller_args(bs: &Bound, args: &[Term]) -> Option<Vec<(Ident, Ty)>> {
    let mut seen = HashSet::new();
    args.iter().map(|a| {
      let x = a.as_local()?;
      let &(_, y, ref ty) = bs.iter().rev().find(|b| b.0 == x)?;
      seen.insert(y).then(|| (y, ty.clone()))
    }).collect()
  }

  /// `?x y1 ... yn` against `s`: `?x` is `fun y1 ... yn => s`.
  fn horder(&mut self, bs: &Bound, x: Ident, ys: Vec<(Ident, Ty)>, s: &Term) -> Result<()> {
    if let Some(v) = self.ev.get_form(&x) {
      let args = ys.iter().map(|&(y, _)| Term::local(y)).collect();
      let applied = Term::app(v.clone(), args);
      return if reduce::is_conv(self.env, RedInfo::BETA, &applied, s) {
        Ok(())
      } else {
        Err(MatchError::MatchFailure)
      }
    }
    self.assign(bs, x, &Term::lambda(ys, s.clone()))
  }

  fn structural(&mut self, bs: &mut Bound, p: &Term, s: &Term) -> Result<()> {
    if_chain! {
      if self.opts.contains(FMatchOpts::HORDER);
      if let TermKind::App(f, pargs) = &**p;
      if let Some(x) = f.as_local();
      if self.ev.is_form(&x);
      then {
        if let Some(ys) = Self::miller_args(bs, pargs) { return self.horder(bs, x, ys, s) }
        debug!("?{x} is not applied to distinct bound variables in {p}; matching first-order");
      }
    }
    match (&**p, &**s) {
      (&TermKind::Local(x), _) if self.ev.is_form(&x) => self.assign(bs, x, s),
      (&TermKind::Local(x), &TermKind::Local(y)) => {
        let ok = match bs.iter().rev().find(|b| b.0 == x) {
          Some(b) => b.1 == y,
          None => x == y && !subject_bound(bs, y),
        };
        if ok { Ok(()) } else { Err(MatchError::MatchFailure) }
      }
      (TermKind::Int(n), TermKind::Int(m)) if n == m => Ok(()),
      (TermKind::Op(p1, tys1), TermKind::Op(p2, tys2)) if p1 == p2 => self.unify_tys(tys1, tys2),
      (TermKind::App(f, pargs), TermKind::App(g, sargs)) => {
        if pargs.len() <= sargs.len() {
          let (pre, post) = sargs.split_at(sargs.len() - pargs.len());
          self.doit(bs, f, &Term::app(g.clone(), pre.to_vec()))?;
          self.all(bs, pargs, post)
        } else {
          let (pre, post) = pargs.split_at(pargs.len() - sargs.len());
          self.doit(bs, &Term::app(f.clone(), pre.to_vec()), g)?;
          self.all(bs, post, sargs)
        }
      }
      (TermKind::Tuple(ps), TermKind::Tuple(ss)) => self.all(bs, ps, ss),
      (TermKind::Proj(p1, i), TermKind::Proj(s1, j)) if i == j => self.doit(bs, p1, s1),
      (TermKind::If(c1, t1, e1), TermKind::If(c2, t2, e2)) => {
        self.doit(bs, c1, c2)?;
        self.doit(bs, t1, t2)?;
        self.doit(bs, e1, e2)
      }
      (TermKind::Let((x, tx), p1, p2), TermKind::Let((y, ty), s1, s2)) => {
        self.unify_ty(tx, ty)?;
        self.doit(bs, p1, s1)?;
        bs.push((*x, *y, ty.clone()));
        let r = self.doit(bs, p2, s2);
        bs.pop();
        r
      }
      (TermKind::Match(p1, pbs, pty), TermKind::Match(s1, sbs, sty)) => {
        self.unify_ty(pty, sty)?;
        self.doit(bs, p1, s1)?;
        self.all(bs, pbs, sbs)
      }
      (TermKind::Quant(q1, b1, body1), TermKind::Quant(q2, b2, body2)) if q1 == q2 => {
        let n = b1.len().min(b2.len());
        for ((_, t1), (_, t2)) in b1[..n].iter().zip(&b2[..n]) { self.unify_ty(t1, t2)? }
        let rest = |b: &[(Ident, Ty)], body: &Term| -> Term {
          if b.len() == n { body.clone() } else { TermKind::Quant(*q1, b[n..].into(), body.clone()).into() }
        };
        let (p2, s2) = (rest(&b1[..], body1), rest(&b2[..], body2));
        let depth = bs.len();
        bs.extend(b1[..n].iter().zip(&b2[..n]).map(|((x, _), (y, ty))| (*x, *y, ty.clone())));
        let r = self.doit(bs, &p2, &s2);
        bs.truncate(depth);
        r
      }
      (&TermKind::Pvar(x, m), &TermKind::Pvar(y, m2)) if x == y => self.match_mem(m, m2),
      (TermKind::Glob(mp, m), TermKind::Glob(mp2, m2)) => {
        self.match_mod(mp, mp2)?;
        self.match_mem(*m, *m2)
      }
      _ => Err(MatchError::MatchFailure),
    }
  }
}

/// Match the formula pattern `p` against `s`, extending the unifier and the
/// placeholder map. Fails with [`MatchError::MatchFailure`] (or the
/// [`MatchError::CannotUnify`] that made it fail) if there is no match.
pub fn f_match_core(
  opts: FMatchOpts, hyps: &dyn Env, (ue, ev): (UnifyEnv, EvMap), p: &Term, s: &Term,
) -> Result<(UnifyEnv, EvMap)> {
  let mut m = FMatcher { opts, env: hyps, ue, ev, fuel: crate::get_delta_fuel() };
  m.doit(&mut vec![], p, s)?;
  Ok((m.ue, m.ev))
}

/// [`f_match_core`], requiring every placeholder to be set by the match.
/// Also returns the final unifier closed into a function, giving for each
/// unification variable the type it stands for.
pub fn f_match(
  opts: FMatchOpts, hyps: &dyn Env, (ue, ev): (UnifyEnv, EvMap), p: &Term, s: &Term,
) -> Result<(UnifyEnv, impl Fn(UnivarId) -> Ty, EvMap)> {
  let (ue, ev) = f_match_core(opts, hyps, (ue, ev), p, s)?;
  if !ev.filled() {
    debug!("{p} matches {s} but leaves placeholders unset");
    return Err(MatchError::MatchFailure)
  }
  let close = ue.clone().close();
  Ok((ue, close, ev))
}

/// Instantiate a term with the result of a match.
#[must_use] pub fn instantiate(ev: &EvMap, close: impl Fn(UnivarId) -> Ty, t: &Term) -> Term {
  ev.assubst().apply(t).map_ty(&mut |ty| ty.map_univars(&mut |u| Some(close(u))))
}

/// Rewrite `goal` with the equation `lhs = rhs`, whose placeholders are
/// declared in `ev`.
///
/// The first sub-term of `goal` in pre-order that `f_match`es `lhs` fixes
/// the placeholders; then the occurrences of that sub-term admitted by
/// `occ` are replaced by the instantiated `rhs`. Fails with
/// [`MatchError::NoMatches`] if no sub-term matches or `occ` keeps none.
pub fn rewrite(
  opts: FMatchOpts, hyps: &dyn Env, occ: Option<&Occ>,
  (ue, ev): (UnifyEnv, EvMap), lhs: &Term, rhs: &Term, goal: &Term,
) -> Result<Term> {
  let mut found = None;
  position::select(|bs, t| {
    let clean = || !t.fv().iter().any(|&x| position::is_bound(bs, x));
    if found.is_none() && clean() {
      if let Ok((_, close, ev)) = f_match(opts, hyps, (ue.clone(), ev.clone()), lhs, t) {
        found = Some((t.clone(), instantiate(&ev, close, rhs)));
        return position::Select::Accept(-1)
      }
    }
    position::Select::Continue
  }, goal);
  let Some((target, rhs)) = found else { return Err(MatchError::NoMatches) };
  debug!("rewriting {target} into {rhs}");
  let mode = if opts.contains(FMatchOpts::CONV) { ConvMode::Conv } else { ConvMode::Syntactic };
  let set = position::select_form(hyps, occ, mode, false, &target, goal)?;
  if set.is_empty() { return Err(MatchError::NoMatches) }
  position::map(&set, &mut |_| rhs.clone(), goal)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::evmap::Kind;
  use crate::reduce::Hyps;
  use crate::registry::core;
  use crate::types::{Path, ProgVar};

  fn plus(a: Term, b: Term) -> Term { Term::binop(core().add.clone(), a, b) }
  fn evs(xs: &[Ident]) -> EvMap { MEvarMap::of_idents(xs.iter().map(|&x| (x, Kind::Form))) }

  #[test]
  fn first_order_match() {
    let a = Ident::fresh("a");
    let x = Term::local(Ident::fresh("x"));
    let p = plus(Term::local(a), Term::int(0));
    let env = Hyps::new();
    let (_, _, ev) = f_match(FMatchOpts::empty(), &env, (UnifyEnv::new(), evs(&[a])), &p, &plus(x.clone(), Term::int(0))).unwrap();
    assert_eq!(ev.get_form(&a), Some(&x));
    let r = f_match_core(FMatchOpts::empty(), &env, (UnifyEnv::new(), evs(&[a])), &p, &plus(Term::int(0), x));
    assert!(matches!(r, Err(MatchError::MatchFailure)));
  }

  #[test]
  fn unset_placeholders_fail_f_match_only() {
    let (a, b) = (Ident::fresh("a"), Ident::fresh("b"));
    let env = Hyps::new();
    let p = Term::local(a);
    assert!(f_match_core(FMatchOpts::empty(), &env, (UnifyEnv::new(), evs(&[a, b])), &p, &Term::int(1)).is_ok());
    assert!(f_match(FMatchOpts::empty(), &env, (UnifyEnv::new(), evs(&[a, b])), &p, &Term::int(1)).is_err());
  }

  #[test]
  fn operator_types_are_unified() {
    let mut ue = UnifyEnv::new();
    let u = ue.fresh();
    let eq = core().eq.clone();
    let a = Ident::fresh("a");
    let p = Term::app(Term::op(eq.clone(), vec![Ty::univar(u)]), vec![Term::local(a), Term::int(1)]);
    let s = Term::app(Term::op(eq, vec![Ty::int()]), vec![Term::int(2), Term::int(1)]);
    let hyps = Hyps::new();
    let (_, close, ev) = f_match(FMatchOpts::empty(), &hyps, (ue, evs(&[a])), &p, &s).unwrap();
    assert_eq!(close(u), Ty::int());
    assert_eq!(instantiate(&ev, close, &p), s);
  }

  #[test]
  fn delta_unfolds_the_subject() {
    let dbl = Path::new(&["M", "double"]);
    let y = Ident::fresh("y");
    let env = Hyps::new().with_op(dbl.clone(), vec![],
      Term::lambda(vec![(y, Ty::int())], plus(Term::local(y), Term::local(y))));
    let a = Ident::fresh("a");
    let p = plus(Term::local(a), Term::local(a));
    let s = Term::app(Term::op(dbl, vec![]), vec![Term::int(5)]);
    assert!(f_match_core(FMatchOpts::empty(), &env, (UnifyEnv::new(), evs(&[a])), &p, &s).is_err());
    let (_, ev) = f_match_core(FMatchOpts::DELTA, &env, (UnifyEnv::new(), evs(&[a])), &p, &s).unwrap();
    assert_eq!(ev.get_form(&a), Some(&Term::int(5)));
  }

  #[test]
  fn conv_accepts_convertible_closed_subterms() {
    let x = Ident::fresh("x");
    let env = Hyps::new().with_local(x, Term::int(3));
    let p = plus(Term::int(3), Term::int(1));
    let s = plus(Term::local(x), Term::int(1));
    assert!(f_match_core(FMatchOpts::empty(), &env, (UnifyEnv::new(), evs(&[])), &p, &s).is_err());
    assert!(f_match_core(FMatchOpts::CONV, &env, (UnifyEnv::new(), evs(&[])), &p, &s).is_ok());
  }

  #[test]
  fn binders_match_up_to_renaming_and_block_escapes() {
    let (x, y, a) = (Ident::fresh("x"), Ident::fresh("y"), Ident::fresh("a"));
    let env = Hyps::new();
    // forall x, x + ?a  against  forall y, y + 1
    let p = Term::forall(vec![(x, Ty::int())], plus(Term::local(x), Term::local(a)));
    let s = Term::forall(vec![(y, Ty::int())], plus(Term::local(y), Term::int(1)));
    let (_, ev) = f_match_core(FMatchOpts::empty(), &env, (UnifyEnv::new(), evs(&[a])), &p, &s).unwrap();
    assert_eq!(ev.get_form(&a), Some(&Term::int(1)));
    // forall x, x + ?a  against  forall y, y + y: ?a cannot be y
    let s2 = Term::forall(vec![(y, Ty::int())], plus(Term::local(y), Term::local(y)));
    assert!(f_match_core(FMatchOpts::empty(), &env, (UnifyEnv::new(), evs(&[a])), &p, &s2).is_err());
  }

  #[test]
  fn higher_order_placeholders() {
    let (x, y, f) = (Ident::fresh("x"), Ident::fresh("y"), Ident::fresh("f"));
    let env = Hyps::new();
    // forall x, ?f x  against  forall y, y + 2
    let p = Term::forall(vec![(x, Ty::int())], Term::app(Term::local(f), vec![Term::local(x)]));
    let body = plus(Term::local(y), Term::int(2));
    let s = Term::forall(vec![(y, Ty::int())], body.clone());
    assert!(f_match_core(FMatchOpts::empty(), &env, (UnifyEnv::new(), evs(&[f])), &p, &s).is_err());
    let (_, ev) = f_match_core(FMatchOpts::HORDER, &env, (UnifyEnv::new(), evs(&[f])), &p, &s).unwrap();
    assert_eq!(ev.get_form(&f), Some(&Term::lambda(vec![(y, Ty::int())], body)));
  }

  #[test]
  fn applied_placeholders_outside_the_pattern_fragment_match_first_order() {
    let (x, y, f) = (Ident::fresh("x"), Ident::fresh("y"), Ident::fresh("f"));
    let h = Term::op(Path::new(&["h"]), vec![]);
    let env = Hyps::new();
    // ?f 1  against  h 1
    let p = Term::app(Term::local(f), vec![Term::int(1)]);
    let s = Term::app(h.clone(), vec![Term::int(1)]);
    let (_, ev) = f_match_core(FMatchOpts::HORDER, &env, (UnifyEnv::new(), evs(&[f])), &p, &s).unwrap();
    assert_eq!(ev.get_form(&f), Some(&h));
    // forall x, ?f x x  against  forall y, h y y
    let p = Term::forall(vec![(x, Ty::int())],
      Term::app(Term::local(f), vec![Term::local(x), Term::local(x)]));
    let s = Term::forall(vec![(y, Ty::int())],
      Term::app(h.clone(), vec![Term::local(y), Term::local(y)]));
    let (_, ev) = f_match_core(FMatchOpts::HORDER, &env, (UnifyEnv::new(), evs(&[f])), &p, &s).unwrap();
    assert_eq!(ev.get_form(&f), Some(&h));
    // forall x, ?f x x  against  forall y, h y 1: no first-order solution
    let s = Term::forall(vec![(y, Ty::int())], Term::app(h, vec![Term::local(y), Term::int(1)]));
    assert!(f_match_core(FMatchOpts::HORDER, &env, (UnifyEnv::new(), evs(&[f])), &p, &s).is_err());
  }

  #[test]
  fn delta_gives_up_on_looping_definitions() {
    let lp = Path::new(&["M", "loop"]);
    let env = Hyps::new().with_op(lp.clone(), vec![], Term::op(lp.clone(), vec![]));
    let a = Ident::fresh("a");
    let p = plus(Term::local(a), Term::int(0));
    let r = f_match_core(FMatchOpts::DELTA, &env, (UnifyEnv::new(), evs(&[a])), &p, &Term::op(lp, vec![]));
    assert!(matches!(r, Err(MatchError::MatchFailure)));
  }

  #[test]
  fn pattern_univars_need_not_be_allocated_first() {
    let eq = core().eq.clone();
    let a = Ident::fresh("a");
    let u = UnivarId(0);
    let p = Term::app(Term::op(eq.clone(), vec![Ty::univar(u)]), vec![Term::local(a), Term::int(1)]);
    let s = Term::app(Term::op(eq, vec![Ty::int()]), vec![Term::int(2), Term::int(1)]);
    let hyps = Hyps::new();
    let (_, close, ev) = f_match(FMatchOpts::empty(), &hyps, (UnifyEnv::new(), evs(&[a])), &p, &s).unwrap();
    assert_eq!(close(u), Ty::int());
    assert_eq!(ev.get_form(&a), Some(&Term::int(2)));
  }

  #[test]
  fn memory_placeholders() {
    let m = Memory(Ident::fresh("&m"));
    let hr = Memory(Ident::fresh("&hr"));
    let v = ProgVar(crate::intern("v"));
    let ev = MEvarMap::of_idents([(m.0, Kind::Mem)]);
    let (_, ev) = f_match_core(FMatchOpts::empty(), &Hyps::new(), (UnifyEnv::new(), ev),
      &Term::pvar(v, m), &Term::pvar(v, hr)).unwrap();
    assert_eq!(ev.get_mem(&m.0), Some(hr));
  }

  #[test]
  fn rewrite_replaces_selected_occurrences() {
    let a = Ident::fresh("a");
    let x = Term::local(Ident::fresh("x"));
    let lhs = plus(Term::local(a), Term::int(0));
    let rhs = Term::local(a);
    // (x + 0, x + 0, 0 + x)
    let goal = Term::tuple(vec![plus(x.clone(), Term::int(0)), plus(x.clone(), Term::int(0)), plus(Term::int(0), x.clone())]);
    let env = Hyps::new();
    let all = rewrite(FMatchOpts::empty(), &env, None, (UnifyEnv::new(), evs(&[a])), &lhs, &rhs, &goal).unwrap();
    assert_eq!(all, Term::tuple(vec![x.clone(), x.clone(), plus(Term::int(0), x.clone())]));
    let second = rewrite(FMatchOpts::empty(), &env, Some(&Occ::inclusive([2])),
      (UnifyEnv::new(), evs(&[a])), &lhs, &rhs, &goal).unwrap();
    assert_eq!(second, Term::tuple(vec![plus(x.clone(), Term::int(0)), x.clone(), plus(Term::int(0), x.clone())]));
    let none = rewrite(FMatchOpts::empty(), &env, None, (UnifyEnv::new(), evs(&[a])), &lhs, &rhs, &Term::int(4));
    assert_eq!(none, Err(MatchError::NoMatches));
  }
}
