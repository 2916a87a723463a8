//! Head reduction and conversion.
//!
//! Definitions are looked up through an [`Env`], so the matching core never
//! needs to know where they come from. Everything here is bounded by the
//! fuel set with [`set_delta_fuel`](crate::set_delta_fuel): a conversion
//! check that runs out of fuel answers "not convertible".

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::Symbol;
use crate::types::{Ident, Path, Quant, Subst, Term, TermKind, Ty};

bitflags! {
  /// The reductions [`h_red`] may perform.
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub struct RedInfo: u8 {
    /// `(fun x => b) a` to `b[x := a]`
    const BETA = 1;
    /// `let x = a in b` to `b[x := a]`
    const ZETA = 2;
    /// Conditionals on `true`/`false`, projections of tuples and datatype
    /// matches on constructors.
    const IOTA = 4;
    /// Unfolding of operator and local definitions.
    const DELTA = 8;
  }
}

/// The definition of an operator: its type parameters and its body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpDef {
  /// The type parameters, instantiated by the operator's type arguments.
  pub tparams: Vec<Symbol>,
  /// The body, usually a `fun`.
  pub body: Term,
}

/// What reduction needs to know about the surrounding context.
pub trait Env {
  /// The definition of an operator, if it is transparent.
  fn op_def(&self, _: &Path) -> Option<&OpDef> { None }
  /// The definition of a local, if it is a `let`-bound hypothesis.
  fn local_def(&self, _: Ident) -> Option<&Term> { None }
  /// The index of a datatype constructor among its siblings.
  fn ctor_index(&self, _: &Path) -> Option<usize> { None }
}

/// A concrete [`Env`]: transparent operators, local definitions and
/// constructors.
#[derive(Clone, Debug, Default)]
pub struct Hyps {
  ops: HashMap<Path, OpDef>,
  locals: HashMap<Ident, Term>,
  ctors: HashMap<Path, usize>,
}

impl Hyps {
  /// The empty context.
  #[must_use] pub fn new() -> Self { Self::default() }

  /// Add a transparent operator.
  #[must_use] pub fn with_op(mut self, p: Path, tparams: Vec<Symbol>, body: Term) -> Self {
    self.ops.insert(p, OpDef { tparams, body });
    self
  }

  /// Add a local definition.
  #[must_use] pub fn with_local(mut self, x: Ident, body: Term) -> Self {
    self.locals.insert(x, body);
    self
  }

  /// Add a datatype: its constructors, in order.
  #[must_use] pub fn with_ctors(mut self, ctors: impl IntoIterator<Item = Path>) -> Self {
    for (i, c) in ctors.into_iter().enumerate() { self.ctors.insert(c, i); }
    self
  }
}

impl Env for Hyps {
  fn op_def(&self, p: &Path) -> Option<&OpDef> { self.ops.get(p) }
  fn local_def(&self, x: Ident) -> Option<&Term> { self.locals.get(&x) }
  fn ctor_index(&self, p: &Path) -> Option<usize> { self.ctors.get(p).copied() }
}

/// The body of `p` at the type arguments `tys`, if `p` is transparent.
#[must_use] pub fn unfold_op(env: &dyn Env, p: &Path, tys: &[Ty]) -> Option<Term> {
  let def = env.op_def(p)?;
  if def.tparams.is_empty() { return Some(def.body.clone()) }
  let s = def.tparams.iter().copied().zip(tys.iter().cloned()).collect::<HashMap<_, _>>();
  Some(def.body.map_ty(&mut |t| t.subst_vars(&s)))
}

fn is_bool(t: &Term) -> Option<bool> {
  let TermKind::Op(p, _) = &**t else { return None };
  let ops = crate::registry::core();
  if *p == ops.true_ { Some(true) } else if *p == ops.false_ { Some(false) } else { None }
}

/// One step of head reduction, or `None` if `t` is in head normal form for
/// the reductions in `ri`.
#[must_use] pub fn h_red(env: &dyn Env, ri: RedInfo, t: &Term) -> Option<Term> {
  match &**t {
    TermKind::App(f, args) => {
      if let TermKind::Quant(Quant::Lambda, bs, body) = &**f {
        if ri.contains(RedInfo::BETA) {
          let k = bs.len().min(args.len());
          let mut s = Subst::new();
          for ((x, _), a) in bs.iter().zip(&**args) { s.bind(*x, a.clone()) }
          let f2 = s.apply(&Term::lambda(bs[k..].to_vec(), body.clone()));
          return Some(Term::app(f2, args[k..].to_vec()))
        }
        return None
      }
      Some(Term::app(h_red(env, ri, f)?, args.to_vec()))
    }
    TermKind::Let((x, _), e1, e2) if ri.contains(RedInfo::ZETA) => {
      let mut s = Subst::new();
      s.bind(*x, e1.clone());
      Some(s.apply(e2))
    }
    TermKind::If(c, e1, e2) if ri.contains(RedInfo::IOTA) => match is_bool(c) {
      Some(true) => Some(e1.clone()),
      Some(false) => Some(e2.clone()),
      None => Some(Term::if_(h_red(env, ri, c)?, e1.clone(), e2.clone())),
    },
    &TermKind::Proj(ref e, i) if ri.contains(RedInfo::IOTA) => match &**e {
      TermKind::Tuple(es) => es.get(usize::try_from(i).ok()?).cloned(),
      _ => Some(Term::proj(h_red(env, ri, e)?, i)),
    },
    TermKind::Match(e, bs, ty) if ri.contains(RedInfo::IOTA) => {
      let (head, args) = e.destr_app();
      if_chain! {
        if let TermKind::Op(c, _) = &**head;
        if let Some(i) = env.ctor_index(c);
        if let Some(b) = bs.get(i);
        then { return Some(Term::app(b.clone(), args.to_vec())) }
      }
      Some(Term::match_(h_red(env, ri, e)?, bs.to_vec(), ty.clone()))
    }
    TermKind::Op(p, tys) if ri.contains(RedInfo::DELTA) => unfold_op(env, p, tys),
    &TermKind::Local(x) if ri.contains(RedInfo::DELTA) => env.local_def(x).cloned(),
    _ => None,
  }
}

/// Head reduce `t` as far as the fuel allows.
#[must_use] pub fn whnf(env: &dyn Env, ri: RedInfo, t: &Term) -> Term {
  let mut t = t.clone();
  for _ in 0..crate::get_delta_fuel() {
    match h_red(env, ri, &t) {
      Some(t2) => t = t2,
      None => break,
    }
  }
  t
}

struct Conv<'a> {
  env: &'a dyn Env,
  ri: RedInfo,
  fuel: usize,
}

impl Conv<'_> {
  fn conv(&mut self, a: &Term, b: &Term) -> bool {
    if a == b || self.congruent(a, b) { return true }
    if self.fuel == 0 {
      debug!("out of fuel deciding {a} == {b}");
      return false
    }
    self.fuel -= 1;
    if let Some(a2) = h_red(self.env, self.ri, a) { return self.conv(&a2, b) }
    if let Some(b2) = h_red(self.env, self.ri, b) { return self.conv(a, &b2) }
    false
  }

  fn all(&mut self, a: &[Term], b: &[Term]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| self.conv(a, b))
  }

  /// Same head constructor and convertible children, up to renaming of
  /// bound variables.
  fn congruent(&mut self, a: &Term, b: &Term) -> bool {
    match (&**a, &**b) {
      (TermKind::App(f, xs), TermKind::App(g, ys)) => xs.len() == ys.len() && self.conv(f, g) && self.all(xs, ys),
      (TermKind::Tuple(xs), TermKind::Tuple(ys)) => self.all(xs, ys),
      (TermKind::Proj(e1, i), TermKind::Proj(e2, j)) => i == j && self.conv(e1, e2),
      (TermKind::If(c1, t1, e1), TermKind::If(c2, t2, e2)) =>
        self.conv(c1, c2) && self.conv(t1, t2) && self.conv(e1, e2),
      (TermKind::Match(e1, bs1, ty1), TermKind::Match(e2, bs2, ty2)) =>
        ty1 == ty2 && self.conv(e1, e2) && self.all(bs1, bs2),
      (TermKind::Let((x, tx), a1, a2), TermKind::Let((y, ty), b1, b2)) => {
        let mut s = Subst::new();
        s.bind(*y, Term::local(*x));
        tx == ty && self.conv(a1, b1) && self.conv(a2, &s.apply(b2))
      }
      (TermKind::Quant(q1, bs1, body1), TermKind::Quant(q2, bs2, body2)) => {
        if q1 != q2 || bs1.len() != bs2.len() { return false }
        let mut s = Subst::new();
        for ((x, tx), (y, ty)) in bs1.iter().zip(&**bs2) {
          if tx != ty { return false }
          s.bind(*y, Term::local(*x));
        }
        self.conv(body1, &s.apply(body2))
      }
      _ => false,
    }
  }
}

/// Are `a` and `b` equal up to the reductions in `ri` and renaming of bound
/// variables?
#[must_use] pub fn is_conv(env: &dyn Env, ri: RedInfo, a: &Term, b: &Term) -> bool {
  Conv { env, ri, fuel: crate::get_delta_fuel() }.conv(a, b)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::registry::core;

  fn plus(a: Term, b: Term) -> Term { Term::binop(core().add.clone(), a, b) }

  fn double() -> (Path, Hyps) {
    let p = Path::new(&["M", "double"]);
    let x = Ident::fresh("x");
    let body = Term::lambda(vec![(x, Ty::int())], plus(Term::local(x), Term::local(x)));
    (p.clone(), Hyps::new().with_op(p, vec![], body))
  }

  #[test]
  fn delta_then_beta() {
    let (p, env) = double();
    let t = Term::app(Term::op(p, vec![]), vec![Term::int(2)]);
    assert_eq!(whnf(&env, RedInfo::all(), &t), plus(Term::int(2), Term::int(2)));
    assert_eq!(whnf(&env, RedInfo::BETA, &t), t);
  }

  #[test]
  fn zeta_and_iota() {
    let env = Hyps::new();
    let x = Ident::fresh("x");
    let t = Term::let_(x, Ty::int(), Term::int(1), plus(Term::local(x), Term::local(x)));
    assert_eq!(h_red(&env, RedInfo::ZETA, &t), Some(plus(Term::int(1), Term::int(1))));
    let c = Term::if_(Term::bool(false), Term::int(1), Term::proj(Term::tuple(vec![Term::int(7), Term::int(8)]), 1));
    assert_eq!(whnf(&env, RedInfo::IOTA, &c), Term::int(8));
  }

  #[test]
  fn match_on_a_constructor() {
    let (none, some) = (Path::new(&["None"]), Path::new(&["Some"]));
    let env = Hyps::new().with_ctors([none.clone(), some.clone()]);
    let y = Ident::fresh("y");
    let t = Term::match_(Term::app(Term::op(some, vec![]), vec![Term::int(4)]),
      vec![Term::int(0), Term::lambda(vec![(y, Ty::int())], Term::local(y))], Ty::int());
    assert_eq!(whnf(&env, RedInfo::all(), &t), Term::int(4));
  }

  #[test]
  fn conversion_unfolds_and_renames() {
    let (p, env) = double();
    let t = Term::app(Term::op(p, vec![]), vec![Term::int(3)]);
    assert!(is_conv(&env, RedInfo::all(), &t, &plus(Term::int(3), Term::int(3))));
    assert!(!is_conv(&env, RedInfo::all(), &t, &plus(Term::int(3), Term::int(4))));
    let (x, y) = (Ident::fresh("x"), Ident::fresh("y"));
    let fx = Term::forall(vec![(x, Ty::int())], Term::local(x));
    let fy = Term::forall(vec![(y, Ty::int())], Term::local(y));
    assert!(is_conv(&env, RedInfo::empty(), &fx, &fy));
  }

  #[test]
  fn looping_definitions_run_out_of_fuel() {
    let p = Path::new(&["M", "loop"]);
    let env = Hyps::new().with_op(p.clone(), vec![], Term::op(p.clone(), vec![]));
    assert!(!is_conv(&env, RedInfo::all(), &Term::op(p, vec![]), &Term::int(0)));
  }
}
