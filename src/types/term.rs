//! Terms: formulas and expressions.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use num::BigInt;
use serde::{Deserialize, Deserializer, Serialize};
use crate::Symbol;
use super::{Path, Ty};

static NEXT_TAG: AtomicU32 = AtomicU32::new(1);

/// A local identifier. The `tag` makes identifiers with the same name distinct,
/// so bound variables never need renaming to avoid capture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Ident {
  /// The user-facing name.
  pub name: Symbol,
  /// The disambiguating tag.
  pub tag: u32,
}

impl Ident {
  /// A new identifier, distinct from every other identifier created so far.
  #[must_use] pub fn fresh(name: &str) -> Self {
    Self { name: crate::intern(name), tag: NEXT_TAG.fetch_add(1, Ordering::Relaxed) }
  }

  /// A fresh identifier with the same name as `self`.
  #[must_use] pub fn refresh(self) -> Self {
    Self { name: self.name, tag: NEXT_TAG.fetch_add(1, Ordering::Relaxed) }
  }
}

// Identifiers read from outside move the tag counter past their own tag, so
// that `fresh` never hands out one of them again.
impl<'de> Deserialize<'de> for Ident {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    struct Raw { name: Symbol, tag: u32 }
    let Raw { name, tag } = Raw::deserialize(d)?;
    NEXT_TAG.fetch_max(tag.saturating_add(1), Ordering::Relaxed);
    Ok(Self { name, tag })
  }
}

impl fmt::Display for Ident {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.name) }
}
impl fmt::Debug for Ident {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}_{}", self.name, self.tag) }
}

/// A memory (program state), as in `x{m}`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Memory(pub Ident);

/// A program variable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ProgVar(pub Symbol);

/// A module: either a top-level path or a local module parameter.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ModPath {
  /// A module parameter.
  Local(Ident),
  /// A top-level module.
  Top(Path),
}

/// Binding forms.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Quant {
  /// `forall`
  Forall,
  /// `exists`
  Exists,
  /// `fun`
  Lambda,
}

/// A term. Cloning is cheap; equality and hashing are structural.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term(Rc<TermKind>);

/// The shapes of a [`Term`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermKind {
  /// An integer literal.
  Int(BigInt),
  /// A local variable.
  Local(Ident),
  /// An operator, instantiated at the given types.
  Op(Path, Box<[Ty]>),
  /// An application to one or more arguments. Never nested in head position.
  App(Term, Box<[Term]>),
  /// A tuple.
  Tuple(Box<[Term]>),
  /// The projection on the `i`th component of a tuple.
  Proj(Term, u32),
  /// `if c then t else e`
  If(Term, Term, Term),
  /// `let x = e1 in e2`
  Let((Ident, Ty), Term, Term),
  /// A datatype match: the scrutinee, one branch per constructor (each a
  /// function of the constructor's arguments) and the result type.
  Match(Term, Box<[Term]>, Ty),
  /// A quantifier or lambda over one or more binders.
  Quant(Quant, Box<[(Ident, Ty)]>, Term),
  /// A program variable read in a memory.
  Pvar(ProgVar, Memory),
  /// The global state of a module in a memory.
  Glob(ModPath, Memory),
}

impl Deref for Term {
  type Target = TermKind;
  fn deref(&self) -> &TermKind { &self.0 }
}

impl From<TermKind> for Term {
  fn from(k: TermKind) -> Self { Self(Rc::new(k)) }
}

impl Term {
  /// An integer literal.
  #[must_use] pub fn int(n: impl Into<BigInt>) -> Self { TermKind::Int(n.into()).into() }

  /// A local variable.
  #[must_use] pub fn local(x: Ident) -> Self { TermKind::Local(x).into() }

  /// An operator.
  #[must_use] pub fn op(p: Path, tys: Vec<Ty>) -> Self { TermKind::Op(p, tys.into()).into() }

  /// Apply `f` to `args`, merging with an application already at the head.
  #[must_use] pub fn app(f: Term, args: Vec<Term>) -> Self {
    if args.is_empty() { return f }
    match &*f {
      TermKind::App(g, args0) => {
        let mut all = args0.to_vec();
        all.extend(args);
        TermKind::App(g.clone(), all.into()).into()
      }
      _ => TermKind::App(f, args.into()).into(),
    }
  }

  /// A tuple.
  #[must_use] pub fn tuple(es: Vec<Term>) -> Self { TermKind::Tuple(es.into()).into() }

  /// A projection.
  #[must_use] pub fn proj(e: Term, i: u32) -> Self { TermKind::Proj(e, i).into() }

  /// A conditional.
  #[must_use] pub fn if_(c: Term, t: Term, e: Term) -> Self { TermKind::If(c, t, e).into() }

  /// A let binding.
  #[must_use] pub fn let_(x: Ident, ty: Ty, e1: Term, e2: Term) -> Self {
    TermKind::Let((x, ty), e1, e2).into()
  }

  /// A datatype match.
  #[must_use] pub fn match_(e: Term, bs: Vec<Term>, ty: Ty) -> Self {
    TermKind::Match(e, bs.into(), ty).into()
  }

  /// A binder. Binding nothing is the identity.
  #[must_use] pub fn quant(q: Quant, bs: Vec<(Ident, Ty)>, body: Term) -> Self {
    if bs.is_empty() { return body }
    match &*body {
      TermKind::Quant(q2, bs2, body2) if *q2 == q => {
        let mut all = bs;
        all.extend(bs2.iter().cloned());
        TermKind::Quant(q, all.into(), body2.clone()).into()
      }
      _ => TermKind::Quant(q, bs.into(), body).into(),
    }
  }

  /// `fun bs => body`
  #[must_use] pub fn lambda(bs: Vec<(Ident, Ty)>, body: Term) -> Self { Self::quant(Quant::Lambda, bs, body) }

  /// `forall bs, body`
  #[must_use] pub fn forall(bs: Vec<(Ident, Ty)>, body: Term) -> Self { Self::quant(Quant::Forall, bs, body) }

  /// A program variable in a memory.
  #[must_use] pub fn pvar(x: ProgVar, m: Memory) -> Self { TermKind::Pvar(x, m).into() }

  /// Module globals in a memory.
  #[must_use] pub fn glob(mp: ModPath, m: Memory) -> Self { TermKind::Glob(mp, m).into() }

  /// A binary operator application `op a b`.
  #[must_use] pub fn binop(op: Path, a: Term, b: Term) -> Self {
    Self::app(Self::op(op, vec![]), vec![a, b])
  }

  /// The boolean constant `true` or `false`.
  #[must_use] pub fn bool(b: bool) -> Self {
    let ops = crate::registry::core();
    Self::op(if b { ops.true_.clone() } else { ops.false_.clone() }, vec![])
  }

  /// Split an application into head and arguments.
  #[must_use] pub fn destr_app(&self) -> (&Term, &[Term]) {
    match &**self {
      TermKind::App(f, args) => (f, args),
      _ => (self, &[]),
    }
  }

  /// The local variable, if this is one.
  #[must_use] pub fn as_local(&self) -> Option<Ident> {
    if let TermKind::Local(x) = **self { Some(x) } else { None }
  }

  /// The immediate sub-terms, in traversal order.
  #[must_use] pub fn children(&self) -> Vec<Term> {
    match &**self {
      TermKind::Int(_) | TermKind::Local(_) | TermKind::Op(..) |
      TermKind::Pvar(..) | TermKind::Glob(..) => vec![],
      TermKind::App(f, args) => std::iter::once(f).chain(&**args).cloned().collect(),
      TermKind::Tuple(es) => es.to_vec(),
      TermKind::Proj(e, _) => vec![e.clone()],
      TermKind::If(c, t, e) => vec![c.clone(), t.clone(), e.clone()],
      TermKind::Let(_, e1, e2) => vec![e1.clone(), e2.clone()],
      TermKind::Match(e, bs, _) => std::iter::once(e).chain(&**bs).cloned().collect(),
      TermKind::Quant(_, _, body) => vec![body.clone()],
    }
  }

  /// The variables bound by this node in its `i`th child.
  #[must_use] pub fn binders_of_child(&self, i: usize) -> &[(Ident, Ty)] {
    match &**self {
      TermKind::Let(x, _, _) if i == 1 => std::slice::from_ref(x),
      TermKind::Quant(_, bs, _) => bs,
      _ => &[],
    }
  }

  /// Rebuild this node with new immediate sub-terms, given in the order of
  /// [`children`](Self::children). Returns `self` unchanged if every child
  /// is pointer-equal to the old one.
  ///
  /// # Panics
  /// The number of children must match.
  #[must_use] pub fn with_children(&self, cs: Vec<Term>) -> Term {
    let old = self.children();
    assert_eq!(old.len(), cs.len(), "with_children: arity mismatch");
    if old.iter().zip(&cs).all(|(a, b)| Rc::ptr_eq(&a.0, &b.0)) { return self.clone() }
    let mut it = cs.into_iter();
    let mut next = || it.next().expect("checked arity");
    match &**self {
      TermKind::Int(_) | TermKind::Local(_) | TermKind::Op(..) |
      TermKind::Pvar(..) | TermKind::Glob(..) => self.clone(),
      TermKind::App(_, args) => {
        let f = next();
        Self::app(f, (0..args.len()).map(|_| next()).collect())
      }
      TermKind::Tuple(es) => Self::tuple((0..es.len()).map(|_| next()).collect()),
      &TermKind::Proj(_, i) => Self::proj(next(), i),
      TermKind::If(..) => { let c = next(); let t = next(); Self::if_(c, t, next()) }
      TermKind::Let(x, _, _) => { let e1 = next(); TermKind::Let(x.clone(), e1, next()).into() }
      TermKind::Match(_, bs, ty) => {
        let e = next();
        TermKind::Match(e, (0..bs.len()).map(|_| next()).collect(), ty.clone()).into()
      }
      TermKind::Quant(q, bs, _) => TermKind::Quant(*q, bs.clone(), next()).into(),
    }
  }

  /// Are these two terms the same allocation?
  #[must_use] pub fn ptr_eq(&self, other: &Term) -> bool { Rc::ptr_eq(&self.0, &other.0) }

  /// Collect the free local variables.
  pub fn free_vars(&self, out: &mut HashSet<Ident>) {
    fn rec(t: &Term, bound: &mut Vec<Ident>, out: &mut HashSet<Ident>) {
      match &**t {
        &TermKind::Local(x) => if !bound.contains(&x) { out.insert(x); }
        TermKind::Let((x, _), e1, e2) => {
          rec(e1, bound, out);
          bound.push(*x);
          rec(e2, bound, out);
          bound.pop();
        }
        TermKind::Quant(_, bs, body) => {
          let n = bound.len();
          bound.extend(bs.iter().map(|b| b.0));
          rec(body, bound, out);
          bound.truncate(n);
        }
        _ => for c in t.children() { rec(&c, bound, out) }
      }
    }
    rec(self, &mut vec![], out)
  }

  /// The set of free local variables.
  #[must_use] pub fn fv(&self) -> HashSet<Ident> {
    let mut out = HashSet::new();
    self.free_vars(&mut out);
    out
  }

  /// Rebuild the term, transforming every type that occurs in it.
  #[must_use] pub fn map_ty(&self, f: &mut impl FnMut(&Ty) -> Ty) -> Term {
    match &**self {
      TermKind::Op(p, tys) => TermKind::Op(p.clone(), tys.iter().map(&mut *f).collect()).into(),
      TermKind::Let((x, ty), e1, e2) =>
        TermKind::Let((*x, f(ty)), e1.map_ty(f), e2.map_ty(f)).into(),
      TermKind::Match(e, bs, ty) =>
        TermKind::Match(e.map_ty(f), bs.iter().map(|b| b.map_ty(f)).collect(), f(ty)).into(),
      TermKind::Quant(q, bs, body) => TermKind::Quant(*q,
        bs.iter().map(|(x, ty)| (*x, f(ty))).collect(), body.map_ty(f)).into(),
      _ => {
        let cs = self.children();
        if cs.is_empty() { return self.clone() }
        self.with_children(cs.iter().map(|c| c.map_ty(f)).collect())
      }
    }
  }
}

/// A simultaneous substitution of terms for local variables, memories for
/// memories, and modules for module parameters.
#[derive(Clone, Debug, Default)]
pub struct Subst {
  /// Local variable substitution.
  pub forms: HashMap<Ident, Term>,
  /// Memory substitution.
  pub mems: HashMap<Ident, Memory>,
  /// Module parameter substitution.
  pub mods: HashMap<Ident, ModPath>,
}

impl Subst {
  /// The empty substitution.
  #[must_use] pub fn new() -> Self { Self::default() }

  /// Is this the identity?
  #[must_use] pub fn is_empty(&self) -> bool {
    self.forms.is_empty() && self.mems.is_empty() && self.mods.is_empty()
  }

  /// Add `x := t`.
  pub fn bind(&mut self, x: Ident, t: Term) { self.forms.insert(x, t); }

  /// Substitute in a memory.
  #[must_use] pub fn mem(&self, m: Memory) -> Memory { self.mems.get(&m.0).copied().unwrap_or(m) }

  /// Substitute in a module path.
  #[must_use] pub fn modpath(&self, mp: &ModPath) -> ModPath {
    match mp {
      ModPath::Local(x) => self.mods.get(x).cloned().unwrap_or_else(|| mp.clone()),
      ModPath::Top(_) => mp.clone(),
    }
  }

  /// Apply the substitution. Binders whose name occurs free in the range
  /// are renamed.
  #[must_use] pub fn apply(&self, t: &Term) -> Term {
    if self.is_empty() { return t.clone() }
    let mut range = HashSet::new();
    for e in self.forms.values() { e.free_vars(&mut range) }
    self.apply_core(&range, t)
  }

  fn apply_core(&self, range: &HashSet<Ident>, t: &Term) -> Term {
    match &**t {
      TermKind::Local(x) => self.forms.get(x).cloned().unwrap_or_else(|| t.clone()),
      &TermKind::Pvar(x, m) => {
        let m2 = self.mem(m);
        if m2 == m { t.clone() } else { Term::pvar(x, m2) }
      }
      TermKind::Glob(mp, m) => Term::glob(self.modpath(mp), self.mem(*m)),
      TermKind::Let((x, ty), e1, e2) => {
        let e1 = self.apply_core(range, e1);
        let (x2, s) = self.under(range, *x);
        TermKind::Let((x2, ty.clone()), e1, s.apply_core(range, e2)).into()
      }
      TermKind::Quant(q, bs, body) => {
        let mut s = self.clone();
        let bs = bs.iter().map(|&(x, ref ty)| {
          let (x2, s2) = s.under(range, x);
          s = s2;
          (x2, ty.clone())
        }).collect::<Vec<_>>();
        TermKind::Quant(*q, bs.into(), s.apply_core(range, body)).into()
      }
      _ => {
        let cs = t.children();
        if cs.is_empty() { return t.clone() }
        t.with_children(cs.iter().map(|c| self.apply_core(range, c)).collect())
      }
    }
  }

  /// The substitution to use under a binder for `x`, and the name to bind.
  fn under(&self, range: &HashSet<Ident>, x: Ident) -> (Ident, Subst) {
    let mut s = self.clone();
    if range.contains(&x) {
      let x2 = x.refresh();
      s.forms.insert(x, Term::local(x2));
      (x2, s)
    } else {
      s.forms.remove(&x);
      (x, s)
    }
  }
}

impl fmt::Display for Term {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fn list(f: &mut fmt::Formatter<'_>, es: &[Term], sep: &str) -> fmt::Result {
      for (i, e) in es.iter().enumerate() {
        if i != 0 { write!(f, "{sep}")? }
        write!(f, "{e}")?
      }
      Ok(())
    }
    match &**self {
      TermKind::Int(n) => write!(f, "{n}"),
      TermKind::Local(x) => write!(f, "{x}"),
      TermKind::Op(p, _) => write!(f, "{p}"),
      TermKind::App(g, args) => {
        write!(f, "({g} ")?;
        list(f, args, " ")?;
        write!(f, ")")
      }
      TermKind::Tuple(es) => { write!(f, "(")?; list(f, es, ", ")?; write!(f, ")") }
      TermKind::Proj(e, i) => write!(f, "{e}.`{}", i + 1),
      TermKind::If(c, t, e) => write!(f, "(if {c} then {t} else {e})"),
      TermKind::Let((x, _), e1, e2) => write!(f, "(let {x} = {e1} in {e2})"),
      TermKind::Match(e, bs, _) => { write!(f, "(match {e} with ")?; list(f, bs, " | ")?; write!(f, ")") }
      TermKind::Quant(q, bs, body) => {
        let kw = match q { Quant::Forall => "forall", Quant::Exists => "exists", Quant::Lambda => "fun" };
        write!(f, "({kw}")?;
        for (x, ty) in &**bs { write!(f, " ({x} : {ty})")? }
        write!(f, ", {body})")
      }
      TermKind::Pvar(x, m) => write!(f, "{}{{{}}}", x.0, m.0),
      TermKind::Glob(ModPath::Top(p), m) => write!(f, "(glob {p}){{{}}}", m.0),
      TermKind::Glob(ModPath::Local(x), m) => write!(f, "(glob {x}){{{}}}", m.0),
    }
  }
}

impl fmt::Debug for Term {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self}") }
}
