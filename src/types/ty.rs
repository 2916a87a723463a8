//! Types of terms, including unification variables.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use serde::{Deserialize, Serialize};
use ecm_util::mk_id;
use crate::Symbol;
use super::Path;

mk_id! {
  /// A type unification variable, allocated by a [`UnifyEnv`](crate::UnifyEnv).
  #[derive(Serialize, Deserialize)]
  UnivarId
}

/// A type.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ty(Rc<TyKind>);

/// The shapes of a [`Ty`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TyKind {
  /// A unification variable.
  Univar(UnivarId),
  /// A type parameter of the enclosing declaration.
  Var(Symbol),
  /// A type constructor applied to arguments, such as `int` or `'a list`.
  Constr(Path, Box<[Ty]>),
  /// A tuple type.
  Tuple(Box<[Ty]>),
  /// A function type.
  Fun(Ty, Ty),
}

impl Deref for Ty {
  type Target = TyKind;
  fn deref(&self) -> &TyKind { &self.0 }
}

impl From<TyKind> for Ty {
  fn from(k: TyKind) -> Self { Self(Rc::new(k)) }
}

impl Ty {
  /// A unification variable.
  #[must_use] pub fn univar(id: UnivarId) -> Self { TyKind::Univar(id).into() }

  /// A type parameter.
  #[must_use] pub fn var(name: &str) -> Self { TyKind::Var(crate::intern(name)).into() }

  /// A type constructor application.
  #[must_use] pub fn constr(p: Path, args: Vec<Ty>) -> Self {
    TyKind::Constr(p, args.into()).into()
  }

  /// A tuple type.
  #[must_use] pub fn tuple(tys: Vec<Ty>) -> Self { TyKind::Tuple(tys.into()).into() }

  /// A function type `a -> b`.
  #[must_use] pub fn fun(a: Ty, b: Ty) -> Self { TyKind::Fun(a, b).into() }

  /// The type of booleans.
  #[must_use] pub fn bool() -> Self { Self::constr(crate::registry::core().tbool.clone(), vec![]) }

  /// The type of integers.
  #[must_use] pub fn int() -> Self { Self::constr(crate::registry::core().tint.clone(), vec![]) }

  /// Rebuild the type, replacing every unification variable `u` with `f(u)`
  /// when that returns something.
  #[must_use] pub fn map_univars(&self, f: &mut impl FnMut(UnivarId) -> Option<Ty>) -> Ty {
    match &**self {
      &TyKind::Univar(u) => f(u).unwrap_or_else(|| self.clone()),
      TyKind::Var(_) => self.clone(),
      TyKind::Constr(p, args) =>
        TyKind::Constr(p.clone(), args.iter().map(|t| t.map_univars(f)).collect()).into(),
      TyKind::Tuple(tys) => TyKind::Tuple(tys.iter().map(|t| t.map_univars(f)).collect()).into(),
      TyKind::Fun(a, b) => Self::fun(a.map_univars(f), b.map_univars(f)),
    }
  }

  /// Instantiate type parameters.
  #[must_use] pub fn subst_vars(&self, s: &HashMap<Symbol, Ty>) -> Ty {
    if s.is_empty() { return self.clone() }
    match &**self {
      TyKind::Univar(_) => self.clone(),
      TyKind::Var(a) => s.get(a).cloned().unwrap_or_else(|| self.clone()),
      TyKind::Constr(p, args) =>
        TyKind::Constr(p.clone(), args.iter().map(|t| t.subst_vars(s)).collect()).into(),
      TyKind::Tuple(tys) => TyKind::Tuple(tys.iter().map(|t| t.subst_vars(s)).collect()).into(),
      TyKind::Fun(a, b) => Self::fun(a.subst_vars(s), b.subst_vars(s)),
    }
  }

  /// Call `f` on every unification variable of the type, in order.
  pub fn for_each_univar(&self, f: &mut impl FnMut(UnivarId)) {
    match &**self {
      &TyKind::Univar(u) => f(u),
      TyKind::Var(_) => {}
      TyKind::Constr(_, tys) | TyKind::Tuple(tys) => tys.iter().for_each(|t| t.for_each_univar(f)),
      TyKind::Fun(a, b) => { a.for_each_univar(f); b.for_each_univar(f) }
    }
  }

  /// Does the unification variable `u` occur in this type?
  #[must_use] pub fn occurs(&self, u: UnivarId) -> bool {
    match &**self {
      &TyKind::Univar(v) => u == v,
      TyKind::Var(_) => false,
      TyKind::Constr(_, tys) | TyKind::Tuple(tys) => tys.iter().any(|t| t.occurs(u)),
      TyKind::Fun(a, b) => a.occurs(u) || b.occurs(u),
    }
  }
}

impl fmt::Display for Ty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &**self {
      TyKind::Univar(u) => write!(f, "#{}", u.0),
      TyKind::Var(a) => write!(f, "'{a}"),
      TyKind::Constr(p, args) => match &**args {
        [] => write!(f, "{p}"),
        [a] => write!(f, "{a} {p}"),
        args => {
          write!(f, "(")?;
          for (i, a) in args.iter().enumerate() {
            if i != 0 { write!(f, ", ")? }
            write!(f, "{a}")?
          }
          write!(f, ") {p}")
        }
      }
      TyKind::Tuple(tys) => {
        write!(f, "(")?;
        for (i, t) in tys.iter().enumerate() {
          if i != 0 { write!(f, " * ")? }
          write!(f, "{t}")?
        }
        write!(f, ")")
      }
      TyKind::Fun(a, b) => write!(f, "({a} -> {b})"),
    }
  }
}

impl fmt::Debug for Ty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self}") }
}
