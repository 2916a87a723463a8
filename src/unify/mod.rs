//! Type unification for matching patterns with unification variables.

mod union_find;

use ecm_util::Idx;
use crate::error::{MatchError, Result};
use crate::types::{Ty, TyKind, UnivarId};
use union_find::{UnificationTable, UnifyCtx};

#[derive(Clone, Debug)]
enum UnivarValue {
  Assigned(Ty),
  Unassigned,
}

impl UnifyCtx<UnivarValue> for () {
  type Error = (Ty, Ty);

  fn unify_values(&mut self, value1: &UnivarValue, value2: &UnivarValue) -> std::result::Result<UnivarValue, Self::Error> {
    match (value1, value2) {
      (UnivarValue::Assigned(ty1), UnivarValue::Assigned(ty2)) =>
        if ty1 == ty2 { Ok(value1.clone()) } else { Err((ty1.clone(), ty2.clone())) },
      (UnivarValue::Assigned(_), UnivarValue::Unassigned) => Ok(value1.clone()),
      (UnivarValue::Unassigned, _) => Ok(value2.clone()),
    }
  }
}

/// A set of type unification variables and what they have been unified with.
///
/// Cloning is how a search takes a snapshot to come back to.
#[derive(Clone, Debug, Default)]
pub struct UnifyEnv {
  table: UnificationTable<UnivarId, UnivarValue>,
}

impl UnifyEnv {
  /// An environment with no unification variables.
  #[must_use] pub fn new() -> Self { Self::default() }

  /// A new, unassigned unification variable.
  pub fn fresh(&mut self) -> UnivarId { self.table.new_key(UnivarValue::Unassigned) }

  fn known(&self, u: UnivarId) -> bool { u.into_usize() < self.table.len() }

  /// Replace the unification variables of `t` by what they stand for, as far
  /// as is known. Unassigned variables are replaced by their class
  /// representative.
  pub fn resolve(&mut self, t: &Ty) -> Ty {
    t.map_univars(&mut |u| {
      if !self.known(u) { return None }
      let root = self.table.find(u);
      match self.table.probe_value(root).clone() {
        UnivarValue::Assigned(t) => Some(self.resolve(&t)),
        UnivarValue::Unassigned => (root != u).then(|| Ty::univar(root)),
      }
    })
  }

  /// Replace a unification variable at the head of `t` by its value.
  fn head(&mut self, t: &Ty) -> Ty {
    match **t {
      TyKind::Univar(u) if self.known(u) => match self.table.probe_value(u).clone() {
        UnivarValue::Assigned(t) => self.head(&t),
        UnivarValue::Unassigned => Ty::univar(self.table.find(u)),
      },
      _ => t.clone(),
    }
  }

  fn assign(&mut self, u: UnivarId, t: &Ty) -> Result<()> {
    let t = self.resolve(t);
    if t.occurs(u) {
      debug!("occurs check: #{} in {t}", u.0);
      return Err(MatchError::CannotUnify(Ty::univar(u), t))
    }
    self.table.unify_var_value(&mut (), u, &UnivarValue::Assigned(t))
      .map_err(|(t1, t2)| MatchError::CannotUnify(t1, t2))
  }

  /// Take in the unification variables of `t` that were allocated
  /// somewhere else (a pattern read from a file, say), as unassigned.
  fn reserve(&mut self, t: &Ty) {
    t.for_each_univar(&mut |u| while !self.known(u) { self.fresh(); });
  }

  /// Make `t1` and `t2` equal, assigning unification variables as needed.
  /// On failure, some assignments may have been made; callers that want to
  /// go on after a failure work on a clone.
  pub fn unify(&mut self, t1: &Ty, t2: &Ty) -> Result<()> {
    self.reserve(t1);
    self.reserve(t2);
    self.unify_known(t1, t2)
  }

  fn unify_known(&mut self, t1: &Ty, t2: &Ty) -> Result<()> {
    let (a, b) = (self.head(t1), self.head(t2));
    match (&*a, &*b) {
      (&TyKind::Univar(u), &TyKind::Univar(v)) =>
        self.table.unify_var_var(&mut (), u, v).map_err(|(t1, t2)| MatchError::CannotUnify(t1, t2)),
      (&TyKind::Univar(u), _) => self.assign(u, &b),
      (_, &TyKind::Univar(v)) => self.assign(v, &a),
      (TyKind::Var(x), TyKind::Var(y)) if x == y => Ok(()),
      (TyKind::Constr(p, as_), TyKind::Constr(q, bs)) if p == q && as_.len() == bs.len() =>
        as_.iter().zip(&**bs).try_for_each(|(a, b)| self.unify_known(a, b)),
      (TyKind::Tuple(as_), TyKind::Tuple(bs)) if as_.len() == bs.len() =>
        as_.iter().zip(&**bs).try_for_each(|(a, b)| self.unify_known(a, b)),
      (TyKind::Fun(a1, b1), TyKind::Fun(a2, b2)) => {
        self.unify_known(a1, a2)?;
        self.unify_known(b1, b2)
      }
      _ => Err(MatchError::CannotUnify(self.resolve(&a), self.resolve(&b))),
    }
  }

  /// Are `t1` and `t2` unifiable? Nothing is assigned either way.
  #[must_use] pub fn unifiable(&self, t1: &Ty, t2: &Ty) -> bool { self.clone().unify(t1, t2).is_ok() }

  /// Freeze the environment into a map from unification variables to what
  /// they stand for. Variables left unassigned map to their class
  /// representative, and unknown variables to themselves.
  #[must_use] pub fn close(mut self) -> impl Fn(UnivarId) -> Ty {
    let tys = (0..self.table.len())
      .map(|i| self.resolve(&Ty::univar(UnivarId::from_usize(i))))
      .collect::<Vec<_>>();
    move |u| tys.get(u.into_usize()).cloned().unwrap_or_else(|| Ty::univar(u))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Path;

  fn list(t: Ty) -> Ty { Ty::constr(Path::new(&["list"]), vec![t]) }

  #[test]
  fn unify_assigns_through_structure() {
    let mut ue = UnifyEnv::new();
    let (a, b) = (ue.fresh(), ue.fresh());
    ue.unify(&list(Ty::univar(a)), &list(Ty::univar(b))).unwrap();
    ue.unify(&Ty::univar(b), &Ty::int()).unwrap();
    assert_eq!(ue.resolve(&Ty::univar(a)), Ty::int());
    let f = ue.close();
    assert_eq!(f(a), Ty::int());
    assert_eq!(f(UnivarId(99)), Ty::univar(UnivarId(99)));
  }

  #[test]
  fn mismatches_and_cycles_fail() {
    let mut ue = UnifyEnv::new();
    let a = ue.fresh();
    assert!(!ue.unifiable(&Ty::int(), &Ty::bool()));
    assert!(matches!(ue.unify(&Ty::univar(a), &list(Ty::univar(a))), Err(MatchError::CannotUnify(..))));
    ue.unify(&Ty::univar(a), &Ty::int()).unwrap();
    assert!(matches!(ue.unify(&Ty::univar(a), &Ty::bool()), Err(MatchError::CannotUnify(..))));
  }

  #[test]
  fn foreign_variables_are_taken_in() {
    let mut ue = UnifyEnv::new();
    let u = UnivarId(3);
    ue.unify(&list(Ty::univar(u)), &list(Ty::bool())).unwrap();
    assert_eq!(ue.resolve(&Ty::univar(u)), Ty::bool());
    assert_eq!(ue.resolve(&Ty::univar(UnivarId(1))), Ty::univar(UnivarId(1)));
    assert_eq!(ue.fresh(), UnivarId(4));
  }

  #[test]
  fn unassigned_variables_resolve_to_a_representative() {
    let mut ue = UnifyEnv::new();
    let (a, b) = (ue.fresh(), ue.fresh());
    ue.unify(&Ty::univar(a), &Ty::univar(b)).unwrap();
    assert_eq!(ue.resolve(&Ty::univar(a)), ue.resolve(&Ty::univar(b)));
    let f = ue.close();
    assert_eq!(f(a), f(b));
  }
}
