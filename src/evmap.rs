//! Maps from a fixed set of placeholders to optional bindings.
//!
//! An [`EvarMap`] is created with its whole domain up front (the captures a
//! pattern declares) and is threaded through a backtracking search by value:
//! `set` returns a new map and leaves the old one intact, so a search can
//! keep a snapshot and go back to it for the price of a pointer copy.
//!
//! [`MEvarMap`] is the three-sorted version used for formula, memory and
//! module placeholders. Each placeholder is declared with a [`Kind`] and only
//! accepts values of that kind.

use std::fmt;
use std::hash::Hash;
use serde::{Deserialize, Serialize};
use crate::types::{Ident, Memory, ModPath, Subst, Term};

/// A domain-fixed map from placeholders to optional values.
#[derive(Clone)]
pub struct EvarMap<K: Clone + Hash + Eq, V: Clone> {
  map: im::HashMap<K, Option<V>>,
}

impl<K: Clone + Hash + Eq + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug for EvarMap<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map().entries(self.map.iter()).finish()
  }
}

impl<K: Clone + Hash + Eq, V: Clone> Default for EvarMap<K, V> {
  fn default() -> Self { Self { map: im::HashMap::new() } }
}

impl<K: Clone + Hash + Eq, V: Clone> EvarMap<K, V> {
  /// The map with an empty domain.
  #[must_use] pub fn new() -> Self { Self::default() }

  /// A map whose domain is `ids`, all unset.
  #[must_use] pub fn of_idents(ids: impl IntoIterator<Item = K>) -> Self {
    Self { map: ids.into_iter().map(|k| (k, None)).collect() }
  }

  /// Add `id` to the domain, unset. Does nothing if `id` is already present,
  /// set or not.
  #[must_use] pub fn add(&self, id: K) -> Self {
    if self.map.contains_key(&id) { return self.clone() }
    Self { map: self.map.update(id, None) }
  }

  /// Bind `id` to `v`.
  ///
  /// # Panics
  /// If `id` is not in the domain. That means the placeholder set was built
  /// wrongly, which is a bug in the caller rather than a failed match.
  #[must_use] pub fn set(&self, id: K, v: V) -> Self {
    assert!(self.map.contains_key(&id), "EvarMap::set: placeholder outside of the domain");
    Self { map: self.map.update(id, Some(v)) }
  }

  /// Is `id` in the domain?
  #[must_use] pub fn mem(&self, id: &K) -> bool { self.map.contains_key(id) }

  /// The binding of `id`, if it is in the domain and set.
  #[must_use] pub fn get(&self, id: &K) -> Option<&V> { self.map.get(id)?.as_ref() }

  /// Is `id` in the domain and set?
  #[must_use] pub fn is_set(&self, id: &K) -> bool { self.get(id).is_some() }

  /// Are all placeholders set?
  #[must_use] pub fn filled(&self) -> bool { self.map.values().all(Option::is_some) }

  /// The number of placeholders.
  #[must_use] pub fn len(&self) -> usize { self.map.len() }

  /// Is the domain empty?
  #[must_use] pub fn is_empty(&self) -> bool { self.map.is_empty() }

  /// Iterate over the domain and the current bindings.
  pub fn iter(&self) -> impl Iterator<Item = (&K, Option<&V>)> {
    self.map.iter().map(|(k, v)| (k, v.as_ref()))
  }
}

/// The sort of a placeholder in an [`MEvarMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
  /// A formula or expression.
  Form,
  /// A memory.
  Mem,
  /// A module.
  Mod,
}

/// Something a placeholder can be bound to: a term, a memory or a module.
/// These are also the objects the [`matcher`](crate::matcher) walks over.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Obj {
  /// A term.
  Form(Term),
  /// A memory.
  Mem(Memory),
  /// A module.
  Mod(ModPath),
}

impl Obj {
  /// The sort of this object.
  #[must_use] pub fn kind(&self) -> Kind {
    match self {
      Obj::Form(_) => Kind::Form,
      Obj::Mem(_) => Kind::Mem,
      Obj::Mod(_) => Kind::Mod,
    }
  }

  /// The term, if this is one.
  #[must_use] pub fn as_form(&self) -> Option<&Term> {
    if let Obj::Form(t) = self { Some(t) } else { None }
  }
}

impl fmt::Display for Obj {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Obj::Form(t) => write!(f, "{t}"),
      Obj::Mem(m) => write!(f, "&{}", m.0),
      Obj::Mod(ModPath::Top(p)) => write!(f, "{p}"),
      Obj::Mod(ModPath::Local(x)) => write!(f, "{x}"),
    }
  }
}

/// A three-sorted [`EvarMap`]: formula, memory and module placeholders.
#[derive(Clone)]
pub struct MEvarMap<K: Clone + Hash + Eq> {
  forms: EvarMap<K, Term>,
  mems: EvarMap<K, Memory>,
  mods: EvarMap<K, ModPath>,
}

impl<K: Clone + Hash + Eq + fmt::Debug> fmt::Debug for MEvarMap<K> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MEvarMap")
      .field("forms", &self.forms)
      .field("mems", &self.mems)
      .field("mods", &self.mods)
      .finish()
  }
}

impl<K: Clone + Hash + Eq> Default for MEvarMap<K> {
  fn default() -> Self {
    Self { forms: EvarMap::new(), mems: EvarMap::new(), mods: EvarMap::new() }
  }
}

impl<K: Clone + Hash + Eq> MEvarMap<K> {
  /// The map with an empty domain.
  #[must_use] pub fn new() -> Self { Self::default() }

  /// A map whose domain is `ids`, each declared with its kind, all unset.
  ///
  /// # Panics
  /// If an id is declared twice with different kinds.
  #[must_use] pub fn of_idents(ids: impl IntoIterator<Item = (K, Kind)>) -> Self {
    ids.into_iter().fold(Self::new(), |ev, (k, kind)| ev.add(k, kind))
  }

  /// The declared kind of `id`, if it is in the domain.
  #[must_use] pub fn kind_of(&self, id: &K) -> Option<Kind> {
    if self.forms.mem(id) { Some(Kind::Form) }
    else if self.mems.mem(id) { Some(Kind::Mem) }
    else if self.mods.mem(id) { Some(Kind::Mod) }
    else { None }
  }

  /// Add `id` to the domain with the given kind, unset. Does nothing if it is
  /// already there with that kind.
  ///
  /// # Panics
  /// If `id` is already declared with another kind.
  #[must_use] pub fn add(&self, id: K, kind: Kind) -> Self {
    match self.kind_of(&id) {
      Some(k) => {
        assert_eq!(k, kind, "MEvarMap::add: placeholder redeclared with another kind");
        self.clone()
      }
      None => {
        let mut ev = self.clone();
        match kind {
          Kind::Form => ev.forms = ev.forms.add(id),
          Kind::Mem => ev.mems = ev.mems.add(id),
          Kind::Mod => ev.mods = ev.mods.add(id),
        }
        ev
      }
    }
  }

  /// Bind `id` to `v`.
  ///
  /// # Panics
  /// If `id` is not in the domain, or was declared with a kind other than
  /// `v`'s. Either way the placeholders were built wrongly by the caller.
  #[must_use] pub fn set(&self, id: K, v: Obj) -> Self {
    let Some(kind) = self.kind_of(&id) else {
      panic!("MEvarMap::set: placeholder outside of the domain")
    };
    assert_eq!(kind, v.kind(), "MEvarMap::set: value of the wrong kind");
    let mut ev = self.clone();
    match v {
      Obj::Form(t) => ev.forms = ev.forms.set(id, t),
      Obj::Mem(m) => ev.mems = ev.mems.set(id, m),
      Obj::Mod(mp) => ev.mods = ev.mods.set(id, mp),
    }
    ev
  }

  /// Is `id` in the domain?
  #[must_use] pub fn mem(&self, id: &K) -> bool { self.kind_of(id).is_some() }

  /// Is `id` a formula placeholder?
  #[must_use] pub fn is_form(&self, id: &K) -> bool { self.forms.mem(id) }

  /// Is `id` a memory placeholder?
  #[must_use] pub fn is_mem(&self, id: &K) -> bool { self.mems.mem(id) }

  /// Is `id` a module placeholder?
  #[must_use] pub fn is_mod(&self, id: &K) -> bool { self.mods.mem(id) }

  /// Is `id` in the domain and set, whatever its kind?
  #[must_use] pub fn is_set(&self, id: &K) -> bool {
    self.forms.is_set(id) || self.mems.is_set(id) || self.mods.is_set(id)
  }

  /// The binding of `id`, if it is in the domain and set.
  #[must_use] pub fn get(&self, id: &K) -> Option<Obj> {
    self.forms.get(id).cloned().map(Obj::Form)
      .or_else(|| self.mems.get(id).copied().map(Obj::Mem))
      .or_else(|| self.mods.get(id).cloned().map(Obj::Mod))
  }

  /// The formula bound to `id`.
  #[must_use] pub fn get_form(&self, id: &K) -> Option<&Term> { self.forms.get(id) }

  /// The memory bound to `id`.
  #[must_use] pub fn get_mem(&self, id: &K) -> Option<Memory> { self.mems.get(id).copied() }

  /// The module bound to `id`.
  #[must_use] pub fn get_mod(&self, id: &K) -> Option<&ModPath> { self.mods.get(id) }

  /// Are all placeholders of every kind set?
  #[must_use] pub fn filled(&self) -> bool {
    self.forms.filled() && self.mems.filled() && self.mods.filled()
  }

  /// Iterate over the set placeholders and their values.
  pub fn bindings(&self) -> impl Iterator<Item = (&K, Obj)> {
    let forms = self.forms.iter().filter_map(|(k, v)| Some((k, Obj::Form(v?.clone()))));
    let mems = self.mems.iter().filter_map(|(k, v)| Some((k, Obj::Mem(*v?))));
    let mods = self.mods.iter().filter_map(|(k, v)| Some((k, Obj::Mod(v?.clone()))));
    forms.chain(mems).chain(mods)
  }

  /// Iterate over the placeholders that are still unset.
  pub fn unset(&self) -> impl Iterator<Item = &K> {
    let forms = self.forms.iter().filter(|p| p.1.is_none()).map(|p| p.0);
    let mems = self.mems.iter().filter(|p| p.1.is_none()).map(|p| p.0);
    let mods = self.mods.iter().filter(|p| p.1.is_none()).map(|p| p.0);
    forms.chain(mems).chain(mods)
  }
}

impl MEvarMap<Ident> {
  /// The substitution replacing every set placeholder by its value. Meant for
  /// filled maps; unset placeholders are left in place.
  #[must_use] pub fn assubst(&self) -> Subst {
    let mut s = Subst::new();
    for (&x, v) in self.bindings() {
      match v {
        Obj::Form(t) => { s.forms.insert(x, t); }
        Obj::Mem(m) => { s.mems.insert(x, m); }
        Obj::Mod(mp) => { s.mods.insert(x, mp); }
      }
    }
    s
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::ProgVar;

  #[test]
  fn filled_only_after_every_set() {
    let (x, y) = (Ident::fresh("x"), Ident::fresh("y"));
    let ev = EvarMap::of_idents([x, y]);
    assert!(!ev.filled());
    let ev1 = ev.set(x, Term::int(1));
    assert!(!ev1.filled());
    let ev2 = ev1.set(y, Term::int(2));
    assert!(ev2.filled());
    // the earlier snapshots are untouched
    assert!(!ev.is_set(&x) && !ev1.is_set(&y));
    assert!(EvarMap::<Ident, Term>::of_idents([]).filled());
  }

  #[test]
  fn add_never_overwrites() {
    let x = Ident::fresh("x");
    let ev = EvarMap::of_idents([x]).set(x, Term::int(3));
    assert_eq!(ev.add(x).get(&x), Some(&Term::int(3)));
  }

  #[test]
  #[should_panic(expected = "outside of the domain")]
  fn set_outside_domain_panics() {
    let ev = EvarMap::<Ident, Term>::of_idents([Ident::fresh("x")]);
    let _ = ev.set(Ident::fresh("y"), Term::int(0));
  }

  #[test]
  #[should_panic(expected = "wrong kind")]
  fn set_wrong_kind_panics() {
    let m = Ident::fresh("m");
    let ev = MEvarMap::of_idents([(m, Kind::Mem)]);
    let _ = ev.set(m, Obj::Form(Term::int(0)));
  }

  #[test]
  fn assubst_instantiates_all_sorts() {
    let (x, m) = (Ident::fresh("x"), Ident::fresh("m"));
    let ev = MEvarMap::of_idents([(x, Kind::Form), (m, Kind::Mem)]);
    let mhr = Memory(Ident::fresh("&hr"));
    let ev = ev.set(x, Obj::Form(Term::int(7)));
    assert!(ev.is_set(&x) && !ev.is_set(&m) && !ev.filled());
    let ev = ev.set(m, Obj::Mem(mhr));
    assert!(ev.is_set(&m) && ev.filled());
    let v = ProgVar(crate::intern("v"));
    let t = Term::tuple(vec![Term::local(x), Term::pvar(v, Memory(m))]);
    let r = ev.assubst().apply(&t);
    assert_eq!(r, Term::tuple(vec![Term::int(7), Term::pvar(v, mhr)]));
  }
}
