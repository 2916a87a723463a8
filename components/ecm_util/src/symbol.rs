//! Interned names: captures, path components, program variables and memories.

use std::{collections::HashMap, fmt::Display, sync::{LazyLock, Mutex}};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::{IdxVec, MutexExt};

crate::mk_id! {
  /// A `Symbol` is an interned string.
  ///
  /// Capture names, operator path components, program variables and memory
  /// names are all symbols, so comparing and hashing them is a `u32` operation.
  ///
  /// Symbols are interned forever: the interner leaks any string it is given.
  Symbol(!Debug)
}

/// The process-wide table behind [`Symbol`].
///
/// Names read from JSON and the components of operator paths
/// all pass through here. Most code calls [`intern`]; lock the table with
/// [`Interner::with`] when interning a whole batch, such as every component
/// of a path.
#[derive(Debug, Default)]
pub struct Interner {
  ids: HashMap<&'static str, Symbol>,
  names: IdxVec<Symbol, &'static str>,
}

static INTERNER: LazyLock<Mutex<Interner>> = LazyLock::new(Default::default);

impl Interner {
  /// Run `f` with the table locked. `f` must not call [`intern`] or
  /// [`Symbol::as_str`], which take the same lock.
  pub fn with<R>(f: impl FnOnce(&mut Interner) -> R) -> R { f(&mut INTERNER.ulock()) }

  /// The symbol for `s`, allocating one on first sight.
  pub fn intern(&mut self, s: &str) -> Symbol {
    if let Some(&id) = self.ids.get(s) { return id }
    let s = Box::leak(s.to_owned().into_boxed_str());
    let id = self.names.push(s);
    self.ids.insert(s, id);
    id
  }

  /// The name of a symbol allocated by this table.
  #[must_use] pub fn get(&self, symbol: Symbol) -> &'static str { self.names[symbol] }
}

/// The symbol for `s`, through the global table.
#[must_use] pub fn intern(s: &str) -> Symbol { Interner::with(|i| i.intern(s)) }

impl Symbol {
  /// The name this symbol was interned from.
  #[must_use] pub fn as_str(self) -> &'static str { Interner::with(|i| i.get(self)) }
}

impl From<&str> for Symbol {
  fn from(s: &str) -> Self { intern(s) }
}

impl Display for Symbol {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.as_str().fmt(f) }
}
impl std::fmt::Debug for Symbol {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{self}") }
}

impl Serialize for Symbol {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for Symbol {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    Ok(intern(&String::deserialize(d)?))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn interning_is_stable() {
    let a = intern("eq");
    assert_eq!(a, intern("eq"));
    assert_ne!(a, intern("add"));
    assert_eq!(a.as_str(), "eq");
    let (x, y) = Interner::with(|i| (i.intern("x"), i.intern("Top.x")));
    assert_ne!(x, y);
    assert_eq!(Symbol::from("Top.x"), y);
  }
}
