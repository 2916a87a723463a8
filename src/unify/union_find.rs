// Warning: This file has been adapted from the ena crate, so it has
// a different license.
//
// Copyright 2012-2014 The Rust Project Developers. See the COPYRIGHT
// file at http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Union-find over newtyped keys, with a value at every root.
//!
//! When two keys are unioned, their values are merged by a [`UnifyCtx`];
//! if the merge fails, the keys stay apart. Tables are cloned to take
//! snapshots, so nothing here keeps an undo log.

use ecm_util::{Idx, IdxVec};

/// How to merge the values of two keys that are unioned together.
pub(crate) trait UnifyCtx<V> {
  /// The error when two values cannot be merged.
  type Error;

  /// Given two values, produce a new value that combines them.
  fn unify_values(&mut self, value1: &V, value2: &V) -> Result<V, Self::Error>;
}

#[derive(PartialEq, Clone, Debug)]
struct VarValue<K, V> {
  parent: K, // if equal to self, this is a root
  value: V,  // only relevant to roots
  rank: u32, // only relevant to roots
}

impl<K: PartialEq + Copy, V> VarValue<K, V> {
  fn new_var(key: K, value: V) -> Self { VarValue { parent: key, value, rank: 0 } }

  fn parent(&self, self_key: K) -> Option<K> {
    if self.parent == self_key { None } else { Some(self.parent) }
  }
}

/// Table of unification keys and their values.
#[derive(Clone, Debug)]
pub(crate) struct UnificationTable<K, V> {
  values: IdxVec<K, VarValue<K, V>>,
}

impl<K, V> Default for UnificationTable<K, V> {
  fn default() -> Self { Self { values: IdxVec::default() } }
}

impl<K: Idx, V> UnificationTable<K, V> {
  /// The number of keys created so far.
  #[must_use] pub(crate) fn len(&self) -> usize { self.values.len() }

  /// Creates a fresh key with the given value.
  pub(crate) fn new_key(&mut self, value: V) -> K {
    let key = K::from_usize(self.values.len());
    self.values.push(VarValue::new_var(key, value))
  }

  /// The root of `vid`, compressing the path to it.
  fn get_root_key(&mut self, vid: K) -> K {
    let Some(redirect) = self.values[vid].parent(vid) else { return vid };
    let root_key = self.get_root_key(redirect);
    if root_key != redirect {
      self.values[vid].parent = root_key;
    }
    root_key
  }

  /// Makes the root of lower rank point at the other one, which gets
  /// `new_value`.
  fn unify_roots(&mut self, key_a: K, key_b: K, new_value: V) {
    let rank_a = self.values[key_a].rank;
    let rank_b = self.values[key_b].rank;
    let (new_rank, old_root, new_root) = match rank_a.cmp(&rank_b) {
      std::cmp::Ordering::Greater => (rank_a, key_b, key_a),
      std::cmp::Ordering::Less => (rank_b, key_a, key_b),
      std::cmp::Ordering::Equal => (rank_a + 1, key_a, key_b),
    };
    self.values[old_root].parent = new_root;
    let root = &mut self.values[new_root];
    root.rank = new_rank;
    root.value = new_value;
  }

  /// The current root key of `id`.
  pub(crate) fn find(&mut self, id: K) -> K { self.get_root_key(id) }

  /// Unions together two keys, merging their values. If merging fails, the
  /// error is returned and nothing changes.
  pub(crate) fn unify_var_var<S: UnifyCtx<V>>(&mut self, ctx: &mut S, a_id: K, b_id: K) -> Result<(), S::Error> {
    let root_a = self.get_root_key(a_id);
    let root_b = self.get_root_key(b_id);
    if root_a == root_b { return Ok(()) }
    let combined = ctx.unify_values(&self.values[root_a].value, &self.values[root_b].value)?;
    self.unify_roots(root_a, root_b, combined);
    Ok(())
  }

  /// Merges `b` into the value of `a_id`.
  pub(crate) fn unify_var_value<S: UnifyCtx<V>>(&mut self, ctx: &mut S, a_id: K, b: &V) -> Result<(), S::Error> {
    let root_a = self.get_root_key(a_id);
    let value = ctx.unify_values(&self.values[root_a].value, b)?;
    self.values[root_a].value = value;
    Ok(())
  }

  /// The value at the root of `id`.
  pub(crate) fn probe_value(&mut self, id: K) -> &V {
    let root = self.get_root_key(id);
    &self.values[root].value
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Min;
  impl UnifyCtx<u32> for Min {
    type Error = std::convert::Infallible;
    fn unify_values(&mut self, a: &u32, b: &u32) -> Result<u32, Self::Error> { Ok(*a.min(b)) }
  }

  #[test]
  fn unions_merge_values() {
    let mut t = UnificationTable::<usize, u32>::default();
    let (a, b, c) = (t.new_key(5), t.new_key(3), t.new_key(9));
    assert_eq!(t.len(), 3);
    t.unify_var_var(&mut Min, a, b).unwrap_or_else(|e| match e {});
    assert_eq!(t.find(a), t.find(b));
    assert_ne!(t.find(a), t.find(c));
    assert_eq!(*t.probe_value(a), 3);
    t.unify_var_value(&mut Min, c, &1).unwrap_or_else(|e| match e {});
    t.unify_var_var(&mut Min, c, b).unwrap_or_else(|e| match e {});
    assert_eq!(*t.probe_value(a), 1);
  }
}
