//! Utilities shared by the matching core: interned symbols, newtyped indices,
//! a typed index vector, and a stack-allocated linked list for binder contexts.

// rust lints we want
#![warn(
  bare_trait_objects,
  elided_lifetimes_in_paths,
  missing_copy_implementations,
  missing_debug_implementations,
  future_incompatible,
  rust_2018_idioms,
  trivial_numeric_casts,
  variant_size_differences,
  unreachable_pub,
  unused,
  missing_docs
)]
// all the clippy
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
// all the clippy::restriction lints we want
#![warn(
  clippy::else_if_without_else,
  clippy::float_arithmetic,
  clippy::get_unwrap,
  clippy::integer_division,
  clippy::rc_buffer,
  clippy::rest_pat_in_fully_bound_structs,
  clippy::string_add,
  clippy::unwrap_used
)]
// all the clippy lints we don't want
#![allow(
  clippy::cognitive_complexity,
  clippy::comparison_chain,
  clippy::default_trait_access,
  clippy::inline_always,
  clippy::missing_const_for_fn,
  clippy::missing_errors_doc,
  clippy::missing_panics_doc,
  clippy::module_name_repetitions,
  clippy::multiple_crate_versions,
  clippy::option_if_let_else,
  clippy::redundant_pub_crate,
  clippy::semicolon_if_nothing_returned,
  clippy::shadow_unrelated,
  clippy::too_many_lines,
  clippy::use_self
)]

use std::error::Error;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

mod symbol;

pub use symbol::{Interner, Symbol, intern};

/// Newtype for `Box<dyn Error + Send + Sync>`
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Declares newtyped `u32` identifiers.
///
/// Each generated type gets a `fresh` method to draw the next id from a
/// `&mut` counter, and an [`Idx`] impl so it can index an [`IdxVec`].
/// Writing `Name(!Debug)` suppresses the derived `Debug` impl.
#[macro_export]
macro_rules! mk_id {
  (@impl $id:ident) => {
    impl $id {
      /// Generate a fresh variable from a `&mut ID` counter.
      #[must_use] #[inline] pub fn fresh(&mut self) -> Self {
        let n = *self;
        self.0 += 1;
        n
      }
    }
    impl From<$id> for usize {
      fn from(id: $id) -> usize { $crate::u32_as_usize(id.0) }
    }
    impl $crate::Idx for $id {
      fn into_usize(self) -> usize { self.into() }
      fn from_usize(n: usize) -> Self { $id(u32::try_from(n).expect("overflow")) }
    }
  };
  ($(#[$attr:meta])* $id:ident(!Debug)) => {
    $(#[$attr])*
    #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct $id(pub u32);
    $crate::mk_id!(@impl $id);
  };
  ($($(#[$attr:meta])* $id:ident),* $(,)?) => {$(
    $(#[$attr])*
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct $id(pub u32);
    $crate::mk_id!(@impl $id);
  )*};
}

/// A trait for newtyped integers, that can be used as index types in vectors and sets.
pub trait Idx: Copy + Eq {
  /// Convert from `T` to `usize`
  fn into_usize(self) -> usize;
  /// Convert from `usize` to `T`
  fn from_usize(_: usize) -> Self;
}

impl Idx for usize {
  fn into_usize(self) -> usize { self }
  fn from_usize(n: usize) -> Self { n }
}

/// A vector indexed by a custom indexing type `I`, usually a newtyped integer.
#[derive(Clone, Debug)]
pub struct IdxVec<I, T>(pub Vec<T>, PhantomData<I>);

impl<I, T> IdxVec<I, T> {
  /// Construct a new empty [`IdxVec`].
  #[must_use] pub const fn new() -> Self { Self(vec![], PhantomData) }

  /// The number of elements in the [`IdxVec`].
  #[must_use] pub fn len(&self) -> usize { self.0.len() }

  /// Returns `true` if the vector contains no elements.
  #[must_use] pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// Insert a new value at the end of the vector.
  pub fn push(&mut self, val: T) -> I where I: Idx {
    let id = I::from_usize(self.0.len());
    self.0.push(val);
    id
  }
}

impl<I, T> From<Vec<T>> for IdxVec<I, T> {
  fn from(vec: Vec<T>) -> Self { Self(vec, PhantomData) }
}

impl<I, T> Default for IdxVec<I, T> {
  fn default() -> Self { vec![].into() }
}

impl<I: Idx, T> Index<I> for IdxVec<I, T> {
  type Output = T;
  fn index(&self, index: I) -> &Self::Output { &self.0[I::into_usize(index)] }
}

impl<I: Idx, T> IndexMut<I> for IdxVec<I, T> {
  fn index_mut(&mut self, index: I) -> &mut Self::Output { &mut self.0[I::into_usize(index)] }
}

/// Converts `n` from `u32` to `usize` or panics (which should not happen since we don't support
/// 16 bit systems).
#[inline]
#[must_use]
pub fn u32_as_usize(n: u32) -> usize {
  n.try_into().expect("here's a nickel, get a better computer")
}

/// Extension trait for [`Mutex`](std::sync::Mutex)`<T>`.
pub trait MutexExt<T> {
  /// Like `lock`, but propagates instead of catches panics.
  fn ulock(&self) -> std::sync::MutexGuard<'_, T>;
}

impl<T> MutexExt<T> for std::sync::Mutex<T> {
  fn ulock(&self) -> std::sync::MutexGuard<'_, T> {
    self.lock().expect("propagating poisoned mutex")
  }
}

/// A structure that allows constructing linked lists on the call stack.
///
/// Traversals that pass under binders push the bound names here instead of
/// cloning a set at every level.
#[derive(Debug)]
pub struct StackList<'a, T>(pub Option<&'a (StackList<'a, T>, T)>);

impl<T> Clone for StackList<'_, T> {
  fn clone(&self) -> Self { *self }
}
impl<T> Copy for StackList<'_, T> {}

impl<T> Default for StackList<'_, T> {
  fn default() -> Self { Self(None) }
}

impl<'a, T> StackList<'a, T> {
  /// Iterate from the most recently pushed element to the oldest.
  pub fn iter(&self) -> impl Iterator<Item = &'a T> {
    let mut s = self.0;
    std::iter::from_fn(move || {
      let (s2, t) = s?;
      s = s2.0;
      Some(t)
    })
  }
}
