//! The contract a persistent tree must satisfy to be addressed by cursors.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use crate::path::KeyPath;

/// Cheap identity comparison.
///
/// `same` answers "is this the value I already had?" without a deep
/// comparison: persistent containers compare their shared storage by pointer,
/// scalars compare by value. A false negative only costs a redundant write; a
/// false positive would drop one, so implementations must never report two
/// different values as the same.
pub trait Same {
    fn same(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Same for Arc<T> {
    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: Same> Same for Option<T> {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! impl_same_by_eq {
    ($($t:ty),*) => {
        $(impl Same for $t {
            fn same(&self, other: &Self) -> bool {
                self == other
            }
        })*
    };
}

impl_same_by_eq!(bool, char, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, String, &str);

/// Native operations of a persistent tree.
///
/// Every operation is non-destructive: writes return a new tree and leave
/// `self` untouched, sharing unchanged sub-trees. A node and its children
/// have the same type, so the value found at a path is itself a `Tree`.
pub trait Tree: Clone + Same + Send + Sync + 'static {
    /// Key type used to address children.
    type Key: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;

    /// Error raised by rejected writes.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The value at `path`, or `None` if nothing is there.
    fn get_in(&self, path: &[Self::Key]) -> Option<Self>;

    /// A new tree with `value` stored at `path`.
    fn set_in(&self, path: &[Self::Key], value: Self) -> Result<Self, Self::Error>;

    /// A new tree without the value at `path`.
    ///
    /// Deleting an absent path must return a tree that is [`Same`] as `self`.
    fn delete_in(&self, path: &[Self::Key]) -> Result<Self, Self::Error>;

    /// Visit the direct children of this node in order.
    ///
    /// Returns the number of children visited, including the one that broke
    /// the iteration.
    fn for_each(&self, f: &mut dyn FnMut(Self, Self::Key) -> ControlFlow<()>) -> usize;

    /// Fold over the direct children of this node in order.
    fn fold<A, F>(&self, init: A, f: F) -> A
    where
        F: FnMut(A, Self, Self::Key) -> A;
}

/// The stored ("boxed") representation of a cursor's root.
///
/// A root unboxes into the [`Tree`] the accessors operate on, and a commit
/// boxes the new tree again, optionally consulting the previous root (to
/// carry a version counter, for instance). Every tree is its own root, with
/// identity box/unbox.
pub trait Root: Clone + Send + Sync + 'static {
    type Unboxed: Tree;

    fn unbox(&self) -> Self::Unboxed;

    fn rebox(unboxed: Self::Unboxed, previous: &Self) -> Self;
}

impl<T: Tree> Root for T {
    type Unboxed = T;

    fn unbox(&self) -> T {
        self.clone()
    }

    fn rebox(unboxed: T, _previous: &T) -> T {
        unboxed
    }
}

/// The tree type a root unboxes into.
pub type NodeOf<B> = <B as Root>::Unboxed;

/// The key type of the tree a root unboxes into.
pub type KeyOf<B> = <<B as Root>::Unboxed as Tree>::Key;

/// The key path type for a root.
pub type PathOf<B> = KeyPath<KeyOf<B>>;
