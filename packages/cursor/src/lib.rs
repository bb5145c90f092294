//! Arbor cursors: path-addressed handles over persistent trees
//!
//! A cursor pairs an immutable [`Options`] record with a path into a tree
//! whose root it carries. Reads go through an [`Accessor`]; writes produce a
//! new root and a new cursor while every older cursor keeps its snapshot.
//!
//! This crate is generic over the tree:
//! - [`Tree`]: native `get_in`/`set_in`/`delete_in` and child iteration
//! - [`Root`]: the stored form of a root, boxed around the tree
//! - [`Same`]: cheap identity, used to detect no-op writes and memo hits
//!
//! `arbor-value` provides a ready-made tree.
//!
//! Use this layer for:
//! - Handing out write access to one branch of a larger document
//! - Observing commits through update hooks
//! - Building cursor types with extra behavior ([`Cursor`] + [`CursorCore`])

mod accessor;
mod base;
mod cursor;
mod error;
mod options;
mod path;
mod tree;

#[cfg(test)]
mod testing;

pub use accessor::{
    Accessor, Accessors, DeleteInFn, ForEachFn, GetInFn, Native, ReduceFn, SetInFn,
};
pub use base::BaseCursor;
pub use cursor::{Cursor, CursorCore, Memo};
pub use error::{BoxError, Error, Result};
pub use options::{BoxFn, Options, OptionsBuilder, UnboxFn, UpdateHook};
pub use path::{IntoKeyPath, KeyPath};
pub use tree::{KeyOf, NodeOf, PathOf, Root, Same, Tree};
