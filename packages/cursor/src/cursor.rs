//! The cursor protocol: navigation, reads, and commits against a shared root.
//!
//! A cursor is an immutable handle made of an [`Options`] record and a
//! private memo of its last read. Every write goes through the accessor,
//! re-boxes the new root, runs the update hooks and yields a *new* cursor of
//! the same concrete type via [`Cursor::create_from`]. The original cursor
//! keeps pointing at the old root.
//!
//! Cursor types other than [`BaseCursor`](crate::BaseCursor) embed a
//! [`CursorCore`] and implement the two required methods; everything else is
//! provided.

use std::cell::RefCell;
use std::fmt;
use std::ops::ControlFlow;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::options::{unbox_root, Options, OptionsBuilder};
use crate::path::{IntoKeyPath, KeyPath};
use crate::tree::{KeyOf, NodeOf, PathOf, Root, Same};

/// The last read of a cursor: the unboxed root it was computed against and
/// the value found at the cursor's path.
///
/// A hit requires the current root to be [`Same`] as the stored one.
pub struct Memo<T> {
    cell: RefCell<Option<(T, Option<T>)>>,
}

impl<T: Same + Clone> Memo<T> {
    pub fn new() -> Self {
        Memo {
            cell: RefCell::new(None),
        }
    }

    /// The memoized value for `root`, or `None` on a miss.
    fn lookup(&self, root: &T) -> Option<Option<T>> {
        let cell = self.cell.borrow();
        let (cached_root, value) = cell.as_ref()?;
        cached_root.same(root).then(|| value.clone())
    }

    fn store(&self, root: T, value: Option<T>) {
        *self.cell.borrow_mut() = Some((root, value));
    }

    /// The last value read, whatever root it was read from.
    pub fn last(&self) -> Option<T> {
        self.cell.borrow().as_ref().and_then(|(_, value)| value.clone())
    }
}

impl<T: Same + Clone> Default for Memo<T> {
    fn default() -> Self {
        Memo::new()
    }
}

/// A clone takes a copy of the current snapshot. The two cells are
/// independent afterwards.
impl<T: Clone> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Memo {
            cell: RefCell::new(self.cell.borrow().clone()),
        }
    }
}

impl<T> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo").finish_non_exhaustive()
    }
}

/// The state every cursor type embeds.
pub struct CursorCore<B: Root> {
    options: Options<B>,
    memo: Memo<NodeOf<B>>,
}

impl<B: Root> CursorCore<B> {
    pub fn new(options: Options<B>) -> Self {
        CursorCore {
            options,
            memo: Memo::new(),
        }
    }

    pub fn options(&self) -> &Options<B> {
        &self.options
    }

    pub fn memo(&self) -> &Memo<NodeOf<B>> {
        &self.memo
    }
}

impl<B: Root> Clone for CursorCore<B> {
    fn clone(&self) -> Self {
        CursorCore {
            options: self.options.clone(),
            memo: self.memo.clone(),
        }
    }
}

impl<B: Root + fmt::Debug> fmt::Debug for CursorCore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorCore")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// An immutable handle on a location in a persistent tree.
///
/// Implementors supply their [`CursorCore`] and a way to build a sibling of
/// their own type from new options. Every derived cursor (navigation,
/// commits, iteration) is produced by [`Cursor::create_from`], so a
/// specialised cursor type never degrades to a plain one.
///
/// `Clone` must keep the options record: a clone is the same cursor for the
/// purposes of [`Cursor::same_as`].
pub trait Cursor: Clone + Sized {
    type Root: Root;

    fn core(&self) -> &CursorCore<Self::Root>;

    /// Construct a cursor of the implementing type around `options`.
    fn create_from(&self, options: Options<Self::Root>) -> Self;

    fn options(&self) -> &Options<Self::Root> {
        self.core().options()
    }

    fn path(&self) -> &PathOf<Self::Root> {
        self.options().path()
    }

    /// Check whether both cursors hold the same options record.
    fn same_as(&self, other: &Self) -> bool {
        self.options().ptr_eq(other.options())
    }

    /// The value at this cursor's path, or `None` if nothing is there.
    ///
    /// Repeated reads against the same root are answered from the memo
    /// without calling the accessor.
    fn deref(&self) -> Option<NodeOf<Self::Root>> {
        let options = self.options();
        let (_, root) = unbox_root(options)?;
        let memo = self.core().memo();
        if let Some(value) = memo.lookup(&root) {
            return value;
        }

        trace!(path = ?options.path(), "reading through accessor");
        let value = options.accessor().get_in(&root, options.path());
        memo.store(root, value.clone());
        value
    }

    /// The value at this cursor's path, or `not_set` if nothing is there.
    fn deref_or(&self, not_set: NodeOf<Self::Root>) -> NodeOf<Self::Root> {
        self.deref().unwrap_or(not_set)
    }

    /// Check whether a value is present at this cursor's path.
    fn exists(&self) -> bool {
        self.deref().is_some()
    }

    /// The last value this cursor read, without consulting the tree.
    fn cached_value(&self) -> Option<NodeOf<Self::Root>> {
        self.core().memo().last()
    }

    /// A cursor at `sub` relative to this one.
    ///
    /// An empty sub-path returns this cursor unchanged.
    fn cursor(&self, sub: impl IntoKeyPath<KeyOf<Self::Root>>) -> Self {
        let sub = sub.into_key_path();
        if sub.is_empty() {
            return self.clone();
        }
        let path = self.path().join(&sub);
        self.create_from(self.options().with_path(path))
    }

    /// A cursor at the root of the tree, with every other option kept.
    fn root(&self) -> Self {
        self.create_from(self.options().with_path(KeyPath::new()))
    }

    /// Replace the value at this cursor's path with the result of `updater`.
    ///
    /// The updater receives the current value (`None` if absent), the
    /// unboxed root and the boxed root. Returning a value that is [`Same`]
    /// as the current one is a no-op and yields this cursor unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::MissingRootData`] if no root is attached, or whatever the
    /// accessor or an update hook raised.
    fn update<F>(&self, updater: F) -> Result<Self>
    where
        F: FnOnce(Option<NodeOf<Self::Root>>, &NodeOf<Self::Root>, &Self::Root) -> NodeOf<Self::Root>,
    {
        self.try_update(|current, root, boxed| Ok(updater(current, root, boxed)))
    }

    /// [`Cursor::update`] with a fallible updater; its error aborts the
    /// commit and is returned as is.
    fn try_update<F>(&self, updater: F) -> Result<Self>
    where
        F: FnOnce(Option<NodeOf<Self::Root>>, &NodeOf<Self::Root>, &Self::Root) -> Result<NodeOf<Self::Root>>,
    {
        let options = self.options();
        let (boxed, root) = unbox_root(options).ok_or(Error::MissingRootData)?;
        let current = options.accessor().get_in(&root, options.path());
        let next = updater(current.clone(), &root, boxed)?;
        if current.is_some_and(|current| current.same(&next)) {
            trace!(path = ?options.path(), "update left the value unchanged");
            return Ok(self.clone());
        }
        write_at_path(self, boxed, root, next)
    }

    /// [`Cursor::update`] where an absent value reads as `not_set`.
    ///
    /// Returning a value [`Same`] as `not_set` for an absent path is a no-op.
    fn update_or<F>(&self, not_set: NodeOf<Self::Root>, updater: F) -> Result<Self>
    where
        F: FnOnce(NodeOf<Self::Root>, &NodeOf<Self::Root>, &Self::Root) -> NodeOf<Self::Root>,
    {
        let options = self.options();
        let (boxed, root) = unbox_root(options).ok_or(Error::MissingRootData)?;
        let current = options
            .accessor()
            .get_in(&root, options.path())
            .unwrap_or(not_set);
        let next = updater(current.clone(), &root, boxed);
        if current.same(&next) {
            trace!(path = ?options.path(), "update left the value unchanged");
            return Ok(self.clone());
        }
        write_at_path(self, boxed, root, next)
    }

    /// Remove the value at this cursor's path.
    ///
    /// If the accessor returns a root [`Same`] as the current one (the path
    /// was absent), nothing is committed and this cursor is returned.
    fn delete(&self) -> Result<Self> {
        let options = self.options();
        let (boxed, root) = unbox_root(options).ok_or(Error::MissingRootData)?;
        let next = options.accessor().delete_in(&root, options.path())?;
        if next.same(&root) {
            trace!(path = ?options.path(), "delete left the root unchanged");
            return Ok(self.clone());
        }
        commit(self, boxed, root, next, "delete")
    }

    /// Alias of [`Cursor::delete`].
    fn remove(&self) -> Result<Self> {
        self.delete()
    }

    /// Visit the children of the value at this cursor's path, each as a
    /// cursor of this type.
    ///
    /// `f` may stop the iteration early by returning `ControlFlow::Break`.
    /// Returns the number of children visited, or `None` if there is no
    /// value here.
    fn for_each<F>(&self, mut f: F) -> Option<usize>
    where
        F: FnMut(Self, KeyOf<Self::Root>) -> ControlFlow<()>,
    {
        let node = self.deref()?;
        let visited = self.options().accessor().for_each(&node, &mut |_, key| {
            f(self.cursor(KeyPath::from(vec![key.clone()])), key)
        });
        Some(visited)
    }

    /// Fold over the children of the value at this cursor's path, each as a
    /// cursor of this type.
    ///
    /// Returns `None` if there is no value here.
    fn reduce<A, F>(&self, init: A, mut f: F) -> Option<A>
    where
        F: FnMut(A, Self, KeyOf<Self::Root>) -> A,
    {
        let node = self.deref()?;
        let mut acc = Some(init);
        self.options().accessor().reduce(&node, &mut |_, key| {
            if let Some(prev) = acc.take() {
                let child = self.cursor(KeyPath::from(vec![key.clone()]));
                acc = Some(f(prev, child, key));
            }
        });
        acc
    }

    /// A cursor of this type around `options`, validated again first.
    ///
    /// # Errors
    ///
    /// [`Error::MissingRootData`] if `options` carry no root data.
    fn with_options(&self, options: Options<Self::Root>) -> Result<Self> {
        let options = OptionsBuilder::from(options).build()?;
        Ok(self.create_from(options))
    }
}

fn write_at_path<C: Cursor>(
    cursor: &C,
    boxed: &C::Root,
    root: NodeOf<C::Root>,
    value: NodeOf<C::Root>,
) -> Result<C> {
    let options = cursor.options();
    let next = options.accessor().set_in(&root, options.path(), value)?;
    commit(cursor, boxed, root, next, "update")
}

fn commit<C: Cursor>(
    cursor: &C,
    boxed: &C::Root,
    old_root: NodeOf<C::Root>,
    new_root: NodeOf<C::Root>,
    op: &'static str,
) -> Result<C> {
    let options = cursor.options();
    let reboxed = options.rebox(new_root.clone(), boxed);
    options.notify(options.path(), &new_root, &old_root)?;
    debug!(path = ?options.path(), op, "committed new root");
    Ok(cursor.create_from(options.with_root_data(reboxed)))
}
