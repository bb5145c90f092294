//! The accessor protocol: how a cursor reads, writes, deletes and iterates.
//!
//! Every operation receives the unboxed root (or, for iteration, the node at
//! the cursor's path) as its first argument. The default bodies delegate to
//! the tree's native [`Tree`] operations, so an implementation only overrides
//! what it needs.

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::tree::Tree;

/// Five operations a cursor performs on its tree.
///
/// # Object Safety
///
/// This trait is object-safe: options store it as `Arc<dyn Accessor<T>>`.
pub trait Accessor<T: Tree>: Send + Sync {
    /// Read the value at `path`.
    fn get_in(&self, root: &T, path: &[T::Key]) -> Option<T> {
        root.get_in(path)
    }

    /// Write `value` at `path`, returning the new root.
    fn set_in(&self, root: &T, path: &[T::Key], value: T) -> Result<T> {
        root.set_in(path, value).map_err(Error::accessor)
    }

    /// Delete the value at `path`, returning the new root.
    fn delete_in(&self, root: &T, path: &[T::Key]) -> Result<T> {
        root.delete_in(path).map_err(Error::accessor)
    }

    /// Visit the children of `node`; returns the number visited.
    fn for_each(&self, node: &T, f: &mut dyn FnMut(T, T::Key) -> ControlFlow<()>) -> usize {
        node.for_each(f)
    }

    /// Drive a fold over the children of `node`.
    ///
    /// The caller owns the accumulator; the accessor only decides which
    /// children are folded and in what order.
    fn reduce(&self, node: &T, f: &mut dyn FnMut(T, T::Key)) {
        node.fold((), |(), child, key| f(child, key))
    }
}

/// The accessor that delegates every operation to the tree itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Native;

impl<T: Tree> Accessor<T> for Native {}

/// Reads the value at a path.
pub type GetInFn<T> = Arc<dyn Fn(&T, &[<T as Tree>::Key]) -> Option<T> + Send + Sync>;

/// Writes a value at a path and returns the new root.
pub type SetInFn<T> = Arc<dyn Fn(&T, &[<T as Tree>::Key], T) -> Result<T> + Send + Sync>;

/// Deletes the value at a path and returns the new root.
pub type DeleteInFn<T> = Arc<dyn Fn(&T, &[<T as Tree>::Key]) -> Result<T> + Send + Sync>;

/// Visits the children of a node.
pub type ForEachFn<T> = Arc<
    dyn Fn(&T, &mut dyn FnMut(T, <T as Tree>::Key) -> ControlFlow<()>) -> usize + Send + Sync,
>;

/// Drives a fold over the children of a node.
pub type ReduceFn<T> = Arc<dyn Fn(&T, &mut dyn FnMut(T, <T as Tree>::Key)) + Send + Sync>;

/// Per-operation overrides layered over a base accessor.
///
/// Each operation left unset falls back to the base accessor when the
/// overrides are resolved.
pub struct Accessors<T: Tree> {
    get_in: Option<GetInFn<T>>,
    set_in: Option<SetInFn<T>>,
    delete_in: Option<DeleteInFn<T>>,
    for_each: Option<ForEachFn<T>>,
    reduce: Option<ReduceFn<T>>,
}

impl<T: Tree> Accessors<T> {
    /// No overrides.
    pub fn new() -> Self {
        Accessors {
            get_in: None,
            set_in: None,
            delete_in: None,
            for_each: None,
            reduce: None,
        }
    }

    /// Check if no operation is overridden.
    pub fn is_empty(&self) -> bool {
        self.get_in.is_none()
            && self.set_in.is_none()
            && self.delete_in.is_none()
            && self.for_each.is_none()
            && self.reduce.is_none()
    }

    pub fn get_in<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &[T::Key]) -> Option<T> + Send + Sync + 'static,
    {
        self.get_in = Some(Arc::new(f));
        self
    }

    pub fn set_in<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &[T::Key], T) -> Result<T> + Send + Sync + 'static,
    {
        self.set_in = Some(Arc::new(f));
        self
    }

    pub fn delete_in<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &[T::Key]) -> Result<T> + Send + Sync + 'static,
    {
        self.delete_in = Some(Arc::new(f));
        self
    }

    pub fn for_each<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &mut dyn FnMut(T, T::Key) -> ControlFlow<()>) -> usize + Send + Sync + 'static,
    {
        self.for_each = Some(Arc::new(f));
        self
    }

    pub fn reduce<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &mut dyn FnMut(T, T::Key)) + Send + Sync + 'static,
    {
        self.reduce = Some(Arc::new(f));
        self
    }

    /// Fill every unset operation from `base`.
    ///
    /// Without any override the base accessor is returned as is.
    pub fn resolve(self, base: Arc<dyn Accessor<T>>) -> Arc<dyn Accessor<T>> {
        if self.is_empty() {
            return base;
        }

        let reduce = self.reduce.unwrap_or_else(|| {
            let base = Arc::clone(&base);
            Arc::new(move |node: &T, f: &mut dyn FnMut(T, T::Key)| base.reduce(node, f))
        });
        let for_each = self.for_each.unwrap_or_else(|| {
            let base = Arc::clone(&base);
            Arc::new(
                move |node: &T, f: &mut dyn FnMut(T, T::Key) -> ControlFlow<()>| {
                    base.for_each(node, f)
                },
            )
        });
        let delete_in = self.delete_in.unwrap_or_else(|| {
            let base = Arc::clone(&base);
            Arc::new(move |root: &T, path: &[T::Key]| base.delete_in(root, path))
        });
        let set_in = self.set_in.unwrap_or_else(|| {
            let base = Arc::clone(&base);
            Arc::new(move |root: &T, path: &[T::Key], value: T| base.set_in(root, path, value))
        });
        let get_in = self.get_in.unwrap_or_else(|| {
            Arc::new(move |root: &T, path: &[T::Key]| base.get_in(root, path))
        });

        Arc::new(Resolved {
            get_in,
            set_in,
            delete_in,
            for_each,
            reduce,
        })
    }
}

impl<T: Tree> Default for Accessors<T> {
    fn default() -> Self {
        Accessors::new()
    }
}

impl<T: Tree> Clone for Accessors<T> {
    fn clone(&self) -> Self {
        Accessors {
            get_in: self.get_in.clone(),
            set_in: self.set_in.clone(),
            delete_in: self.delete_in.clone(),
            for_each: self.for_each.clone(),
            reduce: self.reduce.clone(),
        }
    }
}

/// A fully populated operation table.
struct Resolved<T: Tree> {
    get_in: GetInFn<T>,
    set_in: SetInFn<T>,
    delete_in: DeleteInFn<T>,
    for_each: ForEachFn<T>,
    reduce: ReduceFn<T>,
}

impl<T: Tree> Accessor<T> for Resolved<T> {
    fn get_in(&self, root: &T, path: &[T::Key]) -> Option<T> {
        (self.get_in)(root, path)
    }

    fn set_in(&self, root: &T, path: &[T::Key], value: T) -> Result<T> {
        (self.set_in)(root, path, value)
    }

    fn delete_in(&self, root: &T, path: &[T::Key]) -> Result<T> {
        (self.delete_in)(root, path)
    }

    fn for_each(&self, node: &T, f: &mut dyn FnMut(T, T::Key) -> ControlFlow<()>) -> usize {
        (self.for_each)(node, f)
    }

    fn reduce(&self, node: &T, f: &mut dyn FnMut(T, T::Key)) {
        (self.reduce)(node, f)
    }
}
