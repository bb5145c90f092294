//! The options record every cursor carries.
//!
//! `Options` is immutable. Deriving a cursor changes exactly one field (the
//! path on navigation, the root data on commit) and shares every other field
//! with the predecessor through reference-counted handles, so a long chain of
//! derived cursors never copies closures or accessor tables.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::accessor::{Accessor, Accessors, Native};
use crate::error::{Error, Result};
use crate::path::{IntoKeyPath, KeyPath};
use crate::tree::{KeyOf, NodeOf, PathOf, Root};

/// Turns the stored root into the tree the accessors operate on.
pub type UnboxFn<B> = Arc<dyn Fn(&B) -> NodeOf<B> + Send + Sync>;

/// Turns a freshly committed tree back into the stored root.
///
/// The second argument is the root being replaced.
pub type BoxFn<B> = Arc<dyn Fn(NodeOf<B>, &B) -> B + Send + Sync>;

/// Called after every commit with `(options, path, new_root, old_root)`.
///
/// `options` are the options of the cursor that committed, and both roots
/// are unboxed.
pub type UpdateHook<B> =
    Arc<dyn Fn(&Options<B>, &PathOf<B>, &NodeOf<B>, &NodeOf<B>) -> Result<()> + Send + Sync>;

/// Document keys that name callables. They cannot be loaded from a document.
const CALLABLE_KEYS: [&str; 7] = [
    "getIn",
    "setIn",
    "deleteIn",
    "forEach",
    "reduce",
    "onUpdate",
    "_onUpdate",
];

struct Boxing<B: Root> {
    unbox: UnboxFn<B>,
    rebox: BoxFn<B>,
}

struct Hooks<B: Root> {
    on_update_internal: Option<UpdateHook<B>>,
    on_update: Option<UpdateHook<B>>,
}

struct OptionsInner<B: Root> {
    path: PathOf<B>,
    root_data: Option<B>,
    boxing: Arc<Boxing<B>>,
    accessor: Arc<dyn Accessor<NodeOf<B>>>,
    hooks: Arc<Hooks<B>>,
}

/// The immutable configuration of a cursor.
///
/// Cloning is cheap and yields a handle to the same record
/// ([`Options::ptr_eq`] holds between the two).
pub struct Options<B: Root> {
    inner: Arc<OptionsInner<B>>,
}

impl<B: Root> Options<B> {
    /// Start building options.
    pub fn builder() -> OptionsBuilder<B> {
        OptionsBuilder::new()
    }

    /// The path the cursor addresses, relative to the unboxed root.
    pub fn path(&self) -> &PathOf<B> {
        &self.inner.path
    }

    /// The stored (boxed) root, if one was supplied.
    pub fn root_data(&self) -> Option<&B> {
        self.inner.root_data.as_ref()
    }

    /// Unbox a root with the configured transform.
    pub fn unbox(&self, root: &B) -> NodeOf<B> {
        (self.inner.boxing.unbox)(root)
    }

    /// Box a committed tree with the configured transform.
    pub fn rebox(&self, unboxed: NodeOf<B>, previous: &B) -> B {
        (self.inner.boxing.rebox)(unboxed, previous)
    }

    /// The accessor used for every read, write and traversal.
    pub fn accessor(&self) -> &dyn Accessor<NodeOf<B>> {
        self.inner.accessor.as_ref()
    }

    /// Check whether a user update hook is installed.
    pub fn has_on_update(&self) -> bool {
        self.inner.hooks.on_update.is_some()
    }

    /// Check whether an internal update hook is installed.
    pub fn has_on_update_internal(&self) -> bool {
        self.inner.hooks.on_update_internal.is_some()
    }

    /// Run the update hooks: the internal one first, then the user one.
    ///
    /// The first hook error stops the notification and is returned as is.
    pub fn notify(&self, path: &PathOf<B>, new_root: &NodeOf<B>, old_root: &NodeOf<B>) -> Result<()> {
        let hooks = &self.inner.hooks;
        if let Some(hook) = &hooks.on_update_internal {
            hook(self, path, new_root, old_root)?;
        }
        if let Some(hook) = &hooks.on_update {
            hook(self, path, new_root, old_root)?;
        }
        Ok(())
    }

    /// New options that differ from these only in their path.
    #[must_use]
    pub fn with_path(&self, path: PathOf<B>) -> Self {
        let inner = &self.inner;
        Options {
            inner: Arc::new(OptionsInner {
                path,
                root_data: inner.root_data.clone(),
                boxing: Arc::clone(&inner.boxing),
                accessor: Arc::clone(&inner.accessor),
                hooks: Arc::clone(&inner.hooks),
            }),
        }
    }

    /// New options that differ from these only in their root data.
    #[must_use]
    pub fn with_root_data(&self, root_data: B) -> Self {
        let inner = &self.inner;
        Options {
            inner: Arc::new(OptionsInner {
                path: inner.path.clone(),
                root_data: Some(root_data),
                boxing: Arc::clone(&inner.boxing),
                accessor: Arc::clone(&inner.accessor),
                hooks: Arc::clone(&inner.hooks),
            }),
        }
    }

    /// Check whether both handles refer to the same record.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Check whether both records share their closures, accessor and hooks.
    ///
    /// True for any two options derived from the same build.
    pub fn shares_config(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner.boxing, &other.inner.boxing)
            && Arc::ptr_eq(&self.inner.accessor, &other.inner.accessor)
            && Arc::ptr_eq(&self.inner.hooks, &other.inner.hooks)
    }
}

impl<B: Root> Clone for Options<B> {
    fn clone(&self) -> Self {
        Options {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Root + fmt::Debug> fmt::Debug for Options<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("path", self.path())
            .field("root_data", &self.inner.root_data)
            .field("on_update", &self.has_on_update())
            .field("on_update_internal", &self.has_on_update_internal())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Options`].
///
/// Every field is optional. [`OptionsBuilder::build`] fills absent fields
/// with their defaults and then requires root data, unless
/// [`OptionsBuilder::skip_data_check`] was called.
pub struct OptionsBuilder<B: Root> {
    root_data: Option<B>,
    unbox: Option<UnboxFn<B>>,
    rebox: Option<BoxFn<B>>,
    path: Option<PathOf<B>>,
    accessor: Option<Arc<dyn Accessor<NodeOf<B>>>>,
    overrides: Accessors<NodeOf<B>>,
    on_update: Option<UpdateHook<B>>,
    on_update_internal: Option<UpdateHook<B>>,
    skip_data_check: bool,
}

impl<B: Root> OptionsBuilder<B> {
    /// A builder with nothing set.
    pub fn new() -> Self {
        OptionsBuilder {
            root_data: None,
            unbox: None,
            rebox: None,
            path: None,
            accessor: None,
            overrides: Accessors::new(),
            on_update: None,
            on_update_internal: None,
            skip_data_check: false,
        }
    }

    /// The stored root.
    pub fn root_data(mut self, root_data: B) -> Self {
        self.root_data = Some(root_data);
        self
    }

    /// The path to address; a bare key or a sequence of keys.
    pub fn path(mut self, path: impl IntoKeyPath<KeyOf<B>>) -> Self {
        self.path = Some(path.into_key_path());
        self
    }

    /// Override [`Root::unbox`].
    pub fn unbox<F>(mut self, f: F) -> Self
    where
        F: Fn(&B) -> NodeOf<B> + Send + Sync + 'static,
    {
        self.unbox = Some(Arc::new(f));
        self
    }

    /// Override [`Root::rebox`].
    pub fn rebox<F>(mut self, f: F) -> Self
    where
        F: Fn(NodeOf<B>, &B) -> B + Send + Sync + 'static,
    {
        self.rebox = Some(Arc::new(f));
        self
    }

    /// Replace the base accessor (the native tree operations by default).
    ///
    /// Per-operation overrides still take precedence over it.
    pub fn accessor(mut self, accessor: impl Accessor<NodeOf<B>> + 'static) -> Self {
        self.accessor = Some(Arc::new(accessor));
        self
    }

    pub fn get_in<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeOf<B>, &[KeyOf<B>]) -> Option<NodeOf<B>> + Send + Sync + 'static,
    {
        self.overrides = self.overrides.get_in(f);
        self
    }

    pub fn set_in<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeOf<B>, &[KeyOf<B>], NodeOf<B>) -> Result<NodeOf<B>> + Send + Sync + 'static,
    {
        self.overrides = self.overrides.set_in(f);
        self
    }

    pub fn delete_in<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeOf<B>, &[KeyOf<B>]) -> Result<NodeOf<B>> + Send + Sync + 'static,
    {
        self.overrides = self.overrides.delete_in(f);
        self
    }

    pub fn for_each<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeOf<B>, &mut dyn FnMut(NodeOf<B>, KeyOf<B>) -> std::ops::ControlFlow<()>) -> usize
            + Send
            + Sync
            + 'static,
    {
        self.overrides = self.overrides.for_each(f);
        self
    }

    pub fn reduce<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeOf<B>, &mut dyn FnMut(NodeOf<B>, KeyOf<B>)) + Send + Sync + 'static,
    {
        self.overrides = self.overrides.reduce(f);
        self
    }

    /// Hook for end users, called after the internal hook on every commit.
    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&Options<B>, &PathOf<B>, &NodeOf<B>, &NodeOf<B>) -> Result<()> + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(f));
        self
    }

    /// Hook reserved for specialised cursor types, called first on every commit.
    pub fn on_update_internal<F>(mut self, f: F) -> Self
    where
        F: Fn(&Options<B>, &PathOf<B>, &NodeOf<B>, &NodeOf<B>) -> Result<()> + Send + Sync + 'static,
    {
        self.on_update_internal = Some(Arc::new(f));
        self
    }

    /// Allow building without root data, to supply it later with
    /// [`Options::with_root_data`].
    pub fn skip_data_check(mut self) -> Self {
        self.skip_data_check = true;
        self
    }

    /// Fill defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRootData`] if no root data was supplied and
    /// the data check was not skipped.
    pub fn build(self) -> Result<Options<B>> {
        // defaults, last declared first
        let accessor = self
            .overrides
            .resolve(self.accessor.unwrap_or_else(|| Arc::new(Native)));
        let path = self.path.unwrap_or_default();
        let rebox = self.rebox.unwrap_or_else(|| {
            Arc::new(|unboxed: NodeOf<B>, previous: &B| B::rebox(unboxed, previous))
        });
        let unbox = self
            .unbox
            .unwrap_or_else(|| Arc::new(|root: &B| root.unbox()));

        if self.root_data.is_none() && !self.skip_data_check {
            return Err(Error::MissingRootData);
        }

        Ok(Options {
            inner: Arc::new(OptionsInner {
                path,
                root_data: self.root_data,
                boxing: Arc::new(Boxing { unbox, rebox }),
                accessor,
                hooks: Arc::new(Hooks {
                    on_update_internal: self.on_update_internal,
                    on_update: self.on_update,
                }),
            }),
        })
    }
}

impl<B> OptionsBuilder<B>
where
    B: Root + DeserializeOwned,
    KeyOf<B>: DeserializeOwned,
{
    /// Load the data fields of a configuration document.
    ///
    /// The document is a map with an optional `root.data` entry (deserialized
    /// into the root type) and an optional `path` entry (a key or an array of
    /// keys, also accepted under `keyPath`). Callables cannot be expressed in
    /// a document; attach them with the builder methods afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingOptions`] if `document` is `None`.
    /// - [`Error::InvalidConfigurationType`] if it is an array.
    /// - [`Error::InvalidOptionsType`] if it is any other non-map value.
    /// - [`Error::InvalidField`] if `root`, `root.data` or `path` has the
    ///   wrong shape.
    pub fn from_document(document: Option<&serde_json::Value>) -> Result<Self> {
        let document = document.ok_or(Error::MissingOptions)?;
        let map = match document {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Array(_) => {
                return Err(Error::InvalidConfigurationType { found: "array" })
            }
            other => {
                return Err(Error::InvalidOptionsType {
                    found: json_kind(other),
                })
            }
        };

        for key in CALLABLE_KEYS {
            if map.contains_key(key) {
                debug!(key, "ignoring callable option in configuration document");
            }
        }

        let mut builder = OptionsBuilder::new();

        if let Some(root) = map.get("root") {
            let root = root.as_object().ok_or_else(|| Error::InvalidField {
                field: "root",
                message: format!("expected a map, found {}", json_kind(root)),
            })?;
            for key in ["box", "unbox"] {
                if root.contains_key(key) {
                    debug!(key, "ignoring callable root option in configuration document");
                }
            }
            if let Some(data) = root.get("data") {
                let data = B::deserialize(data).map_err(|e| Error::InvalidField {
                    field: "root.data",
                    message: e.to_string(),
                })?;
                builder = builder.root_data(data);
            }
        }

        let path = match (map.get("path"), map.get("keyPath")) {
            (Some(path), Some(_)) => {
                debug!("ignoring keyPath in configuration document, path takes precedence");
                Some(path)
            }
            (path, alias) => path.or(alias),
        };
        if let Some(path) = path {
            let path = match path {
                serde_json::Value::Array(_) => KeyPath::<KeyOf<B>>::deserialize(path),
                key => <KeyOf<B>>::deserialize(key).map(|key| KeyPath::from(vec![key])),
            }
            .map_err(|e| Error::InvalidField {
                field: "path",
                message: e.to_string(),
            })?;
            builder = builder.path(path);
        }

        Ok(builder)
    }
}

impl<B: Root> Default for OptionsBuilder<B> {
    fn default() -> Self {
        OptionsBuilder::new()
    }
}

impl<B: Root> From<Options<B>> for OptionsBuilder<B> {
    /// A builder holding every field of `options`, ready to be re-validated.
    fn from(options: Options<B>) -> Self {
        let inner = &options.inner;
        let boxing = &inner.boxing;
        OptionsBuilder {
            root_data: inner.root_data.clone(),
            unbox: Some(Arc::clone(&boxing.unbox)),
            rebox: Some(Arc::clone(&boxing.rebox)),
            path: Some(inner.path.clone()),
            accessor: Some(Arc::clone(&inner.accessor)),
            overrides: Accessors::new(),
            on_update: inner.hooks.on_update.clone(),
            on_update_internal: inner.hooks.on_update_internal.clone(),
            skip_data_check: false,
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "map",
    }
}

/// Shared-unboxing helper for cursor operations.
///
/// Returns the boxed root together with its unboxed tree, or `None` when the
/// options were built without root data.
pub(crate) fn unbox_root<B: Root>(options: &Options<B>) -> Option<(&B, NodeOf<B>)> {
    let root = options.root_data()?;
    Some((root, options.unbox(root)))
}
