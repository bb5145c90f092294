//! A persistent Value tree for arbor cursors
//!
//! - `Key`: a map entry name or an array position
//! - `Value`: JSON-shaped tree over `imbl` collections, implementing
//!   [`Tree`] so cursors can address it
//! - `path!`: builds key paths from names and indices
//!
//! # Example
//!
//! ```rust
//! use arbor_value::{BaseCursor, Cursor, Options, Value};
//!
//! let root = Value::from(serde_json::json!({ "x": { "y": { "z": "foo" } } }));
//! let cursor = BaseCursor::new(Options::builder().root_data(root))?.cursor(["x", "y"]);
//!
//! let updated = cursor.try_update(|current, _, _| {
//!     current
//!         .unwrap_or_default()
//!         .set("z", "bar")
//!         .map_err(arbor_value::Error::accessor)
//! })?;
//!
//! assert_eq!(updated.root().to_string(), r#"{"x":{"y":{"z":"bar"}}}"#);
//! assert_eq!(cursor.to_string(), r#"{"z":"foo"}"#);
//! # Ok::<(), arbor_value::Error>(())
//! ```

mod convert;
mod error;
mod key;
mod value;

pub use convert::{from_value, to_value};
pub use error::ValueError;
pub use key::Key;
pub use value::Value;

// Re-export the cursor layer for convenience
pub use arbor_cursor::{
    Accessor, Accessors, BaseCursor, Cursor, CursorCore, Error, IntoKeyPath, KeyOf, KeyPath,
    Native, NodeOf, Options, OptionsBuilder, Result, Root, Same, Tree,
};

/// A plain cursor over a bare [`Value`] root.
pub type ValueCursor = BaseCursor<Value>;
