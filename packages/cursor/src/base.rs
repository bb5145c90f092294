//! The plain cursor type.

use std::fmt;

use crate::cursor::{Cursor, CursorCore};
use crate::error::Result;
use crate::options::{Options, OptionsBuilder};
use crate::tree::{NodeOf, Root};

/// A cursor with no behavior beyond the [`Cursor`] protocol.
pub struct BaseCursor<B: Root> {
    core: CursorCore<B>,
}

impl<B: Root> BaseCursor<B> {
    /// Build options and wrap them in a cursor.
    ///
    /// # Errors
    ///
    /// Any error from [`OptionsBuilder::build`].
    pub fn new(builder: OptionsBuilder<B>) -> Result<Self> {
        Ok(BaseCursor::from_options(builder.build()?))
    }

    /// Wrap already-built options.
    pub fn from_options(options: Options<B>) -> Self {
        BaseCursor {
            core: CursorCore::new(options),
        }
    }
}

impl<B: Root> Cursor for BaseCursor<B> {
    type Root = B;

    fn core(&self) -> &CursorCore<B> {
        &self.core
    }

    fn create_from(&self, options: Options<B>) -> Self {
        BaseCursor::from_options(options)
    }
}

impl<B: Root> Clone for BaseCursor<B> {
    fn clone(&self) -> Self {
        BaseCursor {
            core: self.core.clone(),
        }
    }
}

impl<B: Root + fmt::Debug> fmt::Debug for BaseCursor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseCursor")
            .field("path", self.path())
            .field("root_data", &self.options().root_data())
            .finish()
    }
}

/// Renders the value at the cursor's path; nothing if it is absent.
impl<B> fmt::Display for BaseCursor<B>
where
    B: Root,
    NodeOf<B>: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.deref() {
            Some(value) => write!(f, "{}", value),
            None => Ok(()),
        }
    }
}
