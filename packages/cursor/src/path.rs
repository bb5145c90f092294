//! Key paths: ordered sequences of keys locating a position in a tree.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

/// An immutable, cheaply clonable sequence of keys.
///
/// Cloning a `KeyPath` shares its storage. Composition with [`KeyPath::join`]
/// allocates a new sequence and leaves both operands untouched.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath<K> {
    keys: Arc<[K]>,
}

// Not derived: sharing the `Arc` needs no `K: Clone`.
impl<K> Clone for KeyPath<K> {
    fn clone(&self) -> Self {
        KeyPath {
            keys: Arc::clone(&self.keys),
        }
    }
}

impl<K> KeyPath<K> {
    /// The empty path (the root).
    pub fn new() -> Self {
        KeyPath {
            keys: Arc::from(Vec::new()),
        }
    }

    /// Check if this path is empty (root path).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Get the number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Iterate over keys.
    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.keys.iter()
    }

    /// The keys as a slice.
    pub fn as_slice(&self) -> &[K] {
        &self.keys
    }

    /// The last key, if any.
    pub fn last(&self) -> Option<&K> {
        self.keys.last()
    }

    /// Check whether both handles share the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.keys, &other.keys)
    }
}

impl<K: Clone> KeyPath<K> {
    /// Compose this path with a relative sub-path.
    ///
    /// Joining with an empty path on either side returns a handle that shares
    /// the other operand's storage.
    #[must_use]
    pub fn join(&self, other: &KeyPath<K>) -> KeyPath<K> {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut keys = Vec::with_capacity(self.len() + other.len());
        keys.extend(self.keys.iter().cloned());
        keys.extend(other.keys.iter().cloned());
        KeyPath::from(keys)
    }

    /// Append a single key.
    #[must_use]
    pub fn child(&self, key: K) -> KeyPath<K> {
        let mut keys = Vec::with_capacity(self.len() + 1);
        keys.extend(self.keys.iter().cloned());
        keys.push(key);
        KeyPath::from(keys)
    }

    /// The path without its last key, or `None` for the root.
    pub fn parent(&self) -> Option<KeyPath<K>> {
        let (_, init) = self.keys.split_last()?;
        Some(KeyPath::from(init.to_vec()))
    }

    /// Check if this path has the given prefix.
    pub fn has_prefix(&self, prefix: &KeyPath<K>) -> bool
    where
        K: PartialEq,
    {
        self.keys.starts_with(&prefix.keys)
    }
}

impl<K: FromStr> KeyPath<K> {
    /// Parse a `/`-separated path string.
    ///
    /// Empty components are ignored, so `//` and leading or trailing slashes
    /// normalize away.
    ///
    /// # Errors
    ///
    /// Returns the key type's parse error for the first component that does
    /// not parse.
    pub fn parse(s: &str) -> Result<Self, K::Err> {
        s.split('/')
            .filter(|c| !c.is_empty())
            .map(K::from_str)
            .collect::<Result<Vec<K>, _>>()
            .map(KeyPath::from)
    }
}

impl<K> Default for KeyPath<K> {
    fn default() -> Self {
        KeyPath::new()
    }
}

impl<K> Deref for KeyPath<K> {
    type Target = [K];

    fn deref(&self) -> &[K] {
        &self.keys
    }
}

impl<K> From<Vec<K>> for KeyPath<K> {
    fn from(keys: Vec<K>) -> Self {
        KeyPath {
            keys: Arc::from(keys),
        }
    }
}

impl<K> FromIterator<K> for KeyPath<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        KeyPath::from(iter.into_iter().collect::<Vec<K>>())
    }
}

impl<'a, K> IntoIterator for &'a KeyPath<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl<K: fmt::Debug> fmt::Debug for KeyPath<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys.iter()).finish()
    }
}

impl<K: fmt::Display> fmt::Display for KeyPath<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

impl<K: serde::Serialize> serde::Serialize for KeyPath<K> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.keys.iter())
    }
}

impl<'de, K: serde::Deserialize<'de>> serde::Deserialize<'de> for KeyPath<K> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<K>::deserialize(deserializer).map(KeyPath::from)
    }
}

/// Normalization of "a key or a sequence of keys" into a [`KeyPath`].
///
/// Sequences pass through in order; `()` is the empty path. Key types provide
/// their own single-key impls (a bare key becomes a one-element path).
pub trait IntoKeyPath<K> {
    fn into_key_path(self) -> KeyPath<K>;
}

impl<K> IntoKeyPath<K> for () {
    fn into_key_path(self) -> KeyPath<K> {
        KeyPath::new()
    }
}

impl<K> IntoKeyPath<K> for KeyPath<K> {
    fn into_key_path(self) -> KeyPath<K> {
        self
    }
}

impl<K> IntoKeyPath<K> for &KeyPath<K> {
    fn into_key_path(self) -> KeyPath<K> {
        self.clone()
    }
}

impl<K, T: Into<K>> IntoKeyPath<K> for Vec<T> {
    fn into_key_path(self) -> KeyPath<K> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<K, T: Clone + Into<K>> IntoKeyPath<K> for &[T] {
    fn into_key_path(self) -> KeyPath<K> {
        self.iter().cloned().map(Into::into).collect()
    }
}

impl<K, T: Into<K>, const N: usize> IntoKeyPath<K> for [T; N] {
    fn into_key_path(self) -> KeyPath<K> {
        self.into_iter().map(Into::into).collect()
    }
}
