//! Keys addressing children of a [`Value`](crate::Value).

use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use arbor_cursor::{IntoKeyPath, KeyPath};
use serde::{Deserialize, Serialize};

/// A map entry name or an array position.
///
/// Lookups are lenient across the two: an index addresses the map entry
/// named by its decimal form, and a name made of digits addresses an array
/// position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    /// The key as a map entry name.
    pub fn as_name(&self) -> Cow<'_, str> {
        match self {
            Key::Name(name) => Cow::Borrowed(name),
            Key::Index(index) => Cow::Owned(index.to_string()),
        }
    }

    /// The key as an array position, if it is one or parses as one.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(index) => Some(*index),
            Key::Name(name) => name.parse().ok(),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// All-digit components become indices; anything else is a name.
impl FromStr for Key {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = s.parse() {
                return Ok(Key::Index(index));
            }
        }
        Ok(Key::Name(s.to_string()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(index) => write!(f, "{}", index),
        }
    }
}

impl IntoKeyPath<Key> for Key {
    fn into_key_path(self) -> KeyPath<Key> {
        KeyPath::from(vec![self])
    }
}

impl IntoKeyPath<Key> for &str {
    fn into_key_path(self) -> KeyPath<Key> {
        Key::from(self).into_key_path()
    }
}

impl IntoKeyPath<Key> for String {
    fn into_key_path(self) -> KeyPath<Key> {
        Key::from(self).into_key_path()
    }
}

impl IntoKeyPath<Key> for usize {
    fn into_key_path(self) -> KeyPath<Key> {
        Key::from(self).into_key_path()
    }
}

/// Build a `KeyPath<Key>` from names and indices.
///
/// ```
/// use arbor_value::{path, Key};
///
/// let p = path!["items", 0, "name"];
/// assert_eq!(p.as_slice(), &[Key::from("items"), Key::Index(0), Key::from("name")]);
/// assert!(path![].is_empty());
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::KeyPath::<$crate::Key>::new()
    };
    ($($key:expr),+ $(,)?) => {
        $crate::KeyPath::<$crate::Key>::from(vec![$($crate::Key::from($key)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_digits_as_index() {
        assert_eq!("12".parse::<Key>().unwrap(), Key::Index(12));
        assert_eq!("x1".parse::<Key>().unwrap(), Key::from("x1"));
        assert_eq!("".parse::<Key>().unwrap(), Key::from(""));
        assert_eq!("-1".parse::<Key>().unwrap(), Key::from("-1"));
    }

    #[test]
    fn lenient_conversions() {
        assert_eq!(Key::Index(3).as_name(), "3");
        assert_eq!(Key::from("4").as_index(), Some(4));
        assert_eq!(Key::from("four").as_index(), None);
    }

    #[test]
    fn key_path_parse() {
        let path = KeyPath::<Key>::parse("items/0/name").unwrap();
        assert_eq!(path, path!["items", 0, "name"]);
        assert_eq!(path.to_string(), "items/0/name");
    }

    #[test]
    fn single_keys_become_paths() {
        assert_eq!("a".into_key_path(), path!["a"]);
        assert_eq!(String::from("a").into_key_path(), path!["a"]);
        assert_eq!(2usize.into_key_path(), path![2]);
        assert_eq!(Key::from("b").into_key_path(), path!["b"]);
    }

    #[test]
    fn serde_is_untagged() {
        let json = serde_json::to_value(path!["a", 1]).unwrap();
        assert_eq!(json, serde_json::json!(["a", 1]));
        let back: Key = serde_json::from_value(serde_json::json!(7)).unwrap();
        assert_eq!(back, Key::Index(7));
    }
}
