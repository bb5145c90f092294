//! A minimal persistent tree for unit tests: path copying over shared maps.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use serde::Deserialize;

use crate::tree::{Same, Tree};

#[derive(Clone, Debug, PartialEq)]
pub enum Doc {
    Leaf(i64),
    Node(Arc<BTreeMap<String, Doc>>),
}

impl Doc {
    pub fn leaf(value: i64) -> Doc {
        Doc::Leaf(value)
    }

    pub fn empty() -> Doc {
        Doc::Node(Arc::new(BTreeMap::new()))
    }

    pub fn node<const N: usize>(entries: [(&str, Doc); N]) -> Doc {
        Doc::Node(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        ))
    }
}

impl Same for Doc {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Doc::Leaf(a), Doc::Leaf(b)) => a == b,
            (Doc::Node(a), Doc::Node(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Doc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Doc::Leaf(v) => write!(f, "{}", v),
            Doc::Node(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[derive(Debug)]
pub struct DocError(pub String);

impl fmt::Display for DocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for DocError {}

impl Tree for Doc {
    type Key = String;
    type Error = DocError;

    fn get_in(&self, path: &[String]) -> Option<Doc> {
        let mut current = self;
        for key in path {
            current = match current {
                Doc::Node(map) => map.get(key)?,
                Doc::Leaf(_) => return None,
            };
        }
        Some(current.clone())
    }

    fn set_in(&self, path: &[String], value: Doc) -> Result<Doc, DocError> {
        let Some((key, rest)) = path.split_first() else {
            return Ok(value);
        };
        match self {
            Doc::Node(map) => {
                let child = map.get(key).cloned().unwrap_or_else(Doc::empty);
                let child = child.set_in(rest, value)?;
                let mut next = (**map).clone();
                next.insert(key.clone(), child);
                Ok(Doc::Node(Arc::new(next)))
            }
            Doc::Leaf(_) => Err(DocError(format!("cannot set '{}' on a leaf", key))),
        }
    }

    fn delete_in(&self, path: &[String]) -> Result<Doc, DocError> {
        let Some((key, rest)) = path.split_first() else {
            return Ok(Doc::empty());
        };
        let Doc::Node(map) = self else {
            return Ok(self.clone());
        };
        let Some(child) = map.get(key) else {
            return Ok(self.clone());
        };
        let mut next = (**map).clone();
        if rest.is_empty() {
            next.remove(key);
        } else {
            let updated = child.delete_in(rest)?;
            if updated.same(child) {
                return Ok(self.clone());
            }
            next.insert(key.clone(), updated);
        }
        Ok(Doc::Node(Arc::new(next)))
    }

    fn for_each(&self, f: &mut dyn FnMut(Doc, String) -> ControlFlow<()>) -> usize {
        let Doc::Node(map) = self else {
            return 0;
        };
        let mut visited = 0;
        for (k, v) in map.iter() {
            visited += 1;
            if f(v.clone(), k.clone()).is_break() {
                break;
            }
        }
        visited
    }

    fn fold<A, F>(&self, init: A, mut f: F) -> A
    where
        F: FnMut(A, Doc, String) -> A,
    {
        match self {
            Doc::Node(map) => map
                .iter()
                .fold(init, |acc, (k, v)| f(acc, v.clone(), k.clone())),
            Doc::Leaf(_) => init,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDoc {
    Leaf(i64),
    Node(BTreeMap<String, RawDoc>),
}

impl From<RawDoc> for Doc {
    fn from(raw: RawDoc) -> Doc {
        match raw {
            RawDoc::Leaf(v) => Doc::Leaf(v),
            RawDoc::Node(map) => Doc::Node(Arc::new(
                map.into_iter().map(|(k, v)| (k, Doc::from(v))).collect(),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Doc {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawDoc::deserialize(deserializer).map(Doc::from)
    }
}
