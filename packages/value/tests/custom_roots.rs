//! Boxed roots, custom accessors, specialised cursor types and documents.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};

use arbor_value::{
    path, Accessor, BaseCursor, Cursor, CursorCore, Error, Key, NodeOf, Options, OptionsBuilder,
    Root, Same, Tree, Value,
};
use serde_json::json;

/// A root that counts its commits.
#[derive(Clone, Debug)]
struct Versioned {
    version: u64,
    data: Value,
}

impl Versioned {
    fn new(data: serde_json::Value) -> Self {
        Versioned {
            version: 0,
            data: Value::from(data),
        }
    }
}

impl Root for Versioned {
    type Unboxed = Value;

    fn unbox(&self) -> Value {
        self.data.clone()
    }

    fn rebox(unboxed: Value, previous: &Self) -> Self {
        Versioned {
            version: previous.version + 1,
            data: unboxed,
        }
    }
}

/// A cursor that records every commit made through it or its descendants.
#[derive(Clone)]
struct Audited {
    core: CursorCore<Versioned>,
    log: Arc<Mutex<Vec<String>>>,
}

impl Audited {
    fn new(root: Versioned) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let options = Options::builder()
            .root_data(root)
            .on_update_internal(move |_, path, new_root, _| {
                sink.lock().unwrap().push(format!("{} -> {}", path, new_root));
                Ok(())
            })
            .build()
            .unwrap();
        Audited {
            core: CursorCore::new(options),
            log,
        }
    }

    fn version(&self) -> Option<u64> {
        self.options().root_data().map(|root| root.version)
    }

    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl Cursor for Audited {
    type Root = Versioned;

    fn core(&self) -> &CursorCore<Versioned> {
        &self.core
    }

    fn create_from(&self, options: Options<Versioned>) -> Self {
        Audited {
            core: CursorCore::new(options),
            log: Arc::clone(&self.log),
        }
    }
}

#[test]
fn boxed_root_is_unboxed_for_reads_and_reboxed_on_commit() {
    let cursor = Audited::new(Versioned::new(json!({ "todos": [] })));
    assert_eq!(cursor.version(), Some(0));

    let todos = cursor.cursor("todos");
    let first = todos
        .try_update(|v, _, _| v.unwrap_or_default().set(0usize, "write tests").map_err(Error::accessor))
        .unwrap();
    assert_eq!(first.version(), Some(1));
    assert_eq!(first.cursor(0usize).deref(), Some(Value::from("write tests")));

    let second = first.cursor(0usize).update(|_, _, _| Value::from("ship")).unwrap();
    assert_eq!(second.version(), Some(2));
    assert_eq!(todos.version(), Some(0));
}

#[test]
fn updater_receives_boxed_root() {
    let cursor = Audited::new(Versioned {
        version: 41,
        data: Value::from(json!({ "n": 1 })),
    });
    let next = cursor
        .cursor("n")
        .update(|_, _, boxed| Value::from(boxed.version as i64))
        .unwrap();
    assert_eq!(next.deref(), Some(Value::from(41)));
    assert_eq!(next.version(), Some(42));
}

#[test]
fn specialised_cursor_is_closed_under_every_operation() {
    let cursor = Audited::new(Versioned::new(json!({ "a": { "b": 1 }, "c": 2 })));

    let navigated: Audited = cursor.cursor(["a", "b"]);
    let updated: Audited = navigated.update(|_, _, _| Value::from(10)).unwrap();
    let deleted: Audited = updated.root().cursor("c").delete().unwrap();
    let rooted: Audited = deleted.root();
    let rebuilt: Audited = rooted
        .with_options(rooted.options().with_path(path!["a"]))
        .unwrap();

    let mut children = Vec::new();
    rebuilt.for_each(|child: Audited, _| {
        children.push(child.version());
        ControlFlow::Continue(())
    });
    let versions = rebuilt.reduce(Vec::new(), |mut acc, child: Audited, _| {
        acc.push(child.version());
        acc
    });

    assert_eq!(rebuilt.deref().map(serde_json::Value::from), Some(json!({ "b": 10 })));
    assert_eq!(rebuilt.version(), Some(2));
    assert_eq!(children, vec![Some(2)]);
    assert_eq!(versions, Some(vec![Some(2)]));
    assert_eq!(
        rebuilt.entries(),
        vec![
            r#"a/b -> {"a":{"b":10},"c":2}"#.to_string(),
            r#"c -> {"a":{"b":10}}"#.to_string(),
        ]
    );
}

#[test]
fn with_options_requires_root_data() {
    let cursor = Audited::new(Versioned::new(json!({})));
    let detached = Options::<Versioned>::builder().skip_data_check().build().unwrap();
    assert!(matches!(cursor.with_options(detached), Err(Error::MissingRootData)));
}

#[test]
fn builder_box_and_unbox_closures() {
    let stored = Value::from(json!({ "meta": { "rev": 0 }, "state": { "count": 1 } }));
    let cursor = BaseCursor::new(
        Options::builder()
            .root_data(stored)
            .unbox(|stored: &Value| stored.get("state").cloned().unwrap_or_default())
            .rebox(|state: Value, previous: &Value| {
                let rev = previous
                    .get_in(&path!["meta", "rev"])
                    .and_then(|v| v.as_i64())
                    .unwrap_or_default();
                previous
                    .set("state", state)
                    .and_then(|v| v.set_in(&path!["meta", "rev"], Value::from(rev + 1)))
                    .unwrap_or_else(|_| previous.clone())
            }),
    )
    .unwrap();

    assert_eq!(cursor.cursor("count").deref(), Some(Value::from(1)));
    let next = cursor.cursor("count").update(|_, _, _| Value::from(2)).unwrap();
    assert_eq!(
        next.options().root_data().cloned().map(serde_json::Value::from),
        Some(json!({ "meta": { "rev": 1 }, "state": { "count": 2 } }))
    );
}

/// Rejects every write.
struct ReadOnly;

impl Accessor<Value> for ReadOnly {
    fn set_in(&self, _root: &Value, path: &[Key], _value: Value) -> arbor_value::Result<Value> {
        Err(Error::accessor(format!("read only: {:?}", path)))
    }

    fn delete_in(&self, _root: &Value, path: &[Key]) -> arbor_value::Result<Value> {
        Err(Error::accessor(format!("read only: {:?}", path)))
    }
}

#[test]
fn custom_accessor_replaces_native_writes() {
    let cursor = BaseCursor::new(
        Options::builder()
            .root_data(Value::from(json!({ "a": 1 })))
            .accessor(ReadOnly),
    )
    .unwrap();

    assert_eq!(cursor.cursor("a").deref(), Some(Value::from(1)));
    assert!(matches!(
        cursor.cursor("a").update(|_, _, _| Value::from(2)),
        Err(Error::Accessor(_))
    ));
    assert!(matches!(cursor.cursor("a").delete(), Err(Error::Accessor(_))));
}

#[test]
fn per_operation_overrides_layer_over_base_accessor() {
    // names are looked up case-insensitively; writes still fail
    let cursor = BaseCursor::new(
        Options::builder()
            .root_data(Value::from(json!({ "name": "arbor" })))
            .accessor(ReadOnly)
            .get_in(|root: &Value, path: &[Key]| {
                let lowered: Vec<Key> = path
                    .iter()
                    .map(|key| Key::from(key.as_name().to_lowercase()))
                    .collect();
                root.get_in(&lowered)
            }),
    )
    .unwrap();

    assert_eq!(cursor.cursor("NAME").deref(), Some(Value::from("arbor")));
    assert!(cursor.cursor("NAME").update(|_, _, _| Value::Null).is_err());
}

#[test]
fn custom_delete_in_controls_no_op_detection() {
    // deleting replaces with null instead of removing the entry
    let cursor = BaseCursor::new(
        Options::builder()
            .root_data(Value::from(json!({ "a": 1, "b": null })))
            .delete_in(|root: &Value, path: &[Key]| {
                root.set_in(path, Value::Null).map_err(Error::accessor)
            }),
    )
    .unwrap();

    let cleared = cursor.cursor("a").delete().unwrap();
    assert_eq!(cleared.deref(), Some(Value::Null));

    let untouched = cursor.cursor("b");
    assert!(untouched.delete().unwrap().same_as(&untouched));
}

#[test]
fn traversal_overrides_are_used_by_cursors() {
    let cursor = BaseCursor::new(
        Options::builder()
            .root_data(Value::from(json!({ "a": 1, "b": 2, "c": 3 })))
            .for_each(|node: &Value, f: &mut dyn FnMut(Value, Key) -> ControlFlow<()>| {
                // skip odd values
                node.for_each(&mut |child, key| {
                    if child.as_i64().is_some_and(|n| n % 2 == 1) {
                        ControlFlow::Continue(())
                    } else {
                        f(child, key)
                    }
                })
            })
            .reduce(|node: &Value, f: &mut dyn FnMut(Value, Key)| {
                let children = node.fold(Vec::new(), |mut acc, child, key| {
                    acc.push((child, key));
                    acc
                });
                for (child, key) in children.into_iter().rev() {
                    f(child, key);
                }
            }),
    )
    .unwrap();

    let mut even = Vec::new();
    cursor.for_each(|child, _| {
        even.push(child.deref());
        ControlFlow::Continue(())
    });
    assert_eq!(even, vec![Some(Value::from(2))]);

    let order = cursor.reduce(String::new(), |acc, _, key| acc + &key.to_string());
    assert_eq!(order.as_deref(), Some("cba"));
}

#[test]
fn document_configures_data_and_path() {
    let document = json!({
        "root": { "data": { "x": [ { "y": "first" } ] } },
        "path": ["x", 0, "y"],
        "getIn": "not callable here"
    });
    let cursor = BaseCursor::new(OptionsBuilder::<Value>::from_document(Some(&document)).unwrap()).unwrap();

    assert_eq!(cursor.path(), &path!["x", 0, "y"]);
    assert_eq!(cursor.deref(), Some(Value::from("first")));

    let bare = json!({ "root": { "data": { "x": 1 } }, "path": "x" });
    let cursor = BaseCursor::new(OptionsBuilder::<Value>::from_document(Some(&bare)).unwrap()).unwrap();
    assert_eq!(cursor.deref(), Some(Value::from(1)));
}

#[test]
fn document_errors_by_kind() {
    assert!(matches!(
        OptionsBuilder::<Value>::from_document(None),
        Err(Error::MissingOptions)
    ));
    assert!(matches!(
        OptionsBuilder::<Value>::from_document(Some(&json!([]))),
        Err(Error::InvalidConfigurationType { .. })
    ));
    assert!(matches!(
        OptionsBuilder::<Value>::from_document(Some(&json!(42))),
        Err(Error::InvalidOptionsType { found: "number" })
    ));
    assert!(matches!(
        OptionsBuilder::<Value>::from_document(Some(&json!({ "path": { "x": 1 } }))),
        Err(Error::InvalidField { field: "path", .. })
    ));

    let empty = OptionsBuilder::<Value>::from_document(Some(&json!({}))).unwrap();
    let err = BaseCursor::new(empty).unwrap_err();
    assert!(err.is_construction());
    assert_eq!(err.to_string(), "value at path ['root', 'data'] is required");
}

#[test]
fn deferred_root_data() {
    let options = Options::<Value>::builder()
        .skip_data_check()
        .path(path!["a"])
        .build()
        .unwrap();
    let detached = BaseCursor::from_options(options.clone());
    assert_eq!(detached.deref(), None);
    assert!(matches!(
        detached.update(|_, _, _| Value::Null),
        Err(Error::MissingRootData)
    ));

    let attached = BaseCursor::from_options(options.with_root_data(Value::from(json!({ "a": true }))));
    assert_eq!(attached.deref(), Some(Value::Bool(true)));
    assert!(attached.options().shares_config(&options));
}

#[test]
fn unbox_is_applied_per_read() {
    fn state_of(root: &Versioned) -> NodeOf<Versioned> {
        root.unbox()
    }
    let root = Versioned::new(json!({ "k": "v" }));
    let cursor = BaseCursor::new(Options::builder().root_data(root.clone())).unwrap();
    assert!(cursor.deref().unwrap().same(&state_of(&root)));
}
