#![expect(missing_docs)]

use bstr::ByteSlice;
use rstest::rstest;
use serde_json::Value;
use spanjson::{Arena, ArenaOptions, Kind, NodeId, SerializeError, TreeError};

const MANIFEST: &str = r#"
{
    "name": "spanjson",
    "version": "0.1.0",
    "authors": ["Ada", "Grace \"Amazing\" Hopper"],
    "downloads": 104233,
    "rating": -0.25,
    "yanked": false,
    "license": null,
    "dependencies": {
        "bstr": {"version": "1.12", "optional": false},
        "log": {"version": "0.4", "features": []}
    },
    "notes": "tabs\tand\nnewlines \u00e9 \uD83D\uDE00"
}
"#;

/// Walks our tree and the `serde_json` value side by side.
fn assert_same(node: NodeId, arena: &mut Arena<'_>, expected: &Value) {
    match expected {
        Value::Null => assert_eq!(node.kind(arena), Some(Kind::Null)),
        Value::Bool(true) => assert_eq!(node.kind(arena), Some(Kind::True)),
        Value::Bool(false) => assert_eq!(node.kind(arena), Some(Kind::False)),
        Value::Number(number) => {
            let ours: f64 = node.get_float(arena).unwrap();
            assert_eq!(Some(ours), number.as_f64());
        }
        Value::String(text) => {
            assert_eq!(node.get_string(arena).unwrap(), text.as_str());
        }
        Value::Array(items) => {
            assert_eq!(node.kind(arena), Some(Kind::Array));
            let children = node.children_as_vec(arena);
            assert_eq!(children.len(), items.len());
            for (child, item) in children.into_iter().zip(items) {
                assert_same(child, arena, item);
            }
        }
        Value::Object(members) => {
            assert_eq!(node.kind(arena), Some(Kind::Object));
            let keys = node.children_as_vec(arena);
            assert_eq!(keys.len(), members.len());
            for (key, (name, value)) in keys.into_iter().zip(members) {
                assert_eq!(key.get_string(arena).unwrap(), name.as_str());
                assert_same(key.first_child(arena).unwrap(), arena, value);
            }
        }
    }
}

#[test]
fn manifest_matches_serde_json() {
    let expected: Value = serde_json::from_str(MANIFEST).unwrap();
    let mut arena = Arena::new();
    let root = arena.parse(MANIFEST).unwrap();
    assert_same(root, &mut arena, &expected);

    let pretty = root.to_json_string(&arena).unwrap();
    let reread: Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(reread, expected);
}

#[test]
fn manifest_queries() {
    let mut arena = Arena::new();
    let root = arena.parse(MANIFEST).unwrap();

    let downloads = root.find_child_element("downloads", &arena).unwrap();
    assert_eq!(downloads.get_integer::<u64>(&arena), Ok(104_233));
    assert_eq!(
        downloads.get_integer::<u8>(&arena),
        Err(TreeError::InvalidNumber)
    );

    let deps = root.find_child_element("dependencies", &arena).unwrap();
    let map = deps.object_as_map(&arena).unwrap();
    let names: Vec<&str> = map.keys().map(|name| name.to_str().unwrap()).collect();
    assert_eq!(names, ["bstr", "log"]);

    let mut members = Vec::new();
    root.iterate_object(&arena, |name, value| {
        members.push((name.to_string(), value.kind(&arena)));
    })
    .unwrap();
    assert_eq!(members.len(), 9);
    assert_eq!(members[7], ("dependencies".to_string(), Some(Kind::Object)));

    let authors = root.find_child_element("authors", &arena).unwrap();
    let second = authors.array_index(1, &arena).unwrap();
    assert_eq!(
        second.get_escaped_string(&mut arena).unwrap(),
        r#"Grace \"Amazing\" Hopper"#
    );
    assert_eq!(
        second.get_string(&mut arena).unwrap(),
        r#"Grace "Amazing" Hopper"#
    );
    assert!(authors.array_index(2, &arena).is_none());
}

#[rstest]
#[case::tiny_blocks(ArenaOptions { initial_node_block: 1, max_node_block: 2, min_string_block: 1, string_search_depth: 1 })]
#[case::defaults(ArenaOptions::default())]
#[case::wide_search(ArenaOptions { string_search_depth: 16, ..ArenaOptions::default() })]
fn pool_sizing_does_not_change_results(#[case] options: ArenaOptions) {
    let expected: Value = serde_json::from_str(MANIFEST).unwrap();
    let mut arena = Arena::with_options(options);
    let root = arena.parse(MANIFEST).unwrap();
    assert_same(root, &mut arena, &expected);
}

#[test]
fn reset_invalidates_handles() {
    let mut arena = Arena::new();
    let root = arena.parse(MANIFEST).unwrap();
    let name = root.find_child_element("name", &arena).unwrap();
    arena.reset();

    assert_eq!(root.kind(&arena), None);
    assert_eq!(root.child_count(&arena), 0);
    assert!(root.find_child_element("name", &arena).is_none());
    assert_eq!(name.get_string(&mut arena), Err(TreeError::StaleHandle));
    assert_eq!(
        root.to_json_string(&arena),
        Err(SerializeError::StaleHandle)
    );
    assert_eq!(arena.stats().nodes, 0);

    let fresh = arena.parse("[]").unwrap();
    assert_ne!(fresh, root);
    assert_eq!(fresh.kind(&arena), Some(Kind::Array));
}

#[test]
fn parse_error_reports_line_and_column() {
    let input = "{\n  \"a\": tru\n}";
    let mut arena = Arena::new();
    let err = arena.parse(input).unwrap_err();

    assert_eq!((err.line, err.column), (2, 8));
    assert_eq!(err.to_string(), "Invalid token at 2:8");
}

#[test]
fn error_nodes_refuse_to_serialize() {
    let mut arena = Arena::new();
    let root = arena.create_node().unwrap();
    root.parse_body("[1, }", &mut arena).unwrap_err();

    assert_eq!(
        root.to_json_string(&arena),
        Err(SerializeError::UnexpectedKind(Kind::Error))
    );
}

#[test]
fn failed_member_reparse_keeps_document_serializable() {
    let mut arena = Arena::new();
    let root = arena.parse(r#"{"a": [1], "b": true}"#).unwrap();
    let before = root.to_json_string(&arena).unwrap();

    let list = root.find_child_element("a", &arena).unwrap();
    let err = list.parse_body("[2, ", &mut arena).unwrap_err();
    assert_eq!(err.to_string(), "End of document reached before end of array at 1:5");

    assert_eq!(root.to_json_string(&arena).unwrap(), before);
}

#[test]
fn moving_a_member_requires_detaching_it_first() {
    let mut arena = Arena::new();
    let root = arena.parse(r#"{"from": {"x": 1}, "to": []}"#).unwrap();
    let member = root.find_child_element("from", &arena).unwrap();
    let target = root.find_child_element("to", &arena).unwrap();

    assert_eq!(
        target.array_push(member, &mut arena),
        Err(TreeError::AlreadyAttached)
    );

    let placeholder = arena.create_node().unwrap();
    placeholder.set_null(&mut arena).unwrap();
    root.object_assign("from", placeholder, &mut arena).unwrap();
    target.array_push(member, &mut arena).unwrap();

    let moved: Value = serde_json::from_str(&root.to_json_string(&arena).unwrap()).unwrap();
    assert_eq!(moved, serde_json::json!({"from": null, "to": [{"x": 1}]}));
}
