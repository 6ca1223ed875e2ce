
use alloc::{string::String, vec::Vec};

use bstr::ByteSlice;

use crate::{Arena, Kind, NodeId};

/// Renders a parsed tree as compact JSON built from the decoded text of every
/// string, so trees can be compared with plain strings.
pub(crate) fn shape(node: NodeId, arena: &mut Arena<'_>) -> String {
    let mut out = String::new();
    write_shape(node, arena, &mut out);
    out
}

fn write_shape(node: NodeId, arena: &mut Arena<'_>, out: &mut String) {
    match node.kind(arena).unwrap() {
        Kind::Null => out.push_str("null"),
        Kind::True => out.push_str("true"),
        Kind::False => out.push_str("false"),
        Kind::Number => out.push_str(node.raw(arena).unwrap().to_str().unwrap()),
        Kind::String => {
            let text = node.get_string(arena).unwrap().to_str().unwrap();
            out.push_str(&serde_json::to_string(text).unwrap());
        }
        Kind::Array => {
            out.push('[');
            for (index, child) in node.children_as_vec(arena).into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_shape(child, arena, out);
            }
            out.push(']');
        }
        Kind::Object => {
            out.push('{');
            let keys: Vec<NodeId> = node.children_as_vec(arena);
            for (index, key) in keys.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                let name = key.get_string(arena).unwrap().to_str().unwrap();
                out.push_str(&serde_json::to_string(name).unwrap());
                out.push(':');
                write_shape(key.first_child(arena).unwrap(), arena, out);
            }
            out.push('}');
        }
        kind @ (Kind::Key | Kind::Error) => panic!("{kind} node inside a value tree"),
    }
}

/// Number of cases each property runs.
pub(crate) fn quickcheck_tests() -> u64 {
    if cfg!(any(miri, feature = "test-fast")) {
        10
    } else if is_ci::cached() {
        10_000
    } else {
        1_000
    }
}
