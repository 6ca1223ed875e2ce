#![no_main]
use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use spanjson::{Arena, ArenaOptions, ParserOptions};

const HEADER: usize = 1; // flags

fn parser(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let input = &data[HEADER..];

    // Small blocks exercise the pool growth paths.
    let options = if flags & 1 != 0 {
        ArenaOptions {
            initial_node_block: 1,
            max_node_block: 4,
            min_string_block: 1,
            string_search_depth: 1,
        }
    } else {
        ArenaOptions::default()
    };
    let parser_options = ParserOptions {
        max_depth: usize::from(flags >> 1),
    };

    let mut arena = Arena::with_options(options);
    let root = arena.create_node().expect("root node");
    let parsed = root.parse_body_with(input, &mut arena, &parser_options);
    root.validate_tree(&arena).expect("tree invariants");

    if parsed.is_err() {
        assert!(root.error_message(&arena).is_some());
        return;
    }

    let pretty = root.to_json_string(&arena).expect("serializable tree");

    let mut second = Arena::new();
    let reparsed = second.parse(pretty.as_str()).expect("output reparses");
    reparsed.validate_tree(&second).expect("tree invariants");
    assert_eq!(reparsed.to_json_string(&second).as_deref(), Ok(pretty.as_str()));

    // Where serde_json also accepts the input, both must agree on the value.
    let Ok(rest) = parsed else { return };
    let consumed = &input[..input.len() - rest.len()];
    if let Ok(expected) = serde_json::from_slice::<Value>(consumed) {
        let ours: Value = serde_json::from_str(&pretty).expect("output is JSON");
        assert_eq!(ours, expected);
    }
}

fuzz_target!(|data: &[u8]| parser(data));
