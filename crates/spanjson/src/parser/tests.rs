use alloc::{string::String, vec::Vec};

use super::*;
use crate::Kind;

fn parse<'src>(arena: &mut Arena<'src>, input: &'src str) -> Result<NodeId, ParseError> {
    let root = arena.create_node().unwrap();
    root.parse_body(input, arena)?;
    Ok(root)
}

fn raw(node: NodeId, arena: &Arena<'_>) -> String {
    String::from_utf8(node.raw(arena).unwrap().to_vec()).unwrap()
}

#[test]
fn member_with_negative_number() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, r#"{"a": -4 }"#).unwrap();

    assert_eq!(root.kind(&arena), Some(Kind::Object));
    assert_eq!(root.child_count(&arena), 1);

    let key = root.first_child(&arena).unwrap();
    assert_eq!(key.kind(&arena), Some(Kind::Key));
    assert_eq!(key.get_string(&mut arena).unwrap(), "a");

    let value = key.first_child(&arena).unwrap();
    assert_eq!(value.kind(&arena), Some(Kind::Number));
    assert_eq!(raw(value, &arena), "-4");
    assert_eq!(value.get_integer::<i32>(&arena), Ok(-4));
}

#[test]
fn array_of_six() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, "[1, 2, 3, 6, 7, 8]").unwrap();

    assert_eq!(root.child_count(&arena), 6);
    let third = root.array_index(2, &arena).unwrap();
    assert_eq!(raw(third, &arena), "3");
    assert_eq!(root.array_index(6, &arena), None);
    root.validate_tree(&arena).unwrap();
}

#[test]
fn strings_borrow_the_input() {
    let input = r#"["plain", "with \"escape\""]"#;
    let mut arena = Arena::new();
    let root = parse(&mut arena, input).unwrap();

    let plain = root.array_index(0, &arena).unwrap();
    assert_eq!(plain.get_string(&mut arena).unwrap(), "plain");

    let escaped = root.array_index(1, &arena).unwrap();
    assert_eq!(raw(escaped, &arena), r#"with \"escape\""#);
    assert_eq!(escaped.get_string(&mut arena).unwrap(), r#"with "escape""#);

    // Only the escaped string needed pool storage.
    assert_eq!(arena.stats().string_blocks, 1);
    assert_eq!(arena.stats().string_bytes_used, "with \"escape\"".len());
}

#[test]
fn even_backslashes_close_the_string() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, r#"["a\\", "b"]"#).unwrap();
    assert_eq!(root.child_count(&arena), 2);
    let first = root.array_index(0, &arena).unwrap();
    assert_eq!(first.get_string(&mut arena).unwrap(), "a\\");
}

#[test]
fn unterminated_string_fails() {
    let mut arena = Arena::new();
    assert!(parse(&mut arena, r#"{"a": "b" }"#).is_ok());

    let err = parse(&mut arena, r#"{"a": "b\" }"#).unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::UnterminatedString);
}

#[test]
fn missing_colon_is_structural() {
    let mut arena = Arena::new();
    let root = arena.create_node().unwrap();
    let err = root.parse_body(r#"{ "b" }"#, &mut arena).unwrap_err();

    assert_eq!(err.syntax_error(), SyntaxError::MissingColon);
    assert_eq!(err.offset, 6);
    assert_eq!(root.kind(&arena), Some(Kind::Error));
    assert_eq!(
        root.error_message(&arena).unwrap(),
        SyntaxError::MissingColon.message()
    );
}

#[test]
fn numbers() {
    let mut arena = Arena::new();
    for good in ["-4", "4.0", "0", "12.50", "-0.5"] {
        let node = parse(&mut arena, good).unwrap();
        assert_eq!(raw(node, &arena), good);
    }

    for bad in ["4.0.0", "4.", "-", "-.5", "1..2"] {
        let err = parse(&mut arena, bad).unwrap_err();
        assert_eq!(err.syntax_error(), SyntaxError::MalformedNumber, "{bad}");
    }

    let err = parse(&mut arena, "+4").unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::UnexpectedCharacter);
}

#[test]
fn numbers_stop_at_the_first_other_byte() {
    let mut arena = Arena::new();
    let root = arena.create_node().unwrap();
    let rest = root.parse_body("42abc", &mut arena).unwrap();
    assert_eq!(rest, b"abc");
    assert_eq!(raw(root, &arena), "42");
}

#[test]
fn literals() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, "[null, true, false]").unwrap();
    let kinds: Vec<_> = root
        .children(&arena)
        .map(|child| child.kind(&arena).unwrap())
        .collect();
    assert_eq!(kinds, [Kind::Null, Kind::True, Kind::False]);

    let err = parse(&mut arena, "[nul]").unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::InvalidToken);
    assert_eq!(err.offset, 1);
}

#[test]
fn empty_containers() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, " { } ").unwrap();
    assert_eq!(root.kind(&arena), Some(Kind::Object));
    assert_eq!(root.child_count(&arena), 0);

    let root = parse(&mut arena, "[\n]").unwrap();
    assert_eq!(root.kind(&arena), Some(Kind::Array));
    assert_eq!(root.first_child(&arena), None);
}

#[test]
fn trailing_commas_are_accepted() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, "[1, 2, ]").unwrap();
    assert_eq!(root.child_count(&arena), 2);

    let root = parse(&mut arena, r#"{"a": 1,}"#).unwrap();
    assert_eq!(root.child_count(&arena), 1);
}

#[test]
fn separators() {
    let mut arena = Arena::new();
    let err = parse(&mut arena, "[1 2]").unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::InvalidSeparator);
    assert_eq!(err.offset, 3);

    let err = parse(&mut arena, "[1, 2").unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::UnterminatedArray);

    let err = parse(&mut arena, r#"{"a": 1"#).unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::UnterminatedObject);

    let err = parse(&mut arena, "[").unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::UnterminatedArray);
}

#[test]
fn object_key_errors() {
    let mut arena = Arena::new();
    let err = parse(&mut arena, "{a: 1}").unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::KeyNotFound);

    let err = parse(&mut arena, r#"{"a"#).unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::UnterminatedKey);

    let err = parse(&mut arena, r#"{"a\q": 1}"#).unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::InvalidKeyEscape);
}

#[test]
fn keys_are_unescaped_eagerly() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, r#"{"tab\there": true}"#).unwrap();
    let value = root.find_child_element("tab\there", &arena).unwrap();
    assert_eq!(value.kind(&arena), Some(Kind::True));

    let key = root.find_key("tab\there", &arena).unwrap();
    assert_eq!(key.raw(&arena).unwrap(), r"tab\there");
}

#[test]
fn empty_input() {
    let mut arena = Arena::new();
    let err = parse(&mut arena, "  \n ").unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::UnexpectedEnd);
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 2);
}

#[test]
fn errors_propagate_to_every_enclosing_node() {
    let mut arena = Arena::new();
    let root = arena.create_node().unwrap();
    let err = root
        .parse_body(r#"{"outer": [1, {"inner": tru}]}"#, &mut arena)
        .unwrap_err();

    assert_eq!(err.syntax_error(), SyntaxError::InvalidToken);
    assert_eq!(root.error_message(&arena).unwrap(), "Invalid token");
}

#[test]
fn error_positions() {
    let mut arena = Arena::new();
    let err = parse(&mut arena, "[\n  1,\n  ?\n]").unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::UnexpectedCharacter);
    assert_eq!((err.line, err.column), (3, 3));
    assert_eq!(
        alloc::format!("{err}"),
        "Unexpected character at start of element at 3:3"
    );
}

#[test]
fn depth_limit() {
    let mut arena = Arena::new();
    let options = ParserOptions { max_depth: 3 };

    let root = arena.create_node().unwrap();
    assert!(root.parse_body_with("[[[1]]]", &mut arena, &options).is_ok());

    let err = root
        .parse_body_with("[[[[1]]]]", &mut arena, &options)
        .unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::DepthLimitExceeded);
    assert_eq!(err.offset, 3);
}

#[test]
fn deep_nesting_with_default_options_fails_cleanly() {
    let input = "[".repeat(5000);
    let mut arena = Arena::new();
    let err = parse(&mut arena, &input).unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::DepthLimitExceeded);
}

#[test]
fn rest_of_input_is_returned() {
    let mut arena = Arena::new();
    let root = arena.create_node().unwrap();
    let rest = root.parse_body(r#"{"a": [true]}, 12"#, &mut arena).unwrap();
    assert_eq!(rest, b", 12");
}

#[test]
fn reparsing_keeps_the_sibling_link() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, "[1, 2, 3]").unwrap();
    let middle = root.array_index(1, &arena).unwrap();

    middle.parse_body(r#""two""#, &mut arena).unwrap();

    assert_eq!(root.child_count(&arena), 3);
    assert_eq!(middle.kind(&arena), Some(Kind::String));
    assert_eq!(raw(root.array_index(2, &arena).unwrap(), &arena), "3");
}

#[test]
fn failed_reparse_of_a_member_keeps_its_value() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, r#"{"a": [1, 2], "b": 3}"#).unwrap();
    let list = root.find_child_element("a", &arena).unwrap();
    let first = list.array_index(0, &arena).unwrap();

    let err = list.parse_body("[1, }", &mut arena).unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::UnexpectedCharacter);

    assert_eq!(list.kind(&arena), Some(Kind::Array));
    assert_eq!(list.child_count(&arena), 2);
    assert_eq!(list.first_child(&arena), Some(first));
    root.validate_tree(&arena).unwrap();

    let value = root.find_child_element("b", &arena).unwrap();
    value.parse_body("tru", &mut arena).unwrap_err();
    assert_eq!(value.get_integer::<i32>(&arena), Ok(3));
    root.validate_tree(&arena).unwrap();
}

#[test]
fn successful_reparse_detaches_the_old_children() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, "[[1, 2]]").unwrap();
    let inner = root.array_index(0, &arena).unwrap();
    let old = inner.array_index(1, &arena).unwrap();

    inner.parse_body("null", &mut arena).unwrap();
    assert_eq!(old.parent(&arena), None);
    root.validate_tree(&arena).unwrap();

    // Released nodes may be linked again.
    let other = arena.create_node().unwrap();
    other.set_array(&mut arena).unwrap();
    other.array_push(old, &mut arena).unwrap();
    other.validate_tree(&arena).unwrap();
}

#[test]
fn linked_keys_cannot_be_reparsed() {
    let mut arena = Arena::new();
    let root = parse(&mut arena, r#"{"a": 1}"#).unwrap();
    let key = root.find_key("a", &arena).unwrap();

    let err = key.parse_body("[]", &mut arena).unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::KeyTarget);
    assert_eq!(key.kind(&arena), Some(Kind::Key));
    root.validate_tree(&arena).unwrap();
}

#[test]
fn stale_root_is_rejected() {
    let mut arena = Arena::new();
    let root = arena.create_node().unwrap();
    arena.reset();

    let err = root.parse_body("1", &mut arena).unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::StaleHandle);
}

#[test]
fn arena_parse_rejects_trailing_content() {
    let mut arena = Arena::new();
    assert!(arena.parse(" [1] \n").is_ok());

    let err = arena.parse("[1] x").unwrap_err();
    assert_eq!(err.syntax_error(), SyntaxError::TrailingCharacters);
    assert_eq!(err.offset, 4);
}
