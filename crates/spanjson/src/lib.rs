//! A zero-copy JSON parser and pretty-printer backed by a bump arena.
//!
//! Documents are parsed into a tree of nodes that all live in one [`Arena`].
//! Strings and numbers are spans into the input buffer; only decoded escapes
//! and programmatically generated text are copied into the arena's string
//! pool. Nodes are addressed by [`NodeId`] handles, and every tree operation
//! takes the arena that owns the node.
//!
//! ```rust
//! use spanjson::{Arena, Kind};
//!
//! let input = r#"{"name": "caf\u00e9", "tags": [1, 2, 3]}"#;
//! let mut arena = Arena::new();
//! let root = arena.parse(input).unwrap();
//!
//! let name = root.find_child_element("name", &arena).unwrap();
//! assert_eq!(name.get_string(&mut arena).unwrap(), "café");
//!
//! let tags = root.find_child_element("tags", &arena).unwrap();
//! assert_eq!(tags.kind(&arena), Some(Kind::Array));
//! assert_eq!(tags.child_count(&arena), 3);
//!
//! let extra = arena.create_node().unwrap();
//! extra.set_bool(true, &mut arena).unwrap();
//! root.object_push_key("extra", extra, &mut arena).unwrap();
//! assert!(root.to_json_string(&arena).unwrap().ends_with("\"extra\": true\n}"));
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod arena;
mod error;
mod escape;
mod node;
mod numbers;
mod options;
mod parser;
mod serialize;
mod span;

#[cfg(test)]
mod tests;

pub use arena::{Arena, ArenaStats};
pub use error::{AllocError, EscapeError, ParseError, Pool, SerializeError, SyntaxError, TreeError};
pub use node::{Children, Kind, NodeId};
pub use numbers::Number;
pub use options::{ArenaOptions, ParserOptions};
pub use span::{PoolRange, Span};
