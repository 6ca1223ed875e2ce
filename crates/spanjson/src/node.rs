//! Tree nodes and the operations on them.
//!
//! Nodes live in an [`Arena`] and are addressed by [`NodeId`] handles. All
//! operations are methods on the handle that take the arena explicitly:
//!
//! ```rust
//! use spanjson::{Arena, Kind};
//!
//! let mut arena = Arena::new();
//! let list = arena.create_node().unwrap();
//! list.set_array(&mut arena).unwrap();
//!
//! for text in ["a", "b"] {
//!     let item = arena.create_node().unwrap();
//!     item.set_string(text, &mut arena).unwrap();
//!     list.array_push(item, &mut arena).unwrap();
//! }
//!
//! assert_eq!(list.child_count(&arena), 2);
//! let second = list.array_index(1, &arena).unwrap();
//! assert_eq!(second.get_string(&mut arena).unwrap(), "b");
//! ```
//!
//! Containers keep their children in an intrusive singly linked list with a
//! tail handle, so appending is O(1) while lookups by index or key are linear.

use alloc::{collections::BTreeMap, vec::Vec};
use core::fmt;

use bstr::BStr;

use crate::{Arena, error::TreeError, span::Span};

/// Handle to a node inside an [`Arena`].
///
/// Handles are cheap to copy and only meaningful together with the arena that
/// issued them. After [`Arena::reset`] every older handle is stale: lookups
/// through it return `None` and mutations fail with
/// [`TreeError::StaleHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) epoch: u32,
    pub(crate) block: u32,
    pub(crate) slot: u32,
}

/// The type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A failed parse or conversion. Carries a message.
    Error,
    /// An object member name. Its single child is the member value.
    Key,
    /// A string value.
    String,
    /// A number value, kept as its source digits.
    Number,
    Object,
    Array,
    Null,
    True,
    False,
}

impl Kind {
    /// Whether nodes of this kind may appear as array elements or member
    /// values.
    #[must_use]
    pub fn is_value(self) -> bool {
        !matches!(self, Kind::Error | Kind::Key)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Error => "error",
            Kind::Key => "key",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::Null => "null",
            Kind::True => "true",
            Kind::False => "false",
        })
    }
}

/// Escaped and unescaped forms of a string. At least one is present; when no
/// escaping is needed both name the same bytes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Text<'src> {
    pub(crate) raw: Option<Span<'src>>,
    pub(crate) clean: Option<Span<'src>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ChildList {
    pub(crate) first: Option<NodeId>,
    pub(crate) last: Option<NodeId>,
    pub(crate) count: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum NodeBody<'src> {
    Error {
        message: Span<'src>,
    },
    Key {
        /// Unescaped member name.
        name: Span<'src>,
        /// Escaped name, once requested.
        raw: Option<Span<'src>>,
        value: Option<NodeId>,
    },
    String(Text<'src>),
    Number(Span<'src>),
    Object(ChildList),
    Array(ChildList),
    Null,
    True,
    False,
}

impl NodeBody<'_> {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            NodeBody::Error { .. } => Kind::Error,
            NodeBody::Key { .. } => Kind::Key,
            NodeBody::String(_) => Kind::String,
            NodeBody::Number(_) => Kind::Number,
            NodeBody::Object(_) => Kind::Object,
            NodeBody::Array(_) => Kind::Array,
            NodeBody::Null => Kind::Null,
            NodeBody::True => Kind::True,
            NodeBody::False => Kind::False,
        }
    }

    pub(crate) fn error(message: &'static str) -> Self {
        NodeBody::Error {
            message: Span::from_static(message),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Node<'src> {
    pub(crate) next: Option<NodeId>,
    /// The container or key this node is linked under.
    pub(crate) parent: Option<NodeId>,
    pub(crate) body: NodeBody<'src>,
}

impl Node<'_> {
    pub(crate) fn empty() -> Self {
        Self {
            next: None,
            parent: None,
            body: NodeBody::Error {
                message: Span::EMPTY,
            },
        }
    }
}

impl NodeId {
    pub(crate) fn new(epoch: u32, block: usize, slot: usize) -> Self {
        Self {
            epoch,
            block: u32::try_from(block).unwrap_or(u32::MAX),
            slot: u32::try_from(slot).unwrap_or(u32::MAX),
        }
    }

    pub(crate) fn body<'src>(self, arena: &Arena<'src>) -> Result<NodeBody<'src>, TreeError> {
        arena
            .node(self)
            .map(|node| node.body)
            .ok_or(TreeError::StaleHandle)
    }

    pub(crate) fn set_body<'src>(
        self,
        body: NodeBody<'src>,
        arena: &mut Arena<'src>,
    ) -> Result<(), TreeError> {
        arena.set_body(self, body).ok_or(TreeError::StaleHandle)
    }

    fn set_links(
        self,
        next: Option<NodeId>,
        parent: Option<NodeId>,
        arena: &mut Arena<'_>,
    ) -> Result<(), TreeError> {
        let node = arena.node_mut(self).ok_or(TreeError::StaleHandle)?;
        node.next = next;
        node.parent = parent;
        Ok(())
    }

    fn set_next(self, next: Option<NodeId>, arena: &mut Arena<'_>) -> Result<(), TreeError> {
        arena.node_mut(self).ok_or(TreeError::StaleHandle)?.next = next;
        Ok(())
    }

    /// Refuses to turn a linked node into something its parent cannot hold:
    /// a key stays a key, and an element or member value stays a value.
    pub(crate) fn check_replace(self, kind: Kind, arena: &Arena<'_>) -> Result<(), TreeError> {
        let node = arena.node(self).ok_or(TreeError::StaleHandle)?;
        if node.parent.is_none() {
            return Ok(());
        }
        match node.body.kind() {
            Kind::Key if kind == Kind::Key => Ok(()),
            Kind::Key => Err(TreeError::KindMismatch {
                expected: Kind::Key,
                found: kind,
            }),
            _ if kind.is_value() => Ok(()),
            _ => Err(TreeError::InvalidValue(kind)),
        }
    }

    /// Replaces the body of this node, detaching whatever the old body held.
    pub(crate) fn replace_body<'src>(
        self,
        body: NodeBody<'src>,
        arena: &mut Arena<'src>,
    ) -> Result<(), TreeError> {
        self.check_replace(body.kind(), arena)?;
        let old = self.body(arena)?;
        release(old, arena);
        self.set_body(body, arena)
    }

    /// The kind of this node, or `None` for a stale handle.
    #[must_use]
    pub fn kind(self, arena: &Arena<'_>) -> Option<Kind> {
        arena.node(self).map(|node| node.body.kind())
    }

    /// Number of children: members of an object, elements of an array, `1`
    /// for a key with a value and `0` for everything else.
    #[must_use]
    pub fn child_count(self, arena: &Arena<'_>) -> usize {
        match arena.node(self).map(|node| node.body) {
            Some(NodeBody::Object(list) | NodeBody::Array(list)) => list.count,
            Some(NodeBody::Key { value: Some(_), .. }) => 1,
            _ => 0,
        }
    }

    #[must_use]
    pub fn first_child(self, arena: &Arena<'_>) -> Option<NodeId> {
        match arena.node(self)?.body {
            NodeBody::Object(list) | NodeBody::Array(list) => list.first,
            NodeBody::Key { value, .. } => value,
            _ => None,
        }
    }

    #[must_use]
    pub fn next_sibling(self, arena: &Arena<'_>) -> Option<NodeId> {
        arena.node(self)?.next
    }

    /// The container this node is an element or key of, or the key whose
    /// value it is. `None` for a detached node.
    #[must_use]
    pub fn parent(self, arena: &Arena<'_>) -> Option<NodeId> {
        arena.node(self)?.parent
    }

    /// The message of an [`Kind::Error`] node.
    #[must_use]
    pub fn error_message<'a>(self, arena: &'a Arena<'_>) -> Option<&'a BStr> {
        match arena.node(self)?.body {
            NodeBody::Error { message } => Some(arena.resolve(message)),
            _ => None,
        }
    }

    /// The stored text of a node without any conversion: number digits, an
    /// error message, or the escaped form of a string or key if it has been
    /// computed.
    #[must_use]
    pub fn raw<'a>(self, arena: &'a Arena<'_>) -> Option<&'a BStr> {
        let span = match arena.node(self)?.body {
            NodeBody::Number(digits) => digits,
            NodeBody::Error { message } => message,
            NodeBody::String(Text { raw, .. }) | NodeBody::Key { raw, .. } => raw?,
            _ => return None,
        };
        Some(arena.resolve(span))
    }

    /// Appends `value` to this array.
    ///
    /// # Errors
    ///
    /// [`TreeError::KindMismatch`] unless this is an array,
    /// [`TreeError::InvalidValue`] if `value` is a key or an error,
    /// [`TreeError::AlreadyAttached`] if `value` already has a parent and
    /// [`TreeError::CreatesCycle`] if `value` is this array or one of its
    /// ancestors.
    pub fn array_push(self, value: NodeId, arena: &mut Arena<'_>) -> Result<(), TreeError> {
        let NodeBody::Array(list) = self.body(arena)? else {
            return Err(self.mismatch(Kind::Array, arena));
        };
        check_attachable(value, self, arena)?;

        let list = append(list, value, self, arena)?;
        self.set_body(NodeBody::Array(list), arena)
    }

    /// Makes `value` the value of `key` and appends the pair to this object.
    ///
    /// # Errors
    ///
    /// [`TreeError::KindMismatch`] unless this is an object and `key` is a
    /// key, [`TreeError::InvalidValue`] if `value` is a key or an error,
    /// [`TreeError::AlreadyAttached`] if `key` or `value` already has a
    /// parent, [`TreeError::CreatesCycle`] if `key` or `value` is this object
    /// or one of its ancestors.
    pub fn object_push(
        self,
        key: NodeId,
        value: NodeId,
        arena: &mut Arena<'_>,
    ) -> Result<(), TreeError> {
        let NodeBody::Object(list) = self.body(arena)? else {
            return Err(self.mismatch(Kind::Object, arena));
        };
        let NodeBody::Key {
            name,
            raw,
            value: previous,
        } = key.body(arena)?
        else {
            return Err(key.mismatch(Kind::Key, arena));
        };
        if key.parent(arena).is_some() {
            return Err(TreeError::AlreadyAttached);
        }
        check_acyclic(key, self, arena)?;
        check_attachable(value, self, arena)?;

        if let Some(previous) = previous {
            previous.set_links(None, None, arena)?;
        }
        value.set_links(None, Some(key), arena)?;
        key.set_body(
            NodeBody::Key {
                name,
                raw,
                value: Some(value),
            },
            arena,
        )?;

        let list = append(list, key, self, arena)?;
        self.set_body(NodeBody::Object(list), arena)
    }

    /// Creates a key named `name` (unescaped text) holding `value` and appends
    /// it to this object. Returns the new key.
    ///
    /// # Errors
    ///
    /// As [`NodeId::object_push`], plus [`TreeError::Alloc`] if the key node
    /// cannot be allocated.
    pub fn object_push_key<'src>(
        self,
        name: impl Into<Span<'src>>,
        value: NodeId,
        arena: &mut Arena<'src>,
    ) -> Result<NodeId, TreeError> {
        let Kind::Object = self.kind_of(arena)? else {
            return Err(self.mismatch(Kind::Object, arena));
        };
        check_attachable(value, self, arena)?;

        let key = arena.create_node()?;
        key.set_key(name, arena)?;
        self.object_push(key, value, arena)?;
        Ok(key)
    }

    /// Sets member `name` of this object to `value`, replacing the value of
    /// the first key with that name or appending a new key. Returns the key.
    ///
    /// # Errors
    ///
    /// As [`NodeId::object_push_key`].
    pub fn object_assign<'src>(
        self,
        name: impl Into<Span<'src>>,
        value: NodeId,
        arena: &mut Arena<'src>,
    ) -> Result<NodeId, TreeError> {
        let Kind::Object = self.kind_of(arena)? else {
            return Err(self.mismatch(Kind::Object, arena));
        };
        check_attachable(value, self, arena)?;

        let name = name.into();
        let existing = self.find_key(arena.resolve(name), arena);
        let Some(key) = existing else {
            return self.object_push_key(name, value, arena);
        };

        let NodeBody::Key {
            name,
            raw,
            value: previous,
        } = key.body(arena)?
        else {
            return Err(key.mismatch(Kind::Key, arena));
        };
        if let Some(previous) = previous {
            previous.set_links(None, None, arena)?;
        }
        value.set_links(None, Some(key), arena)?;
        key.set_body(
            NodeBody::Key {
                name,
                raw,
                value: Some(value),
            },
            arena,
        )?;
        Ok(key)
    }

    /// The first key of this object whose unescaped name equals `name`.
    #[must_use]
    pub fn find_key(self, name: impl AsRef<[u8]>, arena: &Arena<'_>) -> Option<NodeId> {
        let NodeBody::Object(_) = arena.node(self)?.body else {
            return None;
        };
        let name = name.as_ref();
        self.children(arena).find(|&key| match arena.node(key).map(|n| n.body) {
            Some(NodeBody::Key { name: key_name, .. }) => arena.resolve(key_name) == name,
            _ => false,
        })
    }

    /// The value of the first key of this object named `name`.
    #[must_use]
    pub fn find_child_element(self, name: impl AsRef<[u8]>, arena: &Arena<'_>) -> Option<NodeId> {
        self.find_key(name, arena)?.first_child(arena)
    }

    /// The element at `index` of this array.
    #[must_use]
    pub fn array_index(self, index: usize, arena: &Arena<'_>) -> Option<NodeId> {
        let NodeBody::Array(_) = arena.node(self)?.body else {
            return None;
        };
        self.children(arena).nth(index)
    }

    /// Iterates the children of an object (its keys) or an array (its
    /// elements). Yields nothing for other kinds.
    #[must_use]
    pub fn children<'a, 'src>(self, arena: &'a Arena<'src>) -> Children<'a, 'src> {
        let list = match arena.node(self).map(|node| node.body) {
            Some(NodeBody::Object(list) | NodeBody::Array(list)) => list,
            _ => ChildList::default(),
        };
        Children {
            arena,
            next: list.first,
            remaining: list.count,
        }
    }

    /// Calls `f` with the index and handle of every element of this array.
    ///
    /// # Errors
    ///
    /// [`TreeError::KindMismatch`] unless this is an array.
    pub fn iterate_array(
        self,
        arena: &Arena<'_>,
        mut f: impl FnMut(usize, NodeId),
    ) -> Result<(), TreeError> {
        let Kind::Array = self.kind_of(arena)? else {
            return Err(self.mismatch(Kind::Array, arena));
        };
        for (index, child) in self.children(arena).enumerate() {
            f(index, child);
        }
        Ok(())
    }

    /// Calls `f` with the unescaped name and the value of every member of this
    /// object, in insertion order.
    ///
    /// # Errors
    ///
    /// [`TreeError::KindMismatch`] unless this is an object.
    pub fn iterate_object<'a>(
        self,
        arena: &'a Arena<'_>,
        mut f: impl FnMut(&'a BStr, NodeId),
    ) -> Result<(), TreeError> {
        let Kind::Object = self.kind_of(arena)? else {
            return Err(self.mismatch(Kind::Object, arena));
        };
        for key in self.children(arena) {
            if let Some(NodeBody::Key {
                name,
                value: Some(value),
                ..
            }) = arena.node(key).map(|node| node.body)
            {
                f(arena.resolve(name), value);
            }
        }
        Ok(())
    }

    /// Collects the children of an object or array.
    #[must_use]
    pub fn children_as_vec(self, arena: &Arena<'_>) -> Vec<NodeId> {
        self.children(arena).collect()
    }

    /// Collects the members of this object by name. When a name repeats, the
    /// last value wins.
    ///
    /// # Errors
    ///
    /// [`TreeError::KindMismatch`] unless this is an object.
    pub fn object_as_map<'a>(
        self,
        arena: &'a Arena<'_>,
    ) -> Result<BTreeMap<&'a BStr, NodeId>, TreeError> {
        let mut map = BTreeMap::new();
        self.iterate_object(arena, |name, value| {
            map.insert(name, value);
        })?;
        Ok(map)
    }

    /// The unescaped text of a string or key, decoding and caching it on
    /// first request.
    ///
    /// # Errors
    ///
    /// [`TreeError::KindMismatch`] for other kinds, [`TreeError::Escape`] if
    /// the escaped text is malformed.
    pub fn get_string<'a>(self, arena: &'a mut Arena<'_>) -> Result<&'a BStr, TreeError> {
        let span = self.clean_span(arena)?;
        Ok(arena.resolve(span))
    }

    pub(crate) fn clean_span<'src>(self, arena: &mut Arena<'src>) -> Result<Span<'src>, TreeError> {
        match self.body(arena)? {
            NodeBody::Key { name, .. } => Ok(name),
            NodeBody::String(Text {
                clean: Some(clean), ..
            }) => Ok(clean),
            NodeBody::String(Text {
                raw: Some(raw),
                clean: None,
            }) => {
                let clean = arena.unescape(raw)?;
                self.set_body(
                    NodeBody::String(Text {
                        raw: Some(raw),
                        clean: Some(clean),
                    }),
                    arena,
                )?;
                Ok(clean)
            }
            NodeBody::String(Text {
                raw: None,
                clean: None,
            }) => Ok(Span::EMPTY),
            other => Err(TreeError::KindMismatch {
                expected: Kind::String,
                found: other.kind(),
            }),
        }
    }

    /// The escaped text of a string or key, without quotes, encoding and
    /// caching it on first request.
    ///
    /// # Errors
    ///
    /// [`TreeError::KindMismatch`] for other kinds, [`TreeError::Alloc`] if
    /// the escaped copy cannot be stored.
    pub fn get_escaped_string<'a>(self, arena: &'a mut Arena<'_>) -> Result<&'a BStr, TreeError> {
        let span = self.raw_span(arena)?;
        Ok(arena.resolve(span))
    }

    pub(crate) fn raw_span<'src>(self, arena: &mut Arena<'src>) -> Result<Span<'src>, TreeError> {
        match self.body(arena)? {
            NodeBody::String(Text { raw: Some(raw), .. })
            | NodeBody::Key { raw: Some(raw), .. } => Ok(raw),
            NodeBody::String(Text {
                raw: None,
                clean: Some(clean),
            }) => {
                let raw = arena.escape(clean)?;
                self.set_body(
                    NodeBody::String(Text {
                        raw: Some(raw),
                        clean: Some(clean),
                    }),
                    arena,
                )?;
                Ok(raw)
            }
            NodeBody::Key {
                name,
                raw: None,
                value,
            } => {
                let raw = arena.escape(name)?;
                self.set_body(
                    NodeBody::Key {
                        name,
                        raw: Some(raw),
                        value,
                    },
                    arena,
                )?;
                Ok(raw)
            }
            NodeBody::String(Text {
                raw: None,
                clean: None,
            }) => Ok(Span::EMPTY),
            other => Err(TreeError::KindMismatch {
                expected: Kind::String,
                found: other.kind(),
            }),
        }
    }

    /// Turns this node into a string holding the unescaped text `clean`. The
    /// escaped form is computed when first needed.
    ///
    /// Setters detach the children of a container they overwrite. A node
    /// linked into a tree keeps its role: an element or member value cannot
    /// become a key, and a key cannot become a value.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleHandle`], or [`TreeError::KindMismatch`] for a
    /// linked key.
    pub fn set_string<'src>(
        self,
        clean: impl Into<Span<'src>>,
        arena: &mut Arena<'src>,
    ) -> Result<(), TreeError> {
        let text = Text {
            raw: None,
            clean: Some(clean.into()),
        };
        self.replace_body(NodeBody::String(text), arena)
    }

    /// Turns this node into a key named `clean`. A node that already is a key
    /// is renamed and keeps its value; anything else becomes a key with no
    /// value.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleHandle`], or [`TreeError::InvalidValue`] if this
    /// node is an element or member value.
    pub fn set_key<'src>(
        self,
        clean: impl Into<Span<'src>>,
        arena: &mut Arena<'src>,
    ) -> Result<(), TreeError> {
        let name = clean.into();
        if let NodeBody::Key { value, .. } = self.body(arena)? {
            let body = NodeBody::Key {
                name,
                raw: None,
                value,
            };
            return self.set_body(body, arena);
        }
        let body = NodeBody::Key {
            name,
            raw: None,
            value: None,
        };
        self.replace_body(body, arena)
    }

    /// # Errors
    ///
    /// As [`NodeId::set_string`].
    pub fn set_null(self, arena: &mut Arena<'_>) -> Result<(), TreeError> {
        self.replace_body(NodeBody::Null, arena)
    }

    /// # Errors
    ///
    /// As [`NodeId::set_string`].
    pub fn set_bool(self, value: bool, arena: &mut Arena<'_>) -> Result<(), TreeError> {
        self.replace_body(if value { NodeBody::True } else { NodeBody::False }, arena)
    }

    /// Turns this node into an empty array.
    ///
    /// # Errors
    ///
    /// As [`NodeId::set_string`].
    pub fn set_array(self, arena: &mut Arena<'_>) -> Result<(), TreeError> {
        self.replace_body(NodeBody::Array(ChildList::default()), arena)
    }

    /// Turns this node into an empty object.
    ///
    /// # Errors
    ///
    /// As [`NodeId::set_string`].
    pub fn set_object(self, arena: &mut Arena<'_>) -> Result<(), TreeError> {
        self.replace_body(NodeBody::Object(ChildList::default()), arena)
    }

    /// Turns this node into an error, detaching anything it held. Unlike the
    /// public setters this is allowed on linked values.
    pub(crate) fn set_error<'src>(
        self,
        message: &'static str,
        arena: &mut Arena<'src>,
    ) -> Result<(), TreeError> {
        let old = self.body(arena)?;
        release(old, arena);
        self.set_body(NodeBody::error(message), arena)
    }

    fn kind_of(self, arena: &Arena<'_>) -> Result<Kind, TreeError> {
        self.kind(arena).ok_or(TreeError::StaleHandle)
    }

    pub(crate) fn mismatch(self, expected: Kind, arena: &Arena<'_>) -> TreeError {
        match self.kind(arena) {
            Some(found) => TreeError::KindMismatch { expected, found },
            None => TreeError::StaleHandle,
        }
    }

    /// Checks the structural invariants of the tree rooted here.
    #[cfg(any(test, feature = "fuzzing"))]
    #[doc(hidden)]
    pub fn validate_tree(self, arena: &Arena<'_>) -> Result<(), alloc::string::String> {
        use alloc::format;

        let body = self.body(arena).map_err(|e| format!("{self:?}: {e}"))?;
        match body {
            NodeBody::Object(list) | NodeBody::Array(list) => {
                let is_object = matches!(body, NodeBody::Object(_));
                let mut seen = 0;
                let mut last = None;
                let mut cursor = list.first;
                while let Some(child) = cursor {
                    let kind = child
                        .kind(arena)
                        .ok_or_else(|| format!("{child:?} is stale"))?;
                    if is_object && kind != Kind::Key {
                        return Err(format!("object member {child:?} is a {kind}"));
                    }
                    if !is_object && !kind.is_value() {
                        return Err(format!("array element {child:?} is a {kind}"));
                    }
                    if child.parent(arena) != Some(self) {
                        return Err(format!("{child:?} is not linked back to {self:?}"));
                    }
                    if seen == list.count {
                        return Err(format!("{self:?} has more than {seen} children"));
                    }
                    child.validate_tree(arena)?;
                    seen += 1;
                    last = Some(child);
                    cursor = child.next_sibling(arena);
                }
                if seen != list.count {
                    return Err(format!("{self:?} counts {} children, found {seen}", list.count));
                }
                if last != list.last {
                    return Err(format!("{self:?} has a wrong tail"));
                }
                Ok(())
            }
            NodeBody::Key { value, .. } => {
                let value = value.ok_or_else(|| format!("key {self:?} has no value"))?;
                let kind = value
                    .kind(arena)
                    .ok_or_else(|| format!("{value:?} is stale"))?;
                if !kind.is_value() {
                    return Err(format!("key {self:?} holds a {kind}"));
                }
                if value.parent(arena) != Some(self) {
                    return Err(format!("{value:?} is not linked back to {self:?}"));
                }
                value.validate_tree(arena)
            }
            NodeBody::String(Text {
                raw: None,
                clean: None,
            }) => Err(format!("string {self:?} has no text")),
            _ => Ok(()),
        }
    }
}

/// Rejects keys, errors and stale handles as container values.
fn check_value(value: NodeId, arena: &Arena<'_>) -> Result<(), TreeError> {
    let kind = value.kind(arena).ok_or(TreeError::StaleHandle)?;
    if kind.is_value() {
        Ok(())
    } else {
        Err(TreeError::InvalidValue(kind))
    }
}

/// Rejects `value` as a new child somewhere under `under` if it is not a
/// value, is already linked, or is `under` itself or one of its ancestors.
fn check_attachable(value: NodeId, under: NodeId, arena: &Arena<'_>) -> Result<(), TreeError> {
    check_value(value, arena)?;
    if value.parent(arena).is_some() {
        return Err(TreeError::AlreadyAttached);
    }
    check_acyclic(value, under, arena)
}

/// Fails with [`TreeError::CreatesCycle`] if `node` is `under` or one of its
/// ancestors.
fn check_acyclic(node: NodeId, under: NodeId, arena: &Arena<'_>) -> Result<(), TreeError> {
    let mut cursor = Some(under);
    while let Some(ancestor) = cursor {
        if ancestor == node {
            return Err(TreeError::CreatesCycle);
        }
        cursor = ancestor.parent(arena);
    }
    Ok(())
}

/// Detaches the children of a body that is being overwritten so they can be
/// linked elsewhere.
pub(crate) fn release(body: NodeBody<'_>, arena: &mut Arena<'_>) {
    match body {
        NodeBody::Object(list) | NodeBody::Array(list) => {
            let mut cursor = list.first;
            for _ in 0..list.count {
                let Some(child) = cursor else { break };
                let Some(node) = arena.node_mut(child) else {
                    break;
                };
                cursor = node.next.take();
                node.parent = None;
            }
        }
        NodeBody::Key {
            value: Some(value), ..
        } => {
            if let Some(node) = arena.node_mut(value) {
                node.parent = None;
            }
        }
        _ => {}
    }
}

/// Links `child` under `parent` after the tail of `list`.
fn append(
    list: ChildList,
    child: NodeId,
    parent: NodeId,
    arena: &mut Arena<'_>,
) -> Result<ChildList, TreeError> {
    child.set_links(None, Some(parent), arena)?;
    if let Some(last) = list.last {
        last.set_next(Some(child), arena)?;
    }
    Ok(ChildList {
        first: list.first.or(Some(child)),
        last: Some(child),
        count: list.count + 1,
    })
}

/// Iterator over the children of a container, see [`NodeId::children`].
#[derive(Debug, Clone)]
pub struct Children<'a, 'src> {
    arena: &'a Arena<'src>,
    next: Option<NodeId>,
    remaining: usize,
}

impl Iterator for Children<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.next = current.next_sibling(self.arena);
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl core::iter::FusedIterator for Children<'_, '_> {}
