//! Recursive-descent parser from a byte buffer into an arena tree.
//!
//! Every production takes a byte offset into the input and returns the offset
//! just past what it consumed. Scalars never copy: strings and numbers keep a
//! [`Span`] into the input, and string escapes are only decoded when the text
//! is asked for. Object keys are the exception; they are decoded as soon as
//! they are read so lookups can compare plain text.
//!
//! When a production fails, the node it was filling becomes
//! [`Kind::Error`](crate::Kind::Error) with the failure message, and so does
//! every enclosing node up to the one passed to [`NodeId::parse_body`]. The
//! caller therefore finds a readable message on a detached root. A root that
//! is linked into a tree gets its previous value back instead.

mod literal;
#[cfg(test)]
mod tests;

use bstr::ByteSlice;

use crate::{
    Arena, NodeId, ParserOptions,
    error::{ParseError, SyntaxError, TreeError},
    node::{ChildList, Kind, Node, NodeBody, Text, release},
    span::Span,
};
use literal::Literal;

#[derive(Debug, Clone, Copy)]
struct Failure {
    error: SyntaxError,
    offset: usize,
}

fn fail<T>(error: SyntaxError, offset: usize) -> Result<T, Failure> {
    Err(Failure { error, offset })
}

#[inline]
fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

struct Parser<'a, 'src> {
    arena: &'a mut Arena<'src>,
    input: &'src [u8],
    max_depth: usize,
}

impl<'src> Parser<'_, 'src> {
    fn skip_whitespace(&self, mut pos: usize) -> usize {
        while self.input.get(pos).copied().is_some_and(is_whitespace) {
            pos += 1;
        }
        pos
    }

    fn create_node(&mut self, offset: usize) -> Result<NodeId, Failure> {
        self.arena
            .create_node()
            .or_else(|_| fail(SyntaxError::OutOfMemory, offset))
    }

    /// Parses one value into `node`, turning `node` into an error on failure.
    fn value(&mut self, node: NodeId, pos: usize, depth: usize) -> Result<usize, Failure> {
        let result = self.value_body(node, pos, depth);
        if let Err(failure) = result {
            self.arena
                .set_body(node, NodeBody::error(failure.error.message()));
        }
        result
    }

    fn value_body(&mut self, node: NodeId, pos: usize, depth: usize) -> Result<usize, Failure> {
        let start = self.skip_whitespace(pos);
        let Some(&lead) = self.input.get(start) else {
            return fail(SyntaxError::UnexpectedEnd, start);
        };

        match lead {
            b'"' => self.string(node, start + 1),
            b'{' => self.object(node, start + 1, depth + 1),
            b'[' => self.array(node, start + 1, depth + 1),
            b'-' | b'0'..=b'9' => self.number(node, start),
            _ => match Literal::from_lead(lead) {
                Some(literal) => self.literal(node, literal, start),
                None => fail(SyntaxError::UnexpectedCharacter, start),
            },
        }
    }

    /// Finds the closing quote of a string whose contents start at `pos`: the
    /// first `"` preceded by an even number of backslashes.
    fn string_end(&self, pos: usize) -> Option<usize> {
        let mut search = pos;
        loop {
            let quote = search + self.input[search..].find_byte(b'"')?;
            let backslashes = self.input[pos..quote]
                .iter()
                .rev()
                .take_while(|&&b| b == b'\\')
                .count();
            if backslashes % 2 == 0 {
                return Some(quote);
            }
            search = quote + 1;
        }
    }

    fn string(&mut self, node: NodeId, pos: usize) -> Result<usize, Failure> {
        let Some(end) = self.string_end(pos) else {
            return fail(SyntaxError::UnterminatedString, self.input.len());
        };
        let text = Text {
            raw: Some(Span::Borrowed(&self.input[pos..end])),
            clean: None,
        };
        self.arena.set_body(node, NodeBody::String(text));
        Ok(end + 1)
    }

    /// An optional `-`, then digits with at most one `.` that sits between
    /// digits. No exponents.
    fn number(&mut self, node: NodeId, start: usize) -> Result<usize, Failure> {
        let negative = self.input[start] == b'-';
        let mut digits = usize::from(!negative);
        let mut dots = 0;
        let mut malformed = negative;
        let mut end = start + 1;

        while let Some(&byte) = self.input.get(end) {
            match byte {
                b'0'..=b'9' => {
                    digits += 1;
                    malformed = false;
                }
                b'.' => {
                    malformed = true;
                    dots += 1;
                    if digits == 0 || dots > 1 {
                        break;
                    }
                }
                _ => break,
            }
            end += 1;
        }

        if malformed {
            return fail(SyntaxError::MalformedNumber, end);
        }
        let digits = Span::Borrowed(&self.input[start..end]);
        self.arena.set_body(node, NodeBody::Number(digits));
        Ok(end)
    }

    fn literal(&mut self, node: NodeId, literal: Literal, start: usize) -> Result<usize, Failure> {
        let Some(len) = literal.match_prefix(&self.input[start..]) else {
            return fail(SyntaxError::InvalidToken, start);
        };
        self.arena.set_body(node, literal.body());
        Ok(start + len)
    }

    fn enter(&self, depth: usize, offset: usize) -> Result<(), Failure> {
        if depth > self.max_depth {
            return fail(SyntaxError::DepthLimitExceeded, offset);
        }
        Ok(())
    }

    /// Consumes what follows a container element: a `,` (and the whitespace
    /// after it) or, without consuming it, the closing bracket.
    fn separator(
        &self,
        pos: usize,
        close: u8,
        unterminated: SyntaxError,
    ) -> Result<usize, Failure> {
        let pos = self.skip_whitespace(pos);
        match self.input.get(pos) {
            None => fail(unterminated, pos),
            Some(b',') => Ok(self.skip_whitespace(pos + 1)),
            Some(&byte) if byte == close => Ok(pos),
            Some(_) => fail(SyntaxError::InvalidSeparator, pos),
        }
    }

    fn link(&mut self, list: &mut ChildList, parent: NodeId, child: NodeId) {
        if let Some(node) = self.arena.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(last) = list.last.and_then(|last| self.arena.node_mut(last)) {
            last.next = Some(child);
        }
        list.first.get_or_insert(child);
        list.last = Some(child);
        list.count += 1;
    }

    fn array(&mut self, node: NodeId, pos: usize, depth: usize) -> Result<usize, Failure> {
        self.enter(depth, pos - 1)?;

        let mut list = ChildList::default();
        let mut pos = self.skip_whitespace(pos);
        loop {
            match self.input.get(pos) {
                None => return fail(SyntaxError::UnterminatedArray, pos),
                Some(b']') => break,
                Some(_) => {}
            }

            let element = self.create_node(pos)?;
            pos = self.value(element, pos, depth)?;
            self.link(&mut list, node, element);
            pos = self.separator(pos, b']', SyntaxError::UnterminatedArray)?;
        }

        self.arena.set_body(node, NodeBody::Array(list));
        Ok(pos + 1)
    }

    fn object(&mut self, node: NodeId, pos: usize, depth: usize) -> Result<usize, Failure> {
        self.enter(depth, pos - 1)?;

        let mut list = ChildList::default();
        let mut pos = self.skip_whitespace(pos);
        loop {
            match self.input.get(pos) {
                None => return fail(SyntaxError::UnterminatedObject, pos),
                Some(b'}') => break,
                Some(b'"') => {}
                Some(_) => return fail(SyntaxError::KeyNotFound, pos),
            }

            let name_start = pos + 1;
            let Some(name_end) = self.string_end(name_start) else {
                return fail(SyntaxError::UnterminatedKey, self.input.len());
            };
            let raw = Span::Borrowed(&self.input[name_start..name_end]);
            let name = self.arena.unescape(raw).or_else(|err| match err {
                TreeError::Alloc(_) => fail(SyntaxError::OutOfMemory, name_start),
                _ => fail(SyntaxError::InvalidKeyEscape, name_start),
            })?;

            pos = self.skip_whitespace(name_end + 1);
            if self.input.get(pos) != Some(&b':') {
                return fail(SyntaxError::MissingColon, pos);
            }

            let key = self.create_node(pos)?;
            let value = self.create_node(pos)?;
            pos = self.value(value, pos + 1, depth)?;

            let key_body = NodeBody::Key {
                name,
                raw: Some(raw),
                value: Some(value),
            };
            self.arena.set_body(key, key_body);
            if let Some(value) = self.arena.node_mut(value) {
                value.parent = Some(key);
            }
            self.link(&mut list, node, key);
            pos = self.separator(pos, b'}', SyntaxError::UnterminatedObject)?;
        }

        self.arena.set_body(node, NodeBody::Object(list));
        Ok(pos + 1)
    }
}

impl NodeId {
    /// Parses the JSON value at the start of `input` into this node, replacing
    /// whatever it held. Returns the unparsed rest of `input`.
    ///
    /// Leading whitespace is skipped; trailing bytes after the value are left
    /// to the caller. The sibling link of this node is kept, so a member of a
    /// container can be re-parsed in place.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if `input` does not start with a valid value.
    /// A detached node is then an error node whose message is
    /// [`SyntaxError::message`]. A node linked into a container keeps its
    /// previous value instead, so the enclosing tree stays serializable.
    /// A key linked into an object is refused with [`SyntaxError::KeyTarget`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use spanjson::{Arena, Kind};
    ///
    /// let mut arena = Arena::new();
    /// let root = arena.create_node().unwrap();
    /// let rest = root.parse_body("[1, 2, 3] tail", &mut arena).unwrap();
    ///
    /// assert_eq!(root.kind(&arena), Some(Kind::Array));
    /// assert_eq!(rest, b" tail");
    /// ```
    pub fn parse_body<'src, I>(
        self,
        input: &'src I,
        arena: &mut Arena<'src>,
    ) -> Result<&'src [u8], ParseError>
    where
        I: AsRef<[u8]> + ?Sized,
    {
        self.parse_body_with(input, arena, &ParserOptions::default())
    }

    /// [`NodeId::parse_body`] with explicit [`ParserOptions`].
    ///
    /// # Errors
    ///
    /// As [`NodeId::parse_body`].
    pub fn parse_body_with<'src, I>(
        self,
        input: &'src I,
        arena: &mut Arena<'src>,
        options: &ParserOptions,
    ) -> Result<&'src [u8], ParseError>
    where
        I: AsRef<[u8]> + ?Sized,
    {
        let input = input.as_ref();
        let Some(&Node { parent, body, .. }) = arena.node(self) else {
            return Err(ParseError::new(SyntaxError::StaleHandle, input, 0));
        };
        if parent.is_some() && body.kind() == Kind::Key {
            return Err(ParseError::new(SyntaxError::KeyTarget, input, 0));
        }

        let mut parser = Parser {
            arena,
            input,
            max_depth: options.max_depth,
        };
        match parser.value(self, 0, 0) {
            Ok(end) => {
                release(body, arena);
                Ok(&input[end..])
            }
            Err(failure) => {
                if parent.is_some() {
                    arena.set_body(self, body);
                } else {
                    release(body, arena);
                }
                let err = ParseError::new(failure.error, input, failure.offset);
                log::debug!("failed to parse {} byte document: {err}", input.len());
                Err(err)
            }
        }
    }
}

impl<'src> Arena<'src> {
    /// Parses a complete document into a new root node.
    ///
    /// Unlike [`NodeId::parse_body`], anything but whitespace after the value
    /// is an error.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for invalid or trailing input, or
    /// [`SyntaxError::OutOfMemory`] if the root cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use spanjson::{Arena, SyntaxError};
    ///
    /// let mut arena = Arena::new();
    /// let root = arena.parse(r#"{"a": -4}"#).unwrap();
    /// let a = root.find_child_element("a", &arena).unwrap();
    /// assert_eq!(a.get_integer::<i32>(&arena), Ok(-4));
    ///
    /// let err = arena.parse("1 2").unwrap_err();
    /// assert_eq!(err.syntax_error(), SyntaxError::TrailingCharacters);
    /// ```
    pub fn parse<I>(&mut self, input: &'src I) -> Result<NodeId, ParseError>
    where
        I: AsRef<[u8]> + ?Sized,
    {
        let bytes = input.as_ref();
        let root = self
            .create_node()
            .map_err(|_| ParseError::new(SyntaxError::OutOfMemory, bytes, 0))?;
        let rest = root.parse_body(bytes, self)?;

        let trailing = rest.iter().position(|&b| !is_whitespace(b));
        if let Some(index) = trailing {
            let offset = bytes.len() - rest.len() + index;
            let err = ParseError::new(SyntaxError::TrailingCharacters, bytes, offset);
            log::debug!("rejecting document: {err}");
            return Err(err);
        }
        Ok(root)
    }
}
