//! Non-owning views into byte buffers.
//!
//! A [`Span`] either borrows bytes that live outside the arena (the parse
//! input, or a `'static` message) or names a range inside the arena's string
//! pool. Pooled spans are plain handles: they are resolved through
//! [`Arena::resolve`](crate::Arena::resolve) and carry the arena epoch so that
//! a span issued before [`Arena::reset`](crate::Arena::reset) resolves to
//! nothing instead of to another document's bytes.

use core::ptr;

/// A view into a byte buffer.
///
/// Equality is by content and needs the arena, see
/// [`Arena::span_eq`](crate::Arena::span_eq).
#[derive(Debug, Clone, Copy)]
pub enum Span<'src> {
    /// Bytes owned outside the arena.
    Borrowed(&'src [u8]),
    /// Bytes owned by the arena's string pool.
    Pooled(PoolRange),
}

/// Location of a pooled span inside the string pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolRange {
    pub(crate) epoch: u32,
    pub(crate) block: u32,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Span<'static> {
    /// The empty span.
    pub const EMPTY: Self = Span::Borrowed(b"");

    pub(crate) const fn from_static(text: &'static str) -> Self {
        Span::Borrowed(text.as_bytes())
    }
}

impl Span<'_> {
    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Span::Borrowed(bytes) => bytes.len(),
            Span::Pooled(range) => range.end - range.start,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'src> From<&'src [u8]> for Span<'src> {
    fn from(bytes: &'src [u8]) -> Self {
        Span::Borrowed(bytes)
    }
}

impl<'src, const N: usize> From<&'src [u8; N]> for Span<'src> {
    fn from(bytes: &'src [u8; N]) -> Self {
        Span::Borrowed(bytes)
    }
}

impl<'src> From<&'src str> for Span<'src> {
    fn from(text: &'src str) -> Self {
        Span::Borrowed(text.as_bytes())
    }
}

/// Content equality with a fast path for two views of the same bytes.
#[inline]
pub(crate) fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    ptr::eq(a.as_ptr(), b.as_ptr()) || a == b
}
