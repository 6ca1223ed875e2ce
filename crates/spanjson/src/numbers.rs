//! Reading and writing number nodes.
//!
//! Parsed numbers keep their source digits; nothing is converted until a
//! caller asks for a concrete type.

use alloc::vec::Vec;
use core::fmt::{self, Write as _};

use crate::{Arena, Kind, NodeId, error::TreeError, node::NodeBody};

const SET_NUMBER_FAILED: &str = "Failed to set number";

mod sealed {
    pub trait Sealed {}
}

/// Primitive numbers that can be stored with [`NodeId::set_number`].
pub trait Number: sealed::Sealed + Copy {
    /// Appends the decimal text of `self`, or returns `false` if it has none.
    #[doc(hidden)]
    fn write_text(self, out: &mut Vec<u8>) -> bool;
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Number for $ty {
                fn write_text(self, out: &mut Vec<u8>) -> bool {
                    out.extend_from_slice(itoa::Buffer::new().format(self).as_bytes());
                    true
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

struct ByteWriter<'a>(&'a mut Vec<u8>);

impl fmt::Write for ByteWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

macro_rules! impl_float {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            // `Display` for floats never uses exponent notation, which the
            // parser does not accept.
            impl Number for $ty {
                fn write_text(self, out: &mut Vec<u8>) -> bool {
                    self.is_finite() && write!(ByteWriter(out), "{self}").is_ok()
                }
            }
        )*
    };
}

impl_float!(f32, f64);

impl NodeId {
    fn number_text<'a>(self, arena: &'a Arena<'_>) -> Result<&'a [u8], TreeError> {
        match self.body(arena)? {
            NodeBody::Number(digits) => Ok(arena.bytes(digits)),
            other => Err(TreeError::KindMismatch {
                expected: Kind::Number,
                found: other.kind(),
            }),
        }
    }

    /// Parses this number as an integer of type `T`.
    ///
    /// # Errors
    ///
    /// [`TreeError::KindMismatch`] unless this is a number,
    /// [`TreeError::InvalidNumber`] unless the whole text is an integer that
    /// fits in `T`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use spanjson::{Arena, TreeError};
    ///
    /// let mut arena = Arena::new();
    /// let root = arena.create_node().unwrap();
    /// root.parse_body(b"[-4, 4.5]", &mut arena).unwrap();
    ///
    /// let first = root.array_index(0, &arena).unwrap();
    /// let second = root.array_index(1, &arena).unwrap();
    /// assert_eq!(first.get_integer::<i32>(&arena), Ok(-4));
    /// assert_eq!(second.get_integer::<i32>(&arena), Err(TreeError::InvalidNumber));
    /// ```
    pub fn get_integer<T>(self, arena: &Arena<'_>) -> Result<T, TreeError>
    where
        T: lexical_parse_integer::FromLexical,
    {
        let text = self.number_text(arena)?;
        T::from_lexical(text).map_err(|_| TreeError::InvalidNumber)
    }

    /// Parses this number as a float of type `T`.
    ///
    /// # Errors
    ///
    /// [`TreeError::KindMismatch`] unless this is a number,
    /// [`TreeError::InvalidNumber`] if the text does not parse.
    pub fn get_float<T>(self, arena: &Arena<'_>) -> Result<T, TreeError>
    where
        T: lexical_parse_float::FromLexical,
    {
        let text = self.number_text(arena)?;
        T::from_lexical(text).map_err(|_| TreeError::InvalidNumber)
    }

    /// Turns this node into a number holding the decimal text of `value`.
    ///
    /// # Errors
    ///
    /// [`TreeError::NonFiniteNumber`] for NaN and infinities, in which case
    /// the node becomes an error. [`TreeError::Alloc`] if the text cannot be
    /// stored. [`TreeError::KindMismatch`] if this node is a key linked into
    /// an object.
    pub fn set_number<T: Number>(self, value: T, arena: &mut Arena<'_>) -> Result<(), TreeError> {
        self.check_replace(Kind::Number, arena)?;

        let mut scratch = core::mem::take(&mut arena.scratch);
        scratch.clear();
        let finite = value.write_text(&mut scratch);
        arena.scratch = scratch;

        if !finite {
            log::debug!("refusing to store non-finite number in {self:?}");
            self.set_error(SET_NUMBER_FAILED, arena)?;
            return Err(TreeError::NonFiniteNumber);
        }

        let text = arena.push_scratch()?;
        self.replace_body(NodeBody::Number(text), arena)
    }
}
