//! Conversion between the escaped text found between JSON quotes and plain
//! UTF-8.
//!
//! Decoding understands the two-character escapes `\" \\ \/ \b \f \n \r \t`
//! and `\uXXXX`, where a high surrogate must be followed by a `\uXXXX` low
//! surrogate and the pair is combined into one code point. Encoding is the
//! inverse, except that `/` is never escaped and control bytes without a short
//! form are written as `\u00XX` with uppercase hex digits.
//!
//! Both directions leave text that needs no work untouched, so the arena can
//! hand back the input span instead of copying it.

use alloc::vec::Vec;
use core::fmt;

use bstr::{BStr, ByteSlice};

use crate::{
    Arena,
    error::{AllocError, EscapeError, Pool, TreeError},
    span::Span,
};

/// Accumulates the four hex digits of a `\u` escape into a UTF-16 code unit.
#[derive(Debug, Default)]
struct HexQuad {
    acc: u16,
    len: u8,
}

impl HexQuad {
    #[inline]
    fn hex_val(byte: u8) -> Option<u16> {
        match byte {
            b'0'..=b'9' => Some(u16::from(byte - b'0')),
            b'a'..=b'f' => Some(u16::from(byte - b'a' + 10)),
            b'A'..=b'F' => Some(u16::from(byte - b'A' + 10)),
            _ => None,
        }
    }

    /// Feeds one digit.
    ///
    /// - Returns `Ok(None)` while fewer than four digits have been seen.
    /// - Returns `Ok(Some(unit))` on the fourth digit and starts over.
    fn feed(&mut self, byte: u8) -> Result<Option<u16>, EscapeError> {
        let digit = Self::hex_val(byte).ok_or(EscapeError::InvalidHexDigit(byte))?;
        self.acc = (self.acc << 4) | digit;
        self.len += 1;

        if self.len < 4 {
            return Ok(None);
        }
        let unit = self.acc;
        *self = Self::default();
        Ok(Some(unit))
    }
}

/// Reads the four digits at the start of `bytes`.
fn read_quad(bytes: &[u8]) -> Result<u16, EscapeError> {
    let mut quad = HexQuad::default();
    for &byte in bytes.iter().take(4) {
        if let Some(unit) = quad.feed(byte)? {
            return Ok(unit);
        }
    }
    Err(EscapeError::TruncatedUnicode)
}

/// Decodes the digits following `\u`, returning the character and how many
/// bytes it consumed.
fn decode_unicode(rest: &[u8]) -> Result<(char, usize), EscapeError> {
    let high = read_quad(rest)?;
    match high {
        0xD800..=0xDBFF => {
            let Some(tail) = rest.get(4..).and_then(|tail| tail.strip_prefix(b"\\u")) else {
                return Err(EscapeError::InvalidSurrogate(high));
            };
            let low = read_quad(tail)?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(EscapeError::InvalidSurrogate(low));
            }
            let code = (((u32::from(high) & 0x3FF) << 10) | (u32::from(low) & 0x3FF)) + 0x1_0000;
            let ch = char::from_u32(code).ok_or(EscapeError::InvalidSurrogate(high))?;
            Ok((ch, 10))
        }
        0xDC00..=0xDFFF => Err(EscapeError::InvalidSurrogate(high)),
        _ => {
            let ch = char::from_u32(u32::from(high)).ok_or(EscapeError::InvalidSurrogate(high))?;
            Ok((ch, 4))
        }
    }
}

/// Appends the decoded form of `raw` to `out`.
///
/// The output is never longer than the input.
pub(crate) fn unescape_into(raw: &[u8], out: &mut Vec<u8>) -> Result<(), EscapeError> {
    let mut pos = 0;
    while let Some(offset) = raw[pos..].find_byte(b'\\') {
        out.extend_from_slice(&raw[pos..pos + offset]);
        pos += offset + 1;

        let &letter = raw.get(pos).ok_or(EscapeError::TrailingBackslash)?;
        pos += 1;
        let byte = match letter {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let (ch, used) = decode_unicode(&raw[pos..])?;
                pos += used;
                let mut utf8 = [0; 4];
                out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
                continue;
            }
            other => return Err(EscapeError::UnknownEscape(other)),
        };
        out.push(byte);
    }
    out.extend_from_slice(&raw[pos..]);
    Ok(())
}

#[inline]
fn needs_escape(byte: u8) -> bool {
    byte == b'"' || byte == b'\\' || byte < 0x20
}

fn short_escape(byte: u8) -> Option<&'static str> {
    Some(match byte {
        b'"' => "\\\"",
        b'\\' => "\\\\",
        0x08 => "\\b",
        0x0C => "\\f",
        b'\n' => "\\n",
        b'\r' => "\\r",
        b'\t' => "\\t",
        _ => return None,
    })
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Appends the escaped form of `clean` to `out`.
///
/// The output is at most six times longer than the input.
pub(crate) fn escape_into(clean: &[u8], out: &mut Vec<u8>) {
    for &byte in clean {
        if !needs_escape(byte) {
            out.push(byte);
        } else if let Some(short) = short_escape(byte) {
            out.extend_from_slice(short.as_bytes());
        } else {
            out.extend_from_slice(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX_DIGITS[usize::from(byte >> 4)],
                HEX_DIGITS[usize::from(byte & 0xF)],
            ]);
        }
    }
}

/// Writes the escaped form of `clean` to `out` without allocating.
pub(crate) fn write_escaped<W: fmt::Write>(clean: &[u8], out: &mut W) -> fmt::Result {
    let mut rest = clean;
    while let Some(offset) = rest.iter().position(|&b| needs_escape(b)) {
        if offset > 0 {
            write!(out, "{}", BStr::new(&rest[..offset]))?;
        }
        let byte = rest[offset];
        match short_escape(byte) {
            Some(short) => out.write_str(short)?,
            None => write!(out, "\\u{byte:04X}")?,
        }
        rest = &rest[offset + 1..];
    }
    if !rest.is_empty() {
        write!(out, "{}", BStr::new(rest))?;
    }
    Ok(())
}

impl<'src> Arena<'src> {
    /// Decodes the escaped string text `raw`.
    ///
    /// Text without a backslash is returned as is. Otherwise the decoded
    /// bytes are copied into the string pool.
    ///
    /// # Errors
    ///
    /// [`TreeError::Escape`] for a malformed escape sequence,
    /// [`TreeError::Alloc`] if the pool cannot grow.
    pub fn unescape(&mut self, raw: Span<'src>) -> Result<Span<'src>, TreeError> {
        if self.bytes(raw).find_byte(b'\\').is_none() {
            return Ok(raw);
        }

        let mut scratch = core::mem::take(&mut self.scratch);
        scratch.clear();
        let input = self.bytes(raw);
        let decoded = scratch
            .try_reserve(input.len())
            .map_err(|_| TreeError::Alloc(AllocError { pool: Pool::Strings }))
            .and_then(|()| unescape_into(input, &mut scratch).map_err(TreeError::from));
        self.scratch = scratch;
        decoded?;

        Ok(self.push_scratch()?)
    }

    /// Escapes `clean` for use between JSON quotes.
    ///
    /// Text with nothing to escape is returned as is. Otherwise the escaped
    /// bytes are copied into the string pool.
    ///
    /// # Errors
    ///
    /// [`TreeError::Alloc`] if the pool cannot grow.
    pub fn escape(&mut self, clean: Span<'src>) -> Result<Span<'src>, TreeError> {
        if !self.bytes(clean).iter().any(|&b| needs_escape(b)) {
            return Ok(clean);
        }

        let mut scratch = core::mem::take(&mut self.scratch);
        scratch.clear();
        let input = self.bytes(clean);
        let reserved = scratch.try_reserve(input.len() * 6);
        if reserved.is_ok() {
            escape_into(input, &mut scratch);
        }
        self.scratch = scratch;
        reserved.map_err(|_| AllocError { pool: Pool::Strings })?;

        Ok(self.push_scratch()?)
    }
}
