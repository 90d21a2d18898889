//! EMV tag-length-value fields
//!
//! ```text
//! +--------+-----------+----------------------+
//! | Tag    | Length    | Value                |
//! | 2 ASCII| 2 decimal | `Length` bytes       |
//! | digits | digits    | (UTF-8, byte count)  |
//! +--------+-----------+----------------------+
//! ```
//!
//! Two length digits cap a value at 99 bytes. Larger content is expressed by
//! nesting fields inside template values (tags 26 and 62).

use crate::{EncodeError, StructuralFault};

/// Largest value a single field can carry
pub const MAX_VALUE_LEN: usize = 99;

/// Serialize one field, counting the value length in UTF-8 bytes.
pub fn encode_field(tag: &'static str, value: &str) -> Result<String, EncodeError> {
    let len = value.len();
    if len > MAX_VALUE_LEN {
        return Err(EncodeError::FieldTooLong { tag, len });
    }
    Ok(format!("{}{:02}{}", tag, len, value))
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character.
pub fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// A field located inside a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixField<'a> {
    /// Two tag bytes
    pub tag: [u8; 2],
    /// Value bytes
    pub value: &'a [u8],
    /// Byte offset of the value within the scanned buffer
    pub offset: usize,
}

impl<'a> PixField<'a> {
    /// Whether this field carries `tag`
    pub fn is(&self, tag: &str) -> bool {
        self.tag.as_slice() == tag.as_bytes()
    }

    /// Value as text, if it is valid UTF-8
    pub fn value_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.value).ok()
    }
}

/// Single-pass reader over consecutive fields.
///
/// Yields an error at most once, then stops.
#[derive(Debug, Clone)]
pub struct TlvReader<'a> {
    input: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> TlvReader<'a> {
    /// Read fields from the start of `input`
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            done: false,
        }
    }

    /// Offset just past the last field read
    pub fn position(&self) -> usize {
        self.pos
    }

    fn fail(
        &mut self,
        fault: StructuralFault,
        at: usize,
    ) -> Option<Result<PixField<'a>, (StructuralFault, usize)>> {
        self.done = true;
        Some(Err((fault, at)))
    }
}

impl<'a> Iterator for TlvReader<'a> {
    type Item = Result<PixField<'a>, (StructuralFault, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.input.len();
        if self.done || self.pos == n {
            return None;
        }
        if self.pos + 4 > n {
            return self.fail(StructuralFault::TruncatedHeader, self.pos);
        }

        let tag = [self.input[self.pos], self.input[self.pos + 1]];
        let (hi, lo) = (self.input[self.pos + 2], self.input[self.pos + 3]);
        if !hi.is_ascii_digit() || !lo.is_ascii_digit() {
            return self.fail(StructuralFault::InvalidLength, self.pos + 2);
        }

        let len = ((hi - b'0') * 10 + (lo - b'0')) as usize;
        let start = self.pos + 4;
        let end = start + len;
        if end > n {
            return self.fail(StructuralFault::ValueOverrun, start);
        }

        self.pos = end;
        Some(Ok(PixField {
            tag,
            value: &self.input[start..end],
            offset: start,
        }))
    }
}
