// Control tuples: the instruction stream of a BSDIFF40 patch.
//
// The decompressed control segment is a flat run of 24-byte records, each
// three sign-magnitude integers: copy_len, insert_len, seek_delta.

use super::varint::{OFFSET_LEN, read_offset};

/// Encoded size of one tuple.
pub const TUPLE_LEN: usize = 3 * OFFSET_LEN;

/// One reconstruction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlTuple {
    /// Bytes produced by adding diff bytes to old bytes.
    pub copy_len: i64,
    /// Bytes copied verbatim from the extra stream.
    pub insert_len: i64,
    /// Old-cursor adjustment applied after the tuple.
    pub seek_delta: i64,
}

impl ControlTuple {
    /// Decode the tuple starting at `pos`, or `None` if fewer than
    /// [`TUPLE_LEN`] bytes remain.
    #[inline]
    pub fn read(control: &[u8], pos: usize) -> Option<Self> {
        if control.len().checked_sub(pos)? < TUPLE_LEN {
            return None;
        }
        Some(Self {
            copy_len: read_offset(control, pos)?,
            insert_len: read_offset(control, pos + OFFSET_LEN)?,
            seek_delta: read_offset(control, pos + 2 * OFFSET_LEN)?,
        })
    }
}

impl std::fmt::Display for ControlTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "copy {} insert {} seek {:+}",
            self.copy_len, self.insert_len, self.seek_delta
        )
    }
}

// ---------------------------------------------------------------------------
// Iterator (for inspection/debugging)
// ---------------------------------------------------------------------------

/// Walk every whole tuple in a decompressed control stream.
///
/// Trailing bytes that do not form a full tuple are reported by
/// [`ControlIter::remainder`] once iteration ends.
pub struct ControlIter<'a> {
    control: &'a [u8],
    pos: usize,
}

impl<'a> ControlIter<'a> {
    pub fn new(control: &'a [u8]) -> Self {
        Self { control, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remainder(&self) -> &'a [u8] {
        &self.control[self.pos..]
    }
}

impl Iterator for ControlIter<'_> {
    type Item = ControlTuple;

    fn next(&mut self) -> Option<ControlTuple> {
        let tuple = ControlTuple::read(self.control, self.pos)?;
        self.pos += TUPLE_LEN;
        Some(tuple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.control.len() - self.pos) / TUPLE_LEN;
        (n, Some(n))
    }
}

impl ExactSizeIterator for ControlIter<'_> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
