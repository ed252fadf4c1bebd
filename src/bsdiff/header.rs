// BSDIFF40 patch container: 32-byte header followed by three gzip segments.
//
//   offset  size  field
//   0       8     magic "BSDIFF40"
//   8       8     compressed control length (sign-magnitude)
//   16      8     compressed diff length    (sign-magnitude)
//   24      8     target (new) file size    (sign-magnitude)
//   32      ...   control segment, diff segment, extra segment (remainder)
//
// Parsing only validates and slices; nothing is decompressed here.

use super::varint::{OFFSET_LEN, decode_offset};
use crate::error::PatchError;

pub const BSDIFF_MAGIC: [u8; 8] = *b"BSDIFF40";

/// Size of the fixed header.
pub const HEADER_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// One of the three independently compressed streams in a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Control,
    Diff,
    Extra,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Control, Segment::Diff, Segment::Extra];

    pub fn name(self) -> &'static str {
        match self {
            Segment::Control => "ctrl",
            Segment::Diff => "diff",
            Segment::Extra => "extra",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Decoded and validated header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchHeader {
    pub magic: [u8; 8],
    pub control_len: i64,
    pub diff_len: i64,
    pub target_size: i64,
}

impl PatchHeader {
    /// Decode and validate the header against the total patch length.
    pub fn decode(patch: &[u8]) -> Result<Self, PatchError> {
        if patch.len() < HEADER_LEN {
            return Err(PatchError::PatchTooSmall { len: patch.len() });
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&patch[..8]);
        if magic != BSDIFF_MAGIC {
            return Err(PatchError::BadMagic { found: magic });
        }

        let control_len = header_field(patch, 8);
        let diff_len = header_field(patch, 16);
        let target_size = header_field(patch, 24);

        let hdr = Self {
            magic,
            control_len,
            diff_len,
            target_size,
        };
        if hdr.segments_end().is_none_or(|end| end > patch.len()) {
            return Err(PatchError::HeaderCorrupt {
                control_len,
                diff_len,
                target_size,
                patch_len: patch.len(),
            });
        }
        Ok(hdr)
    }

    /// Offset one past the diff segment, or `None` if any field is negative
    /// or the sum does not fit in `usize`.
    fn segments_end(&self) -> Option<usize> {
        if self.target_size < 0 {
            return None;
        }
        let control = usize::try_from(self.control_len).ok()?;
        let diff = usize::try_from(self.diff_len).ok()?;
        HEADER_LEN.checked_add(control)?.checked_add(diff)
    }

    /// Target size as `u64`; validated non-negative by `decode`.
    pub fn target_len(&self) -> u64 {
        self.target_size.max(0) as u64
    }
}

/// Decode the integer at `at`; the caller has checked `patch` holds a full
/// header.
fn header_field(patch: &[u8], at: usize) -> i64 {
    let mut word = [0u8; OFFSET_LEN];
    word.copy_from_slice(&patch[at..at + OFFSET_LEN]);
    decode_offset(word)
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// A parsed patch: header plus borrowed compressed segments.
#[derive(Debug, Clone, Copy)]
pub struct PatchContainer<'a> {
    pub header: PatchHeader,
    pub control: &'a [u8],
    pub diff: &'a [u8],
    pub extra: &'a [u8],
}

impl<'a> PatchContainer<'a> {
    /// Validate the header and locate the three segments inside `patch`.
    pub fn parse(patch: &'a [u8]) -> Result<Self, PatchError> {
        let header = PatchHeader::decode(patch)?;
        // `decode` guarantees both lengths are non-negative and in range.
        let control_end = HEADER_LEN + header.control_len as usize;
        let diff_end = control_end + header.diff_len as usize;

        Ok(Self {
            header,
            control: &patch[HEADER_LEN..control_end],
            diff: &patch[control_end..diff_end],
            extra: &patch[diff_end..],
        })
    }

    /// Compressed bytes of one segment.
    pub fn segment(&self, segment: Segment) -> &'a [u8] {
        match segment {
            Segment::Control => self.control,
            Segment::Diff => self.diff,
            Segment::Extra => self.extra,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
