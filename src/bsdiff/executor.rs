// BSDIFF40 reconstruction loop.
//
// Each control tuple runs three phases against the old file and the three
// decompressed streams:
//   1. copy: copy_len bytes of diff[d..] added (mod 256) to old[o..]
//   2. insert: insert_len bytes copied verbatim from extra[e..]
//   3. seek: old cursor moved by seek_delta (may be negative)
//
// Old-file positions outside [0, old.len()) read as zero, so the diff byte
// is emitted unchanged. Every length and cursor is checked before use; the
// output buffer is handed back only when it holds exactly target_size bytes.

use log::{debug, trace};

use super::control::{ControlTuple, TUPLE_LEN};
use super::header::PatchHeader;
use crate::error::PatchError;

/// Borrowed control/diff/extra streams, already decompressed.
#[derive(Debug, Clone, Copy)]
pub struct Streams<'a> {
    pub control: &'a [u8],
    pub diff: &'a [u8],
    pub extra: &'a [u8],
}

/// Rebuild the target described by `header` from `old` and `streams`.
pub fn apply(old: &[u8], header: &PatchHeader, streams: Streams<'_>) -> Result<Vec<u8>, PatchError> {
    let mut rec = Reconstruction::new(old, header.target_size, streams)?;
    while !rec.is_complete() {
        rec.step()?;
    }
    debug!(
        "reconstructed {} bytes from {} control tuples (diff {}/{}, extra {}/{})",
        rec.output.len(),
        rec.tuples,
        rec.diff_pos,
        streams.diff.len(),
        rec.extra_pos,
        streams.extra.len()
    );
    Ok(rec.output)
}

// ---------------------------------------------------------------------------
// Reconstruction state
// ---------------------------------------------------------------------------

/// Cursor state for one reconstruction. `output.len()` is the new cursor.
struct Reconstruction<'a> {
    old: &'a [u8],
    streams: Streams<'a>,
    target_size: i64,
    target_len: usize,
    output: Vec<u8>,
    old_pos: i64,
    control_pos: usize,
    diff_pos: usize,
    extra_pos: usize,
    tuples: u64,
}

impl<'a> Reconstruction<'a> {
    fn new(old: &'a [u8], target_size: i64, streams: Streams<'a>) -> Result<Self, PatchError> {
        let size = target_size.max(0) as u64;
        let target_len = usize::try_from(target_size).map_err(|_| PatchError::Alloc { size })?;
        let mut output = Vec::new();
        output
            .try_reserve_exact(target_len)
            .map_err(|_| PatchError::Alloc { size })?;

        Ok(Self {
            old,
            streams,
            target_size,
            target_len,
            output,
            old_pos: 0,
            control_pos: 0,
            diff_pos: 0,
            extra_pos: 0,
            tuples: 0,
        })
    }

    #[inline]
    fn is_complete(&self) -> bool {
        self.output.len() == self.target_len
    }

    /// Decode and run one control tuple.
    fn step(&mut self) -> Result<(), PatchError> {
        let tuple = ControlTuple::read(self.streams.control, self.control_pos).ok_or_else(|| {
            PatchError::ControlStreamExhausted {
                tuples: self.tuples,
                new_cursor: self.output.len() as i64,
                target_size: self.target_size,
            }
        })?;
        self.control_pos += TUPLE_LEN;
        trace!("tuple {}: {tuple}", self.tuples);

        self.copy_phase(tuple.copy_len)?;
        self.insert_phase(tuple.insert_len)?;
        self.old_pos = self
            .old_pos
            .checked_add(tuple.seek_delta)
            .ok_or_else(|| self.overflow("old cursor overflow on seek"))?;

        self.tuples += 1;
        Ok(())
    }

    fn copy_phase(&mut self, copy_len: i64) -> Result<(), PatchError> {
        let len = usize::try_from(copy_len).map_err(|_| self.overflow("negative copy length"))?;
        if len > self.target_len - self.output.len() {
            return Err(self.overflow("copy past end of target"));
        }
        if len > self.streams.diff.len() - self.diff_pos {
            return Err(self.overflow("copy past end of diff stream"));
        }
        let old_end = self
            .old_pos
            .checked_add(copy_len)
            .ok_or_else(|| self.overflow("old cursor overflow on copy"))?;

        let diff = &self.streams.diff[self.diff_pos..self.diff_pos + len];
        add_old(&mut self.output, diff, self.old, self.old_pos);

        self.diff_pos += len;
        self.old_pos = old_end;
        Ok(())
    }

    fn insert_phase(&mut self, insert_len: i64) -> Result<(), PatchError> {
        let len =
            usize::try_from(insert_len).map_err(|_| self.overflow("negative insert length"))?;
        if len > self.target_len - self.output.len() {
            return Err(self.overflow("insert past end of target"));
        }
        if len > self.streams.extra.len() - self.extra_pos {
            return Err(self.overflow("insert past end of extra stream"));
        }

        self.output
            .extend_from_slice(&self.streams.extra[self.extra_pos..self.extra_pos + len]);
        self.extra_pos += len;
        Ok(())
    }

    fn overflow(&self, reason: &'static str) -> PatchError {
        PatchError::ReconstructionOverflow {
            tuple: self.tuples,
            reason,
        }
    }
}

/// Append `diff[i] + old[old_pos + i]` for each `i`, treating old positions
/// outside the old file as zero.
///
/// The caller guarantees `old_pos + diff.len()` does not overflow.
fn add_old(output: &mut Vec<u8>, diff: &[u8], old: &[u8], old_pos: i64) {
    let start = old_pos;
    let end = old_pos + diff.len() as i64;
    let lo = start.max(0);
    let hi = end.min(old.len() as i64);

    if lo >= hi {
        output.extend_from_slice(diff);
        return;
    }

    let head = (lo - start) as usize;
    let mid = (hi - lo) as usize;
    let old = &old[lo as usize..hi as usize];

    output.extend_from_slice(&diff[..head]);
    output.extend(
        diff[head..head + mid]
            .iter()
            .zip(old)
            .map(|(&d, &o)| d.wrapping_add(o)),
    );
    output.extend_from_slice(&diff[head + mid..]);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
