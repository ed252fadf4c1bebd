// Gzip inflate for patch segments.
//
// The decompressed size of a segment is not recorded anywhere in the patch,
// so the output buffer starts at a multiple of the compressed size and
// doubles whenever the decompressor fills it. Reaching the gzip end-of-stream
// marker is the only success condition; running out of input first is
// `Truncated`.

use flate2::{Decompress, DecompressError, FlushDecompress, Status};
use log::debug;
use thiserror::Error;

/// Default starting capacity, as a multiple of the compressed length.
pub const DEFAULT_CAPACITY_FACTOR: usize = 4;

/// Smallest buffer ever allocated, so tiny inputs do not grow byte by byte.
const MIN_CAPACITY: usize = 64;

/// zlib window bits for a gzip wrapper.
const GZIP_WINDOW_BITS: u8 = 15;

#[derive(Debug, Error)]
pub enum InflateError {
    #[error("malformed compressed stream: {0}")]
    Malformed(#[from] DecompressError),

    #[error("compressed stream ends before end-of-stream marker")]
    Truncated,

    #[error("decompressed size exceeds limit of {limit} bytes")]
    LimitExceeded { limit: usize },

    #[error("cannot grow output buffer to {size} bytes")]
    Alloc { size: usize },
}

// ---------------------------------------------------------------------------
// Inflater
// ---------------------------------------------------------------------------

/// Gzip decompressor settings shared by the three segments of one patch.
#[derive(Debug, Clone, Copy)]
pub struct Inflater {
    capacity_factor: usize,
    limit: Option<usize>,
}

impl Default for Inflater {
    fn default() -> Self {
        Self {
            capacity_factor: DEFAULT_CAPACITY_FACTOR,
            limit: None,
        }
    }
}

impl Inflater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting capacity multiplier (clamped to at least 1).
    pub fn with_capacity_factor(mut self, factor: usize) -> Self {
        self.capacity_factor = factor.max(1);
        self
    }

    /// Fail any segment whose decompressed size exceeds `limit`.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Decompress one complete gzip stream.
    pub fn inflate(&self, input: &[u8]) -> Result<Vec<u8>, InflateError> {
        let hint = input.len().saturating_mul(self.capacity_factor);
        inflate_with_limit(input, hint, self.limit)
    }
}

/// Decompress one complete gzip stream with no size limit.
///
/// `capacity_hint` is the initial output capacity; the buffer doubles from
/// there as needed.
pub fn inflate(input: &[u8], capacity_hint: usize) -> Result<Vec<u8>, InflateError> {
    inflate_with_limit(input, capacity_hint, None)
}

fn inflate_with_limit(
    input: &[u8],
    capacity_hint: usize,
    limit: Option<usize>,
) -> Result<Vec<u8>, InflateError> {
    let mut z = Decompress::new_gzip(GZIP_WINDOW_BITS);
    let mut out = Vec::new();
    reserve(&mut out, capacity_hint.max(MIN_CAPACITY), limit)?;

    loop {
        if out.len() == out.capacity() {
            // Double, bounded so the buffer never holds more than limit + 1.
            let grow = out.capacity().max(MIN_CAPACITY);
            reserve(&mut out, grow, limit)?;
        }

        let before_in = z.total_in();
        let before_out = z.total_out();
        let consumed = before_in as usize;
        let status = z.decompress_vec(&input[consumed..], &mut out, FlushDecompress::None)?;

        if let Some(limit) = limit
            && out.len() > limit
        {
            return Err(InflateError::LimitExceeded { limit });
        }

        match status {
            Status::StreamEnd => {
                let trailing = input.len() - z.total_in() as usize;
                if trailing > 0 {
                    debug!("ignoring {trailing} bytes after gzip end-of-stream");
                }
                return Ok(out);
            }
            Status::Ok | Status::BufError => {
                let progressed = z.total_in() != before_in || z.total_out() != before_out;
                if !progressed && out.len() < out.capacity() {
                    return Err(InflateError::Truncated);
                }
            }
        }
    }
}

/// Grow spare capacity by `additional`, capped at `limit + 1` total.
fn reserve(out: &mut Vec<u8>, additional: usize, limit: Option<usize>) -> Result<(), InflateError> {
    let additional = match limit {
        Some(limit) => additional.min(limit.saturating_add(1).saturating_sub(out.len())),
        None => additional,
    };
    if additional == 0 {
        return Err(InflateError::LimitExceeded {
            limit: limit.unwrap_or(0),
        });
    }
    out.try_reserve_exact(additional)
        .map_err(|_| InflateError::Alloc {
            size: out.len().saturating_add(additional),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
