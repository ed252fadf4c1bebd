// Error taxonomy for patch application.
//
// `PatchError` is what every component returns; `ResultCode` is the closed,
// numeric view of it used at the `apply_patch` boundary. The numeric codes
// and messages are fixed: callers across a language boundary match on them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::bsdiff::header::{HEADER_LEN, Segment};
use crate::compress::inflate::InflateError;

// ---------------------------------------------------------------------------
// Result codes
// ---------------------------------------------------------------------------

/// Caller-visible outcome of one patch application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success,
    OpenOld,
    ReadOld,
    OpenPatch,
    InvalidHeader,
    HeaderCorrupt,
    ControlDecompress,
    DiffDecompress,
    ExtraDecompress,
    CreateNew,
    Alloc,
    CorruptPatch,
    /// Any negative code outside the table.
    Unknown,
}

impl ResultCode {
    /// Every code with a table entry, in numeric order.
    pub const ALL: [ResultCode; 12] = [
        Self::Success,
        Self::OpenOld,
        Self::ReadOld,
        Self::OpenPatch,
        Self::InvalidHeader,
        Self::HeaderCorrupt,
        Self::ControlDecompress,
        Self::DiffDecompress,
        Self::ExtraDecompress,
        Self::CreateNew,
        Self::Alloc,
        Self::CorruptPatch,
    ];

    /// Resolve a numeric code. Non-negative values are success; negative
    /// values outside the table resolve to [`ResultCode::Unknown`].
    pub fn from_code(code: i32) -> Self {
        if code >= 0 {
            return Self::Success;
        }
        match code {
            -1 => Self::OpenOld,
            -2 => Self::ReadOld,
            -3 => Self::OpenPatch,
            -4 => Self::InvalidHeader,
            -5 => Self::HeaderCorrupt,
            -6 => Self::ControlDecompress,
            -7 => Self::DiffDecompress,
            -8 => Self::ExtraDecompress,
            -9 => Self::CreateNew,
            -10 => Self::Alloc,
            -11 => Self::CorruptPatch,
            _ => Self::Unknown,
        }
    }

    /// Numeric value. `Unknown` has no slot in the table and reports `-12`,
    /// the first code past it.
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::OpenOld => -1,
            Self::ReadOld => -2,
            Self::OpenPatch => -3,
            Self::InvalidHeader => -4,
            Self::HeaderCorrupt => -5,
            Self::ControlDecompress => -6,
            Self::DiffDecompress => -7,
            Self::ExtraDecompress => -8,
            Self::CreateNew => -9,
            Self::Alloc => -10,
            Self::CorruptPatch => -11,
            Self::Unknown => -12,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::OpenOld => "Cannot open old file",
            Self::ReadOld => "Cannot read old file",
            Self::OpenPatch => "Cannot open patch file",
            Self::InvalidHeader => "Invalid patch header",
            Self::HeaderCorrupt => "Patch header corrupt",
            Self::ControlDecompress => "Cannot decompress ctrl block",
            Self::DiffDecompress => "Cannot decompress diff block",
            Self::ExtraDecompress => "Cannot decompress extra block",
            Self::CreateNew => "Cannot create new file",
            Self::Alloc => "Memory allocation failed",
            Self::CorruptPatch => "Corrupt patch",
            Self::Unknown => "Unknown error",
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Message for any numeric result code, including codes outside the table.
pub fn describe(code: i32) -> &'static str {
    ResultCode::from_code(code).message()
}

// ---------------------------------------------------------------------------
// PatchError
// ---------------------------------------------------------------------------

/// Failure of one patch application. Always fatal to the call.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("cannot open old file {}: {source}", .path.display())]
    OpenOld {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read old file {}: {source}", .path.display())]
    ReadOld {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Open or read failure on the patch file.
    #[error("cannot open patch file {}: {source}", .path.display())]
    OpenPatch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("patch too small: {len} bytes, header needs {}", HEADER_LEN)]
    PatchTooSmall { len: usize },

    #[error("bad patch magic: {}", escape(.found))]
    BadMagic { found: [u8; 8] },

    #[error(
        "patch header corrupt: control={control_len} diff={diff_len} \
         target={target_size} patch_len={patch_len}"
    )]
    HeaderCorrupt {
        control_len: i64,
        diff_len: i64,
        target_size: i64,
        patch_len: usize,
    },

    #[error("cannot decompress {segment} block: {source}")]
    Decompress {
        segment: Segment,
        #[source]
        source: InflateError,
    },

    #[error("target size {size} exceeds configured limit {limit}")]
    OutputTooLarge { size: u64, limit: u64 },

    #[error("cannot allocate {size} byte output buffer")]
    Alloc { size: u64 },

    #[error(
        "control stream exhausted after {tuples} tuples at output offset \
         {new_cursor} of {target_size}"
    )]
    ControlStreamExhausted {
        tuples: u64,
        new_cursor: i64,
        target_size: i64,
    },

    #[error("control tuple {tuple} out of bounds: {reason}")]
    ReconstructionOverflow { tuple: u64, reason: &'static str },

    #[error("cannot create new file {}: {source}", .path.display())]
    CreateNew {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PatchError {
    /// The caller-visible code for this failure.
    pub fn code(&self) -> ResultCode {
        match self {
            Self::OpenOld { .. } => ResultCode::OpenOld,
            Self::ReadOld { .. } => ResultCode::ReadOld,
            Self::OpenPatch { .. } => ResultCode::OpenPatch,
            Self::PatchTooSmall { .. } | Self::BadMagic { .. } => ResultCode::InvalidHeader,
            Self::HeaderCorrupt { .. } => ResultCode::HeaderCorrupt,
            Self::Decompress { segment, .. } => match segment {
                Segment::Control => ResultCode::ControlDecompress,
                Segment::Diff => ResultCode::DiffDecompress,
                Segment::Extra => ResultCode::ExtraDecompress,
            },
            Self::OutputTooLarge { .. } | Self::Alloc { .. } => ResultCode::Alloc,
            Self::ControlStreamExhausted { .. } | Self::ReconstructionOverflow { .. } => {
                ResultCode::CorruptPatch
            }
            Self::CreateNew { .. } => ResultCode::CreateNew,
        }
    }
}

fn escape(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
