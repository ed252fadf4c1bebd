// Patch engine: ties container parsing, segment inflate and reconstruction
// together for in-memory inputs.
//
//   patch bytes --parse--> header + 3 compressed segments
//               --inflate x3--> control / diff / extra streams
//   old bytes + streams --execute--> new bytes
//
// Every intermediate buffer is owned by `apply_with_options` and dropped on
// return, whether the call succeeds or fails.

use log::debug;

use crate::bsdiff::control::{ControlIter, TUPLE_LEN};
use crate::bsdiff::executor::{self, Streams};
use crate::bsdiff::header::{PatchContainer, PatchHeader, Segment};
use crate::compress::inflate::{DEFAULT_CAPACITY_FACTOR, Inflater};
use crate::error::PatchError;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for patch application.
#[derive(Debug, Clone)]
pub struct PatchOptions {
    /// Reject patches whose header declares a larger target.
    pub max_target_size: Option<u64>,
    /// Reject segments that decompress to more than this many bytes.
    pub max_inflated_size: Option<usize>,
    /// Initial inflate buffer, as a multiple of the compressed segment size.
    pub initial_capacity_factor: usize,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            max_target_size: None,
            max_inflated_size: None,
            initial_capacity_factor: DEFAULT_CAPACITY_FACTOR,
        }
    }
}

impl PatchOptions {
    pub fn with_max_target_size(mut self, limit: u64) -> Self {
        self.max_target_size = Some(limit);
        self
    }

    pub fn with_max_inflated_size(mut self, limit: usize) -> Self {
        self.max_inflated_size = Some(limit);
        self
    }

    fn inflater(&self) -> Inflater {
        Inflater::new()
            .with_capacity_factor(self.initial_capacity_factor)
            .with_limit(self.max_inflated_size)
    }
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Apply `patch` to `old`, returning the reconstructed file.
pub fn apply(old: &[u8], patch: &[u8]) -> Result<Vec<u8>, PatchError> {
    apply_with_options(old, patch, &PatchOptions::default())
}

/// Apply with custom options.
pub fn apply_with_options(
    old: &[u8],
    patch: &[u8],
    opts: &PatchOptions,
) -> Result<Vec<u8>, PatchError> {
    let container = PatchContainer::parse(patch)?;
    let header = container.header;
    check_target_limit(&header, opts)?;

    debug!(
        "patch: {} bytes, ctrl {} diff {} extra {} compressed, target {}",
        patch.len(),
        container.control.len(),
        container.diff.len(),
        container.extra.len(),
        header.target_size
    );

    let inflater = opts.inflater();
    let control = inflate_segment(&inflater, &container, Segment::Control)?;
    let diff = inflate_segment(&inflater, &container, Segment::Diff)?;
    let extra = inflate_segment(&inflater, &container, Segment::Extra)?;

    executor::apply(
        old,
        &header,
        Streams {
            control: &control,
            diff: &diff,
            extra: &extra,
        },
    )
}

fn check_target_limit(header: &PatchHeader, opts: &PatchOptions) -> Result<(), PatchError> {
    match opts.max_target_size {
        Some(limit) if header.target_len() > limit => Err(PatchError::OutputTooLarge {
            size: header.target_len(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// Inflate one segment. A zero-length extra segment is the empty stream.
fn inflate_segment(
    inflater: &Inflater,
    container: &PatchContainer<'_>,
    segment: Segment,
) -> Result<Vec<u8>, PatchError> {
    let input = container.segment(segment);
    if segment == Segment::Extra && input.is_empty() {
        return Ok(Vec::new());
    }
    let out = inflater
        .inflate(input)
        .map_err(|source| PatchError::Decompress { segment, source })?;
    debug!("{segment}: {} -> {} bytes", input.len(), out.len());
    Ok(out)
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// Summary of a patch, for diagnostics.
#[derive(Debug, Clone)]
pub struct PatchInfo {
    pub header: PatchHeader,
    pub patch_len: usize,
    /// Compressed sizes of control, diff, extra.
    pub compressed: [usize; 3],
    /// Decompressed sizes of control, diff, extra.
    pub inflated: [usize; 3],
    /// Whole control tuples in the control stream.
    pub tuples: usize,
    /// Control bytes past the last whole tuple.
    pub trailing_control_bytes: usize,
    /// Sum of copy lengths (diff bytes consumed by a full application).
    pub total_copy: i128,
    /// Sum of insert lengths (extra bytes consumed by a full application).
    pub total_insert: i128,
}

/// Parse and inflate a patch without applying it.
pub fn inspect(patch: &[u8], opts: &PatchOptions) -> Result<PatchInfo, PatchError> {
    let (info, _) = inspect_with_control(patch, opts)?;
    Ok(info)
}

/// Like [`inspect`], also returning the decompressed control stream.
pub fn inspect_with_control(
    patch: &[u8],
    opts: &PatchOptions,
) -> Result<(PatchInfo, Vec<u8>), PatchError> {
    let container = PatchContainer::parse(patch)?;
    let inflater = opts.inflater();

    let mut compressed = [0usize; 3];
    let mut inflated = [0usize; 3];
    let mut control = Vec::new();
    for (i, segment) in Segment::ALL.into_iter().enumerate() {
        let data = inflate_segment(&inflater, &container, segment)?;
        compressed[i] = container.segment(segment).len();
        inflated[i] = data.len();
        if segment == Segment::Control {
            control = data;
        }
    }

    let mut iter = ControlIter::new(&control);
    let (mut tuples, mut total_copy, mut total_insert) = (0usize, 0i128, 0i128);
    for t in iter.by_ref() {
        tuples += 1;
        total_copy += i128::from(t.copy_len);
        total_insert += i128::from(t.insert_len);
    }
    let trailing_control_bytes = iter.remainder().len();
    debug_assert!(trailing_control_bytes < TUPLE_LEN);

    let info = PatchInfo {
        header: container.header,
        patch_len: patch.len(),
        compressed,
        inflated,
        tuples,
        trailing_control_bytes,
        total_copy,
        total_insert,
    };
    Ok((info, control))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultCode;
    use crate::testutil::{build_patch, gzip, raw_header};

    #[test]
    fn apply_identity() {
        let patch = build_patch(8, &[(8, 0, 0)], &[0; 8], b"");
        assert_eq!(apply(b"ABCDEFGH", &patch).unwrap(), b"ABCDEFGH");
    }

    #[test]
    fn apply_mixed_tuples() {
        // "hello world" -> "hello, brave world"
        let old = b"hello world";
        let patch = build_patch(
            18,
            &[(5, 7, 0), (6, 0, 0)],
            &[0; 11],
            b", brave",
        );
        assert_eq!(apply(old, &patch).unwrap(), b"hello, brave world");
    }

    #[test]
    fn zero_length_extra_segment_is_empty_stream() {
        let patch = build_patch(3, &[(3, 0, 0)], &[1, 1, 1], b"");
        assert_eq!(apply(b"abc", &patch).unwrap(), b"bcd");
    }

    #[test]
    fn empty_control_segment_fails_decompress() {
        let patch = raw_header(0, 0, 0);
        let err = apply(b"", &patch).unwrap_err();
        assert_eq!(err.code(), ResultCode::ControlDecompress);
    }

    #[test]
    fn bad_diff_segment_is_reported_as_diff() {
        let control = gzip(&crate::testutil::control_stream(&[(1, 0, 0)]));
        let diff = b"not gzip".to_vec();
        let mut patch = raw_header(control.len() as i64, diff.len() as i64, 1);
        patch.extend_from_slice(&control);
        patch.extend_from_slice(&diff);
        let err = apply(b"a", &patch).unwrap_err();
        assert_eq!(err.code(), ResultCode::DiffDecompress);
    }

    #[test]
    fn bad_extra_segment_is_reported_as_extra() {
        let mut patch = build_patch(1, &[(0, 1, 0)], b"", b"x");
        let last = patch.len() - 1;
        patch.truncate(last);
        let err = apply(b"", &patch).unwrap_err();
        assert_eq!(err.code(), ResultCode::ExtraDecompress);
    }

    #[test]
    fn target_limit() {
        let patch = build_patch(5, &[(0, 5, 0)], b"", b"HELLO");
        let opts = PatchOptions::default().with_max_target_size(4);
        let err = apply_with_options(b"", &patch, &opts).unwrap_err();
        assert!(matches!(err, PatchError::OutputTooLarge { size: 5, limit: 4 }));
        assert_eq!(err.code(), ResultCode::Alloc);

        let opts = PatchOptions::default().with_max_target_size(5);
        assert_eq!(apply_with_options(b"", &patch, &opts).unwrap(), b"HELLO");
    }

    #[test]
    fn inflated_limit() {
        let patch = build_patch(0, &[], &[0; 1000], b"");
        let opts = PatchOptions::default().with_max_inflated_size(100);
        let err = apply_with_options(b"", &patch, &opts).unwrap_err();
        assert_eq!(err.code(), ResultCode::DiffDecompress);
    }

    #[test]
    fn inspect_reports_sizes_and_tuples() {
        let patch = build_patch(7, &[(2, 3, -1), (2, 0, 4)], &[0; 4], b"xyz");
        let info = inspect(&patch, &PatchOptions::default()).unwrap();
        assert_eq!(info.header.target_size, 7);
        assert_eq!(info.patch_len, patch.len());
        assert_eq!(info.inflated, [48, 4, 3]);
        assert_eq!(info.tuples, 2);
        assert_eq!(info.trailing_control_bytes, 0);
        assert_eq!(info.total_copy, 4);
        assert_eq!(info.total_insert, 3);
        assert_eq!(info.compressed.iter().sum::<usize>() + 32, patch.len());
    }
}
