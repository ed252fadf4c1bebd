// File-level patch application.
//
// `apply_file()` reads the old file and the patch fully into memory, runs the
// engine, and only then creates the new file, so a failed reconstruction
// never leaves a partial output behind. `apply_patch()` is the numeric
// result-code surface for callers across a language boundary.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use log::{info, warn};

use crate::engine::{self, PatchOptions};
use crate::error::{PatchError, ResultCode};

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `apply_file()`.
#[derive(Debug, Clone)]
pub struct ApplyStats {
    /// Old file size in bytes.
    pub old_size: u64,
    /// Patch file size in bytes.
    pub patch_size: u64,
    /// Reconstructed file size in bytes.
    pub new_size: u64,
    /// SHA-256 of the new file (if `file-io` feature is enabled).
    pub new_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// apply_file
// ---------------------------------------------------------------------------

/// Apply the patch at `patch_path` to `old_path`, writing `new_path`.
pub fn apply_file(
    old_path: &Path,
    patch_path: &Path,
    new_path: &Path,
    opts: &PatchOptions,
) -> Result<ApplyStats, PatchError> {
    let old = read_old(old_path)?;
    let patch = read_patch(patch_path)?;

    let new_data = engine::apply_with_options(&old, &patch, opts)?;
    write_new(new_path, &new_data)?;

    #[cfg(feature = "file-io")]
    let new_sha256 = Some(sha2::Sha256::digest(&new_data).into());
    #[cfg(not(feature = "file-io"))]
    let new_sha256: Option<[u8; 32]> = None;

    Ok(ApplyStats {
        old_size: old.len() as u64,
        patch_size: patch.len() as u64,
        new_size: new_data.len() as u64,
        new_sha256,
    })
}

fn read_old(path: &Path) -> Result<Vec<u8>, PatchError> {
    let mut file = File::open(path).map_err(|source| PatchError::OpenOld {
        path: path.to_path_buf(),
        source,
    })?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|source| PatchError::ReadOld {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(data)
}

fn read_patch(path: &Path) -> Result<Vec<u8>, PatchError> {
    std::fs::read(path).map_err(|source| PatchError::OpenPatch {
        path: path.to_path_buf(),
        source,
    })
}

fn write_new(path: &Path, data: &[u8]) -> Result<(), PatchError> {
    let err = |source| PatchError::CreateNew {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(err)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, file);
    writer.write_all(data).map_err(err)?;
    writer.flush().map_err(err)
}

// ---------------------------------------------------------------------------
// Result-code surface
// ---------------------------------------------------------------------------

/// Apply a patch between files and report a numeric result code: `0` on
/// success, a negative [`ResultCode`] value on failure. Resolve codes to
/// text with [`crate::describe`].
pub fn apply_patch(
    old_path: impl AsRef<Path>,
    new_path: impl AsRef<Path>,
    patch_path: impl AsRef<Path>,
) -> i32 {
    apply_patch_with_options(old_path, new_path, patch_path, &PatchOptions::default())
}

/// Like [`apply_patch`], with custom options.
pub fn apply_patch_with_options(
    old_path: impl AsRef<Path>,
    new_path: impl AsRef<Path>,
    patch_path: impl AsRef<Path>,
    opts: &PatchOptions,
) -> i32 {
    let (old_path, new_path, patch_path) =
        (old_path.as_ref(), new_path.as_ref(), patch_path.as_ref());
    info!(
        "applying patch: {} + {} -> {}",
        old_path.display(),
        patch_path.display(),
        new_path.display()
    );

    match apply_file(old_path, patch_path, new_path, opts) {
        Ok(stats) => {
            info!("patch applied: {} bytes written", stats.new_size);
            ResultCode::Success.code()
        }
        Err(e) => {
            let code = e.code();
            warn!("patch failed with error {} ({code}): {e}", code.code());
            code.code()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
