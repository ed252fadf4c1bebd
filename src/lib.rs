//! Oxipatch: BSDIFF40 binary patch application in Rust.
//!
//! The crate provides:
//! - The patch format and reconstruction engine (`bsdiff`)
//! - Gzip segment decompression (`compress`)
//! - In-memory orchestration and inspection (`engine`)
//! - File-oriented helpers and the numeric result-code surface (`io`)
//! - Batch application of independent jobs (`batch`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! let old = std::fs::read("app-1.0.bin").unwrap();
//! let patch = std::fs::read("app-1.0-to-1.1.bsdiff").unwrap();
//! let new = oxipatch::engine::apply(&old, &patch).unwrap();
//! std::fs::write("app-1.1.bin", new).unwrap();
//! ```
//!
//! Or through the result-code surface:
//!
//! ```no_run
//! let code = oxipatch::apply_patch("old.bin", "new.bin", "patch.bsdiff");
//! if code != 0 {
//!     eprintln!("patch failed: {}", oxipatch::describe(code));
//! }
//! ```

pub mod batch;
pub mod bsdiff;
pub mod compress;
pub mod engine;
pub mod error;
pub mod io;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(test)]
mod testutil;

pub use engine::{PatchOptions, apply, apply_with_options};
pub use error::{PatchError, ResultCode, describe};
pub use io::{apply_file, apply_patch};
