// Segment decompression.
//
// - `inflate` — gzip inflate into a growable buffer, one call per segment

pub mod inflate;

pub use inflate::{InflateError, Inflater, inflate};
