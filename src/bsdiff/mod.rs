// BSDIFF40 patch format.
//
// # Modules
//
// - `varint`: 8-byte sign-magnitude integers used by header and control stream
// - `header`: 32-byte header parsing and segment location
// - `control`: control tuple decoding and iteration
// - `executor`: reconstruction of the target from old file + streams

pub mod control;
pub mod executor;
pub mod header;
pub mod varint;

pub use control::{ControlIter, ControlTuple, TUPLE_LEN};
pub use executor::{Streams, apply};
pub use header::{BSDIFF_MAGIC, HEADER_LEN, PatchContainer, PatchHeader, Segment};
pub use varint::decode_offset;
