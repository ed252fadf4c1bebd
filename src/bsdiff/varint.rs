// BSDIFF40 signed 64-bit integer codec.
//
// Every integer in the patch header and in the control stream is stored as
// 8 bytes of sign-magnitude: bytes 0..7 hold the little-endian magnitude,
// bit 7 of byte 7 is the sign. This is NOT two's complement; `-1` is
// `01 00 00 00 00 00 00 80`, not `FF FF FF FF FF FF FF FF`.

/// Width of one encoded integer.
pub const OFFSET_LEN: usize = 8;

/// Sign bit, as it sits in the full little-endian word.
const SIGN_BIT: u64 = 1 << 63;

/// Decode one sign-magnitude integer.
///
/// The magnitude uses at most 63 bits, so negation never overflows. A set
/// sign bit over a zero magnitude ("negative zero") decodes to `0`.
#[inline]
pub fn decode_offset(buf: [u8; OFFSET_LEN]) -> i64 {
    let word = u64::from_le_bytes(buf);
    let magnitude = (word & !SIGN_BIT) as i64;
    if word & SIGN_BIT != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Decode the integer starting at `pos` in `data`.
///
/// Returns `None` when fewer than 8 bytes remain.
#[inline]
pub fn read_offset(data: &[u8], pos: usize) -> Option<i64> {
    let end = pos.checked_add(OFFSET_LEN)?;
    let bytes: [u8; OFFSET_LEN] = data.get(pos..end)?.try_into().ok()?;
    Some(decode_offset(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
