//! Variable-length unsigned integer encoding (7b/8b).
//!
//! Each byte carries seven data bits; the high bit is set on every byte
//! except the last. High-order groups come first, so concatenating the data
//! bits left to right yields the value:
//!
//! ```text
//!    1 → [0 0000001]
//!   33 → [0 0100001]
//!  129 → [1 0000001] [0 0000001]
//! 2000 → [1 0001111] [0 1010000]
//! ```

/// Maximum encoded length of a `u64` (10 groups of 7 bits).
pub const MAX_ENCODED_UINT_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const DATA_MASK: u8 = 0x7f;

/// Encodes `val` into `buf`, returning the number of bytes written.
pub fn encode_uint(buf: &mut [u8; MAX_ENCODED_UINT_LEN], val: u64) -> usize {
    let bits = 64 - val.leading_zeros() as usize;
    let groups = bits.div_ceil(7).max(1);

    for (i, byte) in buf.iter_mut().take(groups).enumerate() {
        let shift = 7 * (groups - 1 - i);
        let data = ((val >> shift) as u8) & DATA_MASK;
        *byte = if i + 1 < groups {
            data | CONTINUATION
        } else {
            data
        };
    }
    groups
}

/// Appends the encoding of `val` to `out`.
pub fn encode_uint_to(out: &mut Vec<u8>, val: u64) {
    let mut buf = [0u8; MAX_ENCODED_UINT_LEN];
    let len = encode_uint(&mut buf, val);
    out.extend_from_slice(&buf[..len]);
}

/// Decodes an integer from the front of `input`.
///
/// Returns the value and the number of bytes consumed, or `None` if `input`
/// ends before the integer does or the encoding does not fit in a `u64`.
pub fn decode_uint(input: &[u8]) -> Option<(u64, usize)> {
    let mut val: u64 = 0;
    for (i, &byte) in input.iter().take(MAX_ENCODED_UINT_LEN).enumerate() {
        if val > u64::MAX >> 7 {
            return None;
        }
        val = (val << 7) | u64::from(byte & DATA_MASK);
        if byte & CONTINUATION == 0 {
            return Some((val, i + 1));
        }
    }
    None
}
