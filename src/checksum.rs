//! Rolling remainder checksum
//!
//! The 14-bit repacking leaves the low bits of the final partial unit
//! unused, so bit errors there would otherwise go undetected. This module
//! folds the plaintext into a 32-bit accumulator, embeds the top bits of
//! the accumulator into those unused bits on encode, and re-derives and
//! compares them on decode. The accumulator is carried by the caller across
//! chunks of one logical stream; the fold is per-byte: spread the byte's
//! four 2-bit pairs across the word, add, then complement and rotate.

use crate::codec::REMAINDER_MARKER;
use crate::error::{Base16384Error, Result};

/// Accumulator seed at the start of a stream.
pub const SUM_INIT: u32 = 0x8E29_C213;

/// Right-shift applied to the accumulator before embedding, indexed by the
/// remainder offset. `32 - SUM_SHIFT[offset]` equals the number of unused
/// bits in the final partial unit, `14 * ceil(8r / 14) - 8r`.
const SUM_SHIFT: [u32; 7] = [0, 26, 20, 28, 22, 30, 24];

/// Spreads a byte's four 2-bit pairs to bit offsets 0, 8, 16 and 24.
#[inline]
fn spread(byte: u8) -> u32 {
    let b = byte as u32;
    (b & 0x03) | ((b & 0x0C) << 6) | ((b & 0x30) << 12) | ((b & 0xC0) << 18)
}

/// Folds a plaintext block into the accumulator. Chunking is transparent:
/// `calc_sum(calc_sum(seed, a), b) == calc_sum(seed, ab)`.
pub fn calc_sum(seed: u32, block: &[u8]) -> u32 {
    block
        .iter()
        .fold(seed, |sum, &b| (!sum.wrapping_add(spread(b))).rotate_left(3))
}

/// Number of checksum bits embedded for a remainder of `offset` bytes.
pub fn embedded_bits(offset: u8) -> u32 {
    32 - SUM_SHIFT[offset as usize]
}

/// Embeds the top bits of `sum` into the unused low bits of the final
/// partial unit. `encoded` must end with the remainder marker for `offset`.
///
/// # Panics
///
/// Panics if `offset` is out of 1..=6 or `encoded` does not end with the
/// matching marker.
pub fn embed_sum(sum: u32, offset: u8, encoded: &mut [u8]) {
    let n = check_marker(offset, encoded);
    let shift = SUM_SHIFT[offset as usize];
    let unit = u16::from_be_bytes([encoded[n - 4], encoded[n - 3]]) | (sum >> shift) as u16;
    encoded[n - 4..n - 2].copy_from_slice(&unit.to_be_bytes());
}

/// Compares the checksum bits embedded in the final partial unit against
/// the accumulator recomputed over the decoded plaintext.
pub fn check_sum(sum: u32, offset: u8, encoded: &[u8]) -> Result<()> {
    let n = check_marker(offset, encoded);
    let shift = SUM_SHIFT[offset as usize];
    let mask = (1u16 << (32 - shift)) - 1;
    let embedded = u16::from_be_bytes([encoded[n - 4], encoded[n - 3]]) & mask;
    let computed = (sum >> shift) as u16;
    if embedded != computed {
        return Err(Base16384Error::InvalidDecodingChecksum { embedded, computed });
    }
    Ok(())
}

fn check_marker(offset: u8, encoded: &[u8]) -> usize {
    assert!((1..=6).contains(&offset), "offset out of range");
    let n = encoded.len();
    assert!(
        n >= 4 && encoded[n - 2] == REMAINDER_MARKER && encoded[n - 1] == offset,
        "encoded buffer does not end with the remainder marker"
    );
    n
}
