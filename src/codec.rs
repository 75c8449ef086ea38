//! Bit-repacking transcoder core
//!
//! Maps every 7 plaintext bytes (56 bits) onto four big-endian 16-bit code
//! units. The 56 bits are cut into four consecutive 14-bit fields and each
//! field is offset by [`UNIT_BIAS`], which places every unit in
//! U+4E00..=U+8DFF when the output is read as UTF-16BE. A trailing group of
//! 1..=6 bytes is packed into `ceil(8r / 14)` units, zero-padded, and
//! terminated by the 2-byte remainder marker `(0x3D, r)`.
//!
//! Two variants are exposed for each direction: the bounds-checked functions
//! ([`encode`], [`decode`], and their `_into` forms) never touch memory past
//! the logical input end and are the default; [`encode_unchecked`] and
//! [`decode_unchecked`] reproduce the wide-word fast path of the reference
//! implementation and require the caller to guarantee readable slack past
//! the logical end.

use crate::error::{Base16384Error, Result};

/// Added to every 14-bit field to form a code unit (U+4E00..=U+8DFF).
pub const UNIT_BIAS: u16 = 0x4E00;

/// First byte of the 2-byte remainder marker, `'='`.
pub const REMAINDER_MARKER: u8 = 0x3D;

/// 16-bit units needed to carry `r` leftover bytes: `ceil(8r / 14)`.
const TAIL_UNITS: [usize; 7] = [0, 1, 2, 2, 3, 3, 4];

/// Encoded bytes appended for `r` leftover bytes, remainder marker included.
const TAIL_BYTES: [usize; 7] = [0, 4, 6, 6, 8, 8, 10];

/// Exact encoded length for a plaintext of `n` bytes.
///
/// The remainder marker, when present, occupies the last 2 of the returned
/// bytes. No safety slack is included.
pub fn encoded_len(n: usize) -> usize {
    n / 7 * 8 + TAIL_BYTES[n % 7]
}

/// Exact decoded length for an encoded input of `n` bytes whose remainder
/// marker carries `offset` (0 when no marker is present).
///
/// Fails with [`Base16384Error::InvalidInputLength`] when `offset` is out of
/// 0..=6 or `n` cannot be the length of a well-formed encoding for it.
pub fn decoded_len(n: usize, offset: u8) -> Result<usize> {
    if offset > 6 {
        return Err(Base16384Error::InvalidInputLength { len: n, offset });
    }
    let tail = TAIL_BYTES[offset as usize];
    if n < tail || (n - tail) % 8 != 0 {
        return Err(Base16384Error::InvalidInputLength { len: n, offset });
    }
    Ok((n - tail) / 8 * 7 + offset as usize)
}

/// Loads up to 7 bytes into the top of a 64-bit window, zero-padded.
#[inline]
fn load_window(bytes: &[u8]) -> u64 {
    let mut padded = [0u8; 8];
    padded[..bytes.len()].copy_from_slice(bytes);
    u64::from_be_bytes(padded)
}

/// Emits the first `units` 14-bit fields of `window` as biased big-endian
/// code units. `out` must be exactly `2 * units` bytes.
#[inline]
fn emit_units(window: u64, units: usize, out: &mut [u8]) {
    for (j, slot) in out.chunks_exact_mut(2).take(units).enumerate() {
        let field = ((window >> (50 - 14 * j)) & 0x3FFF) as u16;
        slot.copy_from_slice(&(UNIT_BIAS + field).to_be_bytes());
    }
}

/// Reassembles biased code units back into a 64-bit plaintext window.
/// Fields are extracted per unit so that garbage beyond the meaningful
/// units (marker bytes, embedded checksum bits) cannot bleed across lanes.
#[inline]
fn absorb_units(pairs: &[u8]) -> u64 {
    let mut window = 0u64;
    for (j, pair) in pairs.chunks_exact(2).enumerate() {
        let field = u16::from_be_bytes([pair[0], pair[1]]).wrapping_sub(UNIT_BIAS) & 0x3FFF;
        window |= (field as u64) << (50 - 14 * j);
    }
    window
}

/// Encodes `data`, returning a buffer of exactly `encoded_len(data.len())`
/// bytes. Bounds-checked: the trailing partial group is staged through a
/// zero-padded scratch window.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; encoded_len(data.len())];
    let written = encode_into(data, &mut out);
    debug_assert_eq!(written, out.len());
    out
}

/// Encodes `data` into a caller-supplied buffer of at least
/// `encoded_len(data.len())` bytes, returning the number of bytes written.
///
/// # Panics
///
/// Panics if `out` is too small.
pub fn encode_into(data: &[u8], out: &mut [u8]) -> usize {
    let outlen = encoded_len(data.len());
    assert!(out.len() >= outlen, "output buffer too small");
    let r = data.len() % 7;
    let mut o = 0;
    for group in data.chunks_exact(7) {
        emit_units(load_window(group), 4, &mut out[o..o + 8]);
        o += 8;
    }
    if r != 0 {
        let units = TAIL_UNITS[r];
        let tail = &data[data.len() - r..];
        emit_units(load_window(tail), units, &mut out[o..o + 2 * units]);
        o += 2 * units;
        out[o] = REMAINDER_MARKER;
        out[o + 1] = r as u8;
        o += 2;
    }
    o
}

/// Reads the trailing remainder marker, if any, and returns
/// `(offset, decoded length)` after validating the input shape.
fn probe_marker(units: &[u8]) -> Result<(u8, usize)> {
    let n = units.len();
    if n == 0 {
        return Ok((0, 0));
    }
    if n < 2 {
        return Err(Base16384Error::InvalidInputLength { len: n, offset: 0 });
    }
    let offset = if units[n - 2] == REMAINDER_MARKER {
        let offset = units[n - 1];
        if !(1..=6).contains(&offset) {
            return Err(Base16384Error::InvalidInputLength { len: n, offset });
        }
        offset
    } else {
        0
    };
    let outlen = decoded_len(n, offset)?;
    Ok((offset, outlen))
}

/// Decodes `units`, returning the original plaintext.
///
/// Bounds-checked and hardened: malformed lengths and out-of-range remainder
/// offsets fail with [`Base16384Error::InvalidInputLength`] instead of
/// reading past the input.
pub fn decode(units: &[u8]) -> Result<Vec<u8>> {
    let (_, outlen) = probe_marker(units)?;
    let mut out = vec![0u8; outlen];
    let written = decode_into(units, &mut out)?;
    debug_assert_eq!(written, out.len());
    Ok(out)
}

/// Decodes `units` into a caller-supplied buffer of at least the decoded
/// length, returning the number of bytes written.
///
/// # Panics
///
/// Panics if `out` is too small for a well-formed input.
pub fn decode_into(units: &[u8], out: &mut [u8]) -> Result<usize> {
    let (offset, outlen) = probe_marker(units)?;
    assert!(out.len() >= outlen, "output buffer too small");
    let offset = offset as usize;
    let body = units.len() - TAIL_BYTES[offset];
    let mut o = 0;
    for group in units[..body].chunks_exact(8) {
        let window = absorb_units(group);
        out[o..o + 7].copy_from_slice(&window.to_be_bytes()[..7]);
        o += 7;
    }
    if offset != 0 {
        let tail = &units[body..body + 2 * TAIL_UNITS[offset]];
        let window = absorb_units(tail);
        out[o..o + offset].copy_from_slice(&window.to_be_bytes()[..offset]);
        o += offset;
    }
    Ok(o)
}

/// Loads a full 8-byte window without bounds checks.
#[inline]
unsafe fn read_wide(p: *const u8) -> u64 {
    u64::from_be(std::ptr::read_unaligned(p as *const u64))
}

/// Over-reading encoder matching the reference wide-word fast path. Produces
/// byte-identical output to [`encode_into`] over `data[..len]`.
///
/// Full groups are loaded as whole 64-bit windows, which reads up to 6 bytes
/// past the logical input end; bits beyond `len` are masked out before any
/// unit is emitted, so the slack content never reaches the output.
///
/// # Safety
///
/// `len <= data.len()` and `data` must extend at least 6 readable bytes past
/// the logical end, i.e. `data.len() >= len + 6`. `out` must hold at least
/// `encoded_len(len)` bytes.
pub unsafe fn encode_unchecked(data: &[u8], len: usize, out: &mut [u8]) -> usize {
    debug_assert!(len + 6 <= data.len());
    debug_assert!(out.len() >= encoded_len(len));
    let r = len % 7;
    let mut i = 0;
    let mut o = 0;
    while i + 7 <= len {
        let window = read_wide(data.as_ptr().add(i));
        emit_units(window, 4, out.get_unchecked_mut(o..o + 8));
        i += 7;
        o += 8;
    }
    if r != 0 {
        let mut tail = [0u8; 8];
        std::ptr::copy_nonoverlapping(data.as_ptr().add(i), tail.as_mut_ptr(), 7);
        tail[r..].fill(0);
        let units = TAIL_UNITS[r];
        emit_units(
            u64::from_be_bytes(tail),
            units,
            out.get_unchecked_mut(o..o + 2 * units),
        );
        o += 2 * units;
        *out.get_unchecked_mut(o) = REMAINDER_MARKER;
        *out.get_unchecked_mut(o + 1) = r as u8;
        o += 2;
    }
    o
}

/// Over-reading decoder matching the reference wide-word fast path. Produces
/// output identical to [`decode_into`] over well-formed `units[..len]`.
///
/// The trailing partial group is probed as a whole 64-bit window, reading
/// past the remainder marker; each full-group store writes one scratch byte
/// past the bytes it produces, which the next store (or the tail copy)
/// overwrites.
///
/// # Safety
///
/// `units[..len]` must be a well-formed encoding (misshapen input is a
/// contract violation, checked only by debug assertions), `units` must
/// extend at least 8 readable bytes past the logical end, and `out` must
/// hold at least `decoded_len(len, offset)? + 1` bytes.
pub unsafe fn decode_unchecked(units: &[u8], len: usize, out: &mut [u8]) -> usize {
    debug_assert!(len + 8 <= units.len());
    let offset = if len >= 2 && *units.get_unchecked(len - 2) == REMAINDER_MARKER {
        *units.get_unchecked(len - 1) as usize
    } else {
        0
    };
    debug_assert!(offset <= 6);
    debug_assert!(len >= TAIL_BYTES[offset] && (len - TAIL_BYTES[offset]) % 8 == 0);
    let body = len - TAIL_BYTES[offset];
    debug_assert!(len == 0 || out.len() >= body / 8 * 7 + offset + 1);
    let mut i = 0;
    let mut o = 0;
    while i < body {
        let wide = read_wide(units.as_ptr().add(i));
        let window = repack_wide(wide);
        std::ptr::write_unaligned(out.as_mut_ptr().add(o) as *mut u64, window.to_be());
        i += 8;
        o += 7;
    }
    if offset != 0 {
        let wide = read_wide(units.as_ptr().add(i));
        let bytes = repack_wide(wide).to_be_bytes();
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), out.as_mut_ptr().add(o), offset);
        o += offset;
    }
    o
}

/// Converts a 64-bit window of four biased units back into a plaintext
/// window (7 meaningful bytes at the top, low byte zero). Lanes are
/// unbiased independently so an underflowing garbage lane cannot borrow
/// into its neighbor.
#[inline]
fn repack_wide(wide: u64) -> u64 {
    let mut window = 0u64;
    for j in 0..4 {
        let field = ((wide >> (48 - 16 * j)) as u16).wrapping_sub(UNIT_BIAS) & 0x3FFF;
        window |= (field as u64) << (50 - 14 * j);
    }
    window
}
