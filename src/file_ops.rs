//! Buffered and memory-mapped drivers around the transcoder core
//!
//! Mirrors the reference tool's split: small regular files are mapped and
//! transcoded in one shot, while pipes and large files are processed in
//! fixed-size chunks with the checksum accumulator threaded across chunks.
//! Encode chunks are a multiple of 7 plaintext bytes and decode chunks a
//! multiple of 8 encoded bytes, so only the final chunk can carry a
//! remainder. On decode, a one-byte lookahead folds a remainder marker that
//! starts exactly at a chunk boundary into the current chunk.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use log::debug;
use memmap2::Mmap;

use crate::checksum::{self, SUM_INIT};
use crate::codec;
use crate::error::{Base16384Error, Result};

/// Plaintext bytes fed to the encoder per chunk (multiple of 7).
pub const ENCODE_CHUNK: usize = 1024 * 1024 / 7 * 7;

/// Encoded bytes fed to the decoder per chunk (multiple of 8).
pub const DECODE_CHUNK: usize = 1024 * 1024;

/// UTF-16BE byte-order-mark written ahead of encoded output.
pub const STREAM_HEADER: [u8; 2] = [0xFE, 0xFF];

/// When the remainder checksum is embedded and verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SumMode {
    /// Never.
    #[default]
    Off,
    /// Only when the input is streamed or the encoded file is larger than
    /// one decode chunk. Both directions key off the encoded size, so the
    /// same mode round-trips.
    OnRemain,
    /// Always, even for single-shot small inputs.
    Forced,
}

/// Driver options shared by the encode and decode directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamOptions {
    /// Suppress writing the stream header on encode. Decode always
    /// auto-detects the header, so this only affects encoding.
    pub no_header: bool,
    pub sum: SumMode,
}

/// Reads until `buf` is full or the reader is exhausted.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Encodes `reader` to `writer` in chunks, returning the number of encoded
/// bytes written (header included).
pub fn encode_stream(
    reader: &mut impl Read,
    writer: &mut impl Write,
    no_header: bool,
    sum_check: bool,
) -> Result<u64> {
    let mut written = 0u64;
    if !no_header {
        writer.write_all(&STREAM_HEADER)?;
        written += 2;
    }
    let mut inbuf = vec![0u8; ENCODE_CHUNK];
    // A final partial chunk needs up to 10 extra bytes for tail units and
    // the remainder marker.
    let mut outbuf = vec![0u8; codec::encoded_len(ENCODE_CHUNK) + 10];
    let mut sum = SUM_INIT;
    loop {
        let n = read_full(reader, &mut inbuf)?;
        if n == 0 {
            break;
        }
        let enc = codec::encode_into(&inbuf[..n], &mut outbuf);
        if sum_check {
            sum = checksum::calc_sum(sum, &inbuf[..n]);
            if n % 7 != 0 {
                checksum::embed_sum(sum, (n % 7) as u8, &mut outbuf[..enc]);
            }
        }
        writer.write_all(&outbuf[..enc])?;
        written += enc as u64;
        if n < inbuf.len() {
            break; // short fill means the reader is exhausted
        }
    }
    writer.flush()?;
    Ok(written)
}

/// Decodes `reader` to `writer` in chunks, returning the number of decoded
/// bytes written. A leading stream header is consumed if present.
pub fn decode_stream(
    reader: &mut impl Read,
    writer: &mut impl Write,
    sum_check: bool,
) -> Result<u64> {
    let mut written = 0u64;
    // Room for a marker folded in at the chunk boundary.
    let mut inbuf = vec![0u8; DECODE_CHUNK + 2];
    let mut outbuf = vec![0u8; DECODE_CHUNK / 8 * 7 + 7];

    let mut head = [0u8; 2];
    let hn = read_full(reader, &mut head)?;
    let mut carry = [0u8; 1];
    let mut carry_len = 0;
    let mut lead_len = 0;
    if !(hn == 2 && head == STREAM_HEADER) {
        inbuf[..hn].copy_from_slice(&head[..hn]);
        lead_len = hn;
    }

    let mut sum = SUM_INIT;
    loop {
        inbuf[lead_len..lead_len + carry_len].copy_from_slice(&carry[..carry_len]);
        let start = lead_len + carry_len;
        lead_len = 0;
        carry_len = 0;
        let mut n = start + read_full(reader, &mut inbuf[start..DECODE_CHUNK])?;
        if n == 0 {
            break;
        }
        if n == DECODE_CHUNK {
            // The remainder marker may start exactly at the boundary; sniff
            // one byte ahead the way the reference driver does.
            let mut probe = [0u8; 1];
            if read_full(reader, &mut probe)? == 1 {
                if probe[0] == codec::REMAINDER_MARKER {
                    let mut off = [0u8; 1];
                    if read_full(reader, &mut off)? != 1 {
                        return Err(Base16384Error::InvalidInputLength {
                            len: n + 1,
                            offset: 0,
                        });
                    }
                    inbuf[n] = probe[0];
                    inbuf[n + 1] = off[0];
                    n += 2;
                } else {
                    carry[0] = probe[0];
                    carry_len = 1;
                }
            }
        }
        let chunk = &inbuf[..n];
        let dec = codec::decode_into(chunk, &mut outbuf)?;
        if sum_check {
            sum = checksum::calc_sum(sum, &outbuf[..dec]);
            if chunk[n - 2] == codec::REMAINDER_MARKER {
                checksum::check_sum(sum, chunk[n - 1], chunk)?;
            }
        }
        writer.write_all(&outbuf[..dec])?;
        written += dec as u64;
    }
    writer.flush()?;
    Ok(written)
}

fn open_output(output: &str) -> Result<Box<dyn Write>> {
    if output == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    let path = Path::new(output);
    let file = File::create(path).map_err(|source| Base16384Error::CreateOutput {
        path: path.into(),
        source,
    })?;
    Ok(Box::new(BufWriter::new(file)))
}

fn open_input(input: &str) -> Result<(File, u64)> {
    let path = Path::new(input);
    let file = File::open(path).map_err(|source| Base16384Error::OpenInput {
        path: path.into(),
        source,
    })?;
    let size = file
        .metadata()
        .map_err(|source| Base16384Error::FileSize {
            path: path.into(),
            source,
        })?
        .len();
    Ok((file, size))
}

fn map_input(file: &File, input: &str) -> Result<Mmap> {
    unsafe { Mmap::map(file) }.map_err(|source| Base16384Error::MapInput {
        path: Path::new(input).into(),
        source,
    })
}

/// Encodes `input` to `output`, where `-` names stdin/stdout. Small regular
/// files are memory-mapped and encoded in one shot; everything else goes
/// through the chunked stream driver.
pub fn encode_file(input: &str, output: &str, opts: StreamOptions) -> Result<u64> {
    let mut writer = open_output(output)?;
    if input == "-" {
        let stdin = io::stdin();
        let sum = opts.sum != SumMode::Off;
        return encode_stream(&mut stdin.lock(), &mut writer, opts.no_header, sum);
    }
    let (mut file, size) = open_input(input)?;
    debug!("encoding {input} ({size} bytes)");
    // The single-shot/chunked split and the OnRemain decision both key off
    // the size of the encoded output, which is what decode_file can observe.
    let header_len: u64 = if opts.no_header { 0 } else { 2 };
    let out_len = codec::encoded_len(size as usize) as u64 + header_len;
    if size == 0 || out_len > DECODE_CHUNK as u64 {
        let sum = opts.sum == SumMode::Forced
            || (opts.sum == SumMode::OnRemain && out_len > DECODE_CHUNK as u64);
        return encode_stream(&mut file, &mut writer, opts.no_header, sum);
    }
    let map = map_input(&file, input)?;
    let mut written = 0u64;
    if !opts.no_header {
        writer.write_all(&STREAM_HEADER)?;
        written += 2;
    }
    let mut encoded = codec::encode(&map);
    if opts.sum == SumMode::Forced && map.len() % 7 != 0 {
        let sum = checksum::calc_sum(SUM_INIT, &map);
        checksum::embed_sum(sum, (map.len() % 7) as u8, &mut encoded);
    }
    writer.write_all(&encoded)?;
    writer.flush()?;
    Ok(written + encoded.len() as u64)
}

/// Decodes `input` to `output`, where `-` names stdin/stdout. The stream
/// header is skipped if present.
pub fn decode_file(input: &str, output: &str, opts: StreamOptions) -> Result<u64> {
    let mut writer = open_output(output)?;
    if input == "-" {
        let stdin = io::stdin();
        return decode_stream(&mut stdin.lock(), &mut writer, opts.sum != SumMode::Off);
    }
    let (mut file, size) = open_input(input)?;
    debug!("decoding {input} ({size} bytes)");
    if size == 0 || size > DECODE_CHUNK as u64 {
        let sum = opts.sum == SumMode::Forced
            || (opts.sum == SumMode::OnRemain && size > DECODE_CHUNK as u64);
        return decode_stream(&mut file, &mut writer, sum);
    }
    let map = map_input(&file, input)?;
    let units = match map.get(..2) {
        Some(head) if head == STREAM_HEADER => &map[2..],
        _ => &map[..],
    };
    let decoded = codec::decode(units)?;
    if opts.sum == SumMode::Forced && units.len() >= 2 {
        let n = units.len();
        if units[n - 2] == codec::REMAINDER_MARKER {
            let sum = checksum::calc_sum(SUM_INIT, &decoded);
            checksum::check_sum(sum, units[n - 1], units)?;
        }
    }
    writer.write_all(&decoded)?;
    writer.flush()?;
    Ok(decoded.len() as u64)
}
