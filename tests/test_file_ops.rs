//! File driver coverage: mmap single-shot path, chunked path, headers

use std::fs;

use base16384::file_ops::{decode_file, encode_file, StreamOptions, SumMode, ENCODE_CHUNK};
use rand::{RngCore, SeedableRng};
use tempfile::TempDir;

fn write_payload(dir: &TempDir, name: &str, len: usize, seed: u64) -> (String, Vec<u8>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    let path = dir.path().join(name);
    fs::write(&path, &data).unwrap();
    (path.to_string_lossy().into_owned(), data)
}

fn paths(dir: &TempDir, names: [&str; 2]) -> (String, String) {
    (
        dir.path().join(names[0]).to_string_lossy().into_owned(),
        dir.path().join(names[1]).to_string_lossy().into_owned(),
    )
}

#[test]
fn small_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let (input, data) = write_payload(&dir, "input.bin", 1000, 1);
    let (encoded, decoded) = paths(&dir, ["out.b16384", "roundtrip.bin"]);

    encode_file(&input, &encoded, StreamOptions::default()).unwrap();
    let enc = fs::read(&encoded).unwrap();
    assert_eq!(&enc[..2], &[0xFE, 0xFF], "stream header");

    decode_file(&encoded, &decoded, StreamOptions::default()).unwrap();
    assert_eq!(fs::read(&decoded).unwrap(), data);
}

#[test]
fn no_header_round_trip() {
    let dir = TempDir::new().unwrap();
    let (input, data) = write_payload(&dir, "input.bin", 123, 2);
    let (encoded, decoded) = paths(&dir, ["out.b16384", "roundtrip.bin"]);

    let opts = StreamOptions {
        no_header: true,
        sum: SumMode::Off,
    };
    encode_file(&input, &encoded, opts).unwrap();
    let enc = fs::read(&encoded).unwrap();
    assert_ne!(&enc[..2], &[0xFE, 0xFF]);

    decode_file(&encoded, &decoded, StreamOptions::default()).unwrap();
    assert_eq!(fs::read(&decoded).unwrap(), data);
}

#[test]
fn large_file_uses_chunked_path() {
    let dir = TempDir::new().unwrap();
    // Two full encode chunks plus a remainder.
    let (input, data) = write_payload(&dir, "big.bin", ENCODE_CHUNK * 2 + 13, 3);
    let (encoded, decoded) = paths(&dir, ["big.b16384", "big.roundtrip"]);

    let opts = StreamOptions {
        no_header: false,
        sum: SumMode::OnRemain,
    };
    encode_file(&input, &encoded, opts).unwrap();
    decode_file(&encoded, &decoded, opts).unwrap();
    assert_eq!(fs::read(&decoded).unwrap(), data);
}

#[test]
fn on_remain_round_trips_across_path_boundary() {
    // Lengths around the single-shot/chunked split. Encode and decode must
    // agree on whether the remainder checksum is present, and the agreement
    // is keyed off the encoded size: 917,500 plaintext bytes encode to
    // exactly one decode chunk (no checksum on either side), 917,501 bytes
    // encode one byte past it (checksum on both sides).
    let dir = TempDir::new().unwrap();
    let opts = StreamOptions {
        no_header: false,
        sum: SumMode::OnRemain,
    };
    let lens = [
        917_500,
        917_501,
        1_000_000,
        ENCODE_CHUNK - 1,
        ENCODE_CHUNK,
        ENCODE_CHUNK + 1,
    ];
    for (i, len) in lens.into_iter().enumerate() {
        let (input, data) = write_payload(&dir, &format!("win{i}.bin"), len, 10 + i as u64);
        let enc_name = format!("win{i}.b16384");
        let dec_name = format!("win{i}.out");
        let (encoded, decoded) = paths(&dir, [enc_name.as_str(), dec_name.as_str()]);

        encode_file(&input, &encoded, opts).unwrap();
        decode_file(&encoded, &decoded, opts).unwrap();
        assert_eq!(fs::read(&decoded).unwrap(), data, "len {len}");
    }
}

#[test]
fn embedded_sum_is_invisible_to_plain_decode() {
    // A checksum embedded on encode lives in spare bits only, so a decoder
    // that is not verifying must still recover the payload.
    let dir = TempDir::new().unwrap();
    let (input, data) = write_payload(&dir, "input.bin", 1_000_000, 20);
    let (encoded, decoded) = paths(&dir, ["out.b16384", "roundtrip.bin"]);

    let embed = StreamOptions {
        no_header: false,
        sum: SumMode::OnRemain,
    };
    encode_file(&input, &encoded, embed).unwrap();
    decode_file(&encoded, &decoded, StreamOptions::default()).unwrap();
    assert_eq!(fs::read(&decoded).unwrap(), data);
}

#[test]
fn forced_sum_round_trip_on_small_file() {
    let dir = TempDir::new().unwrap();
    let (input, data) = write_payload(&dir, "input.bin", 47, 4);
    let (encoded, decoded) = paths(&dir, ["out.b16384", "roundtrip.bin"]);

    let opts = StreamOptions {
        no_header: false,
        sum: SumMode::Forced,
    };
    encode_file(&input, &encoded, opts).unwrap();
    decode_file(&encoded, &decoded, opts).unwrap();
    assert_eq!(fs::read(&decoded).unwrap(), data);
}

#[test]
fn forced_sum_detects_corruption() {
    let dir = TempDir::new().unwrap();
    let (input, _) = write_payload(&dir, "input.bin", 47, 5);
    let (encoded, decoded) = paths(&dir, ["out.b16384", "roundtrip.bin"]);

    let opts = StreamOptions {
        no_header: false,
        sum: SumMode::Forced,
    };
    encode_file(&input, &encoded, opts).unwrap();

    // Corrupt the embedded checksum bits in the final partial unit.
    let mut enc = fs::read(&encoded).unwrap();
    let n = enc.len();
    enc[n - 3] ^= 0x01;
    fs::write(&encoded, &enc).unwrap();

    assert!(decode_file(&encoded, &decoded, opts).is_err());
}

#[test]
fn empty_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let (input, _) = write_payload(&dir, "empty.bin", 0, 6);
    let (encoded, decoded) = paths(&dir, ["empty.b16384", "empty.roundtrip"]);

    encode_file(&input, &encoded, StreamOptions::default()).unwrap();
    assert_eq!(fs::read(&encoded).unwrap(), vec![0xFE, 0xFF]);
    decode_file(&encoded, &decoded, StreamOptions::default()).unwrap();
    assert_eq!(fs::read(&decoded).unwrap(), Vec::<u8>::new());
}

#[test]
fn missing_input_reports_open_error() {
    let dir = TempDir::new().unwrap();
    let (encoded, _) = paths(&dir, ["out.b16384", "unused"]);
    let missing = dir.path().join("nope.bin").to_string_lossy().into_owned();
    assert!(encode_file(&missing, &encoded, StreamOptions::default()).is_err());
}
