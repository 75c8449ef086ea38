pub mod args;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod file_ops;

pub use args::parse_args;
pub use codec::{decode, decoded_len, encode, encoded_len};
pub use error::{Base16384Error, Result};
