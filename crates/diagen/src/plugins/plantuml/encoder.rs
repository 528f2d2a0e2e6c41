//! PlantUML text encoding
//!
//! The PlantUML server accepts a diagram source embedded in the request path:
//! the UTF-8 text is compressed as a raw deflate stream, then written out six
//! bits at a time over a URL-safe alphabet. The layout is base64 with a
//! different alphabet and no padding.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use tracing::trace;

use crate::core::{GenerateError, Result};

/// Output alphabet, indexed by 6-bit value
pub const ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

/// Encode a PlantUML source into a URL token
///
/// # Example
/// ```rust
/// use diagen::plugins::plantuml::{decode, encode};
///
/// let token = encode("@startuml\nA --> B\n@enduml").unwrap();
/// assert_eq!(decode(&token).unwrap(), "@startuml\nA --> B\n@enduml");
/// ```
pub fn encode(text: &str) -> Result<String> {
    let compressed = deflate(text.as_bytes())?;
    trace!(
        input_len = text.len(),
        compressed_len = compressed.len(),
        "Compressed diagram source"
    );
    Ok(pack(&compressed))
}

/// Decode a URL token back into the PlantUML source
pub fn decode(token: &str) -> Result<String> {
    let compressed = unpack(token)?;
    let mut text = String::new();
    DeflateDecoder::new(compressed.as_slice())
        .read_to_string(&mut text)
        .map_err(|e| GenerateError::decode_error(format!("inflate failed: {}", e)))?;
    Ok(text)
}

/// Raw deflate at the default level (zlib stream without header and checksum)
fn deflate(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| GenerateError::encode_error(format!("deflate failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| GenerateError::encode_error(format!("deflate failed: {}", e)))
}

/// Spread bytes over the alphabet, 3 bytes to 4 characters
///
/// A trailing pair yields 3 characters and a trailing single byte yields 2;
/// the unused low bits of the last character are zero.
pub fn pack(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        match *chunk {
            [b0, b1, b2] => {
                push_sextet(&mut out, b0 >> 2);
                push_sextet(&mut out, ((b0 & 0x3) << 4) | (b1 >> 4));
                push_sextet(&mut out, ((b1 & 0xF) << 2) | (b2 >> 6));
                push_sextet(&mut out, b2 & 0x3F);
            }
            [b0, b1] => {
                push_sextet(&mut out, b0 >> 2);
                push_sextet(&mut out, ((b0 & 0x3) << 4) | (b1 >> 4));
                push_sextet(&mut out, (b1 & 0xF) << 2);
            }
            [b0] => {
                push_sextet(&mut out, b0 >> 2);
                push_sextet(&mut out, (b0 & 0x3) << 4);
            }
            _ => unreachable!("chunks(3) yields 1 to 3 bytes"),
        }
    }
    out
}

/// Inverse of [`pack`]
pub fn unpack(token: &str) -> Result<Vec<u8>> {
    let sextets = token
        .bytes()
        .enumerate()
        .map(|(pos, c)| {
            sextet_of(c).ok_or_else(|| {
                GenerateError::decode_error(format!(
                    "invalid character {:?} at position {}",
                    c as char, pos
                ))
            })
        })
        .collect::<Result<Vec<u8>>>()?;

    let mut out = Vec::with_capacity(sextets.len() / 4 * 3 + 2);
    for group in sextets.chunks(4) {
        match *group {
            [c0, c1, c2, c3] => {
                out.push((c0 << 2) | (c1 >> 4));
                out.push((c1 << 4) | (c2 >> 2));
                out.push((c2 << 6) | c3);
            }
            [c0, c1, c2] => {
                out.push((c0 << 2) | (c1 >> 4));
                out.push((c1 << 4) | (c2 >> 2));
            }
            [c0, c1] => out.push((c0 << 2) | (c1 >> 4)),
            _ => {
                return Err(GenerateError::decode_error(
                    "token length leaves a dangling character",
                ))
            }
        }
    }
    Ok(out)
}

fn push_sextet(out: &mut String, value: u8) {
    out.push(ALPHABET[(value & 0x3F) as usize] as char);
}

fn sextet_of(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'Z' => Some(c - b'A' + 10),
        b'a'..=b'z' => Some(c - b'a' + 36),
        b'-' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}
