//! Byte-string codecs shared by the key, signature and vault layers: lowercase
//! hex and RFC 4648 §5 base64url.

use base64ct::{Base64UrlUnpadded, Encoding};

use crate::{error::Err, tracerr, Result};

/// Encode bytes as lowercase hex, two digits per byte.
#[must_use]
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string into bytes. Accepts upper- and lowercase digits.
///
/// # Errors
///
/// * `InvalidFormat` - odd length or a non-hex character.
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>> {
    match hex::decode(hex_str) {
        Ok(bytes) => Ok(bytes),
        Err(e) => tracerr!(Err::InvalidFormat, "invalid hex string: {}", e),
    }
}

/// Encode bytes as unpadded base64url.
#[must_use]
pub fn bytes_to_base64url(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

/// Decode a base64url string into bytes. Padded input is normalized before
/// decoding so both padded and unpadded forms are accepted.
///
/// # Errors
///
/// * `InvalidFormat` - a character outside the base64url alphabet.
pub fn base64url_to_bytes(s: &str) -> Result<Vec<u8>> {
    let unpadded = s.trim_end_matches('=');
    match Base64UrlUnpadded::decode_vec(unpadded) {
        Ok(bytes) => Ok(bytes),
        Err(e) => tracerr!(Err::InvalidFormat, "invalid base64url string: {}", e),
    }
}
