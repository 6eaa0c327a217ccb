//! Helper functions for hashing data, canonical JSON, and generating random
//! hex strings.

use olpc_cjson::CanonicalFormatter;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{error::Err, tracerr, Result};

/// SHA-256 digest of the provided bytes.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 digest of a string's UTF-8 bytes, hex-encoded. Counterpart of the
/// remote verifier's hash function, so the framing (raw bytes, no prefix) is a
/// wire contract.
#[must_use]
pub fn sha256_hex(data: &str) -> String {
    hex::encode(sha256(data.as_bytes()))
}

/// Serialize the provided data as canonical JSON (JCS). Used wherever a
/// signature is computed over a JSON value, so both signer and verifier hash
/// identical bytes.
///
/// # Errors
///
/// * `SerializationError` - the data cannot be serialized.
pub fn canonical_json(data: &impl Serialize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter::new());
    if let Err(e) = data.serialize(&mut ser) {
        tracerr!(Err::SerializationError, "failed to canonicalize data: {}", e);
    }
    Ok(buf)
}

/// Random hex string generator: `n` CSPRNG bytes as `2n` lowercase hex chars.
#[must_use]
pub fn rand_hex(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    let mut rng = StdRng::from_entropy();
    rng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
