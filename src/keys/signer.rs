//! Message signing and verification over text messages: SHA-256 digest,
//! ECDSA P-256 signature, fixed-width hex on the wire.

use serde::{Deserialize, Serialize};

use crate::keys::{check_public_key, check_signature, CryptoSuite, KeyPair};
use crate::{codec, signature, Result};

/// The outcome of one signing operation, in the shape the GRETS API layer
/// transmits. Transient; never persisted.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResult {
    /// 128 hex characters: 32-byte r followed by 32-byte s.
    pub signature: String,
    /// The original message text.
    pub message: String,
    /// The signer's public key, 130 hex characters.
    pub public_key: String,
}

/// Sign a text message with the key pair's private material. The SHA-256
/// digest of the raw UTF-8 bytes is signed, with no length prefix and no
/// domain separation tag, because the remote verifier frames its input
/// identically.
///
/// # Errors
///
/// * `InvalidKey` / `KeyImport` - the pair carried no handle and could not be
///   reconstructed.
/// * `Signing` - the signing primitive failed.
pub fn sign<S: CryptoSuite>(key_pair: &KeyPair<S>, message: &str) -> Result<SignatureResult> {
    let suite = key_pair.suite()?;
    let digest = S::digest(message.as_bytes());

    let der = suite.sign_digest(&digest)?;
    let (r, s) = signature::to_fixed_width(&der)?;

    let mut fixed = Vec::with_capacity(r.len() + s.len());
    fixed.extend_from_slice(&r);
    fixed.extend_from_slice(&s);

    Ok(SignatureResult {
        signature: codec::bytes_to_hex(&fixed),
        message: message.to_string(),
        public_key: key_pair.public_key().to_string(),
    })
}

/// Verify a fixed-width hex signature over a text message. Fail-closed: a
/// malformed key or signature, or any internal failure, yields `false` rather
/// than an error: "signature invalid" and "signature malformed" are
/// externally indistinguishable and both must deny trust.
pub fn verify<S: CryptoSuite>(public_key: &str, message: &str, signature: &str) -> bool {
    verify_inner::<S>(public_key, message, signature).is_ok()
}

fn verify_inner<S: CryptoSuite>(public_key: &str, message: &str, signature: &str) -> Result<()> {
    check_public_key(public_key)?;
    check_signature(signature)?;

    let key_bytes = codec::hex_to_bytes(public_key)?;
    let sig_bytes = codec::hex_to_bytes(signature)?;

    // check_signature guarantees 64 bytes.
    let mut r = [0u8; signature::COMPONENT_LEN];
    let mut s = [0u8; signature::COMPONENT_LEN];
    r.copy_from_slice(&sig_bytes[..signature::COMPONENT_LEN]);
    s.copy_from_slice(&sig_bytes[signature::COMPONENT_LEN..]);
    let der = signature::to_der(&r, &s);

    let digest = S::digest(message.as_bytes());
    S::verify_digest(&key_bytes, &digest, &der)
}
