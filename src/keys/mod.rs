//! Key management: the injected crypto capability trait, the P-256 key pair
//! and the wire-format checks for key and signature strings.

pub mod p256;
pub mod signer;

use std::fmt::{self, Debug, Display};
use std::sync::LazyLock;

use regex::Regex;

use crate::{codec, error::Err, tracerr, Result};

/// Length of an uncompressed SEC1 public key point: `0x04` prefix, 32-byte X,
/// 32-byte Y.
pub const PUBLIC_KEY_LEN: usize = 65;

static PRIVATE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[0-9a-fA-F]{64}$").expect("private key regex should compile")
});
static PUBLIC_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^04[0-9a-fA-F]{128}$").expect("public key regex should compile")
});
static SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[0-9a-fA-F]{128}$").expect("signature regex should compile")
});

/// Elliptic curve identifier. A single curve is supported; the explicit value
/// exists so the curve in use is part of the suite's signature rather than
/// ambient state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Curve {
    /// NIST P-256 (secp256r1).
    #[default]
    P256,
}

impl Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P256 => write!(f, "P-256"),
        }
    }
}

/// Platform crypto capability consumed by the key pair, signer and verifier.
/// An implementation wraps one private key and exposes the primitive
/// operations over it, so all higher layers stay independent of the concrete
/// crypto backend.
pub trait CryptoSuite: Clone + Sized + Send + Sync {
    /// The curve this suite operates on.
    fn curve() -> Curve;

    /// Generate a fresh private key from a cryptographically secure random
    /// source.
    ///
    /// # Errors
    ///
    /// * `KeyGeneration` - the primitive could not produce a key.
    fn generate() -> Result<Self>;

    /// Reconstruct a suite from a raw 32-byte private scalar.
    ///
    /// # Errors
    ///
    /// * `KeyImport` - the primitive rejected the scalar.
    fn import(private_key: &[u8]) -> Result<Self>;

    /// The raw 32-byte private scalar.
    fn export_private(&self) -> Vec<u8>;

    /// The public key as a 65-byte uncompressed SEC1 point.
    fn export_public(&self) -> Vec<u8>;

    /// 256-bit digest used for all signing input.
    fn digest(data: &[u8]) -> [u8; 32];

    /// Sign a precomputed digest, returning the DER-encoded signature the
    /// primitive produces.
    ///
    /// # Errors
    ///
    /// * `Signing` - the primitive failed to sign.
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Vec<u8>>;

    /// Verify a DER-encoded signature over a precomputed digest against a
    /// 65-byte uncompressed public key.
    ///
    /// # Errors
    ///
    /// * `KeyImport` - the public key bytes were rejected.
    /// * `MalformedSignature` - the DER signature failed to parse.
    /// * `FailedSignatureVerification` - the signature does not verify.
    fn verify_digest(public_key: &[u8], digest: &[u8; 32], der: &[u8]) -> Result<()>;
}

/// Check a private key string: 64 hex characters (case-insensitive).
///
/// # Errors
///
/// * `InvalidKey` - the string fails the check.
pub fn check_private_key(private_key: &str) -> Result<()> {
    if !PRIVATE_KEY_RE.is_match(private_key) {
        tracerr!(Err::InvalidKey, "private key is not 64 hex characters");
    }
    Ok(())
}

/// Check a public key string: 130 hex characters with `04` prefix.
///
/// # Errors
///
/// * `InvalidKey` - the string fails the check.
pub fn check_public_key(public_key: &str) -> Result<()> {
    if !PUBLIC_KEY_RE.is_match(public_key) {
        tracerr!(Err::InvalidKey, "public key is not 130 hex characters with 04 prefix");
    }
    Ok(())
}

/// Check a signature string: 128 hex characters (case-insensitive).
///
/// # Errors
///
/// * `MalformedSignature` - the string fails the check.
pub fn check_signature(signature: &str) -> Result<()> {
    if !SIGNATURE_RE.is_match(signature) {
        tracerr!(Err::MalformedSignature, "signature is not 128 hex characters");
    }
    Ok(())
}

/// An asymmetric key pair on curve P-256. The hex strings are the wire
/// representation exchanged with the remote verifier; the suite handle is a
/// cached signing capability and is never serialized (the type deliberately
/// implements neither `Serialize` nor `Deserialize`).
///
/// Immutable once created, so a single instance can be shared freely between
/// concurrent signing calls.
#[derive(Clone)]
pub struct KeyPair<S: CryptoSuite> {
    public_key: String,
    private_key: String,
    handle: Option<S>,
}

impl<S: CryptoSuite> KeyPair<S> {
    /// Generate a fresh key pair.
    ///
    /// # Errors
    ///
    /// * `KeyGeneration` - the primitive failed or the exported public key is
    ///   not a 65-byte uncompressed point.
    pub fn generate() -> Result<Self> {
        let suite = S::generate()?;
        let public = suite.export_public();
        if public.len() != PUBLIC_KEY_LEN || public[0] != 0x04 {
            tracerr!(
                Err::KeyGeneration,
                "exported public key is not a {}-byte uncompressed point",
                PUBLIC_KEY_LEN
            );
        }

        Ok(Self {
            public_key: codec::bytes_to_hex(&public),
            private_key: codec::bytes_to_hex(&suite.export_private()),
            handle: Some(suite),
        })
    }

    /// Reconstruct a key pair from its hex wire representation. Both strings
    /// are normalized to lowercase. The supplied public key must match the
    /// point derived from the private scalar; a stored public key is never
    /// trusted on its own.
    ///
    /// # Errors
    ///
    /// * `InvalidKey` - either string fails its format check.
    /// * `KeyImport` - the primitive rejected the scalar, or the public key
    ///   does not belong to it.
    pub fn restore(private_key: &str, public_key: &str) -> Result<Self> {
        check_private_key(private_key)?;
        check_public_key(public_key)?;

        let scalar = codec::hex_to_bytes(private_key)?;
        let suite = S::import(&scalar)?;

        let public_key = public_key.to_lowercase();
        let derived = codec::bytes_to_hex(&suite.export_public());
        if derived != public_key {
            tracerr!(Err::KeyImport, "public key does not match the private scalar");
        }

        Ok(Self {
            public_key,
            private_key: private_key.to_lowercase(),
            handle: Some(suite),
        })
    }

    /// Derive the uncompressed public key hex for a private scalar. Pure:
    /// identical input always yields identical output, and the result
    /// round-trips through [`KeyPair::restore`].
    ///
    /// # Errors
    ///
    /// * `InvalidKey` - the private key string fails its format check.
    /// * `KeyImport` - the primitive rejected the scalar.
    pub fn derive_public_key(private_key: &str) -> Result<String> {
        check_private_key(private_key)?;
        let scalar = codec::hex_to_bytes(private_key)?;
        let suite = S::import(&scalar)?;
        Ok(codec::bytes_to_hex(&suite.export_public()))
    }

    /// The public key as 130 lowercase hex characters.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The private key as 64 lowercase hex characters.
    #[must_use]
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// The cached suite handle, reconstructed from the private key when a
    /// caller built the pair without one.
    pub(crate) fn suite(&self) -> Result<S> {
        match &self.handle {
            Some(suite) => Ok(suite.clone()),
            None => {
                let restored = Self::restore(&self.private_key, &self.public_key)?;
                restored.suite()
            }
        }
    }

    /// A key pair carrying hex strings only, with no cached handle. Used by
    /// the vault when returning stored material; the handle is reconstructed
    /// on first use.
    pub(crate) fn from_parts(private_key: String, public_key: String) -> Self {
        Self {
            public_key,
            private_key,
            handle: None,
        }
    }
}

impl<S: CryptoSuite> Debug for KeyPair<S> {
    // Private material stays out of log output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("curve", &S::curve())
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}
