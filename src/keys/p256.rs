//! Software implementation of the crypto capability over the RustCrypto P-256
//! stack.

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::hashing;
use crate::keys::{CryptoSuite, Curve};
use crate::{error::Err, tracerr, Result};

/// ECDSA over NIST P-256 with SHA-256 digests. Wraps one signing key; the
/// verifying key is derived from it on demand.
#[derive(Clone)]
pub struct P256Suite {
    signing_key: SigningKey,
}

impl CryptoSuite for P256Suite {
    fn curve() -> Curve {
        Curve::P256
    }

    fn generate() -> Result<Self> {
        Ok(Self {
            signing_key: SigningKey::random(&mut OsRng),
        })
    }

    fn import(private_key: &[u8]) -> Result<Self> {
        match SigningKey::from_slice(private_key) {
            Ok(signing_key) => Ok(Self { signing_key }),
            Err(e) => tracerr!(Err::KeyImport, "private scalar rejected: {}", e),
        }
    }

    fn export_private(&self) -> Vec<u8> {
        self.signing_key.to_bytes().to_vec()
    }

    fn export_public(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_encoded_point(false).as_bytes().to_vec()
    }

    fn digest(data: &[u8]) -> [u8; 32] {
        hashing::sha256(data)
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Vec<u8>> {
        // The digest is signed directly. Hashing again here would break
        // interoperability with the remote verifier.
        let signature: Signature = match self.signing_key.sign_prehash(digest) {
            Ok(sig) => sig,
            Err(e) => tracerr!(Err::Signing, "failed to sign digest: {}", e),
        };
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn verify_digest(public_key: &[u8], digest: &[u8; 32], der: &[u8]) -> Result<()> {
        let verifying_key = match VerifyingKey::from_sec1_bytes(public_key) {
            Ok(key) => key,
            Err(e) => tracerr!(Err::KeyImport, "public key rejected: {}", e),
        };
        let signature = match Signature::from_der(der) {
            Ok(sig) => sig,
            Err(e) => tracerr!(Err::MalformedSignature, "DER signature rejected: {}", e),
        };
        if let Err(e) = verifying_key.verify_prehash(digest, &signature) {
            tracerr!(Err::FailedSignatureVerification, "signature does not verify: {}", e);
        }
        Ok(())
    }
}
