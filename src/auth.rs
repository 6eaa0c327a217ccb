//! Challenge-response authentication: the holder signs a colon-joined
//! `did:challenge:nonce` triple and the verifier reconstructs exactly that
//! string, so the framing here is a wire contract.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::keys::{signer, CryptoSuite, KeyPair};
use crate::{error::Err, hashing, tracerr, Result};

/// How long an issued challenge remains valid.
const CHALLENGE_TTL_MINUTES: i64 = 5;

/// An authentication challenge issued by a verifier. Holders normally receive
/// one from the GRETS backend; [`create_auth_challenge`] mints one for code
/// acting in the verifier role.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthChallenge {
    /// Opaque challenge value, 32 hex characters.
    pub challenge: String,
    /// Per-challenge nonce, 32 hex characters.
    pub nonce: String,
    /// The domain the challenge was issued for.
    pub domain: String,
    /// Instant after which the challenge is rejected.
    pub expires_at: DateTime<Utc>,
}

/// A holder's answer to an [`AuthChallenge`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The DID authenticating.
    pub did: String,
    /// Echo of the challenge value.
    pub challenge: String,
    /// Fixed-width signature over the challenge message, 128 hex characters.
    pub signature: String,
    /// The holder's public key, 130 hex characters.
    pub public_key: String,
}

/// The exact byte string both sides sign and verify.
fn challenge_message(did: &str, challenge: &str, nonce: &str) -> String {
    format!("{did}:{challenge}:{nonce}")
}

/// Mint a fresh challenge for the given domain: two random 16-byte hex
/// nonces and a five-minute expiry.
#[must_use]
pub fn create_auth_challenge(domain: &str) -> AuthChallenge {
    AuthChallenge {
        challenge: hashing::rand_hex(16),
        nonce: hashing::rand_hex(16),
        domain: domain.to_string(),
        expires_at: Utc::now() + Duration::minutes(CHALLENGE_TTL_MINUTES),
    }
}

/// Answer a challenge by signing the `did:challenge:nonce` triple with the
/// holder's key pair, reconstructed from its hex wire form.
///
/// # Errors
///
/// * `InvalidKey` / `KeyImport` - the key material could not be reconstructed.
/// * `Signing` - the signing primitive failed.
pub fn create_auth_response<S: CryptoSuite>(
    did: &str, challenge: &AuthChallenge, private_key: &str, public_key: &str,
) -> Result<AuthResponse> {
    let key_pair = KeyPair::<S>::restore(private_key, public_key)?;
    let message = challenge_message(did, &challenge.challenge, &challenge.nonce);
    let signed = signer::sign(&key_pair, &message)?;

    Ok(AuthResponse {
        did: did.to_string(),
        challenge: challenge.challenge.clone(),
        signature: signed.signature,
        public_key: signed.public_key,
    })
}

/// Verify a holder's response against the challenge it was issued.
///
/// # Errors
///
/// * `Expired` - the challenge expiry is in the past.
/// * `InvalidInput` - the response echoes a different challenge value.
/// * `FailedSignatureVerification` - the signature does not verify against
///   the response's public key.
pub fn verify_auth_response<S: CryptoSuite>(
    challenge: &AuthChallenge, response: &AuthResponse,
) -> Result<()> {
    if Utc::now() > challenge.expires_at {
        tracerr!(Err::Expired, "authentication challenge has expired");
    }
    if challenge.challenge != response.challenge {
        tracerr!(Err::InvalidInput, "challenge value mismatch");
    }

    let message = challenge_message(&response.did, &challenge.challenge, &challenge.nonce);
    if !signer::verify::<S>(&response.public_key, &message, &response.signature) {
        tracerr!(Err::FailedSignatureVerification, "auth response signature does not verify");
    }
    Ok(())
}
