//! # GRETS DID
//!
//! Decentralized Identifier utilities for the GRETS real-estate transaction
//! network. The crate covers the full identity lifecycle on the client side:
//! P-256 key pair generation and reconstruction, message signing and
//! verification with fixed-width signatures, `did:grets` construction and
//! validation, DID document and verifiable credential issuance,
//! challenge-response authentication, and password-gated local key storage.
//!
//! Everything operates on in-memory byte buffers and hex/text strings; the
//! crate performs no network I/O. The hex and signature encodings, digest
//! framing and DID grammar are byte-exact contracts with the GRETS backend.
//!
//! ```
//! use grets_did::{
//!     create_auth_challenge, create_auth_response, generate_did, verify_auth_response,
//!     KeyPair, P256Suite,
//! };
//!
//! # fn main() -> grets_did::Result<()> {
//! let key_pair = KeyPair::<P256Suite>::generate()?;
//! let did = generate_did("investor", None);
//!
//! let challenge = create_auth_challenge("grets.example");
//! let response = create_auth_response::<P256Suite>(
//!     &did,
//!     &challenge,
//!     key_pair.private_key(),
//!     key_pair.public_key(),
//! )?;
//! verify_auth_response::<P256Suite>(&challenge, &response)?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod codec;
pub mod credential;
pub mod did;
pub mod document;
pub mod error;
pub mod hashing;
pub mod keys;
pub mod signature;
pub mod vault;

pub use auth::{
    create_auth_challenge, create_auth_response, verify_auth_response, AuthChallenge, AuthResponse,
};
pub use credential::{
    create_credential, create_presentation, verify_credential, verify_presentation,
    CredentialKind, Proof, VerifiableCredential, VerifiablePresentation,
};
pub use did::{derive_did, generate_did, is_known_organization, parse_did, validate_did, Did};
pub use document::{
    create_did_document, DidDocument, PublicKeyEntry, Service, VerificationMethod,
};
pub use keys::p256::P256Suite;
pub use keys::signer::{sign, verify, SignatureResult};
pub use keys::{
    check_private_key, check_public_key, check_signature, CryptoSuite, Curve, KeyPair,
};
pub use vault::Vault;

/// Result type for the GRETS DID library.
pub type Result<T, E = error::Error> = core::result::Result<T, E>;
