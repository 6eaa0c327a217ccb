//! Verifiable credentials and presentations issued inside the GRETS network.
//! Proof signatures are computed over the canonical JSON of the record with
//! the `proof` field absent, so issuer and verifier hash identical bytes.

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::keys::{signer, CryptoSuite, KeyPair};
use crate::{error::Err, hashing, tracerr, Result};

/// The JSON-LD context for verifiable credentials.
pub const CREDENTIAL_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// Proof type for P-256 ECDSA signatures.
pub const PROOF_TYPE: &str = "EcdsaSecp256r1Signature2019";

/// The credential kinds issued inside the GRETS network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialKind {
    /// Binds a citizen identity to a DID.
    Identity,
    /// Attests membership of a GRETS organization.
    Organization,
    /// Attests a role within an organization.
    Role,
    /// Attests ownership of a real-estate asset.
    Asset,
}

impl CredentialKind {
    /// The type token carried in the credential's `type` array.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "IdentityCredential",
            Self::Organization => "OrganizationCredential",
            Self::Role => "RoleCredential",
            Self::Asset => "AssetCredential",
        }
    }
}

impl Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A linked-data proof over a credential or presentation. The `jws` field
/// carries the network's fixed-width signature hex.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Proof type.
    #[serde(rename = "type")]
    pub proof_type: String,
    /// When the proof was created.
    pub created: DateTime<Utc>,
    /// Reference to the signing key, `<did>#keys-1`.
    pub verification_method: String,
    /// Purpose of the proof.
    pub proof_purpose: String,
    /// 128 hex characters: fixed-width r‖s signature.
    pub jws: String,
}

/// A W3C-shaped verifiable credential.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// The JSON-LD context.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// Credential id, `urn:uuid:<random>`.
    pub id: String,
    /// Type tokens: `VerifiableCredential` plus the kind token.
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// The issuing DID.
    pub issuer: String,
    /// When the credential was issued.
    pub issuance_date: DateTime<Utc>,
    /// Optional expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Claims about the subject. Always carries the subject DID under `id`.
    pub credential_subject: Map<String, Value>,
    /// The issuer's proof. Absent only while the signing input is computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

/// A W3C-shaped verifiable presentation wrapping one or more credentials.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    /// The JSON-LD context.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// Presentation id, `urn:uuid:<random>`.
    pub id: String,
    /// Type tokens, `VerifiablePresentation`.
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// The holder's DID.
    pub holder: String,
    /// The wrapped credentials.
    pub verifiable_credential: Vec<VerifiableCredential>,
    /// The holder's proof. Absent only while the signing input is computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

/// The canonical JSON string a proof signs. `data` must be serialized with
/// its `proof` field absent.
fn signing_input(data: &impl Serialize) -> Result<String> {
    let buf = hashing::canonical_json(data)?;
    match String::from_utf8(buf) {
        Ok(s) => Ok(s),
        Err(e) => tracerr!(Err::SerializationError, "canonical JSON is not UTF-8: {}", e),
    }
}

/// Sign `data` (serialized without its proof) and wrap the signature in a
/// [`Proof`] referencing the signer's key.
fn create_proof<S: CryptoSuite>(
    data: &impl Serialize, key_pair: &KeyPair<S>, verification_method: &str,
) -> Result<Proof> {
    let message = signing_input(data)?;
    let signed = signer::sign(key_pair, &message)?;

    Ok(Proof {
        proof_type: PROOF_TYPE.to_string(),
        created: Utc::now(),
        verification_method: verification_method.to_string(),
        proof_purpose: "assertionMethod".to_string(),
        jws: signed.signature,
    })
}

/// Issue a credential about `subject_did`, signed with the issuer's key pair.
/// The subject DID is added to the claims under `id`.
///
/// # Errors
///
/// * `SerializationError` - the claims cannot be canonicalized.
/// * `Signing` - the signing primitive failed.
pub fn create_credential<S: CryptoSuite>(
    issuer_did: &str, subject_did: &str, kind: CredentialKind, claims: Map<String, Value>,
    key_pair: &KeyPair<S>,
) -> Result<VerifiableCredential> {
    let mut credential_subject = claims;
    credential_subject
        .insert("id".to_string(), Value::String(subject_did.to_string()));

    let mut credential = VerifiableCredential {
        context: vec![CREDENTIAL_CONTEXT.to_string()],
        id: format!("urn:uuid:{}", hashing::rand_hex(16)),
        types: vec!["VerifiableCredential".to_string(), kind.as_str().to_string()],
        issuer: issuer_did.to_string(),
        issuance_date: Utc::now(),
        expiration_date: None,
        credential_subject,
        proof: None,
    };

    let proof = create_proof(&credential, key_pair, &format!("{issuer_did}#keys-1"))?;
    credential.proof = Some(proof);
    Ok(credential)
}

/// Verify a credential's proof against the issuer's public key.
///
/// # Errors
///
/// * `Expired` - the credential's expiry is in the past.
/// * `InvalidInput` - the credential carries no proof.
/// * `FailedSignatureVerification` - the proof signature does not verify.
pub fn verify_credential<S: CryptoSuite>(
    credential: &VerifiableCredential, public_key: &str,
) -> Result<()> {
    if let Some(expiry) = credential.expiration_date {
        if Utc::now() > expiry {
            tracerr!(Err::Expired, "credential expired at {}", expiry);
        }
    }
    let Some(proof) = &credential.proof else {
        tracerr!(Err::InvalidInput, "credential carries no proof");
    };

    let mut unsigned = credential.clone();
    unsigned.proof = None;
    let message = signing_input(&unsigned)?;

    if !signer::verify::<S>(public_key, &message, &proof.jws) {
        tracerr!(Err::FailedSignatureVerification, "credential proof does not verify");
    }
    Ok(())
}

/// Wrap credentials in a presentation signed with the holder's key pair.
///
/// # Errors
///
/// * `SerializationError` - the presentation cannot be canonicalized.
/// * `Signing` - the signing primitive failed.
pub fn create_presentation<S: CryptoSuite>(
    holder_did: &str, credentials: Vec<VerifiableCredential>, key_pair: &KeyPair<S>,
) -> Result<VerifiablePresentation> {
    let mut presentation = VerifiablePresentation {
        context: vec![CREDENTIAL_CONTEXT.to_string()],
        id: format!("urn:uuid:{}", hashing::rand_hex(16)),
        types: vec!["VerifiablePresentation".to_string()],
        holder: holder_did.to_string(),
        verifiable_credential: credentials,
        proof: None,
    };

    let proof = create_proof(&presentation, key_pair, &format!("{holder_did}#keys-1"))?;
    presentation.proof = Some(proof);
    Ok(presentation)
}

/// Verify a presentation's proof against the holder's public key. The wrapped
/// credentials carry their own proofs and are verified separately against
/// their issuers' keys.
///
/// # Errors
///
/// * `InvalidInput` - the presentation carries no proof.
/// * `FailedSignatureVerification` - the proof signature does not verify.
pub fn verify_presentation<S: CryptoSuite>(
    presentation: &VerifiablePresentation, public_key: &str,
) -> Result<()> {
    let Some(proof) = &presentation.proof else {
        tracerr!(Err::InvalidInput, "presentation carries no proof");
    };

    let mut unsigned = presentation.clone();
    unsigned.proof = None;
    let message = signing_input(&unsigned)?;

    if !signer::verify::<S>(public_key, &message, &proof.jws) {
        tracerr!(Err::FailedSignatureVerification, "presentation proof does not verify");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::did::generate_did;
    use crate::keys::p256::P256Suite;

    fn issue() -> (String, KeyPair<P256Suite>, VerifiableCredential) {
        let issuer_pair = KeyPair::<P256Suite>::generate().expect("generate issuer");
        let issuer_did = generate_did("government", None);
        let subject_did = generate_did("investor", None);

        let mut claims = Map::new();
        claims.insert("name".to_string(), json!("Wei Chen"));
        claims.insert("residency".to_string(), json!("district-7"));

        let credential = create_credential(
            &issuer_did,
            &subject_did,
            CredentialKind::Identity,
            claims,
            &issuer_pair,
        )
        .expect("create credential");
        (subject_did, issuer_pair, credential)
    }

    #[test]
    fn credential_round_trip() {
        let (subject_did, issuer_pair, credential) = issue();

        assert_eq!(credential.types, vec!["VerifiableCredential", "IdentityCredential"]);
        assert_eq!(credential.credential_subject["id"], json!(subject_did));
        assert!(credential.id.starts_with("urn:uuid:"));

        let proof = credential.proof.as_ref().expect("proof attached");
        assert_eq!(proof.proof_type, PROOF_TYPE);
        assert_eq!(proof.jws.len(), 128);

        verify_credential::<P256Suite>(&credential, issuer_pair.public_key())
            .expect("verify credential");
    }

    #[test]
    fn rejects_tampered_claims() {
        let (_, issuer_pair, mut credential) = issue();
        credential
            .credential_subject
            .insert("residency".to_string(), json!("district-9"));

        let err = verify_credential::<P256Suite>(&credential, issuer_pair.public_key())
            .expect_err("tampered claims");
        assert!(err.is(Err::FailedSignatureVerification));
    }

    #[test]
    fn rejects_expired_credential() {
        let (_, issuer_pair, mut credential) = issue();
        credential.expiration_date = Some(Utc::now() - Duration::seconds(1));

        let err = verify_credential::<P256Suite>(&credential, issuer_pair.public_key())
            .expect_err("expired credential");
        assert!(err.is(Err::Expired));
    }

    #[test]
    fn rejects_missing_proof() {
        let (_, issuer_pair, mut credential) = issue();
        credential.proof = None;

        let err = verify_credential::<P256Suite>(&credential, issuer_pair.public_key())
            .expect_err("no proof");
        assert!(err.is(Err::InvalidInput));
    }

    #[test]
    fn presentation_round_trip() {
        let (_, _, credential) = issue();
        let holder_pair = KeyPair::<P256Suite>::generate().expect("generate holder");
        let holder_did = generate_did("investor", None);

        let presentation =
            create_presentation(&holder_did, vec![credential], &holder_pair)
                .expect("create presentation");
        verify_presentation::<P256Suite>(&presentation, holder_pair.public_key())
            .expect("verify presentation");

        // A different credential set invalidates the holder's proof.
        let mut tampered = presentation;
        tampered.verifiable_credential.clear();
        let err = verify_presentation::<P256Suite>(&tampered, holder_pair.public_key())
            .expect_err("tampered presentation");
        assert!(err.is(Err::FailedSignatureVerification));
    }

    #[test]
    fn credential_wire_shape() {
        let (_, _, credential) = issue();
        let json = serde_json::to_value(&credential).expect("serialize");

        assert!(json.get("@context").is_some());
        assert!(json.get("issuanceDate").is_some());
        assert!(json.get("credentialSubject").is_some());
        assert!(json.get("expirationDate").is_none()); // skipped when unset
        assert!(json["proof"].get("verificationMethod").is_some());
    }
}
