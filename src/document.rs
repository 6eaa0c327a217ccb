//! DID document construction. The JSON field names are a wire contract with
//! the GRETS registration service and are fixed here as serde renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The JSON-LD context for DID documents.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Verification key type for P-256 ECDSA keys.
pub const VERIFICATION_KEY_TYPE: &str = "EcdsaSecp256r1VerificationKey2019";

/// Service type advertised in every GRETS DID document.
pub const SERVICE_TYPE: &str = "GretsService";

/// Endpoint of the GRETS transaction API.
pub const SERVICE_ENDPOINT: &str = "https://grets.example.com/api/v1";

/// A DID document binding a `did:grets` identifier to its public key and the
/// subject's place in the network. Constructed once at identity issuance and
/// immutable thereafter.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// The JSON-LD context.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// The DID this document describes.
    pub id: String,
    /// Public keys bound to the DID.
    pub public_key: Vec<PublicKeyEntry>,
    /// Verification methods referencing the public keys.
    pub verification_method: Vec<VerificationMethod>,
    /// Verification method ids usable for authentication.
    pub authentication: Vec<String>,
    /// Service endpoints advertised by the subject.
    pub service: Vec<Service>,
    /// The GRETS organization the subject belongs to.
    pub organization: String,
    /// The subject's role within the organization.
    pub role: String,
    /// Issuance timestamp.
    pub created: DateTime<Utc>,
    /// Last update timestamp. Equal to `created` at issuance.
    pub updated: DateTime<Utc>,
}

/// A public key entry in a DID document, carrying the hex wire encoding.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyEntry {
    /// Key id, `<did>#keys-1`.
    pub id: String,
    /// Key type.
    #[serde(rename = "type")]
    pub key_type: String,
    /// The DID controlling this key.
    pub controller: String,
    /// 130 hex characters, uncompressed point.
    pub public_key_hex: String,
}

/// A verification method entry in a DID document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Verification method id, `<did>#vm-1`.
    pub id: String,
    /// Key type.
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID controlling this method.
    pub controller: String,
    /// Key material reference. Carries the same hex encoding as the public
    /// key entry; the field name is the registration service's contract.
    pub public_key_multibase: String,
}

/// A service endpoint entry in a DID document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service id, `<did>#grets-service`.
    pub id: String,
    /// Service type.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Endpoint URL.
    pub service_endpoint: String,
}

/// Construct the DID document for a newly issued identity. Pure: no side
/// effects beyond reading the clock for the `created`/`updated` timestamps.
#[must_use]
pub fn create_did_document(
    did: &str, organization: &str, role: &str, public_key_hex: &str,
) -> DidDocument {
    let now = Utc::now();
    let vm_id = format!("{did}#vm-1");

    DidDocument {
        context: vec![DID_CONTEXT.to_string()],
        id: did.to_string(),
        public_key: vec![PublicKeyEntry {
            id: format!("{did}#keys-1"),
            key_type: VERIFICATION_KEY_TYPE.to_string(),
            controller: did.to_string(),
            public_key_hex: public_key_hex.to_string(),
        }],
        verification_method: vec![VerificationMethod {
            id: vm_id.clone(),
            method_type: VERIFICATION_KEY_TYPE.to_string(),
            controller: did.to_string(),
            public_key_multibase: public_key_hex.to_string(),
        }],
        authentication: vec![vm_id],
        service: vec![Service {
            id: format!("{did}#grets-service"),
            service_type: SERVICE_TYPE.to_string(),
            service_endpoint: SERVICE_ENDPOINT.to_string(),
        }],
        organization: organization.to_string(),
        role: role.to_string(),
        created: now,
        updated: now,
    }
}
