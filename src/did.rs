//! DID grammar for the `grets` method: construction, derivation, parsing and
//! validation of `did:grets:<organization>:<identifier>` strings.

use std::fmt::{self, Display};
use std::sync::LazyLock;

use regex::Regex;

use crate::hashing;

/// The DID method name for the GRETS network.
pub const DID_METHOD: &str = "grets";

/// Organization tokens recognized across the GRETS network.
pub const ORGANIZATIONS: [&str; 7] = [
    "government",
    "bank",
    "agency",
    "thirdparty",
    "audit",
    "investor",
    "administrator",
];

/// Number of hex characters in a server-minted identifier.
const IDENTIFIER_LEN: usize = 16;

static DID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^did:grets:[a-zA-Z]+:[a-zA-Z0-9]+$").expect("DID regex should compile")
});

/// The parsed form of a `did:grets` string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Did {
    /// The DID method, always `grets`.
    pub method: String,
    /// The organization the subject belongs to.
    pub organization: String,
    /// The token uniquely naming the subject within the organization.
    pub identifier: String,
}

impl Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}:{}", self.method, self.organization, self.identifier)
    }
}

/// True if `organization` is one of the fixed GRETS organization tokens.
#[must_use]
pub fn is_known_organization(organization: &str) -> bool {
    ORGANIZATIONS.contains(&organization)
}

/// Build a DID string for the organization. Uses the supplied identifier
/// verbatim when given, otherwise mints a random 16-hex-character token.
#[must_use]
pub fn generate_did(organization: &str, identifier: Option<&str>) -> String {
    let id = identifier.map_or_else(|| hashing::rand_hex(IDENTIFIER_LEN / 2), ToString::to_string);
    format!("did:{DID_METHOD}:{organization}:{id}")
}

/// Build a content-derived DID: the identifier is the first 16 hex characters
/// of SHA-256 over the subject id concatenated with the organization, matching
/// the convention the registration service uses to mint citizen DIDs.
#[must_use]
pub fn derive_did(organization: &str, subject_id: &str) -> String {
    let digest = hashing::sha256_hex(&format!("{subject_id}{organization}"));
    format!("did:{DID_METHOD}:{organization}:{}", &digest[..IDENTIFIER_LEN])
}

/// Split a DID string into its parts. Returns `None` unless there are exactly
/// four colon-delimited segments and the first two are `did` and `grets`.
#[must_use]
pub fn parse_did(did: &str) -> Option<Did> {
    let parts: Vec<&str> = did.split(':').collect();
    if parts.len() != 4 || parts[0] != "did" || parts[1] != DID_METHOD {
        return None;
    }

    Some(Did {
        method: parts[1].to_string(),
        organization: parts[2].to_string(),
        identifier: parts[3].to_string(),
    })
}

/// Structural DID check: parseable, alphabetic organization, non-empty
/// alphanumeric identifier.
#[must_use]
pub fn validate_did(did: &str) -> bool {
    DID_RE.is_match(did)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_round_trip() {
        let did = generate_did("government", Some("abc123"));
        assert_eq!(did, "did:grets:government:abc123");

        let parsed = parse_did(&did).expect("parse");
        assert_eq!(
            parsed,
            Did {
                method: "grets".to_string(),
                organization: "government".to_string(),
                identifier: "abc123".to_string(),
            }
        );
        assert_eq!(parsed.to_string(), did);
    }

    #[test]
    fn generated_identifier_is_sixteen_hex() {
        let did = generate_did("investor", None);
        let parsed = parse_did(&did).expect("parse");
        assert_eq!(parsed.identifier.len(), 16);
        assert!(parsed.identifier.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(validate_did(&did));
    }

    #[test]
    fn derived_did_is_deterministic() {
        let a = derive_did("government", "110101199001011234");
        let b = derive_did("government", "110101199001011234");
        assert_eq!(a, b);
        assert!(validate_did(&a));

        insta::assert_snapshot!(
            derive_did("investor", "subject-1"),
            @"did:grets:investor:035eef9a27a3c25b"
        );
    }

    #[test]
    fn rejects_foreign_method() {
        assert!(parse_did("did:other:government:abc123").is_none());
        assert!(!validate_did("did:other:government:abc123"));
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(!validate_did("not-a-did"));
        assert!(!validate_did("did:grets:government"));
        assert!(!validate_did("did:grets:government:abc:extra"));
        assert!(!validate_did("did:grets:gov1:abc123")); // non-alphabetic org
        assert!(!validate_did("did:grets:government:")); // empty identifier
        assert!(!validate_did("did:grets:government:ab-12")); // non-alphanumeric id
    }

    #[test]
    fn organization_membership() {
        assert!(is_known_organization("investor"));
        assert!(is_known_organization("audit"));
        assert!(!is_known_organization("realtor"));
    }
}
