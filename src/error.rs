//! # Errors
//!
//! Error types used throughout the GRETS DID library. A typed, comparable error
//! code ([`Err`]) travels inside an opaque [`Error`] so callers can match on the
//! category while context messages remain free-form.

use std::fmt::Display;

use thiserror::Error;

/// Simplify creation of errors with tracing.
///
/// # Example
/// ```
/// use grets_did::error::Err;
/// use grets_did::{tracerr, Result};
///
/// fn with_msg() -> Result<()> {
///     tracerr!(Err::InvalidFormat, "message: {}", "some message")
/// }
///
/// fn no_msg() -> Result<()> {
///     tracerr!(Err::InvalidFormat)
/// }
/// ```
#[macro_export]
macro_rules! tracerr {
    // with context
    ($code:expr, $($msg:tt)*) => {
        {
        use $crate::error::Context as _;
        tracing::error!($($msg)*);
        return Err($code).context(format!($($msg)*));
        }
    };
    // no context
    ($code:expr) => {
        {
        tracing::error!("{}", $code);
        return Err($code.into());
        }
    }
}

/// Public error type for the GRETS DID library.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(#[from] anyhow::Error);

impl Error {
    /// Express the error in the wire format used by the GRETS API layer.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.0.root_cause().to_string(),
            "error_description": self.to_string(),
        })
    }

    /// Returns true if `err` is the typed code held by this error object.
    #[must_use]
    pub fn is(&self, err: Err) -> bool {
        self.0.downcast_ref::<Err>().is_some_and(|e| e == &err)
    }
}

/// Typed errors for the GRETS DID library.
#[derive(Clone, Copy, Error, Debug, PartialEq, Eq)]
pub enum Err {
    /// Malformed hex or base64url input. (See context for details)
    #[error("invalid_format")]
    InvalidFormat,

    /// Invalid input. Used where a verification fails that is more complex than
    /// a simple incorrect format. (See context for details)
    #[error("invalid_input")]
    InvalidInput,

    /// A key string fails its length or prefix check.
    #[error("invalid_key")]
    InvalidKey,

    /// The underlying primitive could not produce an exportable key pair.
    #[error("key_generation_error")]
    KeyGeneration,

    /// The underlying primitive rejected reconstructed key bytes.
    #[error("key_import_error")]
    KeyImport,

    /// A DER signature failed to parse or does not fit the curve.
    #[error("malformed_signature")]
    MalformedSignature,

    /// Failure to sign a message.
    #[error("signing_error")]
    Signing,

    /// Failure to verify a signature.
    #[error("failed_signature_verification")]
    FailedSignatureVerification,

    /// The vault password does not match the stored fingerprint.
    #[error("wrong_password")]
    WrongPassword,

    /// An expiry date is in the past.
    #[error("expired")]
    Expired,

    /// An error occurred trying to serialize data.
    #[error("serialization_error")]
    SerializationError,

    /// An error occurred trying to deserialize data.
    #[error("deserialization_error")]
    DeserializationError,

    /// Failure to encrypt a vault entry.
    #[error("encryption_error")]
    Encryption,

    /// Failure to decrypt a vault entry. Distinct from [`Err::WrongPassword`]:
    /// the password fingerprint matched but the AEAD rejected the ciphertext.
    #[error("decryption_error")]
    Decryption,

    /// An error occurred reading or writing vault storage.
    #[error("io_error")]
    Io,
}

/// Context is used to decorate errors with useful context information.
pub trait Context<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Adds context to the error.
    ///
    /// # Errors
    ///
    /// * Original error with context appended.
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static;
}

impl<T, E> Context<T, E> for core::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(e) => Err(Error(anyhow::Error::from(e).context(context))),
        }
    }
}

impl From<Err> for Error {
    fn from(error: Err) -> Self {
        Self(error.into())
    }
}

impl From<ecdsa::Error> for Error {
    fn from(err: ecdsa::Error) -> Self {
        Self(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    use super::*;
    use crate::Result;

    #[test]
    fn base_err() {
        let err: Error = Err::InvalidFormat.into();

        assert_eq!(
            err.to_json(),
            json!({"error":"invalid_format","error_description":"invalid_format"})
        );
        assert!(err.is(Err::InvalidFormat));
        assert!(!err.is(Err::InvalidKey));
    }

    #[test]
    fn context_err() {
        let res: Result<()> = Err(Err::WrongPassword).context("password fingerprint mismatch");
        let err = res.expect_err("expected error");

        assert_eq!(
            err.to_json(),
            json!({"error":"wrong_password","error_description":"password fingerprint mismatch"})
        );
        assert!(err.is(Err::WrongPassword));
    }

    #[test]
    fn primitive_err() {
        let err: Error = ecdsa::Error::new().into();
        assert!(err.to_string().contains("signature"));
        assert!(!err.is(Err::FailedSignatureVerification));
    }

    #[test]
    fn test_macro() {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::ERROR).finish();
        tracing::subscriber::set_global_default(subscriber).expect("setting subscriber failed");

        let Err(e) = run_macro() else {
            panic!("expected error");
        };

        assert_eq!(e.to_string(), "test me");
    }

    fn run_macro() -> Result<()> {
        tracerr!(Err::InvalidFormat, "test {}", "me")
    }
}
