//! Password-gated local storage for one key pair. The entry occupies a single
//! fixed slot per vault directory and is protected with a password-derived
//! key: Argon2id for derivation, XChaCha20-Poly1305 for authenticated
//! encryption. Saves are last-write-wins with atomic file replacement.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::keys::{CryptoSuite, KeyPair};
use crate::{codec, error::Err, hashing, tracerr, Result};

/// The slot file name, carried over from the storage key the web clients use.
const SLOT_FILE: &str = "did_keypair.json";

const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 24;

// Argon2id parameters per the OWASP password-storage baseline.
const KDF_MEMORY_KIB: u32 = 19_456;
const KDF_TIME_COST: u32 = 2;
const KDF_PARALLELISM: u32 = 1;

/// The persisted vault entry.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct VaultEntry {
    /// Argon2id salt, hex.
    salt: String,
    /// AEAD nonce, hex.
    nonce: String,
    /// AEAD ciphertext of the serialized key pair record, base64url.
    ciphertext: String,
    /// Hex SHA-256 of the derived key; checked before decryption so a wrong
    /// password is reported distinctly from a tampered entry.
    password_check: String,
}

/// The plaintext record inside the ciphertext.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredKeyPair {
    public_key: String,
    private_key: String,
    timestamp: DateTime<Utc>,
}

/// A directory-scoped key-pair store with one fixed slot.
#[derive(Clone, Debug)]
pub struct Vault {
    dir: PathBuf,
}

impl Vault {
    /// A vault rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self) -> PathBuf {
        self.dir.join(SLOT_FILE)
    }

    /// Encrypt the key pair under `password` and write it to the slot,
    /// replacing any previous entry. The replacement is atomic (temp file
    /// plus rename); concurrent saves are last-write-wins.
    ///
    /// # Errors
    ///
    /// * `SerializationError` - the key pair record cannot be serialized.
    /// * `Encryption` - the AEAD failed.
    /// * `Io` - the slot file could not be written.
    pub fn save_key_pair<S: CryptoSuite>(
        &self, key_pair: &KeyPair<S>, password: &str,
    ) -> Result<()> {
        let record = StoredKeyPair {
            public_key: key_pair.public_key().to_string(),
            private_key: key_pair.private_key().to_string(),
            timestamp: Utc::now(),
        };
        let plaintext = match serde_json::to_vec(&record) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) => tracerr!(Err::SerializationError, "failed to serialize key pair: {}", e),
        };

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let key = derive_key(password, &salt)?;
        let cipher = match XChaCha20Poly1305::new_from_slice(key.as_slice()) {
            Ok(cipher) => cipher,
            Err(e) => tracerr!(Err::Encryption, "failed to initialize cipher: {}", e),
        };
        let payload = Payload {
            msg: &plaintext,
            aad: SLOT_FILE.as_bytes(),
        };
        let ciphertext = match cipher.encrypt(XNonce::from_slice(&nonce), payload) {
            Ok(ct) => ct,
            Err(e) => tracerr!(Err::Encryption, "failed to encrypt key pair: {}", e),
        };

        let entry = VaultEntry {
            salt: codec::bytes_to_hex(&salt),
            nonce: codec::bytes_to_hex(&nonce),
            ciphertext: codec::bytes_to_base64url(&ciphertext),
            password_check: codec::bytes_to_hex(&hashing::sha256(key.as_slice())),
        };
        let entry_json = match serde_json::to_vec(&entry) {
            Ok(bytes) => bytes,
            Err(e) => tracerr!(Err::SerializationError, "failed to serialize vault entry: {}", e),
        };

        self.write_slot(&entry_json)
    }

    /// Read, authenticate and decrypt the stored key pair. The public key is
    /// re-derived from the private scalar rather than trusted from storage.
    ///
    /// # Errors
    ///
    /// * `WrongPassword` - the password fingerprint mismatches.
    /// * `InvalidFormat` - a stored salt or nonce has the wrong length or
    ///   encoding.
    /// * `Decryption` - the AEAD rejected the (tampered) entry.
    /// * `DeserializationError` - the entry or record is not valid JSON.
    /// * `Io` - the slot file could not be read.
    pub fn load_key_pair<S: CryptoSuite>(&self, password: &str) -> Result<Option<KeyPair<S>>> {
        let raw = match fs::read(self.slot_path()) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => tracerr!(Err::Io, "failed to read vault slot: {}", e),
        };
        let entry: VaultEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => tracerr!(Err::DeserializationError, "vault entry is not valid JSON: {}", e),
        };

        let salt = codec::hex_to_bytes(&entry.salt)?;
        if salt.len() != SALT_LEN {
            tracerr!(Err::InvalidFormat, "vault salt is not {} bytes", SALT_LEN);
        }
        let nonce = codec::hex_to_bytes(&entry.nonce)?;
        if nonce.len() != NONCE_LEN {
            tracerr!(Err::InvalidFormat, "vault nonce is not {} bytes", NONCE_LEN);
        }
        let ciphertext = codec::base64url_to_bytes(&entry.ciphertext)?;

        let key = derive_key(password, &salt)?;
        if codec::bytes_to_hex(&hashing::sha256(key.as_slice())) != entry.password_check {
            tracerr!(Err::WrongPassword, "password fingerprint mismatch");
        }

        let cipher = match XChaCha20Poly1305::new_from_slice(key.as_slice()) {
            Ok(cipher) => cipher,
            Err(e) => tracerr!(Err::Decryption, "failed to initialize cipher: {}", e),
        };
        let payload = Payload {
            msg: ciphertext.as_slice(),
            aad: SLOT_FILE.as_bytes(),
        };
        let plaintext = match cipher.decrypt(XNonce::from_slice(&nonce), payload) {
            Ok(pt) => Zeroizing::new(pt),
            Err(_) => tracerr!(Err::Decryption, "vault entry failed authentication"),
        };

        let record: StoredKeyPair = match serde_json::from_slice(&plaintext) {
            Ok(record) => record,
            Err(e) => {
                tracerr!(Err::DeserializationError, "stored key pair is not valid JSON: {}", e)
            }
        };

        let public_key = KeyPair::<S>::derive_public_key(&record.private_key)?;
        Ok(Some(KeyPair::restore(&record.private_key, &public_key)?))
    }

    /// True if the slot holds an entry.
    #[must_use]
    pub fn has_key_pair(&self) -> bool {
        self.slot_path().is_file()
    }

    /// Delete the stored entry. Idempotent: succeeds when no entry exists.
    ///
    /// # Errors
    ///
    /// * `Io` - the slot file exists but could not be removed.
    pub fn remove_key_pair(&self) -> Result<()> {
        match fs::remove_file(self.slot_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => tracerr!(Err::Io, "failed to remove vault slot: {}", e),
        }
    }

    /// Write the entry to a temp file in the vault directory, then rename
    /// over the slot so readers never observe a partial entry.
    fn write_slot(&self, entry: &[u8]) -> Result<()> {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracerr!(Err::Io, "failed to create vault directory: {}", e);
        }
        let tmp = self.dir.join(format!("{SLOT_FILE}.tmp"));
        if let Err(e) = fs::write(&tmp, entry) {
            tracerr!(Err::Io, "failed to write vault slot: {}", e);
        }
        if let Err(e) = fs::rename(&tmp, self.slot_path()) {
            tracerr!(Err::Io, "failed to replace vault slot: {}", e);
        }
        Ok(())
    }
}

/// Derive the 32-byte AEAD key from the password with Argon2id.
fn derive_key(password: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let params = match Params::new(KDF_MEMORY_KIB, KDF_TIME_COST, KDF_PARALLELISM, Some(32)) {
        Ok(params) => params,
        Err(e) => tracerr!(Err::Encryption, "invalid KDF parameters: {}", e),
    };
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; 32]);
    if let Err(e) = argon2.hash_password_into(password.as_bytes(), salt, key.as_mut_slice()) {
        tracerr!(Err::Encryption, "key derivation failed: {}", e);
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::p256::P256Suite;

    fn vault() -> (tempfile::TempDir, Vault) {
        let dir = tempfile::tempdir().expect("temp dir");
        let vault = Vault::new(dir.path());
        (dir, vault)
    }

    #[test]
    fn save_load_round_trip() {
        let (_dir, vault) = vault();
        let pair = KeyPair::<P256Suite>::generate().expect("generate");

        assert!(!vault.has_key_pair());
        vault.save_key_pair(&pair, "correct horse").expect("save");
        assert!(vault.has_key_pair());

        let loaded = vault
            .load_key_pair::<P256Suite>("correct horse")
            .expect("load")
            .expect("entry present");
        assert_eq!(loaded.public_key(), pair.public_key());
        assert_eq!(loaded.private_key(), pair.private_key());
    }

    #[test]
    fn load_missing_returns_none() {
        let (_dir, vault) = vault();
        assert!(vault.load_key_pair::<P256Suite>("any").expect("load").is_none());
    }

    #[test]
    fn wrong_password_is_reported() {
        let (_dir, vault) = vault();
        let pair = KeyPair::<P256Suite>::generate().expect("generate");
        vault.save_key_pair(&pair, "right").expect("save");

        let err = vault.load_key_pair::<P256Suite>("wrong").expect_err("wrong password");
        assert!(err.is(Err::WrongPassword));
    }

    #[test]
    fn tampered_entry_is_rejected() {
        let (_dir, vault) = vault();
        let pair = KeyPair::<P256Suite>::generate().expect("generate");
        vault.save_key_pair(&pair, "pw").expect("save");

        // Flip one ciphertext byte; the password check still passes but the
        // AEAD must refuse.
        let raw = fs::read(vault.slot_path()).expect("read slot");
        let mut entry: VaultEntry = serde_json::from_slice(&raw).expect("parse entry");
        let mut ct = codec::base64url_to_bytes(&entry.ciphertext).expect("decode");
        ct[0] ^= 0xff;
        entry.ciphertext = codec::bytes_to_base64url(&ct);
        fs::write(vault.slot_path(), serde_json::to_vec(&entry).expect("serialize"))
            .expect("write tampered entry");

        let err = vault.load_key_pair::<P256Suite>("pw").expect_err("tampered");
        assert!(err.is(Err::Decryption));
    }

    #[test]
    fn truncated_salt_is_rejected() {
        let (_dir, vault) = vault();
        let pair = KeyPair::<P256Suite>::generate().expect("generate");
        vault.save_key_pair(&pair, "pw").expect("save");

        let raw = fs::read(vault.slot_path()).expect("read slot");
        let mut entry: VaultEntry = serde_json::from_slice(&raw).expect("parse entry");
        entry.salt = entry.salt[..8].to_string();
        fs::write(vault.slot_path(), serde_json::to_vec(&entry).expect("serialize"))
            .expect("write tampered entry");

        let err = vault.load_key_pair::<P256Suite>("pw").expect_err("short salt");
        assert!(err.is(Err::InvalidFormat));
    }

    #[test]
    fn resave_replaces_slot() {
        let (_dir, vault) = vault();
        let first = KeyPair::<P256Suite>::generate().expect("generate first");
        let second = KeyPair::<P256Suite>::generate().expect("generate second");

        vault.save_key_pair(&first, "pw-one").expect("save first");
        vault.save_key_pair(&second, "pw-two").expect("save second");

        let loaded = vault
            .load_key_pair::<P256Suite>("pw-two")
            .expect("load")
            .expect("entry present");
        assert_eq!(loaded.public_key(), second.public_key());

        // The first password no longer opens the slot.
        let err = vault.load_key_pair::<P256Suite>("pw-one").expect_err("old password");
        assert!(err.is(Err::WrongPassword));
    }

    #[test]
    fn remove_is_idempotent() {
        let (_dir, vault) = vault();
        let pair = KeyPair::<P256Suite>::generate().expect("generate");
        vault.save_key_pair(&pair, "pw").expect("save");

        vault.remove_key_pair().expect("remove");
        assert!(!vault.has_key_pair());
        vault.remove_key_pair().expect("remove again");
    }
}
