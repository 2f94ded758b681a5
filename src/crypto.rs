//! Password-based encryption of the serialized note collection.
//!
//! Blobs are `salt.iv.ciphertext`, each part standard base64. The key is
//! derived with PBKDF2-HMAC-SHA256 and the payload sealed with AES-256-GCM,
//! so a wrong password and a tampered blob fail the same way.
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use log::{debug, warn};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use crate::{NotebookError, Result};

pub const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const IV_LEN: usize = 12;
const KEY_LEN: usize = 32;

fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

fn cipher_for(password: &str, salt: &[u8]) -> Result<Aes256Gcm> {
    let key = derive_key(password, salt);
    Aes256Gcm::new_from_slice(&key).map_err(|e| NotebookError::ApplicationError {
        message: format!("Failed to initialize cipher: {}", e),
    })
}

/// Encrypts `plaintext` with a key derived from `password`.
pub fn encrypt(plaintext: &str, password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let cipher = cipher_for(password, &salt)?;
    let sealed = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|_| NotebookError::ApplicationError {
            message: "Encryption failed".to_string(),
        })?;

    debug!("Encrypted {} bytes", plaintext.len());
    Ok([STANDARD.encode(salt), STANDARD.encode(iv), STANDARD.encode(sealed)].join("."))
}

/// Decrypts a blob produced by [`encrypt`].
///
/// Every failure is [`NotebookError::Decryption`]: a wrong password, a blob
/// that does not authenticate, and a blob that is not three base64 parts of
/// the right sizes all look the same to the caller.
pub fn decrypt(blob: &str, password: &str) -> Result<String> {
    let parts: Vec<&str> = blob.trim().split('.').collect();
    let [salt, iv, data] = parts.as_slice() else {
        return Err(malformed(format!("expected 3 parts, found {}", parts.len())));
    };

    let salt = decode_part("salt", salt)?;
    let iv = decode_part("iv", iv)?;
    let data = decode_part("ciphertext", data)?;
    if iv.len() != IV_LEN {
        return Err(malformed(format!(
            "iv must be {} bytes, found {}",
            IV_LEN,
            iv.len()
        )));
    }

    let cipher = cipher_for(password, &salt)?;
    let plain = cipher
        .decrypt(Nonce::from_slice(&iv), data.as_slice())
        .map_err(|_| {
            warn!("Rejected encrypted blob: authentication failed");
            NotebookError::Decryption
        })?;

    String::from_utf8(plain).map_err(|_| NotebookError::Decryption)
}

fn malformed(detail: String) -> NotebookError {
    warn!("Rejected encrypted blob: {}", detail);
    NotebookError::Decryption
}

fn decode_part(name: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| malformed(format!("{} is not valid base64: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_with_same_password() {
        let plaintext = r#"[{"id":"1","title":"Secret","content":"ünïcödé"}]"#;
        let blob = encrypt(plaintext, "hunter2").unwrap();
        assert_eq!(blob.split('.').count(), 3);
        assert_eq!(decrypt(&blob, "hunter2").unwrap(), plaintext);
    }

    #[test]
    fn wrong_password_fails_with_decryption_error() {
        let blob = encrypt("top secret", "right").unwrap();
        let err = decrypt(&blob, "wrong").unwrap_err();
        assert!(matches!(err, NotebookError::Decryption));
    }

    #[test]
    fn every_encryption_uses_fresh_salt_and_iv() {
        let a = encrypt("same", "pw").unwrap();
        let b = encrypt("same", "pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tampered_or_malformed_blobs_are_rejected() {
        let blob = encrypt("payload", "pw").unwrap();
        let mut parts: Vec<String> = blob.split('.').map(str::to_string).collect();
        let mut data = STANDARD.decode(&parts[2]).unwrap();
        data[0] ^= 0xff;
        parts[2] = STANDARD.encode(data);
        assert!(matches!(
            decrypt(&parts.join("."), "pw"),
            Err(NotebookError::Decryption)
        ));

        for bad in ["", "abc", "a.b", "!!.!!.!!", "AAAA.AAAA.AAAA"] {
            let result = decrypt(bad, "pw");
            assert!(
                matches!(result, Err(NotebookError::Decryption)),
                "{bad:?} gave {result:?}"
            );
        }
    }
}
