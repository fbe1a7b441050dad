//! Client secret encryption using AES-256-GCM
//!
//! Secrets are stored as an envelope: one version byte, a random 96-bit
//! nonce, then the GCM ciphertext with its 16-byte tag. The owning service
//! ID is bound in as additional authenticated data, so an envelope copied
//! onto another service's row fails to open.

#![allow(deprecated)]

use std::fmt;

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::record::ClientSecret;

const ENVELOPE_V1: u8 = 0x01;
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + NONCE_LEN;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("crypto key must be 32 bytes, got {length}")]
    InvalidKeyLength { length: usize },
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("decrypted secret is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid ciphertext format")]
    InvalidFormat,
    #[error("empty ciphertext")]
    EmptyCiphertext,
}

/// AES-256 key; wiped from memory on drop.
#[derive(Clone)]
pub struct CryptoKey(Zeroizing<Vec<u8>>);

impl CryptoKey {
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(bytes);
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                length: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CryptoKey([REDACTED])")
    }
}

/// Borrowed view of a stored envelope.
struct Envelope<'a> {
    nonce: &'a [u8],
    sealed: &'a [u8],
}

impl<'a> Envelope<'a> {
    fn parse(bytes: &'a [u8]) -> Result<Self, CryptoError> {
        if bytes.is_empty() {
            return Err(CryptoError::EmptyCiphertext);
        }
        if !is_encrypted_payload(bytes) {
            return Err(CryptoError::InvalidFormat);
        }
        let (nonce, sealed) = bytes[1..].split_at(NONCE_LEN);
        Ok(Self { nonce, sealed })
    }
}

/// True when `bytes` carries the version byte and is long enough to hold a
/// nonce and tag.
pub fn is_encrypted_payload(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN + TAG_LEN && bytes[0] == ENVELOPE_V1
}

fn seal(key: &CryptoKey, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = key
        .cipher()
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut envelope = Vec::with_capacity(HEADER_LEN + sealed.len());
    envelope.push(ENVELOPE_V1);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&sealed);
    Ok(envelope)
}

fn open(key: &CryptoKey, aad: &[u8], bytes: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let envelope = Envelope::parse(bytes)?;
    key.cipher()
        .decrypt(
            Nonce::from_slice(envelope.nonce),
            Payload {
                msg: envelope.sealed,
                aad,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::DecryptionFailed)
}

fn client_secret_aad(service_id: i32) -> Vec<u8> {
    format!("oauth_config|{service_id}").into_bytes()
}

/// Encrypts the client secret of the OAuth config owned by `service_id`.
pub fn encrypt_client_secret(
    key: &CryptoKey,
    service_id: i32,
    secret: &ClientSecret,
) -> Result<Vec<u8>, CryptoError> {
    seal(key, &client_secret_aad(service_id), secret.expose().as_bytes())
}

/// Decrypts a stored client secret. Fails unless `service_id` matches the
/// one used at encryption time.
pub fn decrypt_client_secret(
    key: &CryptoKey,
    service_id: i32,
    ciphertext: &[u8],
) -> Result<ClientSecret, CryptoError> {
    let plaintext = open(key, &client_secret_aad(service_id), ciphertext)?;
    std::str::from_utf8(&plaintext)
        .map(|secret| ClientSecret::new(secret.to_string()))
        .map_err(|_| CryptoError::InvalidUtf8)
}
