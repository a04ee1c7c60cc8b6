//! Payload encryption
//!
//! Stored payloads are sealed with ChaCha20-Poly1305 under a key taken from
//! configuration. Each record gets a fresh random nonce; the stored form is
//! `v1:<nonce>:<ciphertext>` with both parts URL-safe base64 without padding.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use crate::utils::errors::{QuickyError, Result};

/// Required key length in bytes
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;
const ENVELOPE_VERSION: &str = "v1";

/// Symmetric cipher for stored content payloads
#[derive(Clone)]
pub struct PayloadCipher {
    key: [u8; KEY_LEN],
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCipher").field("key", &"<redacted>").finish()
    }
}

impl PayloadCipher {
    /// Create a cipher from raw key material
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(QuickyError::Config(format!(
                "Encryption key must be {} bytes, got {}",
                KEY_LEN,
                key.len()
            )));
        }

        let mut material = [0u8; KEY_LEN];
        material.copy_from_slice(key);
        Ok(Self { key: material })
    }

    /// Create a cipher from a base64 key (standard or URL-safe alphabet)
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim();
        let decoded = STANDARD
            .decode(trimmed)
            .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed))
            .map_err(|e| QuickyError::Config(format!("Encryption key is not valid base64: {}", e)))?;

        Self::new(&decoded)
    }

    /// Generate a fresh random key, base64 encoded
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        STANDARD.encode(key)
    }

    /// Seal a plaintext payload
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .aead()
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| QuickyError::Encryption(format!("Failed to seal payload: {}", e)))?;

        Ok(format!(
            "{}:{}:{}",
            ENVELOPE_VERSION,
            URL_SAFE_NO_PAD.encode(nonce),
            URL_SAFE_NO_PAD.encode(ciphertext)
        ))
    }

    /// Open a stored payload. Fails on any envelope, tag or encoding problem.
    pub fn decrypt(&self, envelope: &str) -> Result<String> {
        let mut parts = envelope.split(':');
        let version = parts.next().unwrap_or_default();
        let nonce_b64 = parts.next().unwrap_or_default();
        let ciphertext_b64 = parts.next().unwrap_or_default();

        if version != ENVELOPE_VERSION || parts.next().is_some() {
            return Err(QuickyError::Decryption("Unrecognized payload envelope".to_string()));
        }

        let nonce = URL_SAFE_NO_PAD
            .decode(nonce_b64)
            .map_err(|e| QuickyError::Decryption(format!("Invalid nonce encoding: {}", e)))?;
        if nonce.len() != NONCE_LEN {
            return Err(QuickyError::Decryption("Invalid nonce length".to_string()));
        }
        let ciphertext = URL_SAFE_NO_PAD
            .decode(ciphertext_b64)
            .map_err(|e| QuickyError::Decryption(format!("Invalid payload encoding: {}", e)))?;

        let plaintext = self
            .aead()
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|_| QuickyError::Decryption("Payload authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| QuickyError::Decryption(format!("Payload is not UTF-8: {}", e)))
    }

    fn aead(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.key))
    }
}
