//! Session cookie sealing using AES-256-GCM
//!
//! Cookie values are `base64url(version || nonce || ciphertext)`. The cipher
//! key is the SHA-256 digest of the configured session key, so any key
//! length is accepted.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// AES-256-GCM nonce size (96 bits / 12 bytes)
const NONCE_SIZE: usize = 12;

/// Version byte prepended to every sealed value
const CODEC_VERSION: u8 = 0x01;

#[derive(Clone)]
pub struct SessionCodec {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("cipher", &"[REDACTED]")
            .finish()
    }
}

impl SessionCodec {
    /// # Errors
    /// Returns `StoreInit` if the key is empty.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::StoreInit("session.key must not be empty".to_string()));
        }
        let digest = Sha256::digest(key);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&digest));
        Ok(Self { cipher })
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| Error::Codec(format!("Session encryption failed: {e}")))?;

        let mut combined = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        combined.push(CODEC_VERSION);
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    pub fn open(&self, sealed: &str) -> Result<Vec<u8>> {
        let combined = URL_SAFE_NO_PAD
            .decode(sealed.trim())
            .map_err(|e| Error::Codec(format!("Invalid session cookie encoding: {e}")))?;

        let Some((&version, rest)) = combined.split_first() else {
            return Err(Error::Codec("Session cookie is empty".to_string()));
        };
        if version != CODEC_VERSION {
            return Err(Error::Codec(format!(
                "Unsupported session cookie version: {version}"
            )));
        }
        if rest.len() < NONCE_SIZE {
            return Err(Error::Codec("Session cookie too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Error::Codec("Session cookie failed authentication".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let codec = SessionCodec::new(b"short key").unwrap();
        let sealed = codec.seal(b"session-id-123").unwrap();
        assert!(!sealed.contains("session-id-123"));
        assert_eq!(codec.open(&sealed).unwrap(), b"session-id-123");
    }

    #[test]
    fn test_nonce_differs_per_seal() {
        let codec = SessionCodec::new(b"key").unwrap();
        assert_ne!(codec.seal(b"same").unwrap(), codec.seal(b"same").unwrap());
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(SessionCodec::new(b""), Err(Error::StoreInit(_))));
    }

    #[test]
    fn test_tampered_value_rejected() {
        let codec = SessionCodec::new(b"key").unwrap();
        let mut raw = URL_SAFE_NO_PAD.decode(codec.seal(b"payload").unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        assert!(matches!(
            codec.open(&URL_SAFE_NO_PAD.encode(raw)),
            Err(Error::Codec(_))
        ));
    }

    #[test]
    fn test_other_key_rejected() {
        let sealed = SessionCodec::new(b"key-a").unwrap().seal(b"payload").unwrap();
        assert!(SessionCodec::new(b"key-b").unwrap().open(&sealed).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = SessionCodec::new(b"key").unwrap();
        assert!(codec.open("").is_err());
        assert!(codec.open("not base64 !!").is_err());
        assert!(codec.open("AQID").is_err());
    }
}
