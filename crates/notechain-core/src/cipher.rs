//! Note cipher and content digests.
//!
//! Notes are sealed with AES-256-GCM under a single symmetric key. Every call
//! to [`CipherCodec::encrypt`] draws a fresh 96-bit IV from the OS RNG, so
//! encrypting the same note twice yields two different ciphertexts.
//!
//! Wire format of `EncryptedPayload::encrypted_data`: lowercase hex of
//! `iv || ciphertext || tag`.

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::constants::{IV_SIZE, KEY_SIZE};
use crate::error::CipherError;
use crate::note::{EncryptedPayload, Note, NoteBody};

const TAG_SIZE: usize = 16;

/// Built-in key used when no key is configured. Every install shares it, so it
/// provides no confidentiality against anyone who has read this source.
const DEFAULT_KEY: [u8; KEY_SIZE] = *b"notechain-default-key-change-me!";

/// Symmetric key material for [`CipherCodec`].
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKey([u8; KEY_SIZE]);

impl CipherKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CipherError::InvalidKey {
            expected: KEY_SIZE,
        })?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self, CipherError> {
        let bytes = hex::decode(s.trim()).map_err(|_| CipherError::InvalidKey {
            expected: KEY_SIZE,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_KEY
    }
}

impl Default for CipherKey {
    fn default() -> Self {
        Self(DEFAULT_KEY)
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey(..)")
    }
}

/// Encrypts, decrypts and digests note payloads.
///
/// Holds no mutable state; a single codec may be shared across threads.
#[derive(Clone)]
pub struct CipherCodec {
    cipher: Aes256Gcm,
}

impl fmt::Debug for CipherCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherCodec").finish_non_exhaustive()
    }
}

impl Default for CipherCodec {
    fn default() -> Self {
        Self::new(&CipherKey::default())
    }
}

impl CipherCodec {
    pub fn new(key: &CipherKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(&key.0.into()),
        }
    }

    /// Encrypt `{title, content, tags}` of `note`. The payload keeps the
    /// note's id and timestamps in the clear.
    pub fn encrypt(&self, note: &Note) -> Result<EncryptedPayload, CipherError> {
        let body = NoteBody {
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.clone(),
        };
        let plaintext = serde_json::to_vec(&body).map_err(|_| CipherError::Encrypt)?;

        let mut iv = [0u8; IV_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut iv);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
            .map_err(|_| CipherError::Encrypt)?;

        let mut sealed = Vec::with_capacity(IV_SIZE + ciphertext.len());
        sealed.extend_from_slice(&iv);
        sealed.extend_from_slice(&ciphertext);

        Ok(EncryptedPayload {
            id: note.id.clone(),
            encrypted_data: hex::encode(sealed),
            created_at: note.created_at,
            updated_at: note.updated_at,
        })
    }

    /// Recover the note sealed in `payload`. Timestamps come from the payload.
    pub fn decrypt(&self, payload: &EncryptedPayload) -> Result<Note, CipherError> {
        let sealed = hex::decode(&payload.encrypted_data)
            .map_err(|e| CipherError::Encoding(e.to_string()))?;
        if sealed.len() < IV_SIZE + TAG_SIZE {
            return Err(CipherError::Encoding(format!(
                "{} bytes is shorter than iv and tag",
                sealed.len()
            )));
        }
        let (iv, ciphertext) = sealed.split_at(IV_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;
        if plaintext.is_empty() {
            return Err(CipherError::Plaintext("empty".into()));
        }
        let body: NoteBody = serde_json::from_slice(&plaintext)
            .map_err(|e| CipherError::Plaintext(e.to_string()))?;

        Ok(Note {
            id: payload.id.clone(),
            title: body.title,
            content: body.content,
            tags: body.tags,
            created_at: payload.created_at,
            updated_at: payload.updated_at,
        })
    }

    pub fn digest(&self, data: &str) -> String {
        digest(data)
    }

    pub fn verify(&self, data: &str, expected: &str) -> bool {
        digest(data) == expected
    }
}

/// Lowercase hex SHA-256 of the UTF-8 bytes of `data`.
pub fn digest(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}
