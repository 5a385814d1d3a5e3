//! At-rest encryption for `provider_configs.api_key_encrypted` (I5).
//!
//! HKDF-SHA256 derives a ChaCha20-Poly1305 key from the operator-supplied
//! `APP_SECRET_KEY`; each encryption uses a fresh random nonce stored
//! alongside the ciphertext (`nonce_12 || ciphertext`). This is the same
//! HKDF+ChaCha20Poly1305 combination the teacher's relay session crypto
//! uses, minus the X25519 key exchange and replay counter — a static
//! at-rest secret has no peer to exchange keys with and no transport to
//! replay against, so a random nonce per write is sufficient.

use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{AeadCore, ChaCha20Poly1305, Key, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;
use ws_domain::{Error, Result};

const HKDF_INFO: &[u8] = b"worldline-provider-api-key-v1";

pub struct SecretBox {
    cipher: ChaCha20Poly1305,
}

impl SecretBox {
    pub fn new(app_secret_key: &str) -> Self {
        let hk = Hkdf::<Sha256>::new(None, app_secret_key.as_bytes());
        let mut okm = [0u8; 32];
        hk.expand(HKDF_INFO, &mut okm)
            .expect("32 bytes is a valid HKDF-SHA256 output length");
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&okm)),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| Error::Other("secret encryption failed".into()))?;
        let mut out = nonce.to_vec();
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, blob: &[u8]) -> Result<String> {
        if blob.len() < 12 {
            return Err(Error::Other("encrypted secret blob too short".into()));
        }
        let (nonce_bytes, ciphertext) = blob.split_at(12);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Error::Other("secret decryption failed".into()))?;
        String::from_utf8(plaintext).map_err(|_| Error::Other("decrypted secret is not valid UTF-8".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let sb = SecretBox::new("test-app-secret-key");
        let ct = sb.encrypt("sk-plain-api-key").unwrap();
        assert_ne!(ct, b"sk-plain-api-key");
        let pt = sb.decrypt(&ct).unwrap();
        assert_eq!(pt, "sk-plain-api-key");
    }

    #[test]
    fn different_keys_cannot_decrypt_each_other() {
        let a = SecretBox::new("key-a");
        let b = SecretBox::new("key-b");
        let ct = a.encrypt("secret").unwrap();
        assert!(b.decrypt(&ct).is_err());
    }

    #[test]
    fn ciphertext_is_nondeterministic() {
        let sb = SecretBox::new("test-app-secret-key");
        let ct1 = sb.encrypt("same-plaintext").unwrap();
        let ct2 = sb.encrypt("same-plaintext").unwrap();
        assert_ne!(ct1, ct2);
    }
}
