//! Sealing for envelope values that ask for encryption.
//!
//! Layout of a sealed value (base64, standard alphabet):
//! `nonce (12 bytes) || ciphertext || tag (32 bytes)`.
//! The ciphertext is the plaintext XORed with a SHA-256 counter keystream
//! derived from the key and nonce; the tag is HMAC-SHA256 over nonce and
//! ciphertext. This protects stored values against casual reading and
//! tampering; it is not a vetted AEAD construction.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::StorageError;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 32;

#[derive(Clone)]
pub struct Cipher {
    enc_key: [u8; 32],
    mac_key: [u8; 32],
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cipher(..)")
    }
}

impl Cipher {
    pub fn new(secret: &str) -> Self {
        Self {
            enc_key: derive(secret, b"enc"),
            mac_key: derive(secret, b"mac"),
        }
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<String, StorageError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let mut out = Vec::with_capacity(NONCE_LEN + plaintext.len() + TAG_LEN);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(plaintext);
        self.apply_keystream(&nonce, &mut out[NONCE_LEN..]);

        let tag = self.mac(&out)?;
        out.extend_from_slice(&tag);
        Ok(STANDARD.encode(out))
    }

    pub fn open(&self, sealed: &str) -> Result<Vec<u8>, StorageError> {
        let raw = STANDARD.decode(sealed).map_err(|_| StorageError::Decrypt)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(StorageError::Decrypt);
        }
        let (body, tag) = raw.split_at(raw.len() - TAG_LEN);

        let mut mac = HmacSha256::new_from_slice(&self.mac_key).map_err(|_| StorageError::Decrypt)?;
        mac.update(body);
        mac.verify_slice(tag).map_err(|_| StorageError::Decrypt)?;

        let (nonce, ciphertext) = body.split_at(NONCE_LEN);
        let mut plaintext = ciphertext.to_vec();
        self.apply_keystream(nonce, &mut plaintext);
        Ok(plaintext)
    }

    fn apply_keystream(&self, nonce: &[u8], data: &mut [u8]) {
        for (counter, chunk) in data.chunks_mut(32).enumerate() {
            let mut hasher = Sha256::new();
            hasher.update(self.enc_key);
            hasher.update(nonce);
            hasher.update((counter as u64).to_be_bytes());
            let block = hasher.finalize();
            for (byte, key) in chunk.iter_mut().zip(block.iter()) {
                *byte ^= key;
            }
        }
    }

    fn mac(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.mac_key).map_err(|_| StorageError::Decrypt)?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn derive(secret: &str, label: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(label);
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_value_opens_with_same_secret() {
        let cipher = Cipher::new("s3cret");
        let sealed = cipher.seal(br#"{"email":"a@b.c"}"#).unwrap();
        assert!(!sealed.contains("email"));
        assert_eq!(cipher.open(&sealed).unwrap(), br#"{"email":"a@b.c"}"#);
    }

    #[test]
    fn long_values_span_several_keystream_blocks() {
        let cipher = Cipher::new("s3cret");
        let text = "x".repeat(200);
        let sealed = cipher.seal(text.as_bytes()).unwrap();
        assert_eq!(cipher.open(&sealed).unwrap(), text.as_bytes());
    }

    #[test]
    fn other_secret_or_tampering_is_rejected() {
        let cipher = Cipher::new("s3cret");
        let sealed = cipher.seal(b"payload").unwrap();
        assert!(Cipher::new("other").open(&sealed).is_err());

        let mut raw = STANDARD.decode(&sealed).unwrap();
        raw[NONCE_LEN] ^= 0x01;
        assert!(cipher.open(&STANDARD.encode(raw)).is_err());
        assert!(cipher.open("not base64 at all!").is_err());
    }
}
