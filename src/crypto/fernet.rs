//! Fernet authenticated encryption
//!
//! Tokens are interchangeable with other Fernet implementations:
//!
//! ```text
//! 0x80 | timestamp (u64, big endian) | iv (16) | AES-128-CBC ciphertext | HMAC-SHA256 (32)
//! ```
//!
//! The whole byte string is encoded with URL-safe base64 (padded). The HMAC
//! covers every byte before it and is checked in constant time before any
//! decryption is attempted.

use aes::Aes128;
use base64::{engine::general_purpose::URL_SAFE, Engine};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ColcryptError, ColcryptResult};

use super::DerivedKey;

type HmacSha256 = Hmac<Sha256>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Version byte at the start of every token
pub const VERSION: u8 = 0x80;

/// Size of the CBC initialization vector in bytes
pub const IV_LEN: usize = 16;

/// Size of the HMAC-SHA256 tag in bytes
pub const TAG_LEN: usize = 32;

/// Maximum tolerated clock skew when a TTL is enforced, in seconds
pub const MAX_CLOCK_SKEW: u64 = 60;

const BLOCK_LEN: usize = 16;
const HALF_KEY_LEN: usize = 16;
const HEADER_LEN: usize = 1 + 8 + IV_LEN;
const MIN_TOKEN_LEN: usize = HEADER_LEN + BLOCK_LEN + TAG_LEN;

/// Why a token failed to decrypt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecryptFailure {
    /// Wrong key, tampered token, or malformed token
    #[error("invalid token: incorrect password or corrupted value")]
    InvalidToken,

    /// The token authenticated but is older than the requested TTL
    #[error("token expired")]
    Expired,

    /// The token authenticated but its payload is not UTF-8 text
    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,
}

/// A Fernet instance bound to one key
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Fernet {
    signing_key: [u8; HALF_KEY_LEN],
    encryption_key: [u8; HALF_KEY_LEN],
}

impl Fernet {
    /// Split a derived key into its signing and encryption halves
    pub fn new(key: &DerivedKey) -> Self {
        let bytes = key.as_bytes();
        let mut signing_key = [0u8; HALF_KEY_LEN];
        let mut encryption_key = [0u8; HALF_KEY_LEN];
        signing_key.copy_from_slice(&bytes[..HALF_KEY_LEN]);
        encryption_key.copy_from_slice(&bytes[HALF_KEY_LEN..]);
        Self {
            signing_key,
            encryption_key,
        }
    }

    /// Build from the URL-safe base64 text form of a key
    pub fn from_encoded_key(encoded: &str) -> ColcryptResult<Self> {
        let key = DerivedKey::from_encoded(encoded)?;
        Ok(Self::new(&key))
    }

    /// Encrypt with a fresh random IV and the current time
    pub fn encrypt(&self, plaintext: &[u8]) -> ColcryptResult<String> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        self.encrypt_at(plaintext, current_timestamp(), iv)
    }

    /// Encrypt with an explicit timestamp and IV
    ///
    /// Reusing an IV under the same key leaks plaintext equality; outside
    /// of known-answer tests use [`Fernet::encrypt`].
    pub fn encrypt_at(
        &self,
        plaintext: &[u8],
        timestamp: u64,
        iv: [u8; IV_LEN],
    ) -> ColcryptResult<String> {
        let ciphertext = Aes128CbcEnc::new(&self.encryption_key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len() + TAG_LEN);
        token.push(VERSION);
        token.extend_from_slice(&timestamp.to_be_bytes());
        token.extend_from_slice(&iv);
        token.extend_from_slice(&ciphertext);

        let mut mac = self.mac()?;
        mac.update(&token);
        token.extend_from_slice(&mac.finalize().into_bytes());

        Ok(URL_SAFE.encode(token))
    }

    /// Verify and decrypt a token
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, DecryptFailure> {
        self.decrypt_checked(token, None)
    }

    /// Verify and decrypt a token, rejecting it if it is older than `ttl`
    /// seconds relative to `now` (UNIX seconds) or dated too far in the future
    pub fn decrypt_with_ttl(
        &self,
        token: &str,
        ttl: u64,
        now: u64,
    ) -> Result<Vec<u8>, DecryptFailure> {
        self.decrypt_checked(token, Some((ttl, now)))
    }

    fn decrypt_checked(
        &self,
        token: &str,
        time_check: Option<(u64, u64)>,
    ) -> Result<Vec<u8>, DecryptFailure> {
        let data = URL_SAFE
            .decode(token.as_bytes())
            .map_err(|_| DecryptFailure::InvalidToken)?;

        if data.len() < MIN_TOKEN_LEN || data[0] != VERSION {
            return Err(DecryptFailure::InvalidToken);
        }

        let (signed, tag) = data.split_at(data.len() - TAG_LEN);
        let mut mac = self.mac().map_err(|_| DecryptFailure::InvalidToken)?;
        mac.update(signed);
        mac.verify_slice(tag)
            .map_err(|_| DecryptFailure::InvalidToken)?;

        let mut timestamp_bytes = [0u8; 8];
        timestamp_bytes.copy_from_slice(&signed[1..9]);
        let timestamp = u64::from_be_bytes(timestamp_bytes);

        if let Some((ttl, now)) = time_check {
            if timestamp.saturating_add(ttl) < now {
                return Err(DecryptFailure::Expired);
            }
            if now.saturating_add(MAX_CLOCK_SKEW) < timestamp {
                return Err(DecryptFailure::InvalidToken);
            }
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&signed[9..HEADER_LEN]);

        let ciphertext = &signed[HEADER_LEN..];
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(DecryptFailure::InvalidToken);
        }

        Aes128CbcDec::new(&self.encryption_key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| DecryptFailure::InvalidToken)
    }

    fn mac(&self) -> ColcryptResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| ColcryptError::Encryption(format!("Failed to create HMAC: {}", e)))
    }
}

/// Current UNIX time in seconds, clamped at zero
pub fn current_timestamp() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// Extract the embedded timestamp of a token without authenticating it
pub fn token_timestamp(token: &str) -> Option<u64> {
    let data = URL_SAFE.decode(token.as_bytes()).ok()?;
    if data.len() < 9 || data[0] != VERSION {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[1..9]);
    Some(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_derivation::{derive_key, KeyDerivationParams};

    // Published Fernet test vector
    const VECTOR_KEY: &str = "cw_0x689RpI-jtRR7oE8h_eQsKImvJapLeSbXpwF4e4=";
    const VECTOR_TOKEN: &str = "gAAAAAAdwJ6wAAECAwQFBgcICQoLDA0ODy021cpGVWKZ_eEwCGM4BLLF_5CV9dOPmrhuVUPgJobwOz7JcbmrR64jVmpU4IwqDA==";
    const VECTOR_TIMESTAMP: u64 = 499_162_800;
    const VECTOR_IV: [u8; IV_LEN] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

    fn test_fernet() -> Fernet {
        let params = KeyDerivationParams::with_values([7u8; 16], 1000).unwrap();
        Fernet::new(&derive_key("test_password", &params))
    }

    #[test]
    fn test_known_vector_encrypt() {
        let fernet = Fernet::from_encoded_key(VECTOR_KEY).unwrap();
        let token = fernet
            .encrypt_at(b"hello", VECTOR_TIMESTAMP, VECTOR_IV)
            .unwrap();
        assert_eq!(token, VECTOR_TOKEN);
    }

    #[test]
    fn test_known_vector_decrypt() {
        let fernet = Fernet::from_encoded_key(VECTOR_KEY).unwrap();
        assert_eq!(fernet.decrypt(VECTOR_TOKEN).unwrap(), b"hello");
    }

    #[test]
    fn test_known_vector_ttl() {
        let fernet = Fernet::from_encoded_key(VECTOR_KEY).unwrap();
        let within = fernet.decrypt_with_ttl(VECTOR_TOKEN, 60, VECTOR_TIMESTAMP + 30);
        assert_eq!(within.unwrap(), b"hello");

        let expired = fernet.decrypt_with_ttl(VECTOR_TOKEN, 60, VECTOR_TIMESTAMP + 61);
        assert_eq!(expired, Err(DecryptFailure::Expired));
    }

    #[test]
    fn test_far_future_token_rejected_with_ttl() {
        let fernet = test_fernet();
        let token = fernet.encrypt_at(b"hello", 10_000, VECTOR_IV).unwrap();
        let result = fernet.decrypt_with_ttl(&token, 60, 10_000 - MAX_CLOCK_SKEW - 1);
        assert_eq!(result, Err(DecryptFailure::InvalidToken));

        // Within the skew window it is accepted
        let result = fernet.decrypt_with_ttl(&token, 60, 10_000 - MAX_CLOCK_SKEW);
        assert_eq!(result.unwrap(), b"hello");
    }

    #[test]
    fn test_encrypt_decrypt() {
        let fernet = test_fernet();
        let token = fernet.encrypt(b"Hello, World!").unwrap();
        assert_eq!(fernet.decrypt(&token).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_empty_plaintext() {
        let fernet = test_fernet();
        let token = fernet.encrypt(b"").unwrap();
        assert_eq!(fernet.decrypt(&token).unwrap(), b"");
    }

    #[test]
    fn test_large_plaintext() {
        let fernet = test_fernet();
        let plaintext: Vec<u8> = (0..10000).map(|i| (i % 256) as u8).collect();
        let token = fernet.encrypt(&plaintext).unwrap();
        assert_eq!(fernet.decrypt(&token).unwrap(), plaintext);
    }

    #[test]
    fn test_different_ivs() {
        let fernet = test_fernet();
        let token1 = fernet.encrypt(b"Hello, World!").unwrap();
        let token2 = fernet.encrypt(b"Hello, World!").unwrap();
        assert_ne!(token1, token2);
    }

    #[test]
    fn test_token_layout() {
        let fernet = test_fernet();
        let token = fernet.encrypt_at(b"hello", 1234, VECTOR_IV).unwrap();
        let data = URL_SAFE.decode(&token).unwrap();
        assert_eq!(data[0], VERSION);
        assert_eq!(data.len(), HEADER_LEN + BLOCK_LEN + TAG_LEN);
        assert_eq!(&data[9..25], &VECTOR_IV);
        assert_eq!(token_timestamp(&token), Some(1234));
    }

    #[test]
    fn test_wrong_key_fails() {
        let fernet1 = test_fernet();
        let params = KeyDerivationParams::with_values([7u8; 16], 1000).unwrap();
        let fernet2 = Fernet::new(&derive_key("different_password", &params));

        let token = fernet1.encrypt(b"Hello, World!").unwrap();
        assert_eq!(fernet2.decrypt(&token), Err(DecryptFailure::InvalidToken));
    }

    #[test]
    fn test_every_byte_flip_detected() {
        let fernet = test_fernet();
        let token = fernet.encrypt(b"tamper me").unwrap();
        let data = URL_SAFE.decode(&token).unwrap();

        for i in 0..data.len() {
            let mut tampered = data.clone();
            tampered[i] ^= 0x01;
            let tampered_token = URL_SAFE.encode(&tampered);
            assert_eq!(
                fernet.decrypt(&tampered_token),
                Err(DecryptFailure::InvalidToken),
                "flip at byte {} was not detected",
                i
            );
        }
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let fernet = test_fernet();
        assert_eq!(fernet.decrypt(""), Err(DecryptFailure::InvalidToken));
        assert_eq!(fernet.decrypt("hello world"), Err(DecryptFailure::InvalidToken));
        assert_eq!(fernet.decrypt("gAAAAA=="), Err(DecryptFailure::InvalidToken));

        // Correct length but wrong version byte
        let mut data = vec![0u8; MIN_TOKEN_LEN];
        data[0] = 0x81;
        assert_eq!(
            fernet.decrypt(&URL_SAFE.encode(&data)),
            Err(DecryptFailure::InvalidToken)
        );
    }

    #[test]
    fn test_token_timestamp_rejects_garbage() {
        assert_eq!(token_timestamp("plain text"), None);
        assert_eq!(token_timestamp(""), None);
    }
}
