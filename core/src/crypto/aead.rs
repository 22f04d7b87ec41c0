// ## 📂 File: `src/crypto/aead.rs`

//! src/crypto/aead.rs
//! Opaque AEAD capability and the RustCrypto-backed implementations.
//!
//! Design notes:
//! - The engine only ever sees `AeadPrimitive::{seal, open}`. Any conforming
//!   backend (software, hardware, a test double) can be injected.
//! - All shipped suites use 12-byte nonces and 16-byte tags.
//! - Tag verification is constant-time inside the backend and fails closed
//!   (no partial plaintext).

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce as AesNonce};
use chacha20poly1305::{ChaCha20Poly1305, Nonce as ChaNonce};

use crate::crypto::types::{Algorithm, CryptoError, Key, NONCE_LEN_12, TAG_LEN};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// The `{seal, open}` capability the engine drives.
///
/// Implementations must be deterministic for identical inputs and must
/// return `CryptoError::Authentication` (and nothing else) when a tag does
/// not verify. Tags are always `TAG_LEN` bytes and appended to the
/// ciphertext.
pub trait AeadPrimitive: Send + Sync {
    /// Human-readable suite name, used in logs and telemetry.
    fn name(&self) -> &str;

    /// Key lengths in bytes the primitive accepts.
    fn key_lengths(&self) -> &[usize];

    /// Nonce length in bytes.
    fn nonce_len(&self) -> usize {
        NONCE_LEN_12
    }

    /// `seal(key, nonce, aad, plaintext) -> ciphertext‖tag`
    fn seal(&self, key: &Key, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// `open(key, nonce, aad, ciphertext‖tag) -> plaintext`
    fn open(&self, key: &Key, nonce: &[u8], aad: &[u8], ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Keyed cipher instance for one of the supported algorithms.
#[derive(Clone)]
pub enum AeadImpl {
    Aes128Gcm(Aes128Gcm),
    Aes192Gcm(Aes192Gcm),
    Aes256Gcm(Aes256Gcm),
    ChaCha(ChaCha20Poly1305),
}

impl AeadImpl {
    /// Construct the keyed cipher, rejecting key lengths the algorithm does not take.
    pub fn from_algorithm_and_key(alg: Algorithm, key: &[u8]) -> Result<Self, CryptoError> {
        let invalid = || CryptoError::InvalidKey {
            expected: alg.key_lengths().to_vec(),
            actual: key.len(),
        };

        if !alg.key_lengths().contains(&key.len()) {
            return Err(invalid());
        }

        let cipher = match alg {
            Algorithm::Aes128Gcm => Self::Aes128Gcm(Aes128Gcm::new_from_slice(key).map_err(|_| invalid())?),
            Algorithm::Aes192Gcm => Self::Aes192Gcm(Aes192Gcm::new_from_slice(key).map_err(|_| invalid())?),
            Algorithm::Aes256Gcm => Self::Aes256Gcm(Aes256Gcm::new_from_slice(key).map_err(|_| invalid())?),
            Algorithm::Chacha20Poly1305 => Self::ChaCha(ChaCha20Poly1305::new_from_slice(key).map_err(|_| invalid())?),
        };
        Ok(cipher)
    }

    /// AEAD seal (encrypt) plaintext with nonce and AAD.
    pub fn seal(&self, nonce_12: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_nonce(nonce_12)?;
        let payload = Payload { msg: plaintext, aad };

        let sealed = match self {
            AeadImpl::Aes128Gcm(c) => c.encrypt(AesNonce::from_slice(nonce_12), payload),
            AeadImpl::Aes192Gcm(c) => c.encrypt(AesNonce::from_slice(nonce_12), payload),
            AeadImpl::Aes256Gcm(c) => c.encrypt(AesNonce::from_slice(nonce_12), payload),
            AeadImpl::ChaCha(c) => c.encrypt(ChaNonce::from_slice(nonce_12), payload),
        };
        sealed.map_err(|_| CryptoError::Primitive(format!("{} seal failed", self.name())))
    }

    /// AEAD open (decrypt) ciphertext‖tag with nonce and AAD.
    pub fn open(&self, nonce_12: &[u8], aad: &[u8], ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_nonce(nonce_12)?;
        if ciphertext_and_tag.len() < TAG_LEN {
            return Err(CryptoError::Authentication);
        }
        let payload = Payload { msg: ciphertext_and_tag, aad };

        let opened = match self {
            AeadImpl::Aes128Gcm(c) => c.decrypt(AesNonce::from_slice(nonce_12), payload),
            AeadImpl::Aes192Gcm(c) => c.decrypt(AesNonce::from_slice(nonce_12), payload),
            AeadImpl::Aes256Gcm(c) => c.decrypt(AesNonce::from_slice(nonce_12), payload),
            AeadImpl::ChaCha(c) => c.decrypt(ChaNonce::from_slice(nonce_12), payload),
        };
        opened.map_err(|_| CryptoError::Authentication)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AeadImpl::Aes128Gcm(_) => Algorithm::Aes128Gcm.name(),
            AeadImpl::Aes192Gcm(_) => Algorithm::Aes192Gcm.name(),
            AeadImpl::Aes256Gcm(_) => Algorithm::Aes256Gcm.name(),
            AeadImpl::ChaCha(_) => Algorithm::Chacha20Poly1305.name(),
        }
    }
}

fn check_nonce(nonce: &[u8]) -> Result<(), CryptoError> {
    if nonce.len() != NONCE_LEN_12 {
        return Err(CryptoError::InvalidNonce { expected: NONCE_LEN_12, actual: nonce.len() });
    }
    Ok(())
}

/// `AeadPrimitive` over the RustCrypto ciphers, keyed per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuite {
    alg: Algorithm,
}

impl CipherSuite {
    pub fn new(alg: Algorithm) -> Self {
        Self { alg }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.alg
    }
}

impl AeadPrimitive for CipherSuite {
    fn name(&self) -> &str {
        self.alg.name()
    }

    fn key_lengths(&self) -> &[usize] {
        self.alg.key_lengths()
    }

    fn seal(&self, key: &Key, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        AeadImpl::from_algorithm_and_key(self.alg, key.as_bytes())?.seal(nonce, aad, plaintext)
    }

    fn open(&self, key: &Key, nonce: &[u8], aad: &[u8], ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
        AeadImpl::from_algorithm_and_key(self.alg, key.as_bytes())?.open(nonce, aad, ciphertext_and_tag)
    }
}
