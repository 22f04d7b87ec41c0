// ## 📂 File: `src/crypto/types.rs`

use std::fmt;
use std::sync::Arc;

use num_enum::TryFromPrimitive;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::constants::{cipher_ids, CHACHA_KEY_LENGTHS};

pub use crate::constants::{NONCE_LEN_12, TAG_LEN};

/// AEAD algorithms the shipped backends cover.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Aes128Gcm        = cipher_ids::AES128_GCM,
    Aes192Gcm        = cipher_ids::AES192_GCM,
    Aes256Gcm        = cipher_ids::AES256_GCM,
    Chacha20Poly1305 = cipher_ids::CHACHA20_POLY1305,
}

impl Algorithm {
    /// Key lengths (bytes) the algorithm accepts.
    pub fn key_lengths(&self) -> &'static [usize] {
        match self {
            Algorithm::Aes128Gcm => &[16],
            Algorithm::Aes192Gcm => &[24],
            Algorithm::Aes256Gcm => &[32],
            Algorithm::Chacha20Poly1305 => CHACHA_KEY_LENGTHS,
        }
    }

    pub fn key_len(&self) -> usize {
        self.key_lengths()[0]
    }

    /// Pick the AES-GCM variant for a key length in bits, the way the
    /// throughput harness names it ("AES/GCM" + keyLength).
    pub fn aes_gcm_for_bits(bits: usize) -> Option<Self> {
        match bits {
            128 => Some(Algorithm::Aes128Gcm),
            192 => Some(Algorithm::Aes192Gcm),
            256 => Some(Algorithm::Aes256Gcm),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Aes128Gcm => "AES-128-GCM",
            Algorithm::Aes192Gcm => "AES-192-GCM",
            Algorithm::Aes256Gcm => "AES-256-GCM",
            Algorithm::Chacha20Poly1305 => "ChaCha20-Poly1305",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction an engine is bound to for one message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Seal,
    Open,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Seal => f.write_str("seal"),
            Mode::Open => f.write_str("open"),
        }
    }
}

/// Secret key material.
///
/// Immutable once built. Clones share one allocation, which is zeroed when
/// the last clone drops, so a key can be handed to many engines (or threads)
/// read-only. `Debug` never prints the bytes.
#[derive(Clone)]
pub struct Key {
    bytes: Arc<Zeroizing<Vec<u8>>>,
}

impl Key {
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self { bytes: Arc::new(Zeroizing::new(bytes.to_vec())) }
    }

    /// Fresh random key of `len` bytes from the OS-seeded thread RNG.
    pub fn generate(len: usize) -> Self {
        let mut bytes = Zeroizing::new(vec![0u8; len]);
        rand::thread_rng().fill_bytes(bytes.as_mut_slice());
        Self { bytes: Arc::new(bytes) }
    }

    /// Random key sized for `alg`.
    pub fn generate_for(alg: Algorithm) -> Self {
        Self::generate(alg.key_len())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// True when both handles point at the same allocation.
    pub fn same_allocation(&self, other: &Key) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes: Arc::new(Zeroizing::new(bytes)) }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key").field("len", &self.len()).finish_non_exhaustive()
    }
}

/// Ciphertext and detached tag produced by `finish_seal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealOutput {
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

impl SealOutput {
    /// Wire layout: ciphertext‖tag.
    pub fn into_combined(self) -> Vec<u8> {
        let mut out = self.ciphertext;
        out.extend_from_slice(&self.tag);
        out
    }

    pub fn len(&self) -> usize {
        self.ciphertext.len() + TAG_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Errors raised by the engine and its adapters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material has a length the algorithm does not accept.
    #[error("invalid key length: expected one of {expected:?}, actual={actual}")]
    InvalidKey { expected: Vec<usize>, actual: usize },

    /// Nonce length mismatch.
    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonce { expected: usize, actual: usize },

    /// The nonce equals the one used by the previous sealed message under the same key.
    #[error("nonce reuse: nonce already sealed a message under this key")]
    NonceReuse,

    /// Operation invoked out of sequence.
    #[error("illegal state: {op} not allowed while {state}")]
    IllegalState { op: &'static str, state: String },

    /// Destination cannot hold the worst-case output.
    #[error("buffer too small: required={required}, available={available}")]
    BufferTooSmall { required: usize, available: usize },

    /// Tag did not verify. No plaintext is released.
    #[error("AEAD tag mismatch")]
    Authentication,

    /// Message exceeds what one init..finish cycle may buffer.
    #[error("message too large: {len} bytes exceeds limit of {limit}")]
    MessageTooLarge { len: usize, limit: usize },

    /// The backing primitive refused the input for a reason other than authentication.
    #[error("primitive failure: {0}")]
    Primitive(String),
}

impl CryptoError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, CryptoError::Authentication)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum NonceError {
    /// Salt is invalid (e.g., all zeros).
    InvalidSalt,

    /// Requested nonce length is unsupported.
    InvalidNonceLen { requested: usize, supported: usize },

    /// Seed buffer must be longer than one nonce.
    SeedTooSmall { seed_len: usize, nonce_len: usize },

    /// Rotation modulo outside `1..=seed_len - nonce_len`.
    InvalidModulo { requested: usize, max: usize },

    /// Counter space used up; the key must be rotated.
    Exhausted,

    /// View was issued before a `reseed`, or by another sequencer.
    StaleView { generation: u64, current: u64 },
}

impl fmt::Display for NonceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonceError::InvalidSalt => write!(f, "invalid salt: all zeros"),
            NonceError::InvalidNonceLen { requested, supported } =>
                write!(f, "invalid nonce length: requested={}, supported={}", requested, supported),
            NonceError::SeedTooSmall { seed_len, nonce_len } =>
                write!(f, "seed buffer too small: seed_len={} must exceed nonce_len={}", seed_len, nonce_len),
            NonceError::InvalidModulo { requested, max } =>
                write!(f, "invalid iv modulo: requested={}, allowed=1..={}", requested, max),
            NonceError::Exhausted => write!(f, "nonce counter exhausted, rotate the key"),
            NonceError::StaleView { generation, current } =>
                write!(f, "stale nonce view: issued for seed generation {}, sequencer is at {}", generation, current),
        }
    }
}

impl std::error::Error for NonceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_debug_hides_material() {
        let key = Key::from_slice(&[0xAB; 32]);
        let shown = format!("{:?}", key);
        assert!(shown.contains("len: 32"));
        assert!(!shown.to_lowercase().contains("ab, ab"));
    }

    #[test]
    fn key_clones_share_allocation() {
        let key = Key::generate(16);
        let other = key.clone();
        assert!(key.same_allocation(&other));
        assert!(!key.same_allocation(&Key::from_slice(key.as_bytes())));
    }

    #[test]
    fn algorithm_ids_roundtrip_through_num_enum() {
        let alg = Algorithm::try_from_primitive(cipher_ids::CHACHA20_POLY1305).unwrap();
        assert_eq!(alg, Algorithm::Chacha20Poly1305);
        assert!(Algorithm::try_from_primitive(0x00ff).is_err());
    }

    #[test]
    fn aes_bits_map_to_variants() {
        assert_eq!(Algorithm::aes_gcm_for_bits(192), Some(Algorithm::Aes192Gcm));
        assert_eq!(Algorithm::aes_gcm_for_bits(512), None);
        assert_eq!(Algorithm::Aes192Gcm.key_len(), 24);
    }
}
