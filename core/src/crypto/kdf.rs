// ## src/crypto/kdf.rs

//! crypto/kdf.rs
//! HKDF derivation of per-epoch message keys from a long-lived master key.
//!
//! Design:
//! - HKDF-Extract(master_key, salt) -> PRK
//! - HKDF-Expand(PRK, info) -> key sized for the target algorithm
//!
//! Rotating keys is how a caller escapes the nonce-window limit of
//! `NonceSequencer`: derive a new key per epoch, then reseed.

use hkdf::Hkdf;
use sha2::{Sha256, Sha512};

use crate::constants::prf_ids;
use crate::crypto::types::{Algorithm, CryptoError, Key};

/// Protocol label bound into every derivation.
const INFO_LABEL: &[u8] = b"aead-engine/v1/epoch-key";

/// Build HKDF 'info' binding label, algorithm id and epoch.
#[inline]
fn build_info(alg: Algorithm, epoch: u64) -> Vec<u8> {
    let mut info = Vec::with_capacity(INFO_LABEL.len() + 2 + 8);
    info.extend_from_slice(INFO_LABEL);
    info.extend_from_slice(&(alg as u16).to_le_bytes());
    info.extend_from_slice(&epoch.to_le_bytes());
    info
}

/// Derive the key for `epoch` from `master_key` and a non-zero `salt`.
///
/// Errors:
/// - all-zero salt, unknown PRF id, or an HKDF expand failure.
pub fn derive_epoch_key(
    master_key: &[u8],
    salt: &[u8; 16],
    alg: Algorithm,
    epoch: u64,
    prf_id: u16,
) -> Result<Key, CryptoError> {
    if salt.iter().all(|&b| b == 0) {
        return Err(CryptoError::Primitive("salt must not be all-zero".into()));
    }

    let info = build_info(alg, epoch);
    let mut okm = vec![0u8; alg.key_len()];

    match prf_id {
        x if x == prf_ids::SHA256 => {
            let hk = Hkdf::<Sha256>::new(Some(&salt[..]), master_key);
            hk.expand(&info, &mut okm)
                .map_err(|_| CryptoError::Primitive("HKDF expand failed (SHA-256)".into()))?;
        }
        x if x == prf_ids::SHA512 => {
            let hk = Hkdf::<Sha512>::new(Some(&salt[..]), master_key);
            hk.expand(&info, &mut okm)
                .map_err(|_| CryptoError::Primitive("HKDF expand failed (SHA-512)".into()))?;
        }
        other => {
            return Err(CryptoError::Primitive(format!("unsupported HKDF PRF id 0x{:04x}", other)));
        }
    }

    Ok(Key::from(okm))
}
