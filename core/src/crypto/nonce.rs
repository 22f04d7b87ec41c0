// ## 📂 File: `src/crypto/nonce.rs`

//! Nonce sources.
//!
//! Two schemes live here:
//! - `NonceSequencer`: a rotating window over a random seed buffer. Window `i`
//!   is `seed[i..i + nonce_len]` and the index cycles modulo
//!   `seed_len - nonce_len`. Cheap and allocation-free, but the sequence
//!   repeats after `iv_modulo` calls. Only suitable when a key seals fewer
//!   than `iv_modulo` messages (throughput measurement, short-lived keys).
//! - `CounterNonceSequence` / `derive_nonce_12_tls_style`: TLS-like base IV
//!   XOR a 64-bit message counter. Never wraps under one key; this is the
//!   scheme to use when keys live long.
//!
//! Neither type is internally synchronized. Keep one per thread, or derive
//! nonces statelessly from an index with `derive_nonce_12_tls_style`.

use rand::RngCore;

use crate::crypto::types::{NonceError, NONCE_LEN_12};

/// Read-only window into the sequencer's seed, tied to the seed it was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonceView {
    offset: usize,
    len: usize,
    generation: u64,
}

impl NonceView {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Seed generation the view belongs to; bumped by every `reseed`.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Rotating nonce window over a fixed random seed.
#[derive(Clone)]
pub struct NonceSequencer {
    seed: Vec<u8>,
    nonce_len: usize,
    index: usize,
    modulo: usize,
    generation: u64,
}

impl NonceSequencer {
    /// Random seed of `iv_buffer_size` bytes; windows are `nonce_len` long.
    pub fn new(iv_buffer_size: usize, nonce_len: usize) -> Result<Self, NonceError> {
        let mut seed = vec![0u8; iv_buffer_size];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::from_seed(seed, nonce_len)
    }

    /// Use caller-provided seed bytes.
    pub fn from_seed(seed: Vec<u8>, nonce_len: usize) -> Result<Self, NonceError> {
        validate_nonce_len(nonce_len)?;
        if seed.len() <= nonce_len {
            return Err(NonceError::SeedTooSmall { seed_len: seed.len(), nonce_len });
        }
        let modulo = seed.len() - nonce_len;
        Ok(Self { seed, nonce_len, index: 0, modulo, generation: 0 })
    }

    /// Like `from_seed` but cycle through only the first `modulo` windows.
    /// `modulo` must be in `1..=seed_len - nonce_len`.
    pub fn with_modulo(seed: Vec<u8>, nonce_len: usize, modulo: usize) -> Result<Self, NonceError> {
        let mut seq = Self::from_seed(seed, nonce_len)?;
        if modulo == 0 || modulo > seq.modulo {
            return Err(NonceError::InvalidModulo { requested: modulo, max: seq.modulo });
        }
        seq.modulo = modulo;
        Ok(seq)
    }

    /// Window for the next message, then advance `index` modulo `iv_modulo`.
    #[inline]
    pub fn next(&mut self) -> NonceView {
        let view = NonceView { offset: self.index, len: self.nonce_len, generation: self.generation };
        self.index = (self.index + 1) % self.modulo;
        view
    }

    /// Bytes behind a view returned by `next` since the last `reseed`.
    ///
    /// Views from an earlier seed are rejected with `StaleView`.
    #[inline]
    pub fn nonce(&self, view: &NonceView) -> Result<&[u8], NonceError> {
        let stale = || NonceError::StaleView { generation: view.generation, current: self.generation };
        if view.generation != self.generation || view.len != self.nonce_len {
            return Err(stale());
        }
        let end = view.offset.checked_add(view.len).ok_or_else(stale)?;
        self.seed.get(view.offset..end).ok_or_else(stale)
    }

    /// `next()` resolved into an owned 12-byte nonce.
    pub fn next_nonce(&mut self) -> [u8; NONCE_LEN_12] {
        let offset = self.index;
        self.index = (self.index + 1) % self.modulo;
        // index < modulo <= seed_len - nonce_len, and nonce_len is always 12
        let mut out = [0u8; NONCE_LEN_12];
        out.copy_from_slice(&self.seed[offset..offset + NONCE_LEN_12]);
        out
    }

    /// Number of distinct windows before the sequence repeats.
    pub fn iv_modulo(&self) -> usize {
        self.modulo
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn seed_len(&self) -> usize {
        self.seed.len()
    }

    /// Replace the backing seed and restart at index 0.
    ///
    /// Windows issued before the reseed lose their uniqueness guarantee
    /// against windows issued after it. Only reseed together with a key
    /// rotation.
    pub fn reseed(&mut self, seed: Vec<u8>) -> Result<(), NonceError> {
        if seed.len() <= self.nonce_len {
            return Err(NonceError::SeedTooSmall { seed_len: seed.len(), nonce_len: self.nonce_len });
        }
        self.modulo = seed.len() - self.nonce_len;
        self.seed = seed;
        self.index = 0;
        self.generation += 1;
        Ok(())
    }
}

impl std::fmt::Debug for NonceSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceSequencer")
            .field("seed_len", &self.seed.len())
            .field("nonce_len", &self.nonce_len)
            .field("index", &self.index)
            .field("modulo", &self.modulo)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Derive a 12-byte AEAD nonce in a TLS-style pattern from a 16-byte salt and message index.
///
/// - Base IV: the first 12 bytes of `salt`.
/// - Counter: XOR bytes 4..12 with `index` in little-endian. The 4-byte prefix
///   stays fixed, giving 2^64 distinct nonces per salt.
///
/// Deterministic: same `(salt, index)` gives the same nonce, so parallel
/// workers can compute nonces independently.
#[inline]
pub fn derive_nonce_12_tls_style(
    salt: &[u8; 16],
    index: u64,
) -> Result<[u8; NONCE_LEN_12], NonceError> {
    validate_salt(salt)?;

    let mut nonce = [0u8; NONCE_LEN_12];
    nonce.copy_from_slice(&salt[..NONCE_LEN_12]);

    let ctr: [u8; 8] = index.to_le_bytes();
    for j in 0..8 {
        nonce[4 + j] ^= ctr[j];
    }

    Ok(nonce)
}

/// Stateful counter nonces; fails instead of wrapping.
#[derive(Debug, Clone)]
pub struct CounterNonceSequence {
    salt: [u8; 16],
    next_index: u64,
    exhausted: bool,
}

impl CounterNonceSequence {
    pub fn new(salt: [u8; 16]) -> Result<Self, NonceError> {
        validate_salt(&salt)?;
        Ok(Self { salt, next_index: 0, exhausted: false })
    }

    /// Random non-zero salt.
    pub fn random() -> Self {
        let mut salt = [0u8; 16];
        loop {
            rand::thread_rng().fill_bytes(&mut salt);
            if validate_salt(&salt).is_ok() {
                return Self { salt, next_index: 0, exhausted: false };
            }
        }
    }

    pub fn salt(&self) -> &[u8; 16] {
        &self.salt
    }

    pub fn issued(&self) -> u64 {
        self.next_index
    }

    pub fn next_nonce(&mut self) -> Result<[u8; NONCE_LEN_12], NonceError> {
        if self.exhausted {
            return Err(NonceError::Exhausted);
        }
        let nonce = derive_nonce_12_tls_style(&self.salt, self.next_index)?;
        match self.next_index.checked_add(1) {
            Some(n) => self.next_index = n,
            None => self.exhausted = true,
        }
        Ok(nonce)
    }
}

/// Validate that salt is not all zeros.
#[inline]
pub fn validate_salt(salt: &[u8; 16]) -> Result<(), NonceError> {
    if salt.iter().all(|&b| b == 0) {
        return Err(NonceError::InvalidSalt);
    }
    Ok(())
}

/// Currently only 12-byte nonces are supported.
#[inline]
pub fn validate_nonce_len(nonce_len: usize) -> Result<(), NonceError> {
    if nonce_len != NONCE_LEN_12 {
        return Err(NonceError::InvalidNonceLen { requested: nonce_len, supported: NONCE_LEN_12 });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulo_is_seed_minus_nonce() {
        let seq = NonceSequencer::new(32, NONCE_LEN_12).unwrap();
        assert_eq!(seq.iv_modulo(), 20);
    }

    #[test]
    fn seed_must_exceed_nonce_len() {
        assert_eq!(
            NonceSequencer::from_seed(vec![1u8; 12], 12).err(),
            Some(NonceError::SeedTooSmall { seed_len: 12, nonce_len: 12 })
        );
    }

    #[test]
    fn reseed_resets_index() {
        let mut seq = NonceSequencer::from_seed((0u8..40).collect(), 12).unwrap();
        seq.next();
        seq.next();
        seq.reseed((100u8..120).collect()).unwrap();
        assert_eq!(seq.index(), 0);
        assert_eq!(seq.iv_modulo(), 8);
        assert_eq!(seq.next_nonce()[0], 100);
    }

    #[test]
    fn counter_sequence_xors_low_bytes() {
        let salt = [0x10u8; 16];
        let mut seq = CounterNonceSequence::new(salt).unwrap();
        let first = seq.next_nonce().unwrap();
        let second = seq.next_nonce().unwrap();
        assert_eq!(first, [0x10u8; 12]);
        assert_eq!(second[4], 0x11);
        assert_eq!(&second[..4], &[0x10u8; 4]);
        assert_eq!(seq.issued(), 2);
    }

    #[test]
    fn counter_sequence_stops_at_end_of_space() {
        let mut seq = CounterNonceSequence::new([1u8; 16]).unwrap();
        seq.next_index = u64::MAX;
        assert!(seq.next_nonce().is_ok());
        assert_eq!(seq.next_nonce(), Err(NonceError::Exhausted));
    }

    #[test]
    fn zero_salt_is_rejected() {
        assert_eq!(derive_nonce_12_tls_style(&[0u8; 16], 1), Err(NonceError::InvalidSalt));
        assert!(CounterNonceSequence::new([0u8; 16]).is_err());
    }
}
