//! telemetry/counters.rs
//! Mutable counters collected while sealing and opening.
//!
//! Converted into an immutable `TelemetrySnapshot` when an operation ends.
use bincode::{Decode, Encode};
use std::ops::AddAssign;

/// Deterministic counters collected per engine (or merged across workers).
#[derive(Default, Clone, Debug, Encode, Decode, PartialEq, Eq)]
pub struct TelemetryCounters {
    pub messages_sealed: u64,
    pub messages_opened: u64,
    pub auth_failures: u64,
    pub bytes_plaintext: u64,
    pub bytes_aad: u64,
    pub bytes_ciphertext: u64,
    pub bytes_overhead: u64,
}

impl TelemetryCounters {
    /// Record one sealed message.
    ///
    /// - `pt_len`: plaintext bytes sealed
    /// - `aad_len`: associated data bytes authenticated
    /// - `ct_len`: ciphertext length including the tag
    /// - `overhead_len`: tag (and any other expansion)
    pub fn add_seal(&mut self, pt_len: usize, aad_len: usize, ct_len: usize, overhead_len: usize) {
        self.messages_sealed += 1;
        self.bytes_plaintext += pt_len as u64;
        self.bytes_aad += aad_len as u64;
        self.bytes_ciphertext += ct_len as u64;
        self.bytes_overhead += overhead_len as u64;
    }

    /// Record one successfully opened message. Same field meanings as `add_seal`.
    pub fn add_open(&mut self, pt_len: usize, aad_len: usize, ct_len: usize, overhead_len: usize) {
        self.messages_opened += 1;
        self.bytes_plaintext += pt_len as u64;
        self.bytes_aad += aad_len as u64;
        self.bytes_ciphertext += ct_len as u64;
        self.bytes_overhead += overhead_len as u64;
    }

    pub fn add_auth_failure(&mut self) {
        self.auth_failures += 1;
    }

    pub fn messages(&self) -> u64 {
        self.messages_sealed + self.messages_opened
    }

    // Workers keep private counters and the coordinator merges them at the
    // end, so nothing here needs atomics.
    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.messages_sealed += other.messages_sealed;
        self.messages_opened += other.messages_opened;
        self.auth_failures += other.auth_failures;

        self.bytes_plaintext += other.bytes_plaintext;
        self.bytes_aad += other.bytes_aad;
        self.bytes_ciphertext += other.bytes_ciphertext;
        self.bytes_overhead += other.bytes_overhead;
    }

    /// Field-wise difference from an earlier reading of the same counters.
    pub fn since(&self, earlier: &TelemetryCounters) -> TelemetryCounters {
        TelemetryCounters {
            messages_sealed: self.messages_sealed.saturating_sub(earlier.messages_sealed),
            messages_opened: self.messages_opened.saturating_sub(earlier.messages_opened),
            auth_failures: self.auth_failures.saturating_sub(earlier.auth_failures),
            bytes_plaintext: self.bytes_plaintext.saturating_sub(earlier.bytes_plaintext),
            bytes_aad: self.bytes_aad.saturating_sub(earlier.bytes_aad),
            bytes_ciphertext: self.bytes_ciphertext.saturating_sub(earlier.bytes_ciphertext),
            bytes_overhead: self.bytes_overhead.saturating_sub(earlier.bytes_overhead),
        }
    }

    /// Compact binary form for shipping counters between processes.
    pub fn encode(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        bincode::encode_to_vec(self, bincode::config::standard())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::error::DecodeError> {
        let (counters, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(counters)
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
