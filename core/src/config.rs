//! Engine configuration: which primitive, key size, message size, and the
//! nonce-rotation parameters. Loaded from JSON or built in code.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use num_enum::TryFromPrimitive;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::AsyncLogManager;
use crate::constants::{
    ALLOWED_CHUNK_SIZES, DEFAULT_CHUNK_SIZE, DEFAULT_DATA_SIZE, DEFAULT_IV_BUFFER_SIZE, DEFAULT_LOG_ROTATION,
    DEFAULT_QUEUE_CAP, MAX_IV_BUFFER_SIZE, MAX_MESSAGE_SIZE, NONCE_LEN_12, QUEUE_CAPS, WORKERS_COUNT,
};
use crate::crypto::{AeadEngine, Algorithm, Key, NonceSequencer};
use crate::types::Error;
use crate::utils::enum_name_or_hex;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported cipher suite: {0}")]
    UnsupportedAlgorithm(String),

    #[error("key length {bits} bits does not match {alg} (expects {expected} bits)")]
    KeyLength { alg: Algorithm, bits: usize, expected: usize },

    #[error("data size {0} out of range 0..={max}", max = MAX_MESSAGE_SIZE)]
    DataSize(usize),

    #[error("iv buffer size {size} must be in {min}..={max}", min = NONCE_LEN_12 + 1, max = MAX_IV_BUFFER_SIZE)]
    IvBufferSize { size: usize },

    #[error("iv modulo {modulo} must be in 1..={max}")]
    IvModulo { modulo: usize, max: usize },

    #[error("invalid chunk size {0}, must be one of {ALLOWED_CHUNK_SIZES:?}")]
    ChunkSize(usize),

    #[error("invalid workers count {0}, must be one of {WORKERS_COUNT:?}")]
    Workers(usize),

    #[error("invalid queue capacity {0}, must be one of {QUEUE_CAPS:?}")]
    QueueCap(usize),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read config {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
}

/// Inputs a throughput run (or an application) picks: primitive, key size,
/// bytes per message, and nonce rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub algorithm: Algorithm,
    /// Key length in bits.
    pub key_length: usize,
    /// Plaintext bytes per message.
    pub data_size: usize,
    /// Seed buffer size for the nonce sequencer.
    pub iv_buffer_size: usize,
    /// Windows cycled before repeating; `None` means `iv_buffer_size - nonce_len`.
    pub iv_modulo: Option<usize>,
    /// Transfer chunk for the stream adapter.
    pub chunk_size: usize,
    /// Worker threads for parallel sealing; `None` picks from the core count.
    pub workers: Option<usize>,
    pub queue_cap: usize,
    /// When set, engines append operation events to this file.
    pub event_log: Option<PathBuf>,
    pub log_rotation: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Aes256Gcm,
            key_length: 256,
            data_size: DEFAULT_DATA_SIZE,
            iv_buffer_size: DEFAULT_IV_BUFFER_SIZE,
            iv_modulo: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: None,
            queue_cap: DEFAULT_QUEUE_CAP,
            event_log: None,
            log_rotation: DEFAULT_LOG_ROTATION,
        }
    }
}

impl EngineConfig {
    /// AES-GCM config named the way the harness does: `"AES/GCM"` plus key bits.
    pub fn aes_gcm(key_bits: usize, data_size: usize) -> Result<Self, ConfigError> {
        let algorithm = Algorithm::aes_gcm_for_bits(key_bits)
            .ok_or_else(|| ConfigError::UnsupportedAlgorithm(format!("AES/GCM with {} bit key", key_bits)))?;
        let cfg = Self { algorithm, key_length: key_bits, data_size, ..Self::default() };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn chacha20_poly1305(data_size: usize) -> Result<Self, ConfigError> {
        let cfg = Self { algorithm: Algorithm::Chacha20Poly1305, key_length: 256, data_size, ..Self::default() };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let expected = self.algorithm.key_len() * 8;
        if self.key_length != expected {
            return Err(ConfigError::KeyLength { alg: self.algorithm, bits: self.key_length, expected });
        }
        if self.data_size > MAX_MESSAGE_SIZE {
            return Err(ConfigError::DataSize(self.data_size));
        }
        if self.iv_buffer_size <= NONCE_LEN_12 || self.iv_buffer_size > MAX_IV_BUFFER_SIZE {
            return Err(ConfigError::IvBufferSize { size: self.iv_buffer_size });
        }
        let max_modulo = self.iv_buffer_size - NONCE_LEN_12;
        if let Some(modulo) = self.iv_modulo {
            if modulo == 0 || modulo > max_modulo {
                return Err(ConfigError::IvModulo { modulo, max: max_modulo });
            }
        }
        if !ALLOWED_CHUNK_SIZES.contains(&self.chunk_size) {
            return Err(ConfigError::ChunkSize(self.chunk_size));
        }
        if let Some(w) = self.workers {
            if !WORKERS_COUNT.contains(&w) {
                return Err(ConfigError::Workers(w));
            }
        }
        if !QUEUE_CAPS.contains(&self.queue_cap) {
            return Err(ConfigError::QueueCap(self.queue_cap));
        }
        Ok(())
    }

    pub fn resolved_iv_modulo(&self) -> usize {
        self.iv_modulo.unwrap_or(self.iv_buffer_size.saturating_sub(NONCE_LEN_12))
    }

    /// Worker count: configured, or one per core minus one, snapped down to an allowed count.
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            let cores = num_cpus::get().saturating_sub(1).max(1);
            WORKERS_COUNT.iter().copied().take_while(|&w| w <= cores).last().unwrap_or(1)
        })
    }

    pub fn generate_key(&self) -> Key {
        Key::generate_for(self.algorithm)
    }

    /// Fresh sequencer over a random seed of `iv_buffer_size` bytes.
    pub fn build_sequencer(&self) -> Result<NonceSequencer, Error> {
        self.validate()?;
        let mut seed = vec![0u8; self.iv_buffer_size];
        rand::thread_rng().fill_bytes(&mut seed);
        Ok(NonceSequencer::with_modulo(seed, NONCE_LEN_12, self.resolved_iv_modulo())?)
    }

    /// Engine over the built-in primitive, wired to the event log when configured.
    pub fn build_engine(&self) -> Result<AeadEngine, Error> {
        self.validate()?;
        let engine = AeadEngine::for_algorithm(self.algorithm);
        match &self.event_log {
            Some(path) => {
                let log = AsyncLogManager::new(path, self.log_rotation)?;
                Ok(engine.with_event_log(Arc::new(log)))
            }
            None => Ok(engine),
        }
    }
}

/// Resolve a registry id into an algorithm.
pub fn algorithm_from_id(id: u16) -> Result<Algorithm, ConfigError> {
    Algorithm::try_from_primitive(id).map_err(|_| ConfigError::UnsupportedAlgorithm(enum_name_or_hex::<Algorithm>(id)))
}
