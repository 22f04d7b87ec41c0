// ## 📂 File: `src/crypto/engine.rs`

//! AEAD engine: sequences one message at a time through an opaque primitive.
//!
//! Lifecycle:
//!
//! ```text
//! Uninitialized --init--> Initialized(mode) --update*--> Updating(mode) --finish--> Finished
//!        ^                                                                        |
//!        +--------------------------- init (fresh nonce) -------------------------+
//! ```
//!
//! The primitive is one-shot, so `update_*` buffers its input and returns no
//! bytes; everything comes out of `finish_*`. On the open side that means no
//! unauthenticated plaintext ever leaves the engine.

use std::fmt;
use std::sync::Arc;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::audit::{AsyncLogManager, LogEntry};
use crate::constants::MAX_MESSAGE_SIZE;
use crate::crypto::aead::{AeadPrimitive, CipherSuite};
use crate::crypto::types::{Algorithm, CryptoError, Key, Mode, SealOutput, TAG_LEN};
use crate::telemetry::TelemetryCounters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initialized(Mode),
    Updating(Mode),
    Finished,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Uninitialized => f.write_str("uninitialized"),
            EngineState::Initialized(m) => write!(f, "initialized({})", m),
            EngineState::Updating(m) => write!(f, "updating({})", m),
            EngineState::Finished => f.write_str("finished"),
        }
    }
}

/// Per-message binding created by `init`.
struct Message {
    mode: Mode,
    key: Key,
    nonce: Vec<u8>,
    aad: Vec<u8>,
    buffer: Zeroizing<Vec<u8>>,
}

/// Nonce of the last successfully sealed message, for the adjacent-reuse check.
struct LastSeal {
    key: Key,
    nonce: Vec<u8>,
}

pub struct AeadEngine {
    primitive: Arc<dyn AeadPrimitive>,
    state: EngineState,
    message: Option<Message>,
    last_seal: Option<LastSeal>,
    counters: TelemetryCounters,
    event_log: Option<Arc<AsyncLogManager>>,
}

impl AeadEngine {
    pub fn new(primitive: Arc<dyn AeadPrimitive>) -> Self {
        Self {
            primitive,
            state: EngineState::Uninitialized,
            message: None,
            last_seal: None,
            counters: TelemetryCounters::default(),
            event_log: None,
        }
    }

    /// Engine over the built-in backend for `alg`.
    pub fn for_algorithm(alg: Algorithm) -> Self {
        Self::new(Arc::new(CipherSuite::new(alg)))
    }

    /// Send init/seal/open/auth-failure events to a background log.
    pub fn with_event_log(mut self, log: Arc<AsyncLogManager>) -> Self {
        self.event_log = Some(log);
        self
    }

    pub fn primitive(&self) -> &Arc<dyn AeadPrimitive> {
        &self.primitive
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn mode(&self) -> Option<Mode> {
        self.message.as_ref().map(|m| m.mode)
    }

    /// Bytes accepted by `update_*` and not yet processed.
    pub fn buffered_len(&self) -> usize {
        self.message.as_ref().map_or(0, |m| m.buffer.len())
    }

    pub fn counters(&self) -> &TelemetryCounters {
        &self.counters
    }

    /// Hand back the counters collected so far and start from zero.
    pub fn take_counters(&mut self) -> TelemetryCounters {
        std::mem::take(&mut self.counters)
    }

    /// Bind the engine to one message.
    ///
    /// Any message in flight is discarded (its buffer zeroized). On error the
    /// engine is left exactly as it was.
    pub fn init(&mut self, mode: Mode, key: &Key, nonce: &[u8], aad: &[u8]) -> Result<(), CryptoError> {
        self.validate_init(mode, key, nonce)?;

        self.message = Some(Message {
            mode,
            key: key.clone(),
            nonce: nonce.to_vec(),
            aad: aad.to_vec(),
            buffer: Zeroizing::new(Vec::new()),
        });
        self.state = EngineState::Initialized(mode);

        if let Some(log) = &self.event_log {
            log.append(LogEntry::Init {
                mode,
                suite: self.primitive.name().to_string(),
                nonce: nonce.to_vec(),
                aad_len: aad.len(),
            });
        }
        Ok(())
    }

    /// The checks `init` runs, without touching the engine.
    pub fn validate_init(&self, mode: Mode, key: &Key, nonce: &[u8]) -> Result<(), CryptoError> {
        let accepted = self.primitive.key_lengths();
        if !accepted.contains(&key.len()) {
            return Err(CryptoError::InvalidKey { expected: accepted.to_vec(), actual: key.len() });
        }
        let nonce_len = self.primitive.nonce_len();
        if nonce.len() != nonce_len {
            return Err(CryptoError::InvalidNonce { expected: nonce_len, actual: nonce.len() });
        }
        if mode == Mode::Seal && self.repeats_last_seal(key, nonce) {
            return Err(CryptoError::NonceReuse);
        }
        Ok(())
    }

    /// Feed plaintext. Returns the ciphertext produced so far, which with a
    /// one-shot primitive is always empty.
    pub fn update_seal(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.require(Mode::Seal, "update_seal")?;
        self.buffer_chunk(chunk)?;
        self.state = EngineState::Updating(Mode::Seal);
        Ok(Vec::new())
    }

    /// Seal everything buffered and return ciphertext with its detached tag.
    /// Terminal for the message.
    pub fn finish_seal(&mut self) -> Result<SealOutput, CryptoError> {
        self.require(Mode::Seal, "finish_seal")?;
        let message = self.take_message()?;

        let mut sealed = self.primitive.seal(&message.key, &message.nonce, &message.aad, &message.buffer)?;
        if sealed.len() < TAG_LEN {
            return Err(CryptoError::Primitive(format!(
                "{} returned {} bytes, shorter than the tag",
                self.primitive.name(),
                sealed.len()
            )));
        }

        let tag_start = sealed.len() - TAG_LEN;
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&sealed[tag_start..]);
        sealed.truncate(tag_start);

        self.counters.add_seal(message.buffer.len(), message.aad.len(), sealed.len() + TAG_LEN, TAG_LEN);
        if let Some(log) = &self.event_log {
            log.append(LogEntry::Sealed {
                plaintext_len: message.buffer.len(),
                ciphertext_len: sealed.len() + TAG_LEN,
                tag,
            });
        }
        self.last_seal = Some(LastSeal { key: message.key.clone(), nonce: message.nonce.clone() });

        Ok(SealOutput { ciphertext: sealed, tag })
    }

    /// Feed ciphertext (tag included at the end of the last chunk).
    /// Nothing is verified and nothing is released until `finish_open`.
    pub fn update_open(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.require(Mode::Open, "update_open")?;
        self.buffer_chunk(chunk)?;
        self.state = EngineState::Updating(Mode::Open);
        Ok(Vec::new())
    }

    /// Verify the tag over all buffered ciphertext and the AAD.
    ///
    /// On `Authentication` the buffered ciphertext is zeroized and no
    /// plaintext is returned.
    pub fn finish_open(&mut self) -> Result<Vec<u8>, CryptoError> {
        self.require(Mode::Open, "finish_open")?;
        let message = self.take_message()?;

        match self.primitive.open(&message.key, &message.nonce, &message.aad, &message.buffer) {
            Ok(plaintext) => {
                self.counters.add_open(plaintext.len(), message.aad.len(), message.buffer.len(), TAG_LEN);
                if let Some(log) = &self.event_log {
                    log.append(LogEntry::Opened { plaintext_len: plaintext.len() });
                }
                Ok(plaintext)
            }
            Err(e) => {
                if e.is_authentication() {
                    self.counters.add_auth_failure();
                    if let Some(log) = &self.event_log {
                        log.append(LogEntry::AuthFailure { ciphertext_len: message.buffer.len() });
                    }
                }
                Err(e)
            }
        }
    }

    /// `update_seal(plaintext)` + `finish_seal()`, returned as ciphertext‖tag.
    pub fn seal_one_shot(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.update_seal(plaintext)?;
        Ok(self.finish_seal()?.into_combined())
    }

    /// `update_open(ciphertext_and_tag)` + `finish_open()`.
    pub fn open_one_shot(&mut self, ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.update_open(ciphertext_and_tag)?;
        self.finish_open()
    }

    /// `init` + `seal_one_shot`.
    pub fn seal(&mut self, key: &Key, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.init(Mode::Seal, key, nonce, aad)?;
        self.seal_one_shot(plaintext)
    }

    /// `init` + `open_one_shot`.
    pub fn open(&mut self, key: &Key, nonce: &[u8], aad: &[u8], ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.init(Mode::Open, key, nonce, aad)?;
        self.open_one_shot(ciphertext_and_tag)
    }

    /// Worst-case bytes `finish_*` will produce if `input_len` more bytes are fed.
    pub fn output_size(&self, input_len: usize) -> Result<usize, CryptoError> {
        let message = match (&self.state, &self.message) {
            (EngineState::Initialized(_) | EngineState::Updating(_), Some(m)) => m,
            _ => {
                return Err(CryptoError::IllegalState { op: "output_size", state: self.state.to_string() });
            }
        };
        let total = message.buffer.len() + input_len;
        Ok(match message.mode {
            Mode::Seal => total + TAG_LEN,
            Mode::Open => total.saturating_sub(TAG_LEN),
        })
    }

    fn require(&self, mode: Mode, op: &'static str) -> Result<(), CryptoError> {
        match self.state {
            EngineState::Initialized(m) | EngineState::Updating(m) if m == mode => Ok(()),
            other => Err(CryptoError::IllegalState { op, state: other.to_string() }),
        }
    }

    fn buffer_chunk(&mut self, chunk: &[u8]) -> Result<(), CryptoError> {
        let message = self.message.as_mut().ok_or_else(|| CryptoError::IllegalState {
            op: "update",
            state: EngineState::Uninitialized.to_string(),
        })?;
        let len = message.buffer.len().saturating_add(chunk.len());
        if len > MAX_MESSAGE_SIZE {
            // fatal to the message: drop (zeroizes) so nothing partial can be finished
            self.message = None;
            self.state = EngineState::Finished;
            return Err(CryptoError::MessageTooLarge { len, limit: MAX_MESSAGE_SIZE });
        }
        message.buffer.extend_from_slice(chunk);
        Ok(())
    }

    /// Move to `Finished` and hand over the message; its buffer zeroizes on drop.
    fn take_message(&mut self) -> Result<Message, CryptoError> {
        let message = self.message.take().ok_or_else(|| CryptoError::IllegalState {
            op: "finish",
            state: self.state.to_string(),
        })?;
        self.state = EngineState::Finished;
        Ok(message)
    }

    fn repeats_last_seal(&self, key: &Key, nonce: &[u8]) -> bool {
        match &self.last_seal {
            Some(last) => {
                let same_key = key.same_allocation(&last.key)
                    || bool::from(key.as_bytes().ct_eq(last.key.as_bytes()));
                same_key && last.nonce.as_slice() == nonce
            }
            None => false,
        }
    }
}

impl fmt::Debug for AeadEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AeadEngine")
            .field("suite", &self.primitive.name())
            .field("state", &self.state)
            .field("buffered", &self.buffered_len())
            .finish()
    }
}
