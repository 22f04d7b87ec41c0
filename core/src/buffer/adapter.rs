//! Engine over position/limit views.
//!
//! `seal_into`/`open_into` consume `src.remaining()` and write at
//! `dst.position()`. Key and nonce are checked first, then the destination
//! is sized (or grown) before the engine produces anything, so a rejected
//! call leaves both views untouched.

use crate::buffer::view::{Backing, ByteView};
use crate::constants::TAG_LEN;
use crate::crypto::{AeadEngine, CryptoError, Key, Mode};

#[derive(Debug)]
pub struct BufferedChannelAdapter {
    engine: AeadEngine,
    key: Key,
}

impl BufferedChannelAdapter {
    pub fn new(engine: AeadEngine, key: Key) -> Self {
        Self { engine, key }
    }

    pub fn engine(&self) -> &AeadEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AeadEngine {
        &mut self.engine
    }

    /// Swap the key. The next message needs a nonce that is fresh for it.
    pub fn rekey(&mut self, key: Key) {
        self.key = key;
    }

    pub fn into_engine(self) -> AeadEngine {
        self.engine
    }

    /// Seal all of `src.remaining()` into `dst` as ciphertext‖tag.
    /// Returns the bytes written.
    pub fn seal_into<S: Backing, D: Backing>(
        &mut self,
        nonce: &[u8],
        aad: &[u8],
        src: &mut ByteView<S>,
        dst: &mut ByteView<D>,
    ) -> Result<usize, CryptoError> {
        self.engine.validate_init(Mode::Seal, &self.key, nonce)?;
        dst.reserve(src.remaining() + TAG_LEN)?;
        self.begin(Mode::Seal, nonce, aad)?;
        self.update_from(src)?;
        self.finish_into(dst)
    }

    /// Open all of `src.remaining()` (ciphertext‖tag) into `dst`.
    ///
    /// Writes nothing when the tag does not verify.
    pub fn open_into<S: Backing, D: Backing>(
        &mut self,
        nonce: &[u8],
        aad: &[u8],
        src: &mut ByteView<S>,
        dst: &mut ByteView<D>,
    ) -> Result<usize, CryptoError> {
        self.engine.validate_init(Mode::Open, &self.key, nonce)?;
        dst.reserve(src.remaining().saturating_sub(TAG_LEN))?;
        self.begin(Mode::Open, nonce, aad)?;
        self.update_from(src)?;
        self.finish_into(dst)
    }

    /// Start a message that will be fed from several views.
    pub fn begin(&mut self, mode: Mode, nonce: &[u8], aad: &[u8]) -> Result<(), CryptoError> {
        self.engine.init(mode, &self.key, nonce, aad)
    }

    /// Feed `src.remaining()` into the current message and consume it.
    pub fn update_from<S: Backing>(&mut self, src: &mut ByteView<S>) -> Result<usize, CryptoError> {
        let n = src.remaining();
        match self.engine.mode() {
            Some(Mode::Open) => self.engine.update_open(src.remaining_slice())?,
            _ => self.engine.update_seal(src.remaining_slice())?,
        };
        src.advance(n)?;
        Ok(n)
    }

    /// Finish the current message into `dst`.
    ///
    /// The worst-case output size is reserved first. If `dst` is too small
    /// the message stays open, so the caller may retry with a larger view.
    pub fn finish_into<D: Backing>(&mut self, dst: &mut ByteView<D>) -> Result<usize, CryptoError> {
        let required = self.engine.output_size(0)?;
        dst.reserve(required)?;

        match self.engine.mode() {
            Some(Mode::Open) => {
                let plaintext = self.engine.finish_open()?;
                dst.put(&plaintext)?;
                Ok(plaintext.len())
            }
            _ => {
                let sealed = self.engine.finish_seal()?;
                dst.put(&sealed.ciphertext)?;
                dst.put(&sealed.tag)?;
                Ok(sealed.len())
            }
        }
    }
}
