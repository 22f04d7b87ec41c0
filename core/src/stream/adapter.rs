// ## 📂 File: `src/stream/adapter.rs`
// ## Chunked transfer between Read/Write and one engine message

//! Drive an `AeadEngine` from a pull source into a push sink.
//!
//! The source is read in `chunk_size` pieces until exhausted; each piece
//! goes through `update_*` and whatever comes back is written immediately,
//! then `finish_*` produces the tail. A read error aborts before `finish_*`
//! and leaves the engine in `Updating`; it must be re-`init`ed before use.

use std::io::{Read, Write};

use crate::config::EngineConfig;
use crate::crypto::{AeadEngine, Key, Mode};
use crate::stream::io::{open_input, open_output, read_exact_or_eof, take_shared, InputSource, OutputSink};
use crate::telemetry::{Stage, TelemetrySnapshot, TelemetryTimer};
use crate::types::Error;
use crate::utils::best_chunk_size;

#[derive(Debug)]
pub struct StreamAdapter {
    engine: AeadEngine,
    chunk_size: usize,
}

impl StreamAdapter {
    pub fn new(engine: AeadEngine, chunk_size: usize) -> Self {
        Self { engine, chunk_size: chunk_size.max(1) }
    }

    /// Pick the chunk size from a caller hint, snapped up to an allowed size.
    pub fn with_chunk_hint(engine: AeadEngine, requested: Option<usize>) -> Self {
        Self::new(engine, best_chunk_size(requested))
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, Error> {
        Ok(Self::new(config.build_engine()?, config.chunk_size))
    }

    pub fn engine(&self) -> &AeadEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AeadEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> AeadEngine {
        self.engine
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Seal everything `reader` yields as one message; writes ciphertext‖tag.
    pub fn seal_stream<R: Read, W: Write>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
        key: &Key,
        nonce: &[u8],
        aad: &[u8],
    ) -> Result<TelemetrySnapshot, Error> {
        self.transfer(Mode::Seal, reader, writer, key, nonce, aad)
    }

    /// Open ciphertext‖tag from `reader`. Plaintext reaches `writer` only
    /// after the tag verifies.
    pub fn open_stream<R: Read, W: Write>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
        key: &Key,
        nonce: &[u8],
        aad: &[u8],
    ) -> Result<TelemetrySnapshot, Error> {
        self.transfer(Mode::Open, reader, writer, key, nonce, aad)
    }

    /// Read the source to the end first, then seal in one shot.
    pub fn seal_all<R: Read, W: Write>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
        key: &Key,
        nonce: &[u8],
        aad: &[u8],
    ) -> Result<TelemetrySnapshot, Error> {
        let mut timer = TelemetryTimer::new();
        let before = self.engine.counters().clone();

        let mut plaintext = Vec::new();
        timer.time(Stage::Read, || reader.read_to_end(&mut plaintext))?;

        let engine = &mut self.engine;
        let sealed = timer.time(Stage::Seal, || engine.seal(key, nonce, aad, &plaintext))?;
        timer.time(Stage::Write, || writer.write_all(&sealed).and_then(|_| writer.flush()))?;

        timer.finish();
        Ok(TelemetrySnapshot::from(&self.engine.counters().since(&before), &timer))
    }

    /// `seal_stream` over normalized sources and sinks. A memory sink's bytes
    /// are attached to the snapshot.
    pub fn seal_source(
        &mut self,
        input: InputSource,
        output: OutputSink,
        key: &Key,
        nonce: &[u8],
        aad: &[u8],
    ) -> Result<TelemetrySnapshot, Error> {
        self.run_source(Mode::Seal, input, output, key, nonce, aad)
    }

    pub fn open_source(
        &mut self,
        input: InputSource,
        output: OutputSink,
        key: &Key,
        nonce: &[u8],
        aad: &[u8],
    ) -> Result<TelemetrySnapshot, Error> {
        self.run_source(Mode::Open, input, output, key, nonce, aad)
    }

    fn run_source(
        &mut self,
        mode: Mode,
        input: InputSource,
        output: OutputSink,
        key: &Key,
        nonce: &[u8],
        aad: &[u8],
    ) -> Result<TelemetrySnapshot, Error> {
        let mut reader = open_input(input)?;
        let (mut writer, maybe_buf) = open_output(output)?;

        let mut snapshot = self.transfer(mode, &mut reader, &mut writer, key, nonce, aad)?;
        drop(writer);

        if let Some(buf) = maybe_buf {
            snapshot.attach_output(take_shared(&buf)?);
        }
        Ok(snapshot)
    }

    fn transfer<R: Read, W: Write>(
        &mut self,
        mode: Mode,
        reader: &mut R,
        writer: &mut W,
        key: &Key,
        nonce: &[u8],
        aad: &[u8],
    ) -> Result<TelemetrySnapshot, Error> {
        let mut timer = TelemetryTimer::new();
        let before = self.engine.counters().clone();
        let work = match mode {
            Mode::Seal => Stage::Seal,
            Mode::Open => Stage::Open,
        };

        timer.time(Stage::Validate, || self.engine.init(mode, key, nonce, aad))?;

        loop {
            let chunk = timer.time(Stage::Read, || read_exact_or_eof(&mut *reader, self.chunk_size))?;
            if chunk.is_empty() {
                break;
            }

            let engine = &mut self.engine;
            let out = timer.time(work, || match mode {
                Mode::Seal => engine.update_seal(&chunk),
                Mode::Open => engine.update_open(&chunk),
            })?;
            if !out.is_empty() {
                timer.time(Stage::Write, || writer.write_all(&out))?;
            }

            if chunk.len() < self.chunk_size {
                break;
            }
        }

        let engine = &mut self.engine;
        let tail = timer.time(work, || match mode {
            Mode::Seal => engine.finish_seal().map(|sealed| sealed.into_combined()),
            Mode::Open => engine.finish_open(),
        })?;
        timer.time(Stage::Write, || writer.write_all(&tail).and_then(|_| writer.flush()))?;

        timer.finish();
        Ok(TelemetrySnapshot::from(&self.engine.counters().since(&before), &timer))
    }
}
