// ## 📂 File: `src/parallel.rs`
// ## Batch sealing across worker threads

//! Seal or open a batch of independent messages on a worker pool.
//!
//! Each worker owns its own `AeadEngine`; the key and primitive are shared
//! read-only. Nonces are derived statelessly from `(salt, message index)`
//! so workers never share sequencer state, and results are re-ordered by
//! index before they are returned.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{bounded, Receiver};

use crate::config::EngineConfig;
use crate::constants::DEFAULT_QUEUE_CAP;
use crate::crypto::{derive_nonce_12_tls_style, validate_salt, AeadEngine, AeadPrimitive, CipherSuite, Key, Mode};
use crate::telemetry::{TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::Error;

/// Outputs in input order, plus merged counters from all workers.
#[derive(Debug)]
pub struct BatchOutput {
    pub messages: Vec<Vec<u8>>,
    pub telemetry: TelemetrySnapshot,
}

#[derive(Clone)]
pub struct ParallelSealer {
    primitive: Arc<dyn AeadPrimitive>,
    key: Key,
    salt: [u8; 16],
    workers: usize,
    queue_cap: usize,
}

impl ParallelSealer {
    pub fn new(primitive: Arc<dyn AeadPrimitive>, key: Key, salt: [u8; 16]) -> Result<Self, Error> {
        validate_salt(&salt)?;
        Ok(Self {
            primitive,
            key,
            salt,
            workers: EngineConfig::default().resolved_workers(),
            queue_cap: DEFAULT_QUEUE_CAP,
        })
    }

    pub fn from_config(config: &EngineConfig, key: Key, salt: [u8; 16]) -> Result<Self, Error> {
        config.validate()?;
        let mut sealer = Self::new(Arc::new(CipherSuite::new(config.algorithm)), key, salt)?;
        sealer.workers = config.resolved_workers();
        sealer.queue_cap = config.queue_cap;
        Ok(sealer)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_queue_cap(mut self, queue_cap: usize) -> Self {
        self.queue_cap = queue_cap.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Nonce used for message `index`.
    pub fn nonce_for(&self, index: u64) -> Result<[u8; 12], Error> {
        Ok(derive_nonce_12_tls_style(&self.salt, index)?)
    }

    /// Seal `messages[i]` under the nonce for index `i`; outputs are ciphertext‖tag.
    pub fn seal_messages<M: AsRef<[u8]> + Sync>(&self, aad: &[u8], messages: &[M]) -> Result<BatchOutput, Error> {
        self.run(Mode::Seal, aad, messages)
    }

    /// Inverse of `seal_messages` for the same salt and key. Fails on the first
    /// message whose tag does not verify.
    pub fn open_messages<M: AsRef<[u8]> + Sync>(&self, aad: &[u8], sealed: &[M]) -> Result<BatchOutput, Error> {
        self.run(Mode::Open, aad, sealed)
    }

    fn run<M: AsRef<[u8]> + Sync>(&self, mode: Mode, aad: &[u8], inputs: &[M]) -> Result<BatchOutput, Error> {
        let mut timer = TelemetryTimer::new();
        let workers = self.workers.min(inputs.len()).max(1);

        let (job_tx, job_rx) = bounded::<(u64, &[u8])>(self.queue_cap);
        let (out_tx, out_rx) = bounded::<(u64, Result<Vec<u8>, Error>)>(self.queue_cap);

        let (ordered, counters) = thread::scope(|scope| {
            // ---- Workers ----
            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                let rx = job_rx.clone();
                let tx = out_tx.clone();
                let primitive = self.primitive.clone();
                let key = self.key.clone();
                let salt = self.salt;
                handles.push(scope.spawn(move || {
                    let mut engine = AeadEngine::new(primitive);
                    for (index, input) in rx.iter() {
                        let result = derive_nonce_12_tls_style(&salt, index)
                            .map_err(Error::from)
                            .and_then(|nonce| {
                                let out = match mode {
                                    Mode::Seal => engine.seal(&key, &nonce, aad, input),
                                    Mode::Open => engine.open(&key, &nonce, aad, input),
                                };
                                out.map_err(Error::from)
                            });
                        if tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                    engine.take_counters()
                }));
            }
            drop(job_rx);
            drop(out_tx);

            // ---- Feeder ----
            scope.spawn(move || {
                for (index, input) in inputs.iter().enumerate() {
                    if job_tx.send((index as u64, input.as_ref())).is_err() {
                        break;
                    }
                }
            });

            // ---- Ordered collector ----
            let ordered = collect_ordered(out_rx, inputs.len());

            let mut counters = TelemetryCounters::default();
            for handle in handles {
                let worker_counters = handle.join().map_err(|_| Error::Pipeline("worker panicked"))?;
                counters.merge(&worker_counters);
            }
            Ok::<_, Error>((ordered, counters))
        })?;

        timer.finish();
        Ok(BatchOutput { messages: ordered?, telemetry: TelemetrySnapshot::from(&counters, &timer) })
    }
}

impl std::fmt::Debug for ParallelSealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelSealer")
            .field("suite", &self.primitive.name())
            .field("workers", &self.workers)
            .field("queue_cap", &self.queue_cap)
            .finish_non_exhaustive()
    }
}

/// Drain `rx` into index order. Returns at the first failure; dropping the
/// receiver then stops the workers.
fn collect_ordered(rx: Receiver<(u64, Result<Vec<u8>, Error>)>, expected: usize) -> Result<Vec<Vec<u8>>, Error> {
    let mut pending = BTreeMap::new();
    let mut ordered = Vec::with_capacity(expected);
    let mut next = 0u64;

    for (index, result) in rx.iter() {
        pending.insert(index, result?);
        while let Some(out) = pending.remove(&next) {
            ordered.push(out);
            next += 1;
        }
    }

    if ordered.len() != expected {
        return Err(Error::Pipeline("worker pool closed before all messages were processed"));
    }
    Ok(ordered)
}

/// One-call form of `ParallelSealer::seal_messages` with default pool settings.
pub fn seal_messages<M: AsRef<[u8]> + Sync>(
    primitive: Arc<dyn AeadPrimitive>,
    key: &Key,
    salt: [u8; 16],
    aad: &[u8],
    messages: &[M],
) -> Result<BatchOutput, Error> {
    ParallelSealer::new(primitive, key.clone(), salt)?.seal_messages(aad, messages)
}
