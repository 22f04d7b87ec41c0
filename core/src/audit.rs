//! Append-only operation log for engines: init, seal, open, auth failures.
//!
//! Keys never reach the log. Nonces are public values and are written
//! base64-encoded so a nonce reuse can be spotted after the fact.
//!
//! `AsyncLogManager` owns a background thread. Appends are non-blocking
//! sends; the thread writes one flushed line per entry and rotates the file
//! after `rotation_limit` entries (renamed with a UTC timestamp, then
//! zstd-compressed on a helper thread). Dropping the manager drains the
//! queue, closes the file and joins the thread.
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::crypto::types::{Mode, TAG_LEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Init { mode: Mode, suite: String, nonce: Vec<u8>, aad_len: usize },
    Sealed { plaintext_len: usize, ciphertext_len: usize, tag: [u8; TAG_LEN] },
    Opened { plaintext_len: usize },
    AuthFailure { ciphertext_len: usize },
    /// Free-form marker (key rotation, run boundaries).
    Marker(String),
}

enum LogCommand {
    Append(LogEntry),
    Rotate,
}

/// Synchronous variant: writes through and keeps entries in memory for replay.
#[derive(Debug)]
pub struct LogManager {
    pub entries: Vec<LogEntry>,
    rotation_limit: usize,
    writer: BufWriter<File>,
}

impl LogManager {
    pub fn new(path: impl AsRef<Path>, rotation_limit: usize) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            entries: Vec::new(),
            rotation_limit: rotation_limit.max(1),
            writer: BufWriter::new(file),
        })
    }

    pub fn append(&mut self, entry: LogEntry) -> io::Result<()> {
        self.writer.write_all(format_entry(&entry).as_bytes())?;
        self.writer.flush()?;

        self.entries.push(entry);
        if self.entries.len() >= self.rotation_limit {
            // in-memory window only; the file keeps everything
            self.entries.clear();
        }
        Ok(())
    }

    pub fn replay(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn stream_log(path: impl AsRef<Path>) -> io::Result<impl Iterator<Item = io::Result<String>>> {
        let file = File::open(path)?;
        Ok(BufReader::new(file).lines())
    }
}

pub struct AsyncLogManager {
    tx: Option<Sender<LogCommand>>,
    worker: Option<JoinHandle<()>>,
    path: PathBuf,
}

impl AsyncLogManager {
    /// Open (or create) `path` and start the background writer.
    pub fn new(path: impl AsRef<Path>, rotation_limit: usize) -> io::Result<Self> {
        let path_owned = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path_owned)?;
        let rotation_limit = rotation_limit.max(1);

        let (tx, rx) = channel::<LogCommand>();
        let thread_path = path_owned.clone();

        // Ends when the last sender drops; the file closes with it.
        let worker = thread::spawn(move || {
            let mut writer = Some(BufWriter::new(file));
            let mut count = 0;

            while let Ok(cmd) = rx.recv() {
                let rotate_now = match cmd {
                    LogCommand::Append(entry) => {
                        let Some(w) = writer.as_mut() else { continue };
                        if w.write_all(format_entry(&entry).as_bytes()).is_err() {
                            continue;
                        }
                        let _ = w.flush();
                        count += 1;
                        count >= rotation_limit
                    }
                    LogCommand::Rotate => true,
                };

                if rotate_now {
                    count = 0;
                    if let Some(mut w) = writer.take() {
                        let _ = w.flush();
                    }
                    rotate_file(&thread_path);
                    writer = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(&thread_path)
                        .ok()
                        .map(BufWriter::new);
                }
            }
        });

        Ok(Self { tx: Some(tx), worker: Some(worker), path: path_owned })
    }

    /// Non-blocking append. Dropped silently once the writer thread is gone.
    pub fn append(&self, entry: LogEntry) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(LogCommand::Append(entry));
        }
    }

    /// Force a rotation at the next opportunity.
    pub fn rotate(&self) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(LogCommand::Rotate);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AsyncLogManager {
    /// Drain pending entries, close the file and join the writer thread.
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for AsyncLogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncLogManager").field("path", &self.path).finish()
    }
}

/// One line per entry, prefixed with an RFC 3339 UTC timestamp.
pub fn format_entry(entry: &LogEntry) -> String {
    let ts = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let body = match entry {
        LogEntry::Init { mode, suite, nonce, aad_len } => {
            format!("INIT: mode={} suite={} nonce={} aad_len={}", mode, suite, STANDARD.encode(nonce), aad_len)
        }
        LogEntry::Sealed { plaintext_len, ciphertext_len, tag } => {
            format!("SEALED: plaintext_len={} ciphertext_len={} tag=0x{}", plaintext_len, ciphertext_len, hex::encode(tag))
        }
        LogEntry::Opened { plaintext_len } => format!("OPENED: plaintext_len={}", plaintext_len),
        LogEntry::AuthFailure { ciphertext_len } => format!("AUTH_FAILURE: ciphertext_len={}", ciphertext_len),
        LogEntry::Marker(msg) => format!("MARKER: {}", msg),
    };
    format!("{} {}\n", ts, body)
}

fn rotate_file(path: &Path) {
    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let archived = PathBuf::from(format!("{}.{}", path.display(), timestamp));
    if fs::rename(path, &archived).is_ok() {
        thread::spawn(move || compress_log_file(&archived));
    }
}

fn compress_log_file(src_path: &Path) {
    let dest_path = PathBuf::from(format!("{}.zst", src_path.display()));
    if let (Ok(src), Ok(dest)) = (File::open(src_path), File::create(&dest_path)) {
        if zstd::stream::copy_encode(src, dest, 3).is_ok() {
            let _ = fs::remove_file(src_path);
        }
    }
}

/// Drop consecutive duplicate markers.
pub fn compact_entries(entries: &mut Vec<LogEntry>) {
    entries.dedup_by(|next, prev| matches!((prev, next), (LogEntry::Marker(a), LogEntry::Marker(b)) if a == b));
}
