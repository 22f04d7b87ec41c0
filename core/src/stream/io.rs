// ## 📂 File: `src/stream/io.rs`
// ## Normalized sources and sinks for the stream adapter

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::types::Error;

/// Canonical input abstraction
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Canonical output abstraction
pub enum OutputSink {
    Writer(Box<dyn Write + Send>),
    File(PathBuf),
    /// Collect into memory; the bytes come back on the run's snapshot.
    Memory,
}

/// Normalize input source into a boxed reader
pub fn open_input(src: InputSource) -> Result<Box<dyn Read + Send>, Error> {
    let reader: Box<dyn Read + Send> = match src {
        InputSource::Reader(r) => r,
        InputSource::File(p) => Box::new(std::fs::File::open(p)?),
        InputSource::Memory(b) => Box::new(io::Cursor::new(b)),
    };
    Ok(reader)
}

/// Normalize output sink into a boxed writer, plus the shared buffer when
/// the sink is in memory.
pub fn open_output(sink: OutputSink) -> Result<(Box<dyn Write + Send>, Option<Arc<Mutex<Vec<u8>>>>), Error> {
    match sink {
        OutputSink::Writer(w) => Ok((w, None)),
        OutputSink::File(p) => Ok((Box::new(std::fs::File::create(p)?), None)),
        OutputSink::Memory => {
            let buf = Arc::new(Mutex::new(Vec::new()));
            let writer = SharedBufferWriter { buf: buf.clone() };
            Ok((Box::new(writer), Some(buf)))
        }
    }
}

/// Writer behind `OutputSink::Memory`; `open_output` hands out the buffer handle.
#[derive(Debug, Clone)]
pub struct SharedBufferWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Write for SharedBufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .buf
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "shared buffer poisoned"))?;
        guard.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Copy out a shared buffer filled by `SharedBufferWriter`.
pub fn take_shared(buf: &Arc<Mutex<Vec<u8>>>) -> Result<Vec<u8>, Error> {
    let mut guard = buf.lock().map_err(|_| Error::Pipeline("shared output buffer poisoned"))?;
    Ok(std::mem::take(&mut *guard))
}

/// Read up to `len` bytes, stopping early only at end of input.
///
/// A short (or empty) result means the source is exhausted.
pub fn read_exact_or_eof<R: Read>(r: &mut R, len: usize) -> Result<Bytes, Error> {
    let mut buf = vec![0u8; len];
    let mut off = 0;

    while off < len {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    buf.truncate(off);
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Trickle {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            if self.pos == self.data.len() || out.is_empty() {
                return Ok(0);
            }
            out[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn fills_across_short_reads() {
        let mut src = Trickle { data: b"abcdefg".to_vec(), pos: 0 };
        assert_eq!(&read_exact_or_eof(&mut src, 4).unwrap()[..], b"abcd");
        assert_eq!(&read_exact_or_eof(&mut src, 4).unwrap()[..], b"efg");
        assert!(read_exact_or_eof(&mut src, 4).unwrap().is_empty());
    }

    #[test]
    fn memory_sink_captures_output() {
        let (mut w, buf) = open_output(OutputSink::Memory).unwrap();
        w.write_all(b"hello").unwrap();
        assert_eq!(take_shared(&buf.unwrap()).unwrap(), b"hello");
    }
}
