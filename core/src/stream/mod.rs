//! Stream adapter: an engine driven by `Read` sources and `Write` sinks.

pub mod adapter;
pub mod io;

pub use adapter::StreamAdapter;
pub use io::{open_input, open_output, read_exact_or_eof, InputSource, OutputSink, SharedBufferWriter};
