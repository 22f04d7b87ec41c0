//! aead-engine-core
//!
//! AEAD sealing engine around an opaque `{seal, open}` primitive: nonce
//! sequencing, incremental init/update/finish, and adapters for streams and
//! position/limit buffers.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod config;

pub mod audit;
pub mod crypto;
pub mod telemetry;

// Adapters
pub mod buffer;
pub mod stream;
pub mod parallel;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::buffer::{BufferedChannelAdapter, ByteView};
    pub use crate::config::EngineConfig;
    pub use crate::crypto::{
        AeadEngine, AeadPrimitive, Algorithm, CipherSuite, CryptoError, Key, Mode, NonceSequencer,
    };
    pub use crate::stream::StreamAdapter;
    pub use crate::types::Error;
}
