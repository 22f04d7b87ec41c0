pub mod types;
pub mod aead;
pub mod engine;
pub mod kdf;
pub mod nonce;

pub use types::*;
pub use aead::*;
pub use engine::*;
pub use kdf::*;
pub use nonce::*;
