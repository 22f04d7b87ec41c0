/// ChaCha20-Poly1305 accepts only a 256-bit key.
pub const CHACHA_KEY_LENGTHS: &[usize] = &[32];

/// Standard 12-byte nonce for AES-GCM and ChaCha20-Poly1305.
pub const NONCE_LEN_12: usize = 12;

/// Fixed AEAD tag length (bytes), appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Default size of the random seed buffer the nonce sequencer windows into.
pub const DEFAULT_IV_BUFFER_SIZE: usize = 32;

/// Upper bound on the seed buffer; larger seeds buy nothing but memory.
pub const MAX_IV_BUFFER_SIZE: usize = 1024 * 1024;

/// Defaults when Option<T> is None
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024; // 16 KiB
/// Transfer chunk sizes accepted by the stream adapter (in bytes)
pub const ALLOWED_CHUNK_SIZES: &[usize] = &[
    1024,        // 1 KiB
    4 * 1024,    // 4 KiB
    16 * 1024,   // 16 KiB
    64 * 1024,   // 64 KiB
    256 * 1024,  // 256 KiB
    1024 * 1024, // 1 MiB
];
/// Max chunk size sanity bound (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Default plaintext size per message, matches the smallest benchmark payload.
pub const DEFAULT_DATA_SIZE: usize = 1024;

/// Largest message the engine buffers for a single init..finish cycle (64 MiB).
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Cipher suite identifiers.
pub mod cipher_ids {
    pub const AES128_GCM: u16        = 0x0001;
    pub const AES192_GCM: u16        = 0x0002;
    pub const AES256_GCM: u16        = 0x0003;
    pub const CHACHA20_POLY1305: u16 = 0x0004;
}

/// HKDF PRF identifiers used for key rotation.
pub mod prf_ids {
    pub const SHA256: u16 = 0x0001;
    pub const SHA512: u16 = 0x0002;
}

/// Worker counts accepted by the parallel sealer.
pub const WORKERS_COUNT: &[usize] = &[1, 2, 4, 8, 16, 32];

/// Bounded channel capacities accepted by the parallel sealer.
pub const QUEUE_CAPS: &[usize] = &[1, 4, 16, 64, 256];

pub const DEFAULT_QUEUE_CAP: usize = 16;

/// Entries the event log keeps before rotating its file.
pub const DEFAULT_LOG_ROTATION: usize = 10_000;
