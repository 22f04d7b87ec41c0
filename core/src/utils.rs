use std::fmt;

use num_enum::TryFromPrimitive;

use crate::constants::{ALLOWED_CHUNK_SIZES, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};

/// `Debug` name of a registry value, or its hex form when unknown.
pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:04x}", raw),
    }
}

/// Map a requested transfer chunk size onto `ALLOWED_CHUNK_SIZES`, rounding up.
///
/// `None` gives the default; anything at or above `MAX_CHUNK_SIZE` clamps to
/// it; sizes between the largest allowed size and the max are kept as-is.
pub fn best_chunk_size(requested: Option<usize>) -> usize {
    let Some(size) = requested else {
        return DEFAULT_CHUNK_SIZE;
    };
    if size >= MAX_CHUNK_SIZE {
        return MAX_CHUNK_SIZE;
    }
    ALLOWED_CHUNK_SIZES
        .iter()
        .copied()
        .find(|&allowed| size <= allowed)
        .unwrap_or(size)
}
