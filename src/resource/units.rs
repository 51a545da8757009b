//! Storage quota units
//!
//! The Access API stores quotas in bytes, configuration uses gigabytes.
//! `-1` means unlimited and is never scaled.

/// Quota value meaning "no limit"
pub const UNLIMITED: i64 = -1;

const BYTES_PER_GIGABYTE: i64 = 1024 * 1024 * 1024;

pub fn gigabytes_to_bytes(gigabytes: i64) -> i64 {
    if gigabytes == UNLIMITED {
        return UNLIMITED;
    }
    gigabytes.saturating_mul(BYTES_PER_GIGABYTE)
}

pub fn bytes_to_gigabytes(bytes: i64) -> i64 {
    if bytes == UNLIMITED {
        return UNLIMITED;
    }
    bytes / BYTES_PER_GIGABYTE
}

/// Whether a change of `max_storage_in_gigabytes` from `old` to `new` is a no-op.
///
/// Both sides are compared in bytes. A value that does not parse as an
/// integer never suppresses the change.
pub fn suppress_storage_diff(old: &str, new: &str) -> bool {
    let Ok(old) = old.trim().parse::<i64>() else {
        return false;
    };
    let Ok(new) = new.trim().parse::<i64>() else {
        return false;
    };

    old.wrapping_mul(BYTES_PER_GIGABYTE) == new.wrapping_mul(BYTES_PER_GIGABYTE)
}
