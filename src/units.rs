//! Unit conversions applied at fetcher boundaries.
//!
//! Upstream AWS APIs report capacity in GiB/MiB and throughput in MB/s; every
//! metric this exporter emits is in bytes (or bytes/second), so the
//! conversion happens once, here, rather than being repeated at each call
//! site.

/// Number of bytes in one gibibyte (2^30).
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Number of bytes in one mebibyte (2^20).
pub const MIB: f64 = 1024.0 * 1024.0;

/// Number of bytes in one "MB" as AWS uses the term for throughput (10^6, decimal megabyte).
pub const MB: f64 = 1_000_000.0;

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn gib_to_bytes(gib: f64) -> u64 {
    (gib * GIB).round() as u64
}

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn mib_to_bytes(mib: f64) -> u64 {
    (mib * MIB).round() as u64
}

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn mb_per_s_to_bytes_per_s(mb_per_s: f64) -> u64 {
    (mb_per_s * MB).round() as u64
}
