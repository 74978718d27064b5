//! Content hashing for derived resource versions

use std::fmt::Write;

use aws_lc_rs::digest;

/// Compute a deterministic hash of the input bytes, returning a 16-char hex digest.
///
/// Uses truncated SHA-256 so the value is stable across toolchains and
/// processes. `DefaultHasher` gives no such guarantee.
pub fn deterministic_hash(input: &[u8]) -> String {
    let hash = digest::digest(&digest::SHA256, input);
    hash.as_ref()[..8]
        .iter()
        .fold(String::with_capacity(16), |mut s, b| {
            let _ = write!(s, "{:02x}", b);
            s
        })
}
