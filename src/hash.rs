//! Video id pseudonymization.
//!
//! The segment service buckets lookups by a SHA-256 prefix so the full video
//! id never leaves the client. The prefix length is a protocol constant.

use sha2::{Digest, Sha256};

/// Number of hex characters of the digest sent to the segment service.
pub const PREFIX_LEN: usize = 4;

/// SHA-256 of the video id as lowercase hex.
///
/// Deterministic and pure; arbitrary non-ASCII ids are hashed over their
/// UTF-8 bytes.
pub fn video_hash(video_id: &str) -> String {
    hex::encode(Sha256::digest(video_id.as_bytes()))
}

/// The fixed-length digest prefix used as the lookup key.
pub fn lookup_prefix(video_id: &str) -> String {
    let mut digest = video_hash(video_id);
    digest.truncate(PREFIX_LEN);
    digest
}
