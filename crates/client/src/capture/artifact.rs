//! Deterministic artifact names for captured snapshots.

use sha2::{Digest, Sha256};

use crate::target::Target;

const MAX_STEM_LEN: usize = 96;
const DIGEST_LEN: usize = 12;

/// File name for the snapshot of `target`.
///
/// The readable stem replaces everything outside `[A-Za-z0-9.-]` with `_`;
/// the digest suffix keeps URLs that sanitize to the same stem apart.
pub fn artifact_name(target: &Target) -> String {
    let url = target.as_str();

    let stem: String = url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .take(MAX_STEM_LEN)
        .collect();

    let digest = hex::encode(Sha256::digest(url.as_bytes()));

    format!("{stem}-{}.png", &digest[..DIGEST_LEN])
}
