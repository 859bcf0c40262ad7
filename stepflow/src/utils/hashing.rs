//! Path digest helper for execution directory keying.

use md5::{Digest, Md5};
use std::path::Path;

/// Returns a short hex digest of a filesystem path.
///
/// Execution directories are keyed by this digest so that distinct
/// pipeline roots never collide while repeated calls for the same root
/// map to the same directory.
#[must_use]
pub fn path_digest(path: &Path) -> String {
    let digest = Md5::digest(path.to_string_lossy().as_bytes());
    hex::encode(digest)[..8].to_string()
}
