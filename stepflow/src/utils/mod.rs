//! Small shared utilities.

mod hashing;
mod timestamps;

pub use hashing::path_digest;
pub use timestamps::now_epoch_seconds;
