//! In-memory filesystem and canned report trees for tests.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
pub use scenarios::{EXPORT_DIR, ids};
