//! Read-only filesystem access for the report tree and the extracted export.
//!
//! Everything that reads report or export files goes through [`FileSystem`],
//! so the locator, the row parser and the report glue can be driven from an
//! in-memory [`mock::MockFs`] in tests.

pub mod mock;
mod traits;

pub use traits::{FileSystem, RealFs};
