//! sosdb - engine database extraction from sosreports.
//!
//! The library is shared between:
//! - `sosdb` - command-line viewer for a report or an export bundle
//! - integration tests that build bundles on the fly

pub mod database;
pub mod fs;
pub mod render;
pub mod sos;
