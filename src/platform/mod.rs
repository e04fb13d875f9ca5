//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time
//! - Storage (LocalStorage on web)
//! - Visitor traits used for fingerprinting (browser only)

pub mod time;
#[cfg(target_arch = "wasm32")]
pub mod browser;
#[cfg(target_arch = "wasm32")]
pub mod storage;

pub use time::{now, today};
