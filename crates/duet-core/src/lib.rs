//! # duet-core
//!
//! Core types, playlist decisions, and error handling for the Duet playback engine.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
