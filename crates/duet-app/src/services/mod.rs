//! Services wired into the driver loop.
//!
//! - Text commands read from stdin
//! - In-memory media, remote player, lyrics and search collaborators
//! - The select loop that owns the transport

pub mod commands;
pub mod demo;
pub mod driver;
