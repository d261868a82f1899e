//! Core domain types for Duet.

pub mod advance;
pub mod catalog;
pub mod common;
pub mod generation;
pub mod track;

pub use advance::{next_index, previous_index, resolve, Direction, LoopMode};
pub use catalog::TrackCatalog;
pub use common::*;
pub use generation::Generation;
pub use track::{Track, TrackDescriptor, TrackKind, UNKNOWN_ARTIST};
