//! # duet-playback
//!
//! Unified transport engine for Duet.
//!
//! Features:
//! - One playhead driven across a locally decoded backend and a polled remote
//!   stream backend
//! - Generation-tagged backend events so a swap can never interleave writes
//! - Loop modes, end-of-track advancement, and a single A/B loop region
//! - Time-indexed lyric highlighting

pub mod backend;
pub mod config;
pub mod region;
pub mod transport;

pub use backend::{
    Backend, BackendEvent, Capabilities, Envelope, EventSink, LocalAudioBackend, LocalMedia,
    PlayerSnapshot, RateControl, RegionLoop, RemotePlayer, RemoteState, RemoteStreamBackend,
    VolumeControl,
};
pub use config::TransportConfig;
pub use region::{LoopRegion, LoopRegionManager, RegionChange};
pub use transport::{LoadPhase, PlaybackState, TransportController};
