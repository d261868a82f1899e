//! Lyrics parsing, playhead sync, and lookup for Duet.
//!
//! The lyric text itself comes from a [`LyricsProvider`]; this crate turns it
//! into a time-ordered line sequence, picks the active line for a playhead
//! time, and makes sure a lookup for a replaced track is never applied.

mod parser;
mod resolve;
mod sync;

pub use parser::parse_lrc;
pub use resolve::{clean_title, LyricsProvider, LyricsRecord, LyricsResolver, Strategy};
pub use sync::{FetchTicket, LyricSync, LyricsStatus, LyricsTracker};

use serde::{Deserialize, Serialize};

/// A single line of lyrics with its start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Start time in seconds.
    pub time: f64,
    /// Display text. May be empty for intro/instrumental markers.
    pub text: String,
}

impl LyricLine {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

/// A complete lyric sheet for one track.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LyricSheet {
    /// Lines in source order.
    pub lines: Vec<LyricLine>,
    /// Whether every line carries a real playback timestamp.
    pub synced: bool,
}

impl LyricSheet {
    /// A time-following sheet.
    pub const fn synced(lines: Vec<LyricLine>) -> Self {
        Self {
            lines,
            synced: true,
        }
    }

    /// One unsynced block of text, shown as a single row.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            lines: vec![LyricLine::new(0.0, text)],
            synced: false,
        }
    }
}

/// Result of a lyrics lookup. Not finding lyrics is a status, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum LyricsOutcome {
    Found(LyricSheet),
    NotFound(String),
}

impl LyricsOutcome {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }

    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}
