//! Active-line lookup and generation-tagged lyric refreshes.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use duet_core::Generation;
use tracing::debug;

use crate::{LyricLine, LyricSheet, LyricsOutcome};

/// Maps a playhead time to the active lyric line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricSync {
    sheet: LyricSheet,
}

impl LyricSync {
    pub const fn new(sheet: LyricSheet) -> Self {
        Self { sheet }
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.sheet.lines
    }

    pub const fn is_synced(&self) -> bool {
        self.sheet.synced
    }

    pub const fn sheet(&self) -> &LyricSheet {
        &self.sheet
    }

    /// Index of the line active at `time`.
    ///
    /// This is the greatest index whose timestamp is `<= time`; duplicate
    /// timestamps therefore resolve to the later line. Unsynced sheets never
    /// have an active line.
    pub fn active_index(&self, time: f64) -> Option<usize> {
        if !self.sheet.synced || time.is_nan() {
            return None;
        }
        self.sheet.lines.iter().rposition(|line| line.time <= time)
    }

    pub fn active_line(&self, time: f64) -> Option<&LyricLine> {
        self.active_index(time).and_then(|index| self.sheet.lines.get(index))
    }
}

/// A pending lyrics lookup, tagged with the generation it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: Generation,
    pub artist: String,
    pub title: String,
}

/// What the lyrics panel should show.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LyricsStatus {
    #[default]
    Idle,
    Loading,
    Ready(LyricSync),
    NotFound(String),
}

/// Tracks which `(artist, title)` the lyrics belong to and discards lookups
/// that finish after the track changed.
#[derive(Debug, Default)]
pub struct LyricsTracker {
    key: Option<(String, String)>,
    generation: Generation,
    status: LyricsStatus,
}

impl LyricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn status(&self) -> &LyricsStatus {
        &self.status
    }

    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Note the active track. Returns a ticket when a new lookup is needed.
    pub fn track_changed(&mut self, artist: &str, title: &str) -> Option<FetchTicket> {
        if title.trim().is_empty() {
            self.clear();
            self.status = LyricsStatus::NotFound("No song loaded".to_string());
            return None;
        }

        let unchanged = self
            .key
            .as_ref()
            .is_some_and(|(a, t)| a == artist && t == title);
        if unchanged {
            return None;
        }

        self.key = Some((artist.to_string(), title.to_string()));
        Some(self.issue())
    }

    /// Look up the current track's lyrics again.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.key.is_none() {
            return None;
        }
        Some(self.issue())
    }

    /// Forget the current track. Any pending lookup becomes stale.
    pub fn clear(&mut self) {
        self.key = None;
        self.generation.bump();
        self.status = LyricsStatus::Idle;
    }

    /// Apply a finished lookup. Returns false if the ticket is stale.
    pub fn apply(&mut self, ticket: &FetchTicket, outcome: LyricsOutcome) -> bool {
        if !ticket.generation.is_current(self.generation) {
            debug!(
                "Discarding lyrics for {} - {} ({} superseded by {})",
                ticket.artist, ticket.title, ticket.generation, self.generation
            );
            return false;
        }

        self.status = match outcome {
            LyricsOutcome::Found(sheet) => LyricsStatus::Ready(LyricSync::new(sheet)),
            LyricsOutcome::NotFound(reason) => LyricsStatus::NotFound(reason),
        };
        true
    }

    /// Active line index for the current sheet, if any.
    pub fn active_index(&self, time: f64) -> Option<usize> {
        match &self.status {
            LyricsStatus::Ready(sync) => sync.active_index(time),
            _ => None,
        }
    }

    fn issue(&mut self) -> FetchTicket {
        let generation = self.generation.bump();
        self.status = LyricsStatus::Loading;

        let (artist, title) = self.key.clone().unwrap_or_default();
        debug!("Issuing lyrics lookup {generation} for {artist} - {title}");
        FetchTicket {
            generation,
            artist,
            title,
        }
    }
}
