//! Track types handed to the transport by the metadata and search collaborators.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Artist name used when metadata extraction finds none.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Which backend a track plays through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Decoded locally as waveform audio.
    #[default]
    Local,
    /// Streamed through an embedded remote player.
    Remote,
}

impl TrackKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// A finished track description, as produced by metadata extraction or search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackDescriptor {
    pub title: String,
    pub artist: String,
    /// File/blob reference for local tracks, video id for remote ones.
    pub source_ref: String,
    pub kind: TrackKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_ref: Option<String>,
    /// Duration reported by metadata, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hint: Option<f64>,
}

impl TrackDescriptor {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        source_ref: impl Into<String>,
        kind: TrackKind,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            source_ref: source_ref.into(),
            kind,
            artwork_ref: None,
            duration_hint: None,
        }
    }

    pub fn local(title: impl Into<String>, source_ref: impl Into<String>) -> Self {
        Self::new(title, UNKNOWN_ARTIST, source_ref, TrackKind::Local)
    }

    pub fn remote(
        title: impl Into<String>,
        artist: impl Into<String>,
        video_id: impl Into<String>,
    ) -> Self {
        Self::new(title, artist, video_id, TrackKind::Remote)
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    #[must_use]
    pub fn with_artwork(mut self, artwork_ref: impl Into<String>) -> Self {
        self.artwork_ref = Some(artwork_ref.into());
        self
    }

    #[must_use]
    pub fn with_duration_hint(mut self, seconds: f64) -> Self {
        self.duration_hint = (seconds.is_finite() && seconds > 0.0).then_some(seconds);
        self
    }
}

/// A track admitted to the catalog. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub source_ref: String,
    pub kind: TrackKind,
    pub artwork_ref: Option<String>,
    pub duration_hint: Option<f64>,
}

impl Track {
    pub fn from_descriptor(descriptor: TrackDescriptor) -> Self {
        let artist = if descriptor.artist.trim().is_empty() {
            UNKNOWN_ARTIST.to_string()
        } else {
            descriptor.artist
        };

        Self {
            id: Uuid::new_v4(),
            title: descriptor.title,
            artist,
            source_ref: descriptor.source_ref,
            kind: descriptor.kind,
            artwork_ref: descriptor.artwork_ref,
            duration_hint: descriptor.duration_hint,
        }
    }

    pub const fn is_remote(&self) -> bool {
        matches!(self.kind, TrackKind::Remote)
    }

    /// The `(artist, title)` pair that identifies this track to lyric lookup.
    pub fn lyrics_key(&self) -> (&str, &str) {
        (self.artist.as_str(), self.title.as_str())
    }

    /// Case-insensitive substring match on title or artist.
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.artist.to_lowercase().contains(needle_lower)
    }
}

impl From<TrackDescriptor> for Track {
    fn from(descriptor: TrackDescriptor) -> Self {
        Self::from_descriptor(descriptor)
    }
}
