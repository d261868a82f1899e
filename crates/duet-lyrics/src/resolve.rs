//! Lookup strategies for finding a track's lyrics.
//!
//! Remote titles are often noisy ("Artist - Song (Official Video) | Label"),
//! so the resolver tries progressively looser queries against the provider
//! and stops at the first hit. Strategies are tried in a fixed order and
//! results are not scored against duration or artist similarity.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::fmt;

use duet_core::{Result, UNKNOWN_ARTIST};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{parse_lrc, LyricSheet, LyricsOutcome};

/// Words that remote titles carry but lyric databases don't.
const CLUTTER: &[&str] = &[
    "- topic",
    "official video",
    "official audio",
    "lyrics",
    "official",
    "video",
    "audio",
];

/// A lyrics entry as returned by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsRecord {
    #[serde(default)]
    pub synced_lyrics: Option<String>,
    #[serde(default)]
    pub plain_lyrics: Option<String>,
}

impl LyricsRecord {
    /// Turn the record into a sheet, preferring timestamped text.
    pub fn into_outcome(self) -> LyricsOutcome {
        let plain = self.plain_lyrics.filter(|p| !p.trim().is_empty());

        if let Some(synced) = self.synced_lyrics.filter(|s| !s.trim().is_empty()) {
            let lines = parse_lrc(&synced);
            if !lines.is_empty() || plain.is_none() {
                return LyricsOutcome::Found(LyricSheet::synced(lines));
            }
        }

        match plain {
            Some(text) => LyricsOutcome::Found(LyricSheet::plain(text)),
            None => LyricsOutcome::not_found("Lyrics not found (empty content)"),
        }
    }
}

/// A source of lyric text.
#[allow(async_fn_in_trait)]
pub trait LyricsProvider {
    /// Exact lookup by artist and track name. `Ok(None)` when not found.
    async fn get(&self, artist: &str, title: &str) -> Result<Option<LyricsRecord>>;

    /// Free-text search, best match first.
    async fn search(&self, query: &str) -> Result<Vec<LyricsRecord>>;
}

/// The lookup strategies, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Exact get with artist and cleaned title.
    ExactMatch,
    /// Search for "artist title".
    CombinedQuery,
    /// Treat "Left - Right" titles as "artist - title".
    SplitTitle,
    /// Search for the cleaned title alone.
    TitleOnly,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ExactMatch => "exact match",
            Self::CombinedQuery => "combined query",
            Self::SplitTitle => "split title",
            Self::TitleOnly => "title only",
        };
        f.write_str(name)
    }
}

/// Runs the strategy chain against a provider.
pub struct LyricsResolver<P> {
    provider: P,
}

impl<P: LyricsProvider> LyricsResolver<P> {
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Find lyrics for a track. Never fails; a miss is a `NotFound` status.
    pub async fn resolve(&self, artist: &str, title: &str) -> LyricsOutcome {
        info!("Fetching lyrics for: {} - {}", artist, title);

        match self.find(artist, title).await {
            Some((strategy, record)) => {
                info!("Lyrics found using strategy: {strategy}");
                record.into_outcome()
            }
            None => {
                warn!("All lyrics strategies failed for {} - {}", artist, title);
                LyricsOutcome::not_found("Lyrics not found")
            }
        }
    }

    /// Try each strategy in turn and return the first hit.
    pub async fn find(&self, artist: &str, title: &str) -> Option<(Strategy, LyricsRecord)> {
        let artist = if artist == UNKNOWN_ARTIST { "" } else { artist };
        let cleaned = clean_title(title);

        match self.provider.get(artist, &cleaned).await {
            Ok(Some(record)) => return Some((Strategy::ExactMatch, record)),
            Ok(None) => debug!("Exact lyrics lookup missed"),
            Err(e) => debug!("Exact lyrics lookup failed: {e}"),
        }

        let combined = format!("{artist} {cleaned}");
        if let Some(record) = self.first_hit(Strategy::CombinedQuery, combined.trim()).await {
            return Some((Strategy::CombinedQuery, record));
        }

        if let Some((left, right)) = title.split_once('-') {
            let query = format!("{} {}", left.trim(), clean_title(right));
            if let Some(record) = self.first_hit(Strategy::SplitTitle, query.trim()).await {
                return Some((Strategy::SplitTitle, record));
            }
        }

        self.first_hit(Strategy::TitleOnly, &cleaned)
            .await
            .map(|record| (Strategy::TitleOnly, record))
    }

    async fn first_hit(&self, strategy: Strategy, query: &str) -> Option<LyricsRecord> {
        debug!("Trying {strategy} strategy: {query:?}");
        match self.provider.search(query).await {
            Ok(results) => results.into_iter().next(),
            Err(e) => {
                warn!("Lyrics search ({strategy}) failed: {e}");
                None
            }
        }
    }
}

/// Strip the decorations remote titles carry: bracketed segments, anything
/// after a `|`, and words like "official video".
pub fn clean_title(title: &str) -> String {
    let mut text = title.to_string();
    for (open, close) in [('(', ')'), ('[', ']')] {
        text = strip_enclosed(&text, open, close);
    }

    let text = text.split('|').next().unwrap_or_default();
    strip_clutter(text).trim().to_string()
}

/// Remove everything from the first `open` to the last `close` after it.
fn strip_enclosed(text: &str, open: char, close: char) -> String {
    let Some(start) = text.find(open) else {
        return text.to_string();
    };
    match text.rfind(close) {
        Some(end) if end > start => {
            format!("{}{}", &text[..start], &text[end + close.len_utf8()..])
        }
        _ => text.to_string(),
    }
}

fn strip_clutter(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    'scan: while let Some(c) = rest.chars().next() {
        for word in CLUTTER {
            let len = word.len();
            if rest.len() >= len
                && rest.is_char_boundary(len)
                && rest[..len].eq_ignore_ascii_case(word)
            {
                rest = &rest[len..];
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}
