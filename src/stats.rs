use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::source::MediaKind;

/// Maximum number of captured samples.
pub const SAMPLE_LIMIT: usize = 5;

/// Maximum characters kept from a sample's text.
pub const SAMPLE_TEXT_CHARS: usize = 200;

/// Marker appended to truncated sample text.
pub const ELLIPSIS: &str = "...";

/// Per-kind media counters. Every media post lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaKindCounts {
    pub photo: u64,
    pub video: u64,
    pub document: u64,
    pub audio: u64,
    pub other: u64,
}

impl MediaKindCounts {
    pub fn increment(&mut self, kind: MediaKind) {
        *self.slot_mut(kind) += 1;
    }

    pub fn get(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Photo => self.photo,
            MediaKind::Video => self.video,
            MediaKind::Document => self.document,
            MediaKind::Audio => self.audio,
            MediaKind::Other => self.other,
        }
    }

    pub fn total(&self) -> u64 {
        MediaKind::ALL.iter().map(|kind| self.get(*kind)).sum()
    }

    /// `(kind, count)` pairs in fixed kind order.
    pub fn iter(&self) -> impl Iterator<Item = (MediaKind, u64)> + '_ {
        MediaKind::ALL.iter().map(move |kind| (*kind, self.get(*kind)))
    }

    fn slot_mut(&mut self, kind: MediaKind) -> &mut u64 {
        match kind {
            MediaKind::Photo => &mut self.photo,
            MediaKind::Video => &mut self.video,
            MediaKind::Document => &mut self.document,
            MediaKind::Audio => &mut self.audio,
            MediaKind::Other => &mut self.other,
        }
    }
}

/// Excerpt of a recent text-bearing post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub text: String,
    pub views: u64,
    pub forwards: u64,
    /// Post time in the channel's local offset.
    pub date: DateTime<FixedOffset>,
    pub has_media: bool,
}

impl Sample {
    /// Keep at most [`SAMPLE_TEXT_CHARS`] characters, marking truncation.
    pub fn excerpt(text: &str) -> String {
        if text.chars().count() > SAMPLE_TEXT_CHARS {
            let head: String = text.chars().take(SAMPLE_TEXT_CHARS).collect();
            format!("{}{}", head, ELLIPSIS)
        } else {
            text.to_string()
        }
    }
}

/// Statistics of one channel scan.
///
/// Created fresh per scan and owned by it. Bucket maps only hold keys that
/// saw at least one post; `daily_activity` keeps dates in scan order
/// (newest first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    pub window_days: u32,
    pub total_posts: u64,
    pub total_views: u64,
    pub total_forwards: u64,
    pub total_replies: u64,
    pub media_count: u64,
    pub media_kind_counts: MediaKindCounts,
    /// Local hour of day (0-23) to post count.
    pub hourly_activity: BTreeMap<u8, u64>,
    /// Local calendar date to post count.
    pub daily_activity: IndexMap<NaiveDate, u64>,
    pub samples: Vec<Sample>,
    /// Raw text bodies in scan order; summarizer input only.
    #[serde(skip)]
    pub collected_texts: Vec<String>,
    /// Interactions per post, divided by 100.
    ///
    /// NOT a percentage and not bounded to [0, 100]:
    /// `(views + forwards + replies) / (posts * 100)`. Reports print it with
    /// a `%` sign for compatibility with earlier output; do not "fix" the
    /// scale without changing every consumer.
    pub engagement_rate: f64,
    /// Posts per day over the configured window length, not the observed span.
    pub post_frequency: f64,
    pub content_analysis: String,
}

impl RunningStats {
    pub fn new(window_days: u32) -> Self {
        Self {
            window_days,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_posts == 0
    }

    /// Fill in the derived metrics. No-op for an empty scan.
    pub fn compute_derived(&mut self) {
        if self.total_posts == 0 {
            return;
        }
        let interactions = (self.total_views + self.total_forwards + self.total_replies) as f64;
        self.engagement_rate = interactions / (self.total_posts as f64 * 100.0);
        self.post_frequency = self.total_posts as f64 / f64::from(self.window_days.max(1));
    }

    pub fn mean_views(&self) -> u64 {
        self.total_views / self.total_posts.max(1)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize stats")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write stats file: {}", path.display()))?;
        Ok(())
    }
}
