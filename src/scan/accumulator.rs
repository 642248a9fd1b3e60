/// Per-post accumulation into [`RunningStats`].
use chrono::{FixedOffset, Timelike};

use super::daily::DayCursor;
use crate::source::Post;
use crate::stats::{RunningStats, Sample, SAMPLE_LIMIT};
use crate::timefmt::to_local;

/// Owns the stats of one scan until [`StatsAccumulator::finish`].
pub struct StatsAccumulator {
    stats: RunningStats,
    day: DayCursor,
    offset: FixedOffset,
}

impl StatsAccumulator {
    pub fn new(window_days: u32, offset: FixedOffset) -> Self {
        Self {
            stats: RunningStats::new(window_days),
            day: DayCursor::new(),
            offset,
        }
    }

    pub fn posts_seen(&self) -> u64 {
        self.stats.total_posts
    }

    /// Fold one in-window post into the totals and buckets.
    pub fn record(&mut self, post: &Post) {
        // Normalise before any bucketing so local midnight decides the day
        let local = to_local(post.date, &self.offset);
        let stats = &mut self.stats;

        self.day.observe(local.date_naive(), &mut stats.daily_activity);

        let views = post.views.unwrap_or(0);
        let forwards = post.forwards.unwrap_or(0);
        stats.total_posts += 1;
        stats.total_views += views;
        stats.total_forwards += forwards;
        stats.total_replies += post.replies.unwrap_or(0);

        // hour() is always < 24
        *stats.hourly_activity.entry(local.hour() as u8).or_insert(0) += 1;

        if let Some(kind) = post.media {
            stats.media_count += 1;
            stats.media_kind_counts.increment(kind);
        }

        if let Some(text) = post.text_body() {
            if stats.samples.len() < SAMPLE_LIMIT {
                stats.samples.push(Sample {
                    text: Sample::excerpt(text),
                    views,
                    forwards,
                    date: local,
                    has_media: post.media.is_some(),
                });
            }
            stats.collected_texts.push(text.to_string());
        }
    }

    /// Flush the pending day and hand over the stats, derived metrics included.
    pub fn finish(self) -> RunningStats {
        let Self { mut stats, day, .. } = self;
        day.finish(&mut stats.daily_activity);
        stats.compute_derived();
        stats
    }
}
