/// Channel scan: one backward pass over a channel's recent posts.
///
/// The scan walks the post source newest-first, stops at the first post older
/// than the window cutoff, and folds every accepted post into a fresh
/// [`RunningStats`]. It only reads; abandoning the future at any await point
/// leaves nothing behind.
pub mod accumulator;
pub mod daily;
pub mod pagination;
pub mod progress;

use chrono::{DateTime, Utc};
use futures_util::{pin_mut, TryStreamExt};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::AnalysisError;
use crate::source::{ChannelHandle, ChannelResolver, PostSource};
use crate::stats::RunningStats;
use crate::summarizer::{Summarizer, NO_TEXT_CONTENT, SUMMARY_TEXT_LIMIT, SUMMARY_UNAVAILABLE};
use crate::window::AnalysisWindow;

use accumulator::StatsAccumulator;
use pagination::post_stream;

/// Scan `channel` within `window` and summarize its content.
pub async fn scan<P, S, C>(
    source: &P,
    summarizer: &S,
    channel: &ChannelHandle,
    window: &AnalysisWindow,
    clock: &C,
) -> Result<RunningStats, AnalysisError>
where
    P: PostSource,
    S: Summarizer,
    C: Clock,
{
    scan_with_progress(source, summarizer, channel, window, clock, |_, _| {}).await
}

/// Like [`scan`], calling `on_progress(posts_scanned, oldest_seen)` after
/// every accepted post.
pub async fn scan_with_progress<P, S, C, F>(
    source: &P,
    summarizer: &S,
    channel: &ChannelHandle,
    window: &AnalysisWindow,
    clock: &C,
    mut on_progress: F,
) -> Result<RunningStats, AnalysisError>
where
    P: PostSource,
    S: Summarizer,
    C: Clock,
    F: FnMut(u64, DateTime<Utc>),
{
    let cutoff = window.cutoff(clock.now());
    let mut acc = StatsAccumulator::new(window.window_days(), clock.offset());

    info!(
        channel = %channel,
        max_messages = window.max_messages(),
        window_days = window.window_days(),
        "Scanning channel"
    );

    {
        let posts = post_stream(source, channel, window.max_messages());
        pin_mut!(posts);

        while let Some(post) = posts.try_next().await? {
            if !window.contains(cutoff, post.date) {
                debug!(post_id = post.id, date = %post.date, "Reached window cutoff");
                break;
            }
            acc.record(&post);
            on_progress(acc.posts_seen(), post.date);
        }
    }

    let mut stats = acc.finish();
    if stats.is_empty() {
        info!(channel = %channel, "No posts inside the analysis window");
        return Ok(stats);
    }

    stats.content_analysis = content_analysis(summarizer, &stats.collected_texts).await;

    info!(
        channel = %channel,
        posts = stats.total_posts,
        views = stats.total_views,
        media = stats.media_count,
        "Scan complete"
    );
    Ok(stats)
}

/// Resolve `reference`, then [`scan`] the resulting channel.
pub async fn analyze_channel<R, P, S, C>(
    resolver: &R,
    source: &P,
    summarizer: &S,
    reference: &str,
    window: &AnalysisWindow,
    clock: &C,
) -> Result<(ChannelHandle, RunningStats), AnalysisError>
where
    R: ChannelResolver,
    P: PostSource,
    S: Summarizer,
    C: Clock,
{
    let channel = resolver.resolve(reference).await?;
    let stats = scan(source, summarizer, &channel, window, clock).await?;
    Ok((channel, stats))
}

// Summarizer failures stop here.
async fn content_analysis<S: Summarizer>(summarizer: &S, texts: &[String]) -> String {
    if texts.is_empty() {
        return NO_TEXT_CONTENT.to_string();
    }
    let batch = &texts[..texts.len().min(SUMMARY_TEXT_LIMIT)];
    match summarizer.summarize(batch).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "Content analysis failed, using fallback");
            SUMMARY_UNAVAILABLE.to_string()
        }
    }
}
