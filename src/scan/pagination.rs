/// Backward pagination over a post source.
///
/// Turns page-by-page fetching into a lazy stream of posts. Pages are only
/// requested when the consumer asks for the next post, so a consumer that
/// stops early never triggers another fetch.
use futures_util::stream::{self, Stream, TryStreamExt};

use crate::error::SourceError;
use crate::source::{ChannelHandle, Post, PostId, PostSource};

/// Posts requested per fetch.
pub const PAGE_SIZE: usize = 100;

struct PageState {
    after: Option<PostId>,
    remaining: usize,
    exhausted: bool,
}

/// Stream at most `limit` posts from `source`, newest first.
pub fn post_stream<'a, S>(
    source: &'a S,
    channel: &'a ChannelHandle,
    limit: usize,
) -> impl Stream<Item = Result<Post, SourceError>> + 'a
where
    S: PostSource,
{
    let initial = PageState {
        after: None,
        remaining: limit,
        exhausted: false,
    };

    stream::try_unfold(initial, move |mut state| async move {
        if state.exhausted || state.remaining == 0 {
            return Ok::<_, SourceError>(None);
        }

        let request = state.remaining.min(PAGE_SIZE);
        let mut page = source.fetch_page(channel, state.after, request).await?;
        if page.is_empty() {
            return Ok(None);
        }

        // A source that over-delivers must not push the scan past its cap
        page.truncate(request);
        state.exhausted = page.len() < request;
        state.remaining -= page.len();
        state.after = page.last().map(|post| post.id);

        Ok(Some((stream::iter(page.into_iter().map(Ok::<Post, SourceError>)), state)))
    })
    .try_flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use chrono::{Duration, TimeZone, Utc};
    use futures_util::{pin_mut, TryStreamExt};

    fn posts(n: usize) -> Vec<Post> {
        let newest = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        (0..n)
            .map(|i| Post::new(1_000 - i as i64, newest - Duration::minutes(i as i64)))
            .collect()
    }

    #[tokio::test]
    async fn test_respects_limit_across_pages() -> anyhow::Result<()> {
        let source = MemorySource::new(posts(250));
        let channel = ChannelHandle::new("test");
        let collected: Vec<Post> = post_stream(&source, &channel, 230).try_collect().await?;

        assert_eq!(collected.len(), 230);
        assert_eq!(source.pages_served(), 3);
        assert_eq!(source.posts_served(), 230);
        assert_eq!(collected[0].id, 1_000);
        assert_eq!(collected[229].id, 1_000 - 229);
        Ok(())
    }

    #[tokio::test]
    async fn test_short_page_ends_stream() -> anyhow::Result<()> {
        let source = MemorySource::new(posts(40));
        let channel = ChannelHandle::new("test");
        let collected: Vec<Post> = post_stream(&source, &channel, 100).try_collect().await?;

        assert_eq!(collected.len(), 40);
        assert_eq!(source.pages_served(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_lazy_fetching() -> anyhow::Result<()> {
        let source = MemorySource::new(posts(300));
        let channel = ChannelHandle::new("test");
        let stream = post_stream(&source, &channel, 300);
        pin_mut!(stream);

        assert_eq!(source.pages_served(), 0);
        let first = stream.try_next().await?;
        assert!(first.is_some());
        assert_eq!(source.pages_served(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_source_failure_surfaces() {
        let source = MemorySource::new(posts(250)).failing_after(1);
        let channel = ChannelHandle::new("test");
        let result: Result<Vec<Post>, SourceError> =
            post_stream(&source, &channel, 250).try_collect().await;
        assert!(matches!(result, Err(SourceError::Transport(_))));
    }
}
