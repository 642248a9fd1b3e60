use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ChannelHandle, Post, PostId, PostSource};
use crate::error::SourceError;

/// In-memory post source.
///
/// Serves its posts in the order given (it does not sort) and counts what
/// was requested, so callers can observe pagination behaviour.
#[derive(Debug, Default)]
pub struct MemorySource {
    posts: Vec<Post>,
    fail_after_pages: Option<usize>,
    pages_served: AtomicUsize,
    posts_served: AtomicUsize,
}

impl MemorySource {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            ..Self::default()
        }
    }

    /// Fail with a transport error once `pages` pages have been served.
    pub fn failing_after(mut self, pages: usize) -> Self {
        self.fail_after_pages = Some(pages);
        self
    }

    pub fn pages_served(&self) -> usize {
        self.pages_served.load(Ordering::SeqCst)
    }

    pub fn posts_served(&self) -> usize {
        self.posts_served.load(Ordering::SeqCst)
    }
}

impl PostSource for MemorySource {
    async fn fetch_page(
        &self,
        _channel: &ChannelHandle,
        after: Option<PostId>,
        limit: usize,
    ) -> Result<Vec<Post>, SourceError> {
        if let Some(max_pages) = self.fail_after_pages {
            if self.pages_served() >= max_pages {
                return Err(SourceError::Transport("connection reset".to_string()));
            }
        }

        let start = match after {
            None => 0,
            Some(cursor) => self
                .posts
                .iter()
                .position(|p| p.id == cursor)
                .map_or(self.posts.len(), |index| index + 1),
        };
        let page: Vec<Post> = self.posts.iter().skip(start).take(limit).cloned().collect();

        self.pages_served.fetch_add(1, Ordering::SeqCst);
        self.posts_served.fetch_add(page.len(), Ordering::SeqCst);
        Ok(page)
    }
}
