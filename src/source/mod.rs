/// Channel posts and the collaborators that supply them.
///
/// Adapters map their native records into [`Post`] once, at the boundary,
/// including media classification into a closed [`MediaKind`]. The scan never
/// inspects free-form discriminants.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::error::{ResolveError, SourceError};

pub mod archive;
pub mod memory;
pub mod reference;

pub use archive::ArchiveStore;
pub use memory::MemorySource;

/// Identity of a post inside its channel; also the pagination cursor.
pub type PostId = i64;

/// Stable handle of a resolved channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandle {
    /// Canonical username: lowercase, no leading `@`.
    pub username: String,
    pub title: Option<String>,
}

impl ChannelHandle {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            title: None,
        }
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.username)
    }
}

/// Media category of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Audio,
    Other,
}

impl MediaKind {
    /// Fixed rendering and storage order.
    pub const ALL: [MediaKind; 5] = [
        MediaKind::Photo,
        MediaKind::Video,
        MediaKind::Document,
        MediaKind::Audio,
        MediaKind::Other,
    ];

    /// Classify a free-form media discriminant (e.g. `MessageMediaPhoto`).
    ///
    /// Case-insensitive keyword test; the first of photo, video, document,
    /// audio that occurs wins. Unmatched or absent discriminants are `Other`.
    pub fn classify(discriminant: Option<&str>) -> Self {
        let Some(raw) = discriminant else {
            return MediaKind::Other;
        };
        let lowered = raw.to_lowercase();
        [
            ("photo", MediaKind::Photo),
            ("video", MediaKind::Video),
            ("document", MediaKind::Document),
            ("audio", MediaKind::Audio),
        ]
        .into_iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map_or(MediaKind::Other, |(_, kind)| kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
            MediaKind::Other => "other",
        }
    }
}

/// A channel post as the scan sees it. Absent counters count as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub forwards: Option<u64>,
    #[serde(default)]
    pub replies: Option<u64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media: Option<MediaKind>,
}

impl Post {
    pub fn new(id: PostId, date: DateTime<Utc>) -> Self {
        Self {
            id,
            date,
            views: None,
            forwards: None,
            replies: None,
            text: None,
            media: None,
        }
    }

    /// Text body, if present and non-empty.
    pub fn text_body(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

/// Maps a free-text channel reference to a channel.
pub trait ChannelResolver {
    fn resolve(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<ChannelHandle, ResolveError>>;
}

/// Newest-first, paginated post feed.
///
/// `fetch_page` returns at most `limit` posts that come strictly after the
/// `after` cursor in newest-first order (from the newest post when `after` is
/// `None`). An empty page means the feed is exhausted. Implementations must
/// honour the ordering: the scan stops at the first post older than its
/// cutoff and never looks further.
pub trait PostSource {
    fn fetch_page(
        &self,
        channel: &ChannelHandle,
        after: Option<PostId>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Post>, SourceError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_media() {
        assert_eq!(MediaKind::classify(Some("MessageMediaPhoto")), MediaKind::Photo);
        assert_eq!(MediaKind::classify(Some("VIDEO_FILE")), MediaKind::Video);
        assert_eq!(
            MediaKind::classify(Some("MessageMediaDocument")),
            MediaKind::Document
        );
        assert_eq!(MediaKind::classify(Some("audio_file")), MediaKind::Audio);
        assert_eq!(MediaKind::classify(Some("MessageMediaPoll")), MediaKind::Other);
        assert_eq!(MediaKind::classify(None), MediaKind::Other);
    }

    #[test]
    fn test_classify_first_match_wins() {
        // "photo" is tested before "video"
        assert_eq!(MediaKind::classify(Some("video_photo")), MediaKind::Photo);
        assert_eq!(MediaKind::classify(Some("audio_document")), MediaKind::Document);
    }

    #[test]
    fn test_empty_text_is_no_text() {
        let mut post = Post::new(1, Utc::now());
        assert!(post.text_body().is_none());
        post.text = Some(String::new());
        assert!(post.text_body().is_none());
        post.text = Some("hello".to_string());
        assert_eq!(post.text_body(), Some("hello"));
    }
}
