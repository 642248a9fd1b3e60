/// File-backed channel archive.
///
/// Each channel is one JSON document at `<root>/<username>.json` holding the
/// channel header and its posts as exported from the messaging platform:
///
/// ```json
/// {"channel": {"username": "rustlang", "title": "Rust", "kind": "channel"},
///  "posts": [{"id": 7, "date": "2025-03-10T09:00:00Z", "views": 120,
///             "forwards": 3, "replies": {"replies": 2}, "text": "...",
///             "media": {"type": "MessageMediaPhoto"}}]}
/// ```
///
/// The store is both the channel resolver and the post source. Posts are
/// served newest-first regardless of their order in the file.
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::reference::normalize_reference;
use super::{ChannelHandle, ChannelResolver, MediaKind, Post, PostId, PostSource};
use crate::error::{ResolveError, SourceError};

#[derive(Debug, Deserialize)]
struct ArchiveFile {
    channel: ArchiveChannel,
    #[serde(default)]
    posts: Vec<ArchivePost>,
}

#[derive(Debug, Deserialize)]
struct ArchiveHeader {
    channel: ArchiveChannel,
}

#[derive(Debug, Deserialize)]
struct ArchiveChannel {
    #[serde(default)]
    title: Option<String>,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    restricted: bool,
}

fn default_kind() -> String {
    "channel".to_string()
}

#[derive(Debug, Deserialize)]
struct ArchivePost {
    id: PostId,
    date: DateTime<Utc>,
    #[serde(default)]
    views: Option<u64>,
    #[serde(default)]
    forwards: Option<u64>,
    #[serde(default)]
    replies: Option<ArchiveReplies>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    media: Option<ArchiveMedia>,
}

#[derive(Debug, Deserialize)]
struct ArchiveReplies {
    #[serde(default)]
    replies: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ArchiveMedia {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl From<ArchivePost> for Post {
    fn from(raw: ArchivePost) -> Self {
        Post {
            id: raw.id,
            date: raw.date,
            views: raw.views,
            forwards: raw.forwards,
            replies: raw.replies.and_then(|r| r.replies),
            text: raw.text,
            media: raw
                .media
                .map(|media| MediaKind::classify(media.kind.as_deref())),
        }
    }
}

/// Directory of channel archives.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn channel_path(&self, username: &str) -> PathBuf {
        self.root.join(format!("{}.json", username))
    }

    /// All posts of a channel, newest first.
    async fn load_posts(&self, channel: &ChannelHandle) -> Result<Vec<Post>, SourceError> {
        let path = self.channel_path(&channel.username);
        let content = tokio::fs::read(&path).await.map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        let archive: ArchiveFile =
            serde_json::from_slice(&content).map_err(|source| SourceError::Malformed {
                path: path.clone(),
                source,
            })?;

        let mut posts: Vec<Post> = archive.posts.into_iter().map(Post::from).collect();
        posts.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(posts)
    }
}

impl ChannelResolver for ArchiveStore {
    async fn resolve(&self, reference: &str) -> Result<ChannelHandle, ResolveError> {
        let username = normalize_reference(reference)?;
        let path = self.channel_path(&username);

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ResolveError::NotFound(username));
            }
            Err(err) if err.kind() == ErrorKind::PermissionDenied => {
                return Err(ResolveError::AccessDenied(username));
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Archive unreadable");
                return Err(ResolveError::AccessDenied(username));
            }
        };

        let header: ArchiveHeader = match serde_json::from_slice(&content) {
            Ok(header) => header,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Archive header unreadable");
                return Err(ResolveError::Unreadable(username));
            }
        };

        if !header.channel.kind.eq_ignore_ascii_case("channel") {
            return Err(ResolveError::NotAChannel(username));
        }
        if header.channel.restricted {
            return Err(ResolveError::AccessDenied(username));
        }

        Ok(ChannelHandle {
            username,
            title: header.channel.title,
        })
    }
}

impl PostSource for ArchiveStore {
    async fn fetch_page(
        &self,
        channel: &ChannelHandle,
        after: Option<PostId>,
        limit: usize,
    ) -> Result<Vec<Post>, SourceError> {
        let posts = self.load_posts(channel).await?;
        let start = match after {
            None => 0,
            Some(cursor) => match posts.iter().position(|p| p.id == cursor) {
                Some(index) => index + 1,
                None => {
                    return Err(SourceError::Transport(format!(
                        "cursor post {} no longer present in @{}",
                        cursor, channel.username
                    )))
                }
            },
        };

        Ok(posts.into_iter().skip(start).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn write_archive(dir: &Path, name: &str, body: &str) -> anyhow::Result<()> {
        std::fs::write(dir.join(format!("{}.json", name)), body)?;
        Ok(())
    }

    const SAMPLE: &str = r#"{
        "channel": {"username": "rustlang", "title": "Rust", "kind": "channel"},
        "posts": [
            {"id": 1, "date": "2025-03-08T10:00:00Z", "text": "oldest"},
            {"id": 3, "date": "2025-03-10T10:00:00Z", "views": 50,
             "replies": {"replies": 4}, "media": {"type": "MessageMediaPhoto"}},
            {"id": 2, "date": "2025-03-09T10:00:00Z", "forwards": 2,
             "replies": {}, "media": {}}
        ]
    }"#;

    #[tokio::test]
    async fn test_resolve_and_page_newest_first() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        write_archive(tmp.path(), "rustlang", SAMPLE)?;
        let store = ArchiveStore::new(tmp.path());

        let channel = store.resolve("https://t.me/RustLang").await?;
        assert_eq!(channel.username, "rustlang");
        assert_eq!(channel.title.as_deref(), Some("Rust"));

        let first = store.fetch_page(&channel, None, 2).await?;
        assert_eq!(first.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(first[0].replies, Some(4));
        assert_eq!(first[0].media, Some(MediaKind::Photo));
        assert_eq!(first[1].replies, None);
        assert_eq!(first[1].media, Some(MediaKind::Other));
        assert_eq!(
            first[0].date,
            Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap()
        );

        let second = store.fetch_page(&channel, Some(2), 2).await?;
        assert_eq!(second.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);

        let done = store.fetch_page(&channel, Some(1), 2).await?;
        assert!(done.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_failures() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        write_archive(
            tmp.path(),
            "somegroup",
            r#"{"channel": {"username": "somegroup", "kind": "supergroup"}, "posts": []}"#,
        )?;
        write_archive(
            tmp.path(),
            "private",
            r#"{"channel": {"username": "private", "restricted": true}}"#,
        )?;
        let store = ArchiveStore::new(tmp.path());

        assert!(matches!(
            store.resolve("@missing").await,
            Err(ResolveError::NotFound(_))
        ));
        assert!(matches!(
            store.resolve("somegroup").await,
            Err(ResolveError::NotAChannel(_))
        ));
        assert!(matches!(
            store.resolve("private").await,
            Err(ResolveError::AccessDenied(_))
        ));
        assert!(matches!(
            store.resolve("https://example.com/x").await,
            Err(ResolveError::InvalidReference(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_header_is_not_reported_missing() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        write_archive(tmp.path(), "garbled", "{\"channel\": ")?;
        let store = ArchiveStore::new(tmp.path());

        let err = store.resolve("@garbled").await.unwrap_err();
        assert!(matches!(err, ResolveError::Unreadable(ref name) if name == "garbled"));
        assert_eq!(err.to_string(), "archive for @garbled is unreadable");
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_archive_is_source_error() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        write_archive(
            tmp.path(),
            "broken",
            r#"{"channel": {"username": "broken"}, "posts": [{"id": "x"}]}"#,
        )?;
        let store = ArchiveStore::new(tmp.path());
        let channel = store.resolve("broken").await?;
        let result = store.fetch_page(&channel, None, 10).await;
        assert!(matches!(result, Err(SourceError::Malformed { .. })));
        Ok(())
    }
}
