/// Failure taxonomy for channel analysis.
///
/// Resolution and source failures abort an analysis and reach the caller as
/// [`AnalysisError`]. Summarizer failures never leave the scan: they are
/// logged and replaced with a fixed fallback text.
use std::path::PathBuf;
use thiserror::Error;

/// A channel reference could not be mapped to a readable channel.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("'{0}' is not a valid channel reference")]
    InvalidReference(String),
    #[error("channel @{0} not found")]
    NotFound(String),
    #[error("@{0} is not a channel")]
    NotAChannel(String),
    #[error("access to channel @{0} denied")]
    AccessDenied(String),
    #[error("archive for @{0} is unreadable")]
    Unreadable(String),
}

/// The post source failed while paginating.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed channel archive {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("post source transport error: {0}")]
    Transport(String),
}

/// The content summarizer could not produce a summary.
#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("summarizer is not configured")]
    Disabled,
    #[error("summarizer API key variable {0} is not set")]
    MissingApiKey(String),
    #[error("summarizer request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("summarizer returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("summarizer returned no content")]
    EmptyResponse,
}

/// Coarse failure class, for picking user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Resolution,
    Source,
}

/// A fatal analysis failure. Partial statistics are never attached.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Resolution(#[from] ResolveError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl AnalysisError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Resolution(_) => FailureKind::Resolution,
            Self::Source(_) => FailureKind::Source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_distinguishes_failures() {
        let resolution: AnalysisError = ResolveError::NotFound("rust".to_string()).into();
        let source: AnalysisError = SourceError::Transport("reset".to_string()).into();
        assert_eq!(resolution.kind(), FailureKind::Resolution);
        assert_eq!(source.kind(), FailureKind::Source);
        assert_eq!(resolution.to_string(), "channel @rust not found");
    }
}
