/// Progress reporting for channel scans.
///
/// Animated spinner on a TTY, silent otherwise.
use chrono::{DateTime, FixedOffset, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

use crate::timefmt::{format_local, to_local};

/// Called with (posts_scanned, oldest_seen) after every accepted post.
pub type ProgressCallback = Box<dyn FnMut(u64, DateTime<Utc>) + Send>;

/// Spinner line for a single channel scan.
pub struct ScanProgress {
    spinner: Option<ProgressBar>,
    label: String,
    offset: FixedOffset,
}

impl ScanProgress {
    pub fn new(label: impl Into<String>, offset: FixedOffset) -> Self {
        let label = label.into();
        let spinner = if std::io::stderr().is_terminal() {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg}")
                .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
            {
                pb.set_style(style);
            }
            pb.set_message(label.clone());
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };

        Self {
            spinner,
            label,
            offset,
        }
    }

    /// Callback that updates the spinner message; no-op without a TTY.
    pub fn callback(&self) -> ProgressCallback {
        match self.spinner.clone() {
            Some(pb) => {
                let label = self.label.clone();
                let offset = self.offset;
                Box::new(move |posts, oldest| {
                    pb.set_message(format_scan_line(&label, posts, oldest, offset));
                })
            }
            None => Box::new(|_, _| {}),
        }
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.spinner {
            pb.finish_and_clear();
        }
    }
}

/// `@channel    42 posts back to 2025-03-10 14:05`
pub fn format_scan_line(
    label: &str,
    posts: u64,
    oldest: DateTime<Utc>,
    offset: FixedOffset,
) -> String {
    format!(
        "{} {:>5} posts back to {}",
        label,
        posts,
        format_local(&to_local(oldest, &offset))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_progress_creation() {
        let progress = ScanProgress::new("@test", FixedOffset::east_opt(0).unwrap());
        assert_eq!(progress.spinner.is_some(), std::io::stderr().is_terminal());
        let mut cb = progress.callback();
        cb(1, Utc::now());
        progress.finish();
    }

    #[test]
    fn test_format_scan_line_uses_local_time() {
        let offset = FixedOffset::east_opt(3 * 3600 + 30 * 60).unwrap();
        let oldest = Utc.with_ymd_and_hms(2025, 3, 10, 10, 35, 0).unwrap();
        let line = format_scan_line("@test", 42, oldest, offset);
        assert_eq!(line, "@test    42 posts back to 2025-03-10 14:05");
    }
}
