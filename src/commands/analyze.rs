/// `chanstat analyze`: resolve a channel, scan it, print the report.
///
/// Quota is checked before any network or archive access and only spent
/// after a successful scan.
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use tracing::{error, info};

use crate::clock::Clock;
use crate::config::{resolve_data_root, Config, Overrides};
use crate::error::{AnalysisError, FailureKind};
use crate::logging::{init_logging, SessionKind};
use crate::quota_db::{referral_code, Access, QuotaDb};
use crate::renderer::text::format_report;
use crate::scan::progress::ScanProgress;
use crate::scan::scan_with_progress;
use crate::source::{ArchiveStore, ChannelHandle, ChannelResolver, PostSource};
use crate::stats::RunningStats;
use crate::summarizer::Summarizer;
use crate::window::AnalysisWindow;

/// Options of one `analyze` invocation.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    pub channel: String,
    pub config: Option<PathBuf>,
    pub overrides: Overrides,
    pub user: Option<i64>,
    pub json: Option<PathBuf>,
}

pub async fn run(args: AnalyzeArgs) -> Result<()> {
    let data_root = resolve_data_root();
    let mut config = Config::discover(args.config.as_deref(), &data_root)?;
    config.apply(args.overrides.clone());

    init_logging(
        &data_root,
        &config.logging,
        SessionKind::Analyze,
        &args.channel,
    )?;

    let window = config.analysis_window()?;
    let clock = config.clock()?;
    let summarizer = config.summarizer()?;

    let quota = match args.user {
        Some(user_id) => {
            let db = QuotaDb::init(&data_root, &config.quota)
                .context("Failed to open quota database")?;
            let access = db.check_access(user_id, clock.now())?;
            if !access.allowed() {
                info!(user_id, "Analysis refused, quota exhausted");
                println!(
                    "No analyses remaining. Share your referral code {} or ask for premium access.",
                    referral_code(user_id)
                );
                return Ok(());
            }
            Some((db, user_id, access))
        }
        None => None,
    };

    let store = ArchiveStore::new(config.archive_dir(&data_root));
    let (channel, stats) = match scan_reference(
        &store,
        &store,
        &summarizer,
        &args.channel,
        &window,
        &clock,
    )
    .await
    {
        Ok(found) => found,
        Err(e) => {
            error!(reference = %args.channel, error = %e, "Analysis failed");
            return Err(anyhow!(failure_message(&e)));
        }
    };

    let remaining = match quota {
        Some((db, user_id, Access::Free { .. })) => Some(db.consume_analysis(user_id)?),
        _ => None,
    };

    if let Some(ref path) = args.json {
        stats.save_to_file(path)?;
        eprintln!("Stats JSON written to: {}", path.display());
    }

    match channel.title {
        Some(ref title) => println!("{} ({})", title, channel),
        None => println!("{}", channel),
    }
    print!("{}", format_report(&stats));
    if let Some(remaining) = remaining {
        println!("\nRemaining analyses: {}", remaining);
    }

    Ok(())
}

/// Resolve and scan with a progress spinner.
async fn scan_reference<R, P, S, C>(
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

    let progress = ScanProgress::new(channel.to_string(), clock.offset());
    let on_progress = progress.callback();
    let result =
        scan_with_progress(source, summarizer, &channel, window, clock, on_progress).await;
    progress.finish();

    Ok((channel, result?))
}

/// User-facing text per failure kind.
pub fn failure_message(err: &AnalysisError) -> String {
    match err.kind() {
        FailureKind::Resolution => format!(
            "Channel not found or not accessible ({}). Check the link and make sure the channel is public.",
            err
        ),
        FailureKind::Source => format!("Analysis failed ({}). Please try again later.", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ResolveError, SourceError};

    #[test]
    fn test_failure_message_by_kind() {
        let resolution = AnalysisError::from(ResolveError::NotFound("ghost".to_string()));
        assert!(failure_message(&resolution).starts_with("Channel not found"));

        let source = AnalysisError::from(SourceError::Transport("timeout".to_string()));
        assert!(failure_message(&source).starts_with("Analysis failed"));
    }
}
