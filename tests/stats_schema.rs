use chanstat::clock::{Clock, FixedClock};
use chanstat::scan::scan;
use chanstat::source::{ChannelHandle, MediaKind, MemorySource, Post};
use chanstat::stats::RunningStats;
use chanstat::summarizer::DisabledSummarizer;
use chanstat::window::AnalysisWindow;
use chrono::{Duration, FixedOffset, TimeZone, Utc};
use jsonschema::{Draft, JSONSchema};
use std::path::Path;

fn load_schema() -> anyhow::Result<JSONSchema> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("stats_schema.json");
    let content = std::fs::read_to_string(&path)?;
    let schema_json: serde_json::Value = serde_json::from_str(&content)?;
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema_json)
        .map_err(|e| anyhow::anyhow!("Failed to compile JSON schema: {}", e))
}

fn assert_valid(schema: &JSONSchema, stats: &RunningStats) -> anyhow::Result<()> {
    let value = serde_json::to_value(stats)?;
    if let Err(errors) = schema.validate(&value) {
        let messages: Vec<String> = errors
            .map(|e| format!("  - {}: {}", e.instance_path, e))
            .collect();
        anyhow::bail!("Stats validation failed:\n{}", messages.join("\n"));
    }
    Ok(())
}

#[tokio::test]
async fn scanned_stats_match_schema() -> anyhow::Result<()> {
    let schema = load_schema()?;
    let clock = FixedClock::new(
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
        FixedOffset::east_opt(3 * 3600 + 30 * 60).unwrap(),
    );
    let posts: Vec<Post> = (0..12)
        .map(|i| {
            let mut post = Post::new(100 - i, clock.now() - Duration::hours(i * 7));
            post.views = Some(10 * i as u64);
            if i % 2 == 0 {
                post.text = Some("x".repeat(250));
            }
            if i % 3 == 0 {
                post.media = Some(MediaKind::Photo);
            }
            post
        })
        .collect();
    let source = MemorySource::new(posts);
    let window = AnalysisWindow::new(100, 7)?;

    let stats = scan(
        &source,
        &DisabledSummarizer,
        &ChannelHandle::new("schema"),
        &window,
        &clock,
    )
    .await?;

    assert_eq!(stats.total_posts, 12);
    assert_valid(&schema, &stats)?;
    Ok(())
}

#[test]
fn empty_stats_match_schema() -> anyhow::Result<()> {
    let schema = load_schema()?;
    assert_valid(&schema, &RunningStats::new(7))
}

#[test]
fn schema_rejects_bad_hour_key() -> anyhow::Result<()> {
    let schema = load_schema()?;
    let mut value = serde_json::to_value(RunningStats::new(7))?;
    value["hourly_activity"] = serde_json::json!({"24": 1});
    assert!(!schema.is_valid(&value));
    Ok(())
}
