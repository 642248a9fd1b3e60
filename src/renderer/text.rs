use std::cmp::Reverse;

use crate::stats::RunningStats;
use crate::timefmt::format_local;

/// Number of hours listed under "Active hours".
pub const TOP_HOURS: usize = 5;

/// Report text for a scan that saw no posts.
pub const NO_CONTENT: &str = "No content to analyze.";

/// Render stats as a plain-text report. Pure: same stats, same bytes.
pub fn format_report(stats: &RunningStats) -> String {
    let mut output = String::new();

    render_header(&mut output, stats);

    if stats.total_posts == 0 {
        output.push_str(NO_CONTENT);
        output.push('\n');
        return output;
    }

    // 1. Overview
    render_overview(&mut output, stats);

    // 2. Content performance, media breakdown included
    render_content(&mut output, stats);

    // 3. Active hours
    render_active_hours(&mut output, stats);

    // 4. Content analysis
    output.push_str("Content analysis:\n");
    output.push_str(stats.content_analysis.trim_end());
    output.push('\n');

    // 5. Samples
    render_samples(&mut output, stats);

    output
}

fn render_header(output: &mut String, stats: &RunningStats) {
    let days = stats.window_days;
    output.push_str(&format!(
        "Channel statistics - last {} day{}\n\n",
        days,
        if days == 1 { "" } else { "s" }
    ));
}

fn render_overview(output: &mut String, stats: &RunningStats) {
    output.push_str("Overview:\n");
    output.push_str(&format!("- Posts: {}\n", format_number(stats.total_posts)));
    output.push_str(&format!(
        "- Average views: {}\n",
        format_number(stats.mean_views())
    ));
    // Interaction density on its historical scale, see RunningStats::engagement_rate
    output.push_str(&format!("- Engagement rate: {:.1}%\n", stats.engagement_rate));
    output.push_str(&format!(
        "- Forwards: {}\n",
        format_number(stats.total_forwards)
    ));
    output.push_str(&format!("- Replies: {}\n", format_number(stats.total_replies)));
    output.push('\n');
}

fn render_content(output: &mut String, stats: &RunningStats) {
    output.push_str("Content performance:\n");
    output.push_str(&format!(
        "- Media posts: {}\n",
        format_number(stats.media_count)
    ));
    output.push_str(&format!(
        "- Average posts per day: {:.1}\n",
        stats.post_frequency
    ));
    output.push('\n');

    if stats.media_count == 0 {
        return;
    }

    output.push_str("Media breakdown:\n");
    for (kind, count) in stats.media_kind_counts.iter().filter(|(_, c)| *c > 0) {
        output.push_str(&format!(
            "- {}: {} ({:.1}%)\n",
            kind.as_str(),
            format_number(count),
            percentage(count, stats.media_count)
        ));
    }
    output.push('\n');
}

fn render_active_hours(output: &mut String, stats: &RunningStats) {
    output.push_str("Active hours:\n");
    for (hour, count) in top_hours(stats) {
        output.push_str(&format!(
            "- {:02}:00 - {} posts ({:.1}%)\n",
            hour,
            format_number(count),
            percentage(count, stats.total_posts)
        ));
    }
    output.push('\n');
}

/// Busiest hours, count descending then hour ascending.
pub fn top_hours(stats: &RunningStats) -> Vec<(u8, u64)> {
    let mut hours: Vec<(u8, u64)> = stats
        .hourly_activity
        .iter()
        .map(|(hour, count)| (*hour, *count))
        .collect();
    hours.sort_by_key(|(hour, count)| (Reverse(*count), *hour));
    hours.truncate(TOP_HOURS);
    hours
}

fn render_samples(output: &mut String, stats: &RunningStats) {
    if stats.samples.is_empty() {
        return;
    }

    output.push_str("\nRecent posts:\n");
    for (idx, sample) in stats.samples.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", idx + 1, sample.text));
        output.push_str(&format!(
            "   views: {} | forwards: {} | {} | media: {}\n",
            format_number(sample.views),
            format_number(sample.forwards),
            format_local(&sample.date),
            if sample.has_media { "yes" } else { "no" }
        ));
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    part as f64 * 100.0 / whole.max(1) as f64
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped_rev = String::new();

    for (count, ch) in digits.chars().rev().enumerate() {
        if count > 0 && count.is_multiple_of(3) {
            grouped_rev.push(',');
        }
        grouped_rev.push(ch);
    }

    grouped_rev.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MediaKind;
    use crate::stats::Sample;
    use chrono::{FixedOffset, TimeZone};

    fn populated() -> RunningStats {
        let mut stats = RunningStats::new(7);
        stats.total_posts = 10;
        stats.total_views = 12_345;
        stats.total_forwards = 40;
        stats.total_replies = 15;
        stats.media_count = 4;
        stats.media_kind_counts.increment(MediaKind::Photo);
        stats.media_kind_counts.increment(MediaKind::Photo);
        stats.media_kind_counts.increment(MediaKind::Photo);
        stats.media_kind_counts.increment(MediaKind::Audio);
        for (hour, count) in [(9, 2), (10, 3), (11, 2), (14, 1), (20, 1), (22, 1)] {
            stats.hourly_activity.insert(hour, count);
        }
        stats.content_analysis = "Mostly release notes.".to_string();
        stats.samples.push(Sample {
            text: "Rust 1.80 is out".to_string(),
            views: 1_500,
            forwards: 7,
            date: FixedOffset::east_opt(12_600)
                .unwrap()
                .with_ymd_and_hms(2025, 3, 10, 14, 5, 0)
                .unwrap(),
            has_media: true,
        });
        stats.compute_derived();
        stats
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_empty_report() {
        let report = format_report(&RunningStats::new(7));
        assert!(report.starts_with("Channel statistics - last 7 days"));
        assert!(report.contains(NO_CONTENT));
        assert!(!report.contains("Active hours"));
    }

    #[test]
    fn test_sections_in_order() {
        let report = format_report(&populated());
        let order = [
            "Overview:",
            "Content performance:",
            "Media breakdown:",
            "Active hours:",
            "Content analysis:",
            "Recent posts:",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|heading| report.find(heading).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_overview_values() {
        let report = format_report(&populated());
        assert!(report.contains("- Posts: 10\n"));
        assert!(report.contains("- Average views: 1,234\n"));
        // (12345 + 40 + 15) / (10 * 100) = 12.4
        assert!(report.contains("- Engagement rate: 12.4%\n"));
        assert!(report.contains("- Average posts per day: 1.4\n"));
    }

    #[test]
    fn test_media_breakdown_skips_zero_kinds() {
        let report = format_report(&populated());
        assert!(report.contains("- photo: 3 (75.0%)\n"));
        assert!(report.contains("- audio: 1 (25.0%)\n"));
        assert!(!report.contains("- video:"));
    }

    #[test]
    fn test_no_media_section_without_media() {
        let mut stats = populated();
        stats.media_count = 0;
        stats.media_kind_counts = Default::default();
        assert!(!format_report(&stats).contains("Media breakdown:"));
    }

    #[test]
    fn test_top_hours_ties_by_hour() {
        let hours = top_hours(&populated());
        assert_eq!(hours, vec![(10, 3), (9, 2), (11, 2), (14, 1), (20, 1)]);
        let report = format_report(&populated());
        assert!(report.contains("- 10:00 - 3 posts (30.0%)\n"));
        assert!(!report.contains("22:00"));
    }

    #[test]
    fn test_samples_rendered() {
        let report = format_report(&populated());
        assert!(report.contains("1. Rust 1.80 is out\n"));
        assert!(report.contains("views: 1,500 | forwards: 7 | 2025-03-10 14:05 | media: yes"));
    }

    #[test]
    fn test_deterministic() {
        let stats = populated();
        assert_eq!(format_report(&stats), format_report(&stats));
    }
}
