use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use chanstat::commands::analyze::{self, AnalyzeArgs};
use chanstat::commands::quota::{self, QuotaAction};
use chanstat::config::Overrides;

// Help text constants
const HELP_MAIN: &str = "\
chanstat - channel statistics over a recent window

Commands:
    analyze <CHANNEL>    Scan a channel and print its statistics report.
    quota <ACTION>       Manage per-user analysis allowances.

Usage:
    chanstat analyze <CHANNEL> [options]
    chanstat quota register|show|grant|revoke|list [options]

More help:
    chanstat --help analyze
    chanstat --help quota";

const HELP_ANALYZE: &str = "\
Scan a channel and print its statistics report

Usage:
    chanstat analyze <CHANNEL> [options]

CHANNEL may be a bare name, @name, t.me/name or https://t.me/name.

Options:
    --archive <dir>        Channel archive directory (default: <data>/archive).
    --config <path>        Config file (default: <data>/config.toml if present).
    --window-days <n>      Days back from now to include (default: 7).
    --max-messages <n>     Maximum posts scanned (default: 100).
    --utc-offset <+HH:MM>  Local offset for hour and day buckets (default: +03:30).
    --user <id>            Charge the analysis to this user's quota.
    --json <path>          Also write the stats as JSON.

The data directory is $CHANSTAT_DATA_DIR, or .chanstat when unset.

Examples:
  chanstat analyze @rustlang
  chanstat analyze https://t.me/rustlang --window-days 30 --json stats.json";

const HELP_QUOTA: &str = "\
Manage per-user analysis allowances

Usage:
    chanstat quota register --user <id> [--username <name>] [--referral <code>]
    chanstat quota show --user <id>
    chanstat quota grant --user <id> --days <n>
    chanstat quota revoke --user <id>
    chanstat quota list

New users get 2 free analyses. Each referral (code REF<id>) credits the
referrer with 5 more. Premium users are not charged.";

#[derive(Parser)]
#[command(name = "chanstat", disable_help_flag = true)]
#[command(about = "Channel statistics aggregator", long_about = None)]
struct Cli {
    /// Show help (global or per topic). Example: chanstat --help analyze
    #[arg(long, value_name = "TOPIC", num_args = 0..=1, default_missing_value = "")]
    help: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a channel and print its statistics report
    Analyze(AnalyzeCli),
    /// Manage per-user analysis allowances
    Quota {
        #[command(subcommand)]
        action: QuotaCli,
    },
}

#[derive(Args)]
struct AnalyzeCli {
    /// Channel reference (name, @name or t.me link)
    channel: String,

    #[arg(long)]
    archive: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    window_days: Option<u32>,

    #[arg(long)]
    max_messages: Option<usize>,

    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<String>,

    #[arg(long)]
    user: Option<i64>,

    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Subcommand)]
enum QuotaCli {
    /// Register a user, optionally redeeming a referral code
    Register {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        referral: Option<String>,
    },
    /// Show a user's plan and remaining analyses
    Show {
        #[arg(long)]
        user: i64,
    },
    /// Grant premium for a number of days
    Grant {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        days: u32,
    },
    /// Remove premium and restore the free allowance
    Revoke {
        #[arg(long)]
        user: i64,
    },
    /// List active premium users
    List,
}

impl From<QuotaCli> for QuotaAction {
    fn from(cli: QuotaCli) -> Self {
        match cli {
            QuotaCli::Register {
                user,
                username,
                referral,
            } => QuotaAction::Register {
                user,
                username,
                referral,
            },
            QuotaCli::Show { user } => QuotaAction::Show { user },
            QuotaCli::Grant { user, days } => QuotaAction::Grant { user, days },
            QuotaCli::Revoke { user } => QuotaAction::Revoke { user },
            QuotaCli::List => QuotaAction::List,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(help_topic) = cli.help {
        let topic = help_topic.trim();
        if topic.is_empty() {
            println!("{}", HELP_MAIN);
        } else if topic.eq_ignore_ascii_case("analyze") {
            println!("{}", HELP_ANALYZE);
        } else if topic.eq_ignore_ascii_case("quota") {
            println!("{}", HELP_QUOTA);
        } else {
            println!("Unknown help topic: {}", topic);
        }
        return Ok(());
    }

    match cli.command {
        Some(Commands::Analyze(args)) => {
            let args = AnalyzeArgs {
                channel: args.channel,
                config: args.config,
                overrides: Overrides {
                    window_days: args.window_days,
                    max_messages: args.max_messages,
                    utc_offset: args.utc_offset,
                    archive: args.archive,
                },
                user: args.user,
                json: args.json,
            };
            tokio::runtime::Runtime::new()
                .context("Failed to create Tokio runtime")?
                .block_on(analyze::run(args))
        }
        Some(Commands::Quota { action }) => quota::run(action.into()),
        None => {
            eprintln!("No action specified.");
            eprintln!("Example: chanstat analyze @rustlang");
            eprintln!("More help: chanstat --help");
            Ok(())
        }
    }
}
