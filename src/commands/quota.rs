/// `chanstat quota`: manage per-user analysis allowances.
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};

use crate::config::{resolve_data_root, Config};
use crate::logging::{init_logging, SessionKind};
use crate::quota_db::{Access, QuotaDb, ReferralOutcome};
use crate::timefmt::format_utc;

pub enum QuotaAction {
    Register {
        user: i64,
        username: Option<String>,
        referral: Option<String>,
    },
    Show {
        user: i64,
    },
    Grant {
        user: i64,
        days: u32,
    },
    Revoke {
        user: i64,
    },
    List,
}

impl QuotaAction {
    /// Short label for the log session, e.g. `grant 42`.
    pub fn label(&self) -> String {
        match self {
            Self::Register { user, .. } => format!("register {}", user),
            Self::Show { user } => format!("show {}", user),
            Self::Grant { user, days } => format!("grant {} {}d", user, days),
            Self::Revoke { user } => format!("revoke {}", user),
            Self::List => "list".to_string(),
        }
    }
}

/// Expiry of a premium grant of `days` starting at `now`.
pub fn premium_expiry(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    if days == 0 {
        bail!("--days must be a positive integer");
    }
    let span = Duration::try_days(i64::from(days))
        .with_context(|| format!("--days {} is out of range", days))?;
    match now.checked_add_signed(span) {
        Some(until) => Ok(until),
        None => bail!("--days {} is out of range", days),
    }
}

pub fn run(action: QuotaAction) -> Result<()> {
    let data_root = resolve_data_root();
    let config = Config::discover(None, &data_root)?;
    init_logging(
        &data_root,
        &config.logging,
        SessionKind::Quota,
        &action.label(),
    )?;

    let db = QuotaDb::init(&data_root, &config.quota)?;
    let now = Utc::now();

    match action {
        QuotaAction::Register {
            user,
            username,
            referral,
        } => {
            if db.register_user(user, username.as_deref(), now)? {
                println!("Registered user {}", user);
            } else {
                println!("User {} already registered", user);
            }
            if let Some(code) = referral {
                match db.apply_referral(user, &code)? {
                    ReferralOutcome::Credited { referrer, reward } => {
                        println!("Referral accepted: user {} earned {} analyses", referrer, reward)
                    }
                    ReferralOutcome::AlreadyReferred => println!("Referral already used"),
                    ReferralOutcome::SelfReferral => println!("Cannot use your own referral code"),
                    ReferralOutcome::UnknownCode => println!("Unknown referral code: {}", code),
                }
            }
        }
        QuotaAction::Show { user } => {
            let Some(record) = db.get_user(user)? else {
                bail!("User {} is not registered", user);
            };
            println!("User:            {}", record.user_id);
            if let Some(ref name) = record.username {
                println!("Username:        {}", name);
            }
            println!("Referral code:   {}", record.referral_code);
            match db.check_access(user, now)? {
                Access::Premium { until } => {
                    println!("Plan:            premium until {}", format_utc(&until))
                }
                Access::Free { remaining } => {
                    println!("Plan:            free, {} analyses left", remaining)
                }
                Access::Exhausted => println!("Plan:            free, no analyses left"),
            }
        }
        QuotaAction::Grant { user, days } => {
            let until = premium_expiry(now, days)?;
            db.grant_premium(user, until)?;
            println!("User {} is premium until {}", user, format_utc(&until));
        }
        QuotaAction::Revoke { user } => {
            db.revoke_premium(user)?;
            println!("Premium removed for user {}", user);
        }
        QuotaAction::List => {
            let users = db.list_premium(now)?;
            if users.is_empty() {
                println!("No premium users");
            }
            for user in users {
                let until = user
                    .premium_until
                    .map(|ts| format_utc(&ts))
                    .unwrap_or_default();
                println!(
                    "{:<12} {:<24} until {}",
                    user.user_id,
                    user.username.as_deref().unwrap_or("-"),
                    until
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_premium_expiry() -> Result<()> {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let until = premium_expiry(now, 30)?;
        assert_eq!(until, Utc.with_ymd_and_hms(2025, 4, 9, 12, 0, 0).unwrap());
        Ok(())
    }

    #[test]
    fn test_premium_expiry_rejects_zero_and_overflow() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert!(premium_expiry(now, 0).is_err());
        assert!(premium_expiry(now, u32::MAX).is_err());
        assert!(premium_expiry(now, 200_000_000).is_err());
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(QuotaAction::Grant { user: 7, days: 30 }.label(), "grant 7 30d");
        assert_eq!(QuotaAction::List.label(), "list");
    }
}
