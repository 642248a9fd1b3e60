/// Per-user analysis quota database
///
/// Tracks free analyses left, referral credits and premium expiry. Times are
/// stored as unix milliseconds.
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::info;

use crate::config::QuotaConfig;

/// Database file name inside the data root.
pub const QUOTA_DB_FILE: &str = "quota.sqlite";

const REFERRAL_PREFIX: &str = "REF";

/// One registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: Option<String>,
    pub remaining_analyses: u32,
    pub referral_code: String,
    pub referred_by: Option<i64>,
    pub premium_until: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn is_premium(&self, now: DateTime<Utc>) -> bool {
        self.premium_until.is_some_and(|until| until > now)
    }
}

/// Whether a user may run an analysis right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Premium { until: DateTime<Utc> },
    Free { remaining: u32 },
    Exhausted,
}

impl Access {
    pub fn allowed(&self) -> bool {
        !matches!(self, Access::Exhausted)
    }
}

/// Result of redeeming a referral code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralOutcome {
    Credited { referrer: i64, reward: u32 },
    AlreadyReferred,
    SelfReferral,
    UnknownCode,
}

/// `REF<user_id>`
pub fn referral_code(user_id: i64) -> String {
    format!("{}{}", REFERRAL_PREFIX, user_id)
}

fn parse_referral_code(code: &str) -> Option<i64> {
    code.trim().strip_prefix(REFERRAL_PREFIX)?.parse().ok()
}

fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.and_then(DateTime::from_timestamp_millis)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        username: row.get(1)?,
        remaining_analyses: row.get(2)?,
        referral_code: row.get(3)?,
        referred_by: row.get(4)?,
        premium_until: from_millis(row.get(5)?),
    })
}

const USER_COLUMNS: &str =
    "user_id, username, remaining_analyses, referral_code, referred_by, premium_until";

/// Database handle for quota operations
pub struct QuotaDb {
    conn: Connection,
    free_analyses: u32,
    referral_reward: u32,
}

impl QuotaDb {
    /// Initialize or open the quota database under `data_root`
    pub fn init(data_root: &Path, quota: &QuotaConfig) -> Result<Self> {
        std::fs::create_dir_all(data_root)
            .with_context(|| format!("Failed to create data root: {}", data_root.display()))?;
        let db_path = data_root.join(QUOTA_DB_FILE);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER NOT NULL PRIMARY KEY,
                username TEXT,
                joined_at INTEGER NOT NULL,
                remaining_analyses INTEGER NOT NULL,
                referral_code TEXT NOT NULL UNIQUE,
                referred_by INTEGER,
                premium_until INTEGER
            )",
            [],
        )
        .context("Failed to create users table")?;

        Ok(Self {
            conn,
            free_analyses: quota.free_analyses,
            referral_reward: quota.referral_reward,
        })
    }

    /// Register a user with the free allowance. Returns false if already known.
    pub fn register_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO users (user_id, username, joined_at, remaining_analyses, referral_code)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                username,
                to_millis(now),
                self.free_analyses,
                referral_code(user_id)
            ],
        )?;
        if inserted > 0 {
            info!(user_id, "Registered user");
        }
        Ok(inserted > 0)
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {} FROM users WHERE user_id = ?1", USER_COLUMNS);
        let user = self
            .conn
            .query_row(&sql, params![user_id], user_from_row)
            .optional()?;
        Ok(user)
    }

    fn require_user(&self, user_id: i64) -> Result<UserRecord> {
        self.get_user(user_id)?
            .ok_or_else(|| anyhow!("User {} is not registered", user_id))
    }

    pub fn check_access(&self, user_id: i64, now: DateTime<Utc>) -> Result<Access> {
        let user = self.require_user(user_id)?;
        Ok(match user.premium_until {
            Some(until) if until > now => Access::Premium { until },
            _ if user.remaining_analyses > 0 => Access::Free {
                remaining: user.remaining_analyses,
            },
            _ => Access::Exhausted,
        })
    }

    /// Spend one free analysis; returns what is left.
    pub fn consume_analysis(&self, user_id: i64) -> Result<u32> {
        let changed = self.conn.execute(
            "UPDATE users SET remaining_analyses = remaining_analyses - 1
             WHERE user_id = ?1 AND remaining_analyses > 0",
            params![user_id],
        )?;
        if changed == 0 {
            bail!("User {} has no analyses remaining", user_id);
        }
        Ok(self.require_user(user_id)?.remaining_analyses)
    }

    /// Credit the owner of `code` for referring `user_id`, once per user.
    pub fn apply_referral(&self, user_id: i64, code: &str) -> Result<ReferralOutcome> {
        let Some(referrer) = parse_referral_code(code) else {
            return Ok(ReferralOutcome::UnknownCode);
        };
        if referrer == user_id {
            return Ok(ReferralOutcome::SelfReferral);
        }
        if self.get_user(referrer)?.is_none() {
            return Ok(ReferralOutcome::UnknownCode);
        }
        let user = self.require_user(user_id)?;
        if user.referred_by.is_some() {
            return Ok(ReferralOutcome::AlreadyReferred);
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE users SET referred_by = ?1 WHERE user_id = ?2 AND referred_by IS NULL",
            params![referrer, user_id],
        )?;
        tx.execute(
            "UPDATE users SET remaining_analyses = remaining_analyses + ?1 WHERE user_id = ?2",
            params![self.referral_reward, referrer],
        )?;
        tx.commit()?;

        info!(user_id, referrer, "Referral credited");
        Ok(ReferralOutcome::Credited {
            referrer,
            reward: self.referral_reward,
        })
    }

    pub fn grant_premium(&self, user_id: i64, until: DateTime<Utc>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE users SET premium_until = ?1 WHERE user_id = ?2",
            params![to_millis(until), user_id],
        )?;
        if changed == 0 {
            bail!("User {} is not registered", user_id);
        }
        info!(user_id, until = %until, "Premium granted");
        Ok(())
    }

    /// Drop premium and reset the free allowance to the default.
    pub fn revoke_premium(&self, user_id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE users SET premium_until = NULL, remaining_analyses = ?1 WHERE user_id = ?2",
            params![self.free_analyses, user_id],
        )?;
        if changed == 0 {
            bail!("User {} is not registered", user_id);
        }
        info!(user_id, "Premium revoked");
        Ok(())
    }

    /// Users with premium still active at `now`, latest expiry first.
    pub fn list_premium(&self, now: DateTime<Utc>) -> Result<Vec<UserRecord>> {
        let sql = format!(
            "SELECT {} FROM users
             WHERE premium_until IS NOT NULL AND premium_until > ?1
             ORDER BY premium_until DESC, user_id",
            USER_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let users = stmt
            .query_map(params![to_millis(now)], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}
