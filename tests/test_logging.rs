use chanstat::config::{LoggingConfig, QuotaConfig};
use chanstat::logging::{self, SessionKind};
use chanstat::quota_db::QuotaDb;
use chrono::Utc;

// One subscriber per process: everything that needs it lives in this test.
#[test]
fn sessions_and_quota_events_reach_log_file() -> anyhow::Result<()> {
    let test_dir = tempfile::tempdir()?;
    let data_root = test_dir.path().join("data");
    let settings = LoggingConfig::default();

    let path = logging::init_logging(&data_root, &settings, SessionKind::Quota, "register 42")?;
    assert_eq!(path, logging::log_path(&data_root));

    let db = QuotaDb::init(&data_root, &QuotaConfig::default())?;
    assert!(db.register_user(42, Some("alice"), Utc::now())?);

    // A second command in the same process adds a session, not a subscriber
    logging::init_logging(&data_root, &settings, SessionKind::Analyze, "@rustlang")?;

    let contents = std::fs::read_to_string(&path)?;
    assert!(contents.contains("Session started"), "{}", contents);
    assert!(contents.contains("session=quota"), "{}", contents);
    assert!(contents.contains("register 42"), "{}", contents);
    assert!(contents.contains("Registered user"), "{}", contents);
    assert!(contents.contains("user_id=42"), "{}", contents);
    assert!(contents.contains("session=analyze"), "{}", contents);

    let quota_line = contents
        .lines()
        .position(|line| line.contains("Registered user"));
    let analyze_line = contents
        .lines()
        .position(|line| line.contains("session=analyze"));
    assert!(quota_line < analyze_line);
    Ok(())
}
