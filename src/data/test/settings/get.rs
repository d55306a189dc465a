use super::*;

/// Tests reading settings before any write.
///
/// Verifies that `get` returns None on a fresh database and that
/// `get_or_default` falls back to the unconfigured defaults.
///
/// Expected: Ok(None) / Ok(defaults)
#[tokio::test]
async fn returns_none_then_defaults_on_fresh_database() -> Result<(), AppError> {
    let test = TestBuilder::new().with_monitor_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = MonitorSettingsRepository::new(db);

    assert!(repo.get().await?.is_none());

    let defaults = repo.get_or_default().await?;
    assert_eq!(defaults.alert_channel_id, None);
    assert_eq!(defaults.alert_threshold, DEFAULT_ALERT_THRESHOLD);

    Ok(())
}

/// Tests reading settings after a write.
///
/// Verifies that `get` returns the persisted row once a setter has created
/// it.
///
/// Expected: Ok(Some(settings))
#[tokio::test]
async fn returns_persisted_settings() -> Result<(), AppError> {
    let test = TestBuilder::new().with_monitor_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = MonitorSettingsRepository::new(db);
    repo.set_alert_channel(Some(123456789)).await?;

    let settings = repo.get().await?;
    assert!(settings.is_some());
    let settings = settings.unwrap();
    assert_eq!(settings.alert_channel_id, Some("123456789".to_string()));
    assert_eq!(settings.alert_channel()?, Some(123456789));

    Ok(())
}
