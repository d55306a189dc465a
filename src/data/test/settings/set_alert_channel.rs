use super::*;

/// Tests configuring the alert channel for the first time.
///
/// Verifies that setting a channel on a fresh database creates the settings
/// row with the default threshold.
///
/// Expected: Ok with channel set and default threshold
#[tokio::test]
async fn creates_row_with_default_threshold() -> Result<(), AppError> {
    let test = TestBuilder::new().with_monitor_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = MonitorSettingsRepository::new(db);
    let settings = repo.set_alert_channel(Some(555000111222333)).await?;

    assert_eq!(settings.alert_channel_id, Some("555000111222333".to_string()));
    assert_eq!(settings.alert_threshold, DEFAULT_ALERT_THRESHOLD);

    Ok(())
}

/// Tests replacing a configured alert channel.
///
/// Verifies that setting a new channel overwrites the old one while leaving
/// a previously customized threshold untouched.
///
/// Expected: Ok with new channel and preserved threshold
#[tokio::test]
async fn preserves_threshold_on_update() -> Result<(), AppError> {
    let test = TestBuilder::new().with_monitor_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = MonitorSettingsRepository::new(db);
    repo.set_alert_threshold(25).await?;
    let settings = repo.set_alert_channel(Some(42)).await?;

    assert_eq!(settings.alert_channel_id, Some("42".to_string()));
    assert_eq!(settings.alert_threshold, 25);

    Ok(())
}

/// Tests clearing the alert channel.
///
/// Verifies that passing None removes the configured channel so alerting is
/// disabled again.
///
/// Expected: Ok with no channel configured
#[tokio::test]
async fn clears_channel_with_none() -> Result<(), AppError> {
    let test = TestBuilder::new().with_monitor_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = MonitorSettingsRepository::new(db);
    repo.set_alert_channel(Some(42)).await?;
    let settings = repo.set_alert_channel(None).await?;

    assert_eq!(settings.alert_channel_id, None);
    assert_eq!(settings.alert_channel()?, None);

    Ok(())
}
