use super::*;

/// Tests configuring the threshold for the first time.
///
/// Verifies that setting a threshold on a fresh database creates the settings
/// row with no alert channel.
///
/// Expected: Ok with threshold set and no channel
#[tokio::test]
async fn creates_row_without_channel() -> Result<(), AppError> {
    let test = TestBuilder::new().with_monitor_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = MonitorSettingsRepository::new(db);
    let settings = repo.set_alert_threshold(10).await?;

    assert_eq!(settings.alert_threshold, 10);
    assert_eq!(settings.alert_channel_id, None);

    Ok(())
}

/// Tests updating the threshold on an existing row.
///
/// Verifies that the configured alert channel survives a threshold change.
///
/// Expected: Ok with new threshold and preserved channel
#[tokio::test]
async fn preserves_channel_on_update() -> Result<(), AppError> {
    let test = TestBuilder::new().with_monitor_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = MonitorSettingsRepository::new(db);
    repo.set_alert_channel(Some(777)).await?;
    let settings = repo.set_alert_threshold(50).await?;

    assert_eq!(settings.alert_threshold, 50);
    assert_eq!(settings.alert_channel_id, Some("777".to_string()));

    Ok(())
}
