//! Periodic monitoring jobs.
//!
//! Mirrors the monitors' tick cadence: heartbeat and shard sampling every
//! minute, health checks, event cleanup, and alert evaluation every five
//! minutes (staggered by a few seconds so the five-minute jobs do not land
//! on the same tick). Every job catches and logs its own errors so one bad
//! tick never kills the schedule.

use std::sync::Arc;

use serenity::http::Http;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::error::AppError;
use crate::state::AppState;

pub mod monitor_jobs;

/// Starts the monitoring scheduler.
///
/// # Arguments
/// - `state` - Shared application state
/// - `discord_http` - Discord HTTP client for sending alert messages
///
/// # Returns
/// - `Ok(JobScheduler)` - Running scheduler handle, kept for shutdown
/// - `Err(AppError)` - Job registration or scheduler startup failed
pub async fn start_scheduler(
    state: Arc<AppState>,
    discord_http: Arc<Http>,
) -> Result<JobScheduler, AppError> {
    let scheduler = JobScheduler::new().await?;

    // Heartbeat: refresh the cluster snapshot every minute
    let job_state = state.clone();
    let heartbeat = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let state = job_state.clone();
        Box::pin(async move {
            monitor_jobs::run_heartbeat(&state).await;
        })
    })?;
    scheduler.add(heartbeat).await?;

    // Shard monitor: fold gateway state into the rate-limit monitor
    let job_state = state.clone();
    let shard_monitor = Job::new_async("10 * * * * *", move |_uuid, _lock| {
        let state = job_state.clone();
        Box::pin(async move {
            monitor_jobs::run_shard_monitor(&state).await;
        })
    })?;
    scheduler.add(shard_monitor).await?;

    // Health check: guild density and memory warnings
    let job_state = state.clone();
    let health = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
        let state = job_state.clone();
        Box::pin(async move {
            monitor_jobs::run_health_check(&state).await;
        })
    })?;
    scheduler.add(health).await?;

    // Cleanup: enforce the 24h/1000-event window
    let job_state = state.clone();
    let cleanup = Job::new_async("15 */5 * * * *", move |_uuid, _lock| {
        let state = job_state.clone();
        Box::pin(async move {
            monitor_jobs::run_cleanup(&state).await;
        })
    })?;
    scheduler.add(cleanup).await?;

    // Alerts: evaluate the five-minute window and notify the alert channel
    let job_state = state.clone();
    let job_http = discord_http.clone();
    let alerts = Job::new_async("30 */5 * * * *", move |_uuid, _lock| {
        let state = job_state.clone();
        let http = job_http.clone();
        Box::pin(async move {
            if let Err(e) = monitor_jobs::run_alert_check(&state, &http).await {
                error!("Error checking rate limit alerts: {}", e);
            }
        })
    })?;
    scheduler.add(alerts).await?;

    scheduler.start().await?;

    info!("Monitoring scheduler started");

    Ok(scheduler)
}
