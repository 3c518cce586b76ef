use crate::error::{AppError, AppResult};
use crate::services::billing_scheduler::BillingScheduler;
use log::{error, info};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Start the in-process daily billing job. Deployments that trigger billing
/// through the webhook instead simply leave the cron expression unset and
/// never call this.
pub async fn start_billing_job(
    cron: &str,
    billing: Arc<BillingScheduler>,
) -> AppResult<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create job scheduler: {}", e)))?;

    let job = Job::new_async(cron, move |_id, _lock| {
        let billing = Arc::clone(&billing);
        Box::pin(async move {
            if let Err(e) = billing.handle_daily_payments().await {
                error!("Scheduled billing run failed: {}", e);
            }
        })
    })
    .map_err(|e| AppError::Configuration(format!("Invalid billing cron expression: {}", e)))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to register billing job: {}", e)))?;
    scheduler
        .start()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to start job scheduler: {}", e)))?;

    info!("Daily billing job scheduled ({})", cron);
    Ok(scheduler)
}
