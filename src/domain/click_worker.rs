//! Background worker that turns click events into counter increments.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::ClickRepository;

/// Tuning knobs for [`run_click_worker`].
#[derive(Debug, Clone, Copy)]
pub struct ClickWorkerSettings {
    /// Maximum number of increments in flight at once.
    pub concurrency: usize,
    /// Retries after the first failed attempt.
    pub max_retries: usize,
}

impl Default for ClickWorkerSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_retries: 3,
        }
    }
}

/// Consumes click events until every sender is dropped.
///
/// Each event is processed on its own task, bounded by
/// `settings.concurrency`. Failed increments are retried with exponential
/// backoff; once retries are exhausted the click is logged and counted as an
/// accounting failure. Events already received are always processed before
/// the function returns, so awaiting it drains the queue on shutdown.
pub async fn run_click_worker<R>(
    mut rx: mpsc::Receiver<ClickEvent>,
    repository: Arc<R>,
    settings: ClickWorkerSettings,
) where
    R: ClickRepository + 'static,
{
    let semaphore = Arc::new(Semaphore::new(settings.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    while let Some(event) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        let repository = repository.clone();
        tasks.spawn(async move {
            let _permit = permit;
            process_click(repository.as_ref(), event, settings.max_retries).await;
        });

        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                error!(error = %e, "Click task panicked");
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Click task panicked");
        }
    }

    info!("Click worker stopped");
}

/// Records one click, retrying transient failures.
pub async fn process_click<R>(repository: &R, event: ClickEvent, max_retries: usize)
where
    R: ClickRepository + ?Sized,
{
    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(max_retries);

    match Retry::spawn(strategy, || repository.record_click(event.link_id)).await {
        Ok(true) => {
            counter!("clicks_recorded_total").increment(1);
            debug!(link_id = event.link_id, code = %event.short_code, "Click recorded");
        }
        Ok(false) => {
            warn!(
                link_id = event.link_id,
                code = %event.short_code,
                "Link removed before its click was recorded"
            );
        }
        Err(e) => {
            counter!("clicks_failed_total").increment(1);
            error!(
                link_id = event.link_id,
                code = %event.short_code,
                error = %e,
                "Failed to record click after {} retries",
                max_retries
            );
        }
    }
}
