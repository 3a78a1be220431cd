//! Bounded worker pool for batched calls to the target system.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::BackendError;

/// Run `worker` over `inputs` with at most `width` calls in flight.
///
/// Results come back in input order regardless of completion order. Width 0
/// or 1 awaits each call in turn. The first failure is returned and the
/// remaining tasks are aborted.
pub async fn run_indexed<I, O, F, Fut>(
    inputs: Vec<I>,
    width: usize,
    worker: F,
) -> Result<Vec<O>, BackendError>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, BackendError>> + Send + 'static,
{
    let total = inputs.len();
    if width <= 1 || total <= 1 {
        let mut outputs = Vec::with_capacity(total);
        for input in inputs {
            outputs.push(worker(input).await?);
        }
        return Ok(outputs);
    }

    debug!(tasks = total, width, "Dispatching batch to worker pool");

    let semaphore = Arc::new(Semaphore::new(width));
    let worker = Arc::new(worker);
    let mut tasks = JoinSet::new();

    for (index, input) in inputs.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let worker = Arc::clone(&worker);
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| BackendError::Worker {
                    message: e.to_string(),
                })?;
            (*worker)(input).await.map(|output| (index, output))
        });
    }

    let mut slots: Vec<Option<O>> = std::iter::repeat_with(|| None).take(total).collect();
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(|e| BackendError::Worker {
            message: e.to_string(),
        })?;
        match outcome {
            Ok((index, output)) => slots[index] = Some(output),
            Err(e) => {
                warn!(error = %e, "Worker failed, aborting batch");
                return Err(e);
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| BackendError::Worker {
                message: format!("no result for task {index}"),
            })
        })
        .collect()
}
