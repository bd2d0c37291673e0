//! Queued operations and their type-erased jobs

use super::error::AdmissionError;
use crate::ports::provider::ProviderError;
use docquorum_domain::{Priority, RetryPolicy};
use futures::future::BoxFuture;
use rand::Rng;
use std::cmp::Ordering;
use std::future::Future;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// What the dispatch loop learns from running a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JobOutcome {
    pub succeeded: bool,
    pub attempts: u32,
}

/// A submitted operation with its result channel, independent of the
/// operation's output type.
pub(crate) trait ErasedJob: Send {
    /// Run with bounded retries and deliver the result.
    fn run(self: Box<Self>, retry: RetryPolicy, name: String) -> BoxFuture<'static, JobOutcome>;

    /// Deliver an error without running.
    fn reject(self: Box<Self>, error: AdmissionError);
}

pub(crate) struct TypedJob<T, F> {
    operation: F,
    reply: oneshot::Sender<Result<T, AdmissionError>>,
}

impl<T, F> TypedJob<T, F> {
    pub fn new(operation: F, reply: oneshot::Sender<Result<T, AdmissionError>>) -> Self {
        Self { operation, reply }
    }
}

impl<T, F, Fut> ErasedJob for TypedJob<T, F>
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
{
    fn run(self: Box<Self>, retry: RetryPolicy, name: String) -> BoxFuture<'static, JobOutcome> {
        Box::pin(async move {
            let TypedJob {
                mut operation,
                reply,
            } = *self;
            let mut retries = 0u32;

            let result = loop {
                match operation().await {
                    Ok(value) => break Ok(value),
                    Err(e) if e.is_transient() && retry.allows_retry(retries) => {
                        let jitter: f64 = rand::thread_rng().gen_range(0.0..=1.0);
                        let delay = retry.delay_for(retries, jitter);
                        retries += 1;
                        warn!(
                            "{} failed transiently ({}), retry {}/{} in {:?}",
                            name, e, retries, retry.max_retries, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => break Err(e),
                }
            };

            let outcome = JobOutcome {
                succeeded: result.is_ok(),
                attempts: retries + 1,
            };
            if reply.send(result.map_err(AdmissionError::Provider)).is_err() {
                debug!("{} finished after its caller went away", name);
            }
            outcome
        })
    }

    fn reject(self: Box<Self>, error: AdmissionError) {
        let _ = self.reply.send(Err(error));
    }
}

/// One operation waiting in a controller's queue.
pub(crate) struct QueuedOperation {
    pub name: String,
    pub priority: Priority,
    /// Submission order, for FIFO within a priority
    pub seq: u64,
    pub enqueued_at: Instant,
    pub expires_at: Instant,
    pub estimated_tokens: u64,
    pub job: Box<dyn ErasedJob>,
}

impl PartialEq for QueuedOperation {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedOperation {}

impl Ord for QueuedOperation {
    /// Max-heap order: higher priority first, then lower sequence number.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedOperation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;
    use std::time::Duration;

    fn op(priority: Priority, seq: u64) -> QueuedOperation {
        let (tx, _rx) = oneshot::channel::<Result<(), AdmissionError>>();
        let now = Instant::now();
        QueuedOperation {
            name: format!("op-{}", seq),
            priority,
            seq,
            enqueued_at: now,
            expires_at: now + Duration::from_secs(60),
            estimated_tokens: 0,
            job: Box::new(TypedJob::new(|| async { Ok::<(), ProviderError>(()) }, tx)),
        }
    }

    #[tokio::test]
    async fn test_heap_order_priority_then_fifo() {
        let mut heap = BinaryHeap::new();
        heap.push(op(Priority::Normal, 0));
        heap.push(op(Priority::Low, 1));
        heap.push(op(Priority::Normal, 2));
        heap.push(op(Priority::High, 3));
        heap.push(op(Priority::High, 4));

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|o| o.seq)).collect();
        assert_eq!(order, vec![3, 4, 0, 2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_retries_transient_errors() {
        let (tx, rx) = oneshot::channel();
        let mut calls = 0u32;
        let job: Box<dyn ErasedJob> = Box::new(TypedJob::new(
            move || {
                calls += 1;
                let n = calls;
                async move {
                    if n < 3 {
                        Err(ProviderError::Transient("busy".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            },
            tx,
        ));

        let outcome = job.run(RetryPolicy::default(), "test".to_string()).await;
        assert_eq!(
            outcome,
            JobOutcome {
                succeeded: true,
                attempts: 3
            }
        );
        assert_eq!(rx.await.unwrap(), Ok(3));
    }

    #[tokio::test]
    async fn test_job_does_not_retry_fatal_errors() {
        let (tx, rx) = oneshot::channel::<Result<(), AdmissionError>>();
        let job: Box<dyn ErasedJob> = Box::new(TypedJob::new(
            || async { Err(ProviderError::Fatal("bad request".to_string())) },
            tx,
        ));

        let outcome = job.run(RetryPolicy::default(), "test".to_string()).await;
        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.succeeded);
        assert_eq!(
            rx.await.unwrap(),
            Err(AdmissionError::Provider(ProviderError::Fatal(
                "bad request".to_string()
            )))
        );
    }
}
