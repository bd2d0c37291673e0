//! Per-provider admission controller and its dispatch loop

use super::error::AdmissionError;
use super::queue::{QueuedOperation, TypedJob};
use crate::ports::provider::ProviderError;
use docquorum_domain::{AdmissionPolicy, CircuitState, Priority, RateWindow};
use std::collections::BinaryHeap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Metadata for one admitted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub name: String,
    pub priority: Priority,
    /// Upper bound on the tokens the operation will use. The controller
    /// counts this figure against the per-minute token budget at dispatch
    /// and never reconciles it with the usage the call later reports, so an
    /// underestimate lets the budget be exceeded.
    pub estimated_tokens: u64,
}

impl Admission {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: Priority::default(),
            estimated_tokens: 0,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_estimated_tokens(mut self, tokens: u64) -> Self {
        self.estimated_tokens = tokens;
        self
    }
}

/// Snapshot of a controller's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionStats {
    pub queue_depth: usize,
    pub consecutive_failures: u32,
    pub circuit_open: bool,
    pub requests_in_window: usize,
    pub tokens_in_window: u64,
}

/// Pending result of an enqueued operation.
pub struct AdmissionTicket<T> {
    rx: oneshot::Receiver<Result<T, AdmissionError>>,
}

impl<T> AdmissionTicket<T> {
    /// Wait for the operation to be dispatched (or rejected).
    pub async fn wait(self) -> Result<T, AdmissionError> {
        self.rx.await.unwrap_or(Err(AdmissionError::Shutdown))
    }
}

enum Command {
    Submit(QueuedOperation),
    Reset,
    Stats(oneshot::Sender<AdmissionStats>),
}

/// Gate in front of one provider.
///
/// Operations are queued by priority (FIFO within a priority) and dispatched
/// one at a time by a background task, which enforces the trailing-minute
/// request and token limits, the circuit breaker and retry policy.
///
/// Must be created inside a tokio runtime. Dropping the controller shuts
/// the loop down; anything still queued resolves to
/// [`AdmissionError::Shutdown`].
pub struct AdmissionController {
    name: String,
    policy: AdmissionPolicy,
    commands: mpsc::UnboundedSender<Command>,
    depth: Arc<AtomicUsize>,
    next_seq: AtomicU64,
    cancel: CancellationToken,
}

impl AdmissionController {
    pub fn new(name: impl Into<String>, policy: AdmissionPolicy) -> Self {
        let name = name.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let dispatch = DispatchLoop {
            name: name.clone(),
            policy: policy.clone(),
            commands: rx,
            depth: depth.clone(),
            cancel: cancel.clone(),
            heap: BinaryHeap::new(),
            window: RateWindow::default(),
            circuit: CircuitState::new(),
        };
        tokio::spawn(dispatch.run());

        Self {
            name,
            policy,
            commands: tx,
            depth,
            next_seq: AtomicU64::new(0),
            cancel,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Queue `operation` and wait for its result.
    ///
    /// `operation` is called once per attempt; transient errors are retried
    /// according to the retry policy.
    pub async fn admit<T, F, Fut>(
        &self,
        admission: Admission,
        operation: F,
    ) -> Result<T, AdmissionError>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
    {
        self.enqueue(admission, operation)?.wait().await
    }

    /// Queue `operation` without waiting.
    ///
    /// Fails immediately with [`AdmissionError::QueueOverflow`] when the
    /// queue is full.
    pub fn enqueue<T, F, Fut>(
        &self,
        admission: Admission,
        operation: F,
    ) -> Result<AdmissionTicket<T>, AdmissionError>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return Err(AdmissionError::Shutdown);
        }

        let depth = self.depth.fetch_add(1, Ordering::SeqCst);
        if depth >= self.policy.max_queue_depth {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            debug!("{}: rejecting {} (queue full)", self.name, admission.name);
            return Err(AdmissionError::QueueOverflow { depth });
        }

        let (tx, rx) = oneshot::channel();
        let now = Instant::now();
        let op = QueuedOperation {
            name: admission.name,
            priority: admission.priority,
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            enqueued_at: now,
            expires_at: now + self.policy.max_queue_wait,
            estimated_tokens: admission.estimated_tokens,
            job: Box::new(TypedJob::new(operation, tx)),
        };

        if self.commands.send(Command::Submit(op)).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(AdmissionError::Shutdown);
        }
        Ok(AdmissionTicket { rx })
    }

    /// Clear the rate window and circuit state.
    pub fn reset(&self) {
        let _ = self.commands.send(Command::Reset);
    }

    /// Current state, as seen by the dispatch loop after it finishes the
    /// operation it is running.
    pub async fn stats(&self) -> Result<AdmissionStats, AdmissionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Stats(tx))
            .map_err(|_| AdmissionError::Shutdown)?;
        rx.await.map_err(|_| AdmissionError::Shutdown)
    }

    /// Stop the dispatch loop. An operation already running finishes;
    /// queued ones resolve to [`AdmissionError::Shutdown`].
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for AdmissionController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("name", &self.name)
            .field("queue_depth", &self.depth.load(Ordering::SeqCst))
            .finish()
    }
}

struct DispatchLoop {
    name: String,
    policy: AdmissionPolicy,
    commands: mpsc::UnboundedReceiver<Command>,
    depth: Arc<AtomicUsize>,
    cancel: CancellationToken,
    heap: BinaryHeap<QueuedOperation>,
    window: RateWindow,
    circuit: CircuitState,
}

impl DispatchLoop {
    async fn run(mut self) {
        debug!("{}: dispatch loop started", self.name);

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            if self.heap.is_empty() {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break,
                    cmd = self.commands.recv() => match cmd {
                        Some(cmd) => self.apply(cmd),
                        None => break,
                    },
                }
            }
            while let Ok(cmd) = self.commands.try_recv() {
                self.apply(cmd);
            }

            let now = Instant::now();
            self.expire(now);

            let Some(tokens) = self.heap.peek().map(|op| op.estimated_tokens) else {
                continue;
            };

            if let Some(retry_after) = self.circuit.remaining(now.into_std()) {
                if let Some(op) = self.pop() {
                    debug!("{}: circuit open, rejecting {}", self.name, op.name);
                    op.job.reject(AdmissionError::CircuitOpen { retry_after });
                }
                continue;
            }

            if let Some(wait) = self.window.wait_time(
                now.into_std(),
                self.policy.requests_per_minute,
                self.policy.token_budget_per_minute,
                tokens,
            ) {
                let earliest_expiry = self.heap.iter().map(|op| op.expires_at).min();
                let wake_at = earliest_expiry.map_or(now + wait, |e| e.min(now + wait));
                debug!(
                    "{}: rate limit reached, waiting {:?}",
                    self.name,
                    wake_at.saturating_duration_since(now)
                );
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep_until(wake_at) => {}
                    cmd = self.commands.recv() => match cmd {
                        Some(cmd) => self.apply(cmd),
                        None => break,
                    },
                }
                continue;
            }

            let Some(op) = self.pop() else {
                continue;
            };
            self.window.record(now.into_std(), op.estimated_tokens);
            debug!(
                "{}: dispatching {} after {:?} in queue",
                self.name,
                op.name,
                now.saturating_duration_since(op.enqueued_at)
            );

            let outcome = op.job.run(self.policy.retry.clone(), op.name.clone()).await;
            if outcome.succeeded {
                if self.circuit.record_success() {
                    info!("{}: circuit closed", self.name);
                }
            } else if let Some(cooldown) = self
                .circuit
                .record_failure(Instant::now().into_std(), &self.policy.circuit)
            {
                warn!(
                    "{}: circuit opened for {:?} after {} consecutive failures",
                    self.name,
                    cooldown,
                    self.circuit.consecutive_failures()
                );
            }
        }

        self.commands.close();
        while let Ok(cmd) = self.commands.try_recv() {
            self.apply(cmd);
        }
        let remaining = self.heap.len();
        while let Some(op) = self.pop() {
            op.job.reject(AdmissionError::Shutdown);
        }
        debug!(
            "{}: dispatch loop stopped ({} queued operations dropped)",
            self.name, remaining
        );
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Submit(op) => self.heap.push(op),
            Command::Reset => {
                self.window.clear();
                self.circuit.reset();
                info!("{}: admission state reset", self.name);
            }
            Command::Stats(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn pop(&mut self) -> Option<QueuedOperation> {
        let op = self.heap.pop()?;
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Some(op)
    }

    /// Fail every operation whose queue deadline has passed.
    fn expire(&mut self, now: Instant) {
        if !self.heap.iter().any(|op| op.expires_at <= now) {
            return;
        }
        let (expired, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.heap)
            .into_vec()
            .into_iter()
            .partition(|op| op.expires_at <= now);
        self.heap = waiting.into();

        for op in expired {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            let waited = now.saturating_duration_since(op.enqueued_at);
            warn!("{}: {} timed out after {:?} in queue", self.name, op.name, waited);
            op.job.reject(AdmissionError::QueueTimeout { waited });
        }
    }

    fn snapshot(&mut self) -> AdmissionStats {
        let now = Instant::now().into_std();
        self.window.prune(now);
        AdmissionStats {
            queue_depth: self.heap.len(),
            consecutive_failures: self.circuit.consecutive_failures(),
            circuit_open: self.circuit.is_open(now),
            requests_in_window: self.window.request_count(),
            tokens_in_window: self.window.token_total(),
        }
    }
}
