//! Driving a submitted operation to its terminal state.

use crate::error::{Result, VeoGenError};
use crate::video::provider::OperationClient;
use crate::video::types::{GenerationRequest, Operation};
use std::time::Duration;
use tokio::time::Instant;

/// Default wait between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How the wait between polls evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same wait every time.
    Fixed(Duration),
    /// Doubling wait, capped at `max`.
    Exponential {
        /// First wait.
        initial: Duration,
        /// Upper bound.
        max: Duration,
    },
}

impl Backoff {
    /// Wait before poll number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(interval) => interval,
            Self::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.min(16));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// Polling policy.
///
/// The default polls every 5 seconds forever and fails on the first fetch
/// error. `timeout` and `max_fetch_retries` are opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait schedule.
    pub backoff: Backoff,
    /// Give up after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Retries allowed per fetch for transient errors.
    pub max_fetch_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            backoff: Backoff::Fixed(DEFAULT_POLL_INTERVAL),
            timeout: None,
            max_fetch_retries: 0,
        }
    }
}

/// Lifecycle of a submitted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    /// Still running on the server.
    Pending(Operation),
    /// Finished; the result is final.
    Terminal(Operation),
}

impl OperationState {
    /// Classifies a freshly fetched handle.
    pub fn from_operation(operation: Operation) -> Self {
        if operation.done {
            Self::Terminal(operation)
        } else {
            Self::Pending(operation)
        }
    }
}

type ProgressFn<'a> = Box<dyn FnMut(u32) + Send + 'a>;

/// Submits a request and polls until the operation is done.
pub struct OperationPoller<'a, C: OperationClient + ?Sized> {
    client: &'a C,
    policy: PollPolicy,
    on_poll: Option<ProgressFn<'a>>,
}

impl<'a, C: OperationClient + ?Sized> OperationPoller<'a, C> {
    /// Creates a poller with the default policy.
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            policy: PollPolicy::default(),
            on_poll: None,
        }
    }

    /// Sets the polling policy.
    pub fn policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Registers a callback invoked after every status fetch.
    pub fn on_poll(mut self, callback: impl FnMut(u32) + Send + 'a) -> Self {
        self.on_poll = Some(Box::new(callback));
        self
    }

    /// Submits `request` once and waits for the operation to finish.
    pub async fn run(&mut self, request: &GenerationRequest) -> Result<Operation> {
        let operation = self.client.submit(request).await?;
        tracing::info!(
            operation = %operation.name,
            model = %request.model,
            "submitted video generation request"
        );
        self.wait(operation).await
    }

    /// Polls an already-submitted operation until it is done.
    pub async fn wait(&mut self, operation: Operation) -> Result<Operation> {
        let start = Instant::now();
        let mut state = OperationState::from_operation(operation);
        let mut attempt = 0u32;

        loop {
            let pending = match state {
                OperationState::Terminal(operation) => {
                    tracing::debug!(
                        operation = %operation.name,
                        polls = attempt,
                        elapsed_secs = start.elapsed().as_secs(),
                        "video generation finished"
                    );
                    return Ok(operation);
                }
                OperationState::Pending(operation) => operation,
            };

            let delay = self.policy.backoff.delay(attempt);
            if let Some(timeout) = self.policy.timeout {
                if start.elapsed() + delay > timeout {
                    return Err(VeoGenError::Timeout(timeout));
                }
            }
            tokio::time::sleep(delay).await;

            let fetch = self.fetch_with_retries(&pending, delay);
            let fetched = match self.policy.timeout {
                Some(timeout) => {
                    let remaining = timeout.saturating_sub(start.elapsed());
                    tokio::time::timeout(remaining, fetch)
                        .await
                        .map_err(|_| VeoGenError::Timeout(timeout))??
                }
                None => fetch.await?,
            };
            attempt += 1;
            tracing::debug!(
                operation = %pending.name,
                attempt,
                elapsed_secs = start.elapsed().as_secs(),
                done = fetched.done,
                "polled video generation"
            );
            if let Some(callback) = self.on_poll.as_mut() {
                callback(attempt);
            }
            state = OperationState::from_operation(fetched);
        }
    }

    async fn fetch_with_retries(
        &self,
        operation: &Operation,
        interval: Duration,
    ) -> Result<Operation> {
        let mut retries = 0;
        loop {
            match self.client.fetch(operation).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if e.is_retryable() && retries < self.policy.max_fetch_retries => {
                    retries += 1;
                    let delay = e.retry_after().unwrap_or(interval);
                    tracing::warn!(
                        attempt = retries,
                        max_retries = self.policy.max_fetch_retries,
                        delay_ms = delay.as_millis(),
                        "retrying status fetch after transient error: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted fetch results after a scripted submit result.
    struct ScriptedClient {
        submit: Mutex<Option<Result<Operation>>>,
        fetches: Mutex<VecDeque<Result<Operation>>>,
        fetch_calls: AtomicU32,
    }

    impl ScriptedClient {
        fn new(submit: Result<Operation>, fetches: Vec<Result<Operation>>) -> Self {
            Self {
                submit: Mutex::new(Some(submit)),
                fetches: Mutex::new(fetches.into()),
                fetch_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl OperationClient for ScriptedClient {
        async fn submit(&self, _request: &GenerationRequest) -> Result<Operation> {
            self.submit.lock().unwrap().take().expect("submitted twice")
        }

        async fn fetch(&self, _operation: &Operation) -> Result<Operation> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.fetches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Operation::pending("operations/1")))
        }
    }

    fn done() -> Operation {
        Operation {
            name: "operations/1".into(),
            done: true,
            ..Operation::default()
        }
    }

    fn request() -> GenerationRequest {
        crate::video::request::build_request(&crate::video::request::RequestOptions::new("x"))
            .unwrap()
            .request
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_done_with_fixed_interval() {
        let client = ScriptedClient::new(
            Ok(Operation::pending("operations/1")),
            vec![Ok(Operation::pending("operations/1")), Ok(done())],
        );
        let mut ticks = Vec::new();
        let start = Instant::now();

        let op = OperationPoller::new(&client)
            .on_poll(|n| ticks.push(n))
            .run(&request())
            .await
            .unwrap();

        assert!(op.done);
        assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(ticks, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_done_submission_is_not_polled() {
        let client = ScriptedClient::new(Ok(done()), vec![]);
        let op = OperationPoller::new(&client).run(&request()).await.unwrap();
        assert!(op.done);
        assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_error_propagates_without_polling() {
        let client = ScriptedClient::new(
            Err(VeoGenError::Submission {
                status: 400,
                message: "bad request".into(),
            }),
            vec![],
        );
        let err = OperationPoller::new(&client)
            .run(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, VeoGenError::Submission { status: 400, .. }));
        assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_fails_by_default() {
        let client = ScriptedClient::new(
            Ok(Operation::pending("operations/1")),
            vec![Err(VeoGenError::RateLimited { retry_after: None })],
        );
        let err = OperationPoller::new(&client)
            .run(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, VeoGenError::RateLimited { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_when_configured() {
        let client = ScriptedClient::new(
            Ok(Operation::pending("operations/1")),
            vec![
                Err(VeoGenError::Api {
                    status: 503,
                    message: "unavailable".into(),
                }),
                Ok(done()),
            ],
        );
        let op = OperationPoller::new(&client)
            .policy(PollPolicy {
                max_fetch_retries: 2,
                ..PollPolicy::default()
            })
            .run(&request())
            .await
            .unwrap();
        assert!(op.done);
        assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fetch_error_is_not_retried() {
        let client = ScriptedClient::new(
            Ok(Operation::pending("operations/1")),
            vec![Err(VeoGenError::Credential("revoked".into())), Ok(done())],
        );
        let err = OperationPoller::new(&client)
            .policy(PollPolicy {
                max_fetch_retries: 5,
                ..PollPolicy::default()
            })
            .run(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, VeoGenError::Credential(_)));
        assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_configured() {
        let client = ScriptedClient::new(Ok(Operation::pending("operations/1")), vec![]);
        let err = OperationPoller::new(&client)
            .policy(PollPolicy {
                timeout: Some(Duration::from_secs(12)),
                ..PollPolicy::default()
            })
            .run(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, VeoGenError::Timeout(t) if t == Duration::from_secs(12)));
        assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 2);
    }

    /// Never answers a status fetch.
    struct StalledClient;

    #[async_trait]
    impl OperationClient for StalledClient {
        async fn submit(&self, _request: &GenerationRequest) -> Result<Operation> {
            Ok(Operation::pending("operations/1"))
        }

        async fn fetch(&self, _operation: &Operation) -> Result<Operation> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(done())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bounds_a_stalled_fetch() {
        let start = Instant::now();
        let err = OperationPoller::new(&StalledClient)
            .policy(PollPolicy {
                timeout: Some(Duration::from_secs(12)),
                ..PollPolicy::default()
            })
            .run(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, VeoGenError::Timeout(t) if t == Duration::from_secs(12)));
        assert_eq!(start.elapsed(), Duration::from_secs(12));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_secs(2),
            max: Duration::from_secs(30),
        };
        assert_eq!(backoff.delay(0), Duration::from_secs(2));
        assert_eq!(backoff.delay(1), Duration::from_secs(4));
        assert_eq!(backoff.delay(3), Duration::from_secs(16));
        assert_eq!(backoff.delay(4), Duration::from_secs(30));
        assert_eq!(backoff.delay(1000), Duration::from_secs(30));
    }

    #[test]
    fn test_default_policy_is_unbounded_fixed_five_seconds() {
        let policy = PollPolicy::default();
        assert_eq!(policy.backoff, Backoff::Fixed(Duration::from_secs(5)));
        assert_eq!(policy.timeout, None);
        assert_eq!(policy.max_fetch_retries, 0);
    }
}
