//! Bounded-parallelism batch executor
//!
//! Configs are dispatched in submission order onto at most `max_parallel`
//! concurrently running handlers. A semaphore permit is taken before a config
//! is spawned and released only after its result (and any fail-fast signal)
//! has been recorded, so the next dispatch decision always sees it.

use super::options::ExecutorOptions;
use super::result::{BatchResult, ConfigResult};
use crate::adapters::remote::RateLimitedClient;
use crate::domain::config_file::ConfigFile;
use crate::domain::errors::ExfigError;
use crate::domain::events::{BatchEvent, EventSink};
use chrono::Utc;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    Dispatching,
    Draining,
    Done,
}

/// Dispatches configs under a parallelism bound and failure policy
pub struct BatchExecutor {
    options: ExecutorOptions,
    events: Arc<dyn EventSink>,
    state: Mutex<ExecutorState>,
}

impl BatchExecutor {
    pub fn new(options: ExecutorOptions, events: Arc<dyn EventSink>) -> Self {
        Self {
            options,
            events,
            state: Mutex::new(ExecutorState::Idle),
        }
    }

    pub fn options(&self) -> ExecutorOptions {
        self.options
    }

    pub fn state(&self) -> ExecutorState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_state(&self, next: ExecutorState) {
        match self.state.lock() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Runs `handler` once per config and collects the results
    ///
    /// Never fails: handler errors and panics become
    /// [`ConfigResult::Failure`]. With fail-fast, configs not yet started when
    /// the first failure is recorded are listed in
    /// [`BatchResult::not_dispatched`]; running ones finish normally.
    pub async fn execute<F, Fut>(&self, configs: Vec<ConfigFile>, handler: F) -> BatchResult
    where
        F: Fn(ConfigFile) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ConfigResult> + Send + 'static,
    {
        let start_time = Utc::now();
        let total = configs.len();
        self.set_state(ExecutorState::Dispatching);

        tracing::info!(
            configs = total,
            max_parallel = self.options.max_parallel,
            fail_fast = self.options.fail_fast,
            "Starting batch"
        );

        let handler = Arc::new(handler);
        let semaphore = Arc::new(Semaphore::new(self.options.max_parallel));
        let stop = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();
        let mut not_dispatched = Vec::new();

        let mut pending = configs.into_iter().enumerate();
        while let Some((index, config)) = pending.next() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("Dispatch semaphore closed unexpectedly");
                    not_dispatched.push(config);
                    not_dispatched.extend(pending.by_ref().map(|(_, c)| c));
                    break;
                }
            };

            if self.options.fail_fast && stop.load(Ordering::SeqCst) {
                not_dispatched.push(config);
                not_dispatched.extend(pending.by_ref().map(|(_, c)| c));
                break;
            }

            let handler = handler.clone();
            let stop = stop.clone();
            let events = self.events.clone();
            let fail_fast = self.options.fail_fast;

            tasks.spawn(async move {
                let name = config.name.clone();
                let result = match AssertUnwindSafe(handler(config.clone())).catch_unwind().await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::error!(config = %name, "Config handler panicked");
                        ConfigResult::failure(
                            config,
                            ExfigError::Export(format!("export of '{name}' panicked")),
                        )
                    }
                };

                // Record the failure before the permit frees the next slot
                if !result.is_success() && !stop.swap(true, Ordering::SeqCst) && fail_fast {
                    tracing::warn!(config = %name, "Fail-fast triggered, no further configs will start");
                    events.emit(BatchEvent::FailFastTriggered { config: name });
                }
                drop(permit);

                (index, result)
            });
        }

        self.set_state(ExecutorState::Draining);

        let mut collected = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => collected.push(entry),
                Err(e) => tracing::error!(error = %e, "Config task failed to complete"),
            }
        }
        collected.sort_by_key(|(index, _)| *index);

        self.set_state(ExecutorState::Done);

        let result = BatchResult::new(
            collected.into_iter().map(|(_, result)| result).collect(),
            not_dispatched,
            start_time,
            Utc::now(),
        );

        tracing::info!(
            succeeded = result.success_count(),
            failed = result.failure_count(),
            not_dispatched = result.not_dispatched.len(),
            duration_ms = result.duration.as_millis() as u64,
            "Batch finished"
        );

        result
    }

    /// Like [`execute`](Self::execute), handing every handler the shared
    /// rate-limited client
    pub async fn execute_with_rate_limiting<F, Fut>(
        &self,
        configs: Vec<ConfigFile>,
        client: Arc<RateLimitedClient>,
        handler: F,
    ) -> BatchResult
    where
        F: Fn(ConfigFile, Arc<RateLimitedClient>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ConfigResult> + Send + 'static,
    {
        self.execute(configs, move |config| handler(config, client.clone()))
            .await
    }
}
