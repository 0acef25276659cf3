//! Category content loader
//!
//! Drives a [`LoadMachine`] against a live [`InvestmentSource`]. Network calls
//! and timers run as tokio tasks that report back over a channel; all state
//! mutation happens on the caller's task in [`CategoryContentLoader::handle`].
//! Must be used from inside a tokio runtime.

use crate::client::InvestmentSource;
use crate::error::FetchError;
use crate::machine::{Command, Event, LoadMachine, RetryPolicy};
use crate::render::{render, RenderOptions, View};
use crate::types::{CategorySelector, InvestmentsResponse, LoadState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct CategoryContentLoader {
    machine: LoadMachine,
    source: Arc<dyn InvestmentSource>,
    options: RenderOptions,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    // Covers the in-flight request and every pending timer of the current cycle
    cancel_token: CancellationToken,
}

impl CategoryContentLoader {
    pub fn new(source: Arc<dyn InvestmentSource>, policy: RetryPolicy, options: RenderOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            machine: LoadMachine::new(policy),
            source,
            options,
            events_tx,
            events_rx,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &LoadState {
        self.machine.state()
    }

    pub fn active_category(&self) -> Option<&CategorySelector> {
        self.machine.active_category()
    }

    pub fn view(&self) -> View {
        render(self.machine.state(), &self.options)
    }

    pub fn html(&self) -> String {
        self.view().to_html(&self.options)
    }

    /// Switch to `category`. Returns false when it is already active.
    pub fn select_category(&mut self, category: impl Into<CategorySelector>) -> bool {
        let category = category.into();
        debug!(category = %category, "Category selected");
        self.handle(Event::Select(category))
    }

    /// Manual retry: refetch the active category with a fresh retry budget.
    pub fn retry(&mut self) -> bool {
        debug!("Manual retry requested");
        self.handle(Event::ManualRetry)
    }

    /// Wait for the next network result or timer expiry. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events_rx.recv().await
    }

    /// Feed one event through the machine. Returns false if it was stale or a no-op.
    pub fn handle(&mut self, event: Event) -> bool {
        let failure = match &event {
            Event::FetchFailed { error, .. } => Some(error.clone()),
            _ => None,
        };

        let Some(commands) = self.machine.apply(event) else {
            return false;
        };

        if let Some(error) = failure {
            self.log_failure(&error);
        }
        self.log_state();

        for command in commands {
            self.execute(command);
        }
        true
    }

    /// Process events until one is accepted, then return the resulting state.
    pub async fn step(&mut self) -> &LoadState {
        while let Some(event) = self.events_rx.recv().await {
            if self.handle(event) {
                break;
            }
        }
        self.machine.state()
    }

    /// Step until the loader reaches Idle, Success or Error.
    pub async fn settle(&mut self) -> &LoadState {
        while !self.machine.state().is_settled() {
            self.step().await;
        }
        self.machine.state()
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::CancelPending => {
                self.cancel_token.cancel();
                self.cancel_token = CancellationToken::new();
            }
            Command::Fetch {
                generation,
                category,
            } => self.spawn_fetch(generation, category),
            Command::ScheduleRetry { generation, delay } => {
                self.spawn_timer(delay, Event::RetryDelayElapsed { generation })
            }
            Command::ScheduleRender {
                generation,
                delay,
                items,
            } => self.spawn_timer(delay, Event::DisplayDelayElapsed { generation, items }),
        }
    }

    fn spawn_fetch(&self, generation: u64, category: CategorySelector) {
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        let token = self.cancel_token.clone();
        let timeout = self.machine.policy().timeout;

        debug!(generation, category = %category, "Fetching investments");
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "Investments request aborted");
                }
                result = tokio::time::timeout(timeout, source.fetch(&category)) => {
                    let result = result.unwrap_or(Err(FetchError::Timeout(timeout)));
                    let event = match result.and_then(InvestmentsResponse::into_items) {
                        Ok(items) => Event::FetchSucceeded { generation, items },
                        Err(error) => Event::FetchFailed { generation, error },
                    };
                    let _ = tx.send(event);
                }
            }
        });
    }

    fn spawn_timer(&self, delay: Duration, event: Event) {
        let tx = self.events_tx.clone();
        let token = self.cancel_token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(event);
                }
            }
        });
    }

    fn log_failure(&self, error: &FetchError) {
        let category = self
            .machine
            .active_category()
            .map(ToString::to_string)
            .unwrap_or_default();
        match error {
            FetchError::InvalidResponse(reason) => {
                warn!(category = %category, reason = %reason, "Invalid investments response format")
            }
            _ => warn!(category = %category, error = %error, "Investments request failed"),
        }
    }

    fn log_state(&self) {
        match self.machine.state() {
            LoadState::Retrying {
                attempt,
                max_attempts,
            } => {
                let delay = self.machine.policy().retry_delay;
                warn!(attempt, max_attempts, delay = ?delay, "Scheduling automatic retry")
            }
            LoadState::Error {
                attempt, failure, ..
            } => warn!(retries = attempt, error = %failure, "Giving up on investments, manual retry required"),
            LoadState::Success(items) => info!(count = items.len(), "Investments rendered"),
            LoadState::Loading { attempt, .. } => debug!(attempt, "Loading investments"),
            LoadState::Idle => {}
        }
    }
}

impl Drop for CategoryContentLoader {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
