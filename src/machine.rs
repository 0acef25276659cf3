//! Load state machine
//!
//! Pure transition logic for one category loader. The machine never touches
//! the network or a clock; it consumes [`Event`]s and answers with the
//! [`Command`]s the driver must execute. Every network result and timer is
//! tagged with the generation it was issued under, and anything carrying an
//! older generation is dropped, so the most recent selection always wins.

use crate::constants::*;
use crate::error::FetchError;
use crate::types::{CategorySelector, Investment, LoadState};
use std::time::Duration;

/// Timing and retry budget for the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Minimum time between a successful response and its render
    pub min_display: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            min_display: Duration::from_millis(DEFAULT_MIN_DISPLAY_MS),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Inputs to the machine: user actions, network callbacks and timer expiries
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Select(CategorySelector),
    ManualRetry,
    FetchSucceeded { generation: u64, items: Vec<Investment> },
    FetchFailed { generation: u64, error: FetchError },
    RetryDelayElapsed { generation: u64 },
    DisplayDelayElapsed { generation: u64, items: Vec<Investment> },
}

/// Side effects the driver must perform
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Abort the in-flight request and neutralize pending timers
    CancelPending,
    Fetch {
        generation: u64,
        category: CategorySelector,
    },
    ScheduleRetry { generation: u64, delay: Duration },
    ScheduleRender {
        generation: u64,
        delay: Duration,
        items: Vec<Investment>,
    },
}

#[derive(Debug, Clone)]
pub struct LoadMachine {
    policy: RetryPolicy,
    state: LoadState,
    active: Option<CategorySelector>,
    retries: u32,
    generation: u64,
}

impl LoadMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: LoadState::Idle,
            active: None,
            retries: 0,
            generation: 0,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn active_category(&self) -> Option<&CategorySelector> {
        self.active.as_ref()
    }

    /// Automatic retries used for the active category
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Apply one event. `None` means it was ignored and nothing changed.
    pub fn apply(&mut self, event: Event) -> Option<Vec<Command>> {
        match event {
            Event::Select(category) => {
                if self.active.as_ref() == Some(&category) {
                    return None;
                }
                self.active = Some(category);
                Some(self.restart())
            }
            Event::ManualRetry => {
                self.active.as_ref()?;
                Some(self.restart())
            }
            Event::FetchSucceeded { generation, items } => {
                if !self.is_current(generation) || !matches!(self.state, LoadState::Loading { .. }) {
                    return None;
                }
                Some(vec![Command::ScheduleRender {
                    generation,
                    delay: self.policy.min_display,
                    items,
                }])
            }
            Event::FetchFailed { generation, error } => {
                if !self.is_current(generation) || !matches!(self.state, LoadState::Loading { .. }) {
                    return None;
                }
                if error.is_retryable() && self.retries < self.policy.max_retries {
                    self.retries += 1;
                    self.state = LoadState::Retrying {
                        attempt: self.retries,
                        max_attempts: self.policy.max_retries,
                    };
                    Some(vec![Command::ScheduleRetry {
                        generation,
                        delay: self.policy.retry_delay,
                    }])
                } else {
                    self.state = LoadState::Error {
                        attempt: self.retries,
                        max_attempts: self.policy.max_retries,
                        failure: error,
                    };
                    Some(Vec::new())
                }
            }
            Event::RetryDelayElapsed { generation } => {
                if !self.is_current(generation) || !matches!(self.state, LoadState::Retrying { .. }) {
                    return None;
                }
                let category = self.active.clone()?;
                self.generation += 1;
                self.state = LoadState::Loading {
                    attempt: self.retries,
                    max_attempts: self.policy.max_retries,
                };
                Some(vec![Command::Fetch {
                    generation: self.generation,
                    category,
                }])
            }
            Event::DisplayDelayElapsed { generation, items } => {
                if !self.is_current(generation) || !matches!(self.state, LoadState::Loading { .. }) {
                    return None;
                }
                self.retries = 0;
                self.state = LoadState::Success(items);
                Some(Vec::new())
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Fresh fetch for the active category with a full retry budget
    fn restart(&mut self) -> Vec<Command> {
        self.generation += 1;
        self.retries = 0;
        self.state = LoadState::Loading {
            attempt: 0,
            max_attempts: self.policy.max_retries,
        };
        let mut commands = vec![Command::CancelPending];
        if let Some(category) = self.active.clone() {
            commands.push(Command::Fetch {
                generation: self.generation,
                category,
            });
        }
        commands
    }
}
