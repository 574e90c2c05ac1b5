//! Fan-in point for probe outcomes.
//!
//! A [`ResultCollector`] is sized to the number of targets up front. Each
//! worker receives one [`Publisher`], which can publish exactly once; the
//! consuming side iterates a [`Drain`] that closes as soon as the last
//! expected outcome has been handed out, or when the run is cancelled.

use crate::cancel::{CancellationToken, HookId};
use fanping_model::{ProbeOutcome, RunState};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use thiserror::Error;
use tracing::warn;

pub const UNREPORTED_MESSAGE: &str = "probe worker exited without reporting";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectorError {
    #[error("collector capacity of {capacity} outcomes exhausted")]
    CapacityExhausted { capacity: usize },
}

struct Buffer {
    outcomes: VecDeque<ProbeOutcome>,
    published: usize,
    aborted: bool,
}

struct Shared {
    capacity: usize,
    buffer: Mutex<Buffer>,
    ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, outcome: ProbeOutcome) -> Result<(), CollectorError> {
        let mut buffer = self.lock();
        if buffer.published >= self.capacity {
            return Err(CollectorError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        buffer.published += 1;
        buffer.outcomes.push_back(outcome);
        drop(buffer);
        self.ready.notify_one();
        Ok(())
    }

    fn abort(&self) {
        self.lock().aborted = true;
        self.ready.notify_all();
    }
}

#[derive(Debug)]
pub struct ResultCollector {
    shared: Arc<Shared>,
    issued: usize,
}

impl ResultCollector {
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                capacity,
                buffer: Mutex::new(Buffer {
                    outcomes: VecDeque::with_capacity(capacity),
                    published: 0,
                    aborted: false,
                }),
                ready: Condvar::new(),
            }),
            issued: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Hands out the publish handle for one worker. At most `capacity`
    /// handles exist per collector.
    pub fn publisher(&mut self, target: &str) -> Result<Publisher, CollectorError> {
        if self.issued >= self.shared.capacity {
            return Err(CollectorError::CapacityExhausted {
                capacity: self.shared.capacity,
            });
        }
        self.issued += 1;
        Ok(Publisher {
            target: target.to_string(),
            shared: Arc::clone(&self.shared),
            published: false,
        })
    }

    /// Turns the collector into its consuming end. Cancelling `cancel` wakes
    /// a blocked drain and ends it once already-arrived outcomes are read.
    pub fn drain(self, cancel: &CancellationToken) -> Drain {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let hook = cancel.on_cancel(move || {
            if let Some(shared) = weak.upgrade() {
                shared.abort();
            }
        });

        Drain {
            shared: self.shared,
            cancel: cancel.clone(),
            hook,
            consumed: 0,
            state: RunState::Running,
        }
    }
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buffer = self.lock();
        f.debug_struct("Shared")
            .field("capacity", &self.capacity)
            .field("published", &buffer.published)
            .field("aborted", &buffer.aborted)
            .finish()
    }
}

/// One worker's single-use handle into the collector.
///
/// Dropping it without publishing records a failure for its target, so a
/// worker that panics or never starts still counts toward completion.
#[derive(Debug)]
pub struct Publisher {
    target: String,
    shared: Arc<Shared>,
    published: bool,
}

impl Publisher {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn publish(mut self, outcome: ProbeOutcome) -> Result<(), CollectorError> {
        self.published = true;
        self.shared.publish(outcome)
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        warn!(addr = %self.target, "{UNREPORTED_MESSAGE}");
        let outcome = ProbeOutcome::failure(self.target.clone(), UNREPORTED_MESSAGE);
        if let Err(err) = self.shared.publish(outcome) {
            warn!(addr = %self.target, "dropped outcome: {err}");
        }
    }
}

/// Blocking iterator over outcomes in arrival order.
#[derive(Debug)]
pub struct Drain {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    hook: Option<HookId>,
    consumed: usize,
    state: RunState,
}

impl Drain {
    /// `Running` while outcomes may still arrive, then `Completed` or
    /// `Aborted`.
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn expected(&self) -> usize {
        self.shared.capacity
    }
}

impl Drop for Drain {
    fn drop(&mut self) {
        if let Some(id) = self.hook.take() {
            self.cancel.remove_hook(id);
        }
    }
}

impl Iterator for Drain {
    type Item = ProbeOutcome;

    fn next(&mut self) -> Option<ProbeOutcome> {
        if self.state != RunState::Running {
            return None;
        }

        let mut buffer = self.shared.lock();
        loop {
            if self.consumed == self.shared.capacity {
                self.state = RunState::Completed;
                return None;
            }
            if let Some(outcome) = buffer.outcomes.pop_front() {
                self.consumed += 1;
                return Some(outcome);
            }
            if buffer.aborted {
                self.state = RunState::Aborted;
                return None;
            }
            buffer = self
                .shared
                .ready
                .wait(buffer)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
