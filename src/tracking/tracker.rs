use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    api::{
        error::{StatusError, TriggerError},
        status::{GenerationStatus, LogEntry},
    },
    tracking::{
        algorithm::{AlgorithmKey, ProgressBoard},
        log_book::LogBook,
        notification::Notification,
        parser::LogParser,
        reducer::{reconcile, reduce, ALGORITHM_COUNT},
    },
};

/// Identifies one generation run. Responses tagged with an older epoch are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Epoch(u64);

impl Epoch {
    fn next(self) -> Epoch {
        Epoch(self.0 + 1)
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client side state of the current generation run.
#[derive(Debug, Default)]
pub struct GenerationTracker {
    parser: LogParser,
    epoch: Epoch,
    is_running: bool,
    is_complete: bool,
    notified: bool,
    success_count: u32,
    completed_algorithm_count: u32,
    board: ProgressBoard,
    log: LogBook,
    current: Option<AlgorithmKey>,
}

/// A copy of the tracker state for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerSnapshot {
    pub epoch: Epoch,
    pub is_running: bool,
    pub is_complete: bool,
    pub success_count: u32,
    pub completed_algorithm_count: u32,
    pub current_algorithm: Option<AlgorithmKey>,
    pub algorithms: ProgressBoard,
    pub logs: Vec<LogEntry>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        GenerationTracker::default()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn board(&self) -> &ProgressBoard {
        &self.board
    }

    pub fn logs(&self) -> &[LogEntry] {
        self.log.entries()
    }

    /// A new run may only start when none is in flight.
    pub fn can_start(&self) -> bool {
        !(self.is_running && !self.is_complete)
    }

    pub fn should_poll(&self, epoch: Epoch) -> bool {
        epoch == self.epoch && self.is_running && !self.is_complete
    }

    /// Forgets the previous run and marks a new one as running.
    pub fn begin(&mut self) -> Epoch {
        let epoch = self.epoch.next();
        self.epoch = epoch;
        self.is_running = true;
        self.is_complete = false;
        self.notified = false;
        self.success_count = 0;
        self.completed_algorithm_count = 0;
        self.board = ProgressBoard::new();
        self.log = LogBook::new();
        self.current = None;
        info!(%epoch, "timetable generation started");
        epoch
    }

    /// Rolls back an optimistic [`begin`](Self::begin) after the trigger failed.
    pub fn abort(&mut self, epoch: Epoch, reason: &TriggerError) -> Option<Notification> {
        if epoch != self.epoch {
            return None;
        }
        self.is_running = false;
        Some(Notification::start_failed(reason))
    }

    /// Stops tracking without starting a new run; in-flight responses become stale.
    pub fn detach(&mut self) {
        self.epoch = self.epoch.next();
        self.is_running = false;
    }

    pub fn record_poll_failure(&self, epoch: Epoch, error: &StatusError) {
        if epoch == self.epoch {
            warn!(%epoch, %error, "failed to fetch generation status");
        }
    }

    /// Merges one status response into the run.
    ///
    /// Returns the completion notification the first time the job is seen complete.
    pub fn apply_status(&mut self, epoch: Epoch, status: &GenerationStatus) -> Option<Notification> {
        if epoch != self.epoch {
            warn!(%epoch, current = %self.epoch, "discarding status of a superseded run");
            return None;
        }
        if !self.is_running && !self.is_complete {
            debug!(%epoch, "discarding status of an inactive run");
            return None;
        }

        // counters are frozen once the run is complete
        if !self.is_complete {
            self.success_count = status.success_count;
            self.completed_algorithm_count = status.algorithms_completed;
        }

        for entry in self.log.absorb(status.log_batch()) {
            let parsed = self.parser.parse(&entry.message, self.current);
            self.current = parsed.current;
            for event in &parsed.events {
                debug!(?event, "generation log event");
                self.board = reduce(&self.board, event);
            }
        }

        if status.completed {
            self.complete()
        } else {
            None
        }
    }

    fn complete(&mut self) -> Option<Notification> {
        if !self.is_complete {
            self.is_complete = true;
            self.is_running = false;
            info!(
                epoch = %self.epoch,
                success_count = self.success_count,
                completed = self.completed_algorithm_count,
                "timetable generation complete"
            );
        }
        self.board = reconcile(&self.board, self.success_count);

        if self.notified {
            return None;
        }
        self.notified = true;
        Some(Notification::generated(self.success_count.min(ALGORITHM_COUNT)))
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            epoch: self.epoch,
            is_running: self.is_running,
            is_complete: self.is_complete,
            success_count: self.success_count,
            completed_algorithm_count: self.completed_algorithm_count,
            current_algorithm: self.current,
            algorithms: self.board.clone(),
            logs: self.log.entries().to_vec(),
        }
    }
}
