use std::{sync::Arc, time::Duration};

use anyhow::Context;
use parking_lot::Mutex;
use tracing::{error, info};

use crate::{
    api::{
        client::Client,
        error::{StatusError, TriggerError},
    },
    tracking::{
        notification::NotificationSink,
        poller::{StatusPoller, DEFAULT_POLL_INTERVAL},
        tracker::{Epoch, GenerationTracker, TrackerSnapshot},
    },
};

/// Starts generation jobs and follows them until they complete.
///
/// Dropping the controller stops polling.
pub struct GenerationController<C> {
    client: Arc<Mutex<C>>,
    tracker: Arc<Mutex<GenerationTracker>>,
    sink: Arc<dyn NotificationSink>,
    poll_interval: Duration,
    poller: Option<StatusPoller>,
}

impl<C> GenerationController<C>
where
    C: Client + Send + 'static,
{
    pub fn new(client: C, sink: impl NotificationSink + 'static) -> Self {
        GenerationController {
            client: Arc::new(Mutex::new(client)),
            tracker: Arc::new(Mutex::new(GenerationTracker::new())),
            sink: Arc::new(sink),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poller: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn can_start(&self) -> bool {
        self.tracker.lock().can_start()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().map_or(false, |poller| !poller.is_finished())
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        self.tracker.lock().snapshot()
    }

    /// Triggers a new generation job and starts polling its status.
    ///
    /// On failure the run is rolled back and an error notification is sent.
    pub fn start(&mut self) -> Result<Epoch, TriggerError> {
        let epoch = {
            let mut tracker = self.tracker.lock();
            if !tracker.can_start() {
                return Err(TriggerError::AlreadyRunning);
            }
            tracker.begin()
        };
        self.poller = None;

        let started = self.client.lock().start_generation();
        let started = started.and_then(|()| {
            self.spawn_poller(epoch)
                .context("failed to spawn the status poller")
                .map_err(TriggerError::from)
        });
        if let Err(error) = started {
            error!(%epoch, %error, "failed to start timetable generation");
            let notification = self.tracker.lock().abort(epoch, &error);
            if let Some(notification) = notification {
                self.sink.notify(notification);
            }
            return Err(error);
        }
        Ok(epoch)
    }

    /// Checks once whether the server is already generating, and follows that job if so.
    ///
    /// This is how a fresh controller picks a job back up after a restart.
    pub fn attach(&mut self) -> Result<Option<Epoch>, StatusError> {
        if !self.can_start() {
            return Ok(None);
        }
        let status = self.client.lock().generation_status()?;
        if !status.running || status.completed {
            return Ok(None);
        }

        let epoch = {
            let mut tracker = self.tracker.lock();
            let epoch = tracker.begin();
            tracker.apply_status(epoch, &status);
            epoch
        };
        info!(%epoch, "attached to a running timetable generation");
        if let Err(error) = self.spawn_poller(epoch) {
            self.tracker.lock().detach();
            return Err(StatusError::Transport(
                anyhow::Error::new(error).context("failed to spawn the status poller"),
            ));
        }
        Ok(Some(epoch))
    }

    /// Stops following the current run. Responses still in flight are discarded.
    pub fn stop(&mut self) {
        self.tracker.lock().detach();
        self.poller = None;
    }

    fn spawn_poller(&mut self, epoch: Epoch) -> std::io::Result<()> {
        let poller = StatusPoller::spawn(
            self.client.clone(),
            self.tracker.clone(),
            self.sink.clone(),
            epoch,
            self.poll_interval,
        )?;
        self.poller = Some(poller);
        Ok(())
    }
}

impl<C> Drop for GenerationController<C> {
    fn drop(&mut self) {
        self.tracker.lock().detach();
    }
}
