use std::{
    io,
    sync::{
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    api::client::Client,
    tracking::{
        notification::NotificationSink,
        tracker::{Epoch, GenerationTracker},
    },
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Polls the generation status of one run on a background thread.
///
/// The first fetch happens immediately, later ones on a fixed cadence. Only
/// one fetch is ever outstanding: a slow fetch delays the next tick and the
/// ticks it overran are skipped. Polling ends once the tracker no longer
/// expects responses for this run, or when the poller is cancelled or dropped.
/// A fetch still in flight at that point is not interrupted; its response is
/// discarded by the tracker's epoch check.
pub struct StatusPoller {
    epoch: Epoch,
    cancel: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

struct PollLoop<C> {
    client: Arc<Mutex<C>>,
    tracker: Arc<Mutex<GenerationTracker>>,
    sink: Arc<dyn NotificationSink>,
    epoch: Epoch,
    interval: Duration,
}

impl StatusPoller {
    pub fn spawn<C>(
        client: Arc<Mutex<C>>,
        tracker: Arc<Mutex<GenerationTracker>>,
        sink: Arc<dyn NotificationSink>,
        epoch: Epoch,
        interval: Duration,
    ) -> io::Result<Self>
    where
        C: Client + Send + 'static,
    {
        let (cancel, cancelled) = mpsc::channel();
        let poll_loop = PollLoop {
            client,
            tracker,
            sink,
            epoch,
            interval,
        };
        let handle = thread::Builder::new()
            .name(format!("generation-poller-{}", epoch))
            .spawn(move || poll_loop.run(cancelled))?;
        Ok(StatusPoller {
            epoch,
            cancel: Some(cancel),
            handle: Some(handle),
        })
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Wakes the poller and asks it to stop, without waiting for it.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Waits until the poller has stopped on its own or after [`cancel`](Self::cancel).
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<C: Client> PollLoop<C> {
    fn run(self, cancelled: mpsc::Receiver<()>) {
        debug!(epoch = %self.epoch, interval = ?self.interval, "status poller started");
        let mut next_tick = Instant::now();
        while self.tick() {
            next_tick += self.interval;
            let now = Instant::now();
            while next_tick <= now {
                next_tick += self.interval;
            }
            match cancelled.recv_timeout(next_tick - now) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!(epoch = %self.epoch, "status poller stopped");
    }

    /// One fetch, returns whether polling should go on.
    fn tick(&self) -> bool {
        if !self.tracker.lock().should_poll(self.epoch) {
            return false;
        }
        let response = self.client.lock().generation_status();

        let mut tracker = self.tracker.lock();
        let notification = match response {
            Ok(status) => tracker.apply_status(self.epoch, &status),
            Err(error) => {
                tracker.record_poll_failure(self.epoch, &error);
                None
            }
        };
        let keep_polling = tracker.should_poll(self.epoch);
        drop(tracker);

        if let Some(notification) = notification {
            self.sink.notify(notification);
        }
        keep_polling
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{mpsc, Arc},
        thread,
        time::{Duration, Instant},
    };

    use parking_lot::Mutex;

    use super::StatusPoller;
    use crate::{
        api::{
            client::Client,
            error::{StatusError, TriggerError},
            status::{GenerationStatus, LogEntry},
        },
        tracking::{
            algorithm::{AlgorithmKey, AlgorithmStatus},
            notification::{Notification, NotificationSink},
            tracker::GenerationTracker,
        },
    };

    /// Replays scripted responses, repeating the last one forever.
    struct Script {
        responses: VecDeque<Result<GenerationStatus, &'static str>>,
        fetches: usize,
    }

    impl Client for Script {
        fn start_generation(&mut self) -> Result<(), TriggerError> {
            Ok(())
        }

        fn generation_status(&mut self) -> Result<GenerationStatus, StatusError> {
            self.fetches += 1;
            let response = if self.responses.len() > 1 {
                self.responses.pop_front()
            } else {
                self.responses.front().cloned()
            };
            match response {
                Some(Ok(status)) => Ok(status),
                Some(Err(message)) => Err(StatusError::Transport(anyhow::anyhow!(message))),
                None => Ok(GenerationStatus::default()),
            }
        }
    }

    /// Takes longer than the poll interval for every fetch, completing on the last one.
    struct Sluggish {
        latency: Duration,
        remaining: usize,
        started: Vec<Instant>,
    }

    impl Client for Sluggish {
        fn start_generation(&mut self) -> Result<(), TriggerError> {
            Ok(())
        }

        fn generation_status(&mut self) -> Result<GenerationStatus, StatusError> {
            self.started.push(Instant::now());
            thread::sleep(self.latency);
            self.remaining = self.remaining.saturating_sub(1);
            Ok(status(self.remaining == 0, 3, &[]))
        }
    }

    fn status(completed: bool, success_count: u32, logs: &[&str]) -> GenerationStatus {
        GenerationStatus {
            completed,
            success_count,
            logs: Some(logs.iter().map(|line| LogEntry::new(*line)).collect()),
            ..GenerationStatus::default()
        }
    }

    fn channel_sink() -> (Arc<dyn NotificationSink>, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::sync_channel(16);
        let sink: Arc<dyn NotificationSink> = Arc::new(move |notification: Notification| {
            let _ = sender.send(notification);
        });
        (sink, receiver)
    }

    #[test]
    fn polls_until_complete_and_survives_failures() {
        let client = Arc::new(Mutex::new(Script {
            responses: vec![
                Ok(status(false, 0, &["Starting Genetic Algorithm"])),
                Err("connection reset"),
                Ok(status(false, 0, &["Starting Genetic Algorithm", "GA algorithm completed"])),
                Ok(status(true, 1, &[])),
            ]
            .into(),
            fetches: 0,
        }));
        let tracker = Arc::new(Mutex::new(GenerationTracker::new()));
        let epoch = tracker.lock().begin();
        let (sink, notifications) = channel_sink();

        let poller = StatusPoller::spawn(client.clone(), tracker.clone(), sink, epoch, Duration::from_millis(5)).unwrap();
        let notification = notifications.recv_timeout(Duration::from_secs(5)).unwrap();
        poller.join();

        assert!(notification.message.contains("1 of 3"));
        assert_eq!(client.lock().fetches, 4);
        let tracker = tracker.lock();
        assert!(tracker.is_complete());
        assert_eq!(tracker.board().status(AlgorithmKey::Ga), AlgorithmStatus::Success);
        assert_eq!(tracker.board().status(AlgorithmKey::Co), AlgorithmStatus::Failed);
        assert!(notifications.try_recv().is_err());
    }

    #[test]
    fn cancel_wakes_the_poller() {
        let client = Arc::new(Mutex::new(Script {
            responses: vec![Ok(status(false, 0, &[]))].into(),
            fetches: 0,
        }));
        let tracker = Arc::new(Mutex::new(GenerationTracker::new()));
        let epoch = tracker.lock().begin();
        let (sink, _notifications) = channel_sink();

        let mut poller = StatusPoller::spawn(client.clone(), tracker.clone(), sink, epoch, Duration::from_secs(3600)).unwrap();
        while client.lock().fetches == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        poller.cancel();
        poller.join();
        assert_eq!(client.lock().fetches, 1);
        assert!(tracker.lock().is_running());
    }

    #[test]
    fn superseded_run_stops_polling() {
        let client = Arc::new(Mutex::new(Script {
            responses: vec![Ok(status(false, 0, &[]))].into(),
            fetches: 0,
        }));
        let tracker = Arc::new(Mutex::new(GenerationTracker::new()));
        let stale = tracker.lock().begin();
        tracker.lock().begin();
        let (sink, _notifications) = channel_sink();

        let poller = StatusPoller::spawn(client.clone(), tracker, sink, stale, Duration::from_millis(1)).unwrap();
        poller.join();
        assert_eq!(client.lock().fetches, 0);
    }

    #[test]
    fn slow_fetches_never_overlap() {
        let latency = Duration::from_millis(50);
        let client = Arc::new(Mutex::new(Sluggish {
            latency,
            remaining: 4,
            started: Vec::new(),
        }));
        let tracker = Arc::new(Mutex::new(GenerationTracker::new()));
        let epoch = tracker.lock().begin();
        let (sink, notifications) = channel_sink();

        let poller = StatusPoller::spawn(client.clone(), tracker.clone(), sink, epoch, Duration::from_millis(20)).unwrap();
        notifications.recv_timeout(Duration::from_secs(5)).unwrap();
        poller.join();

        let started = client.lock().started.clone();
        assert_eq!(started.len(), 4);
        for pair in started.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= latency, "fetches started {:?} apart", gap);
        }
        assert!(tracker.lock().is_complete());
    }
}
