pub mod algorithm;
pub mod controller;
pub mod log_book;
pub mod notification;
pub mod parser;
pub mod poller;
pub mod reducer;
pub mod tracker;

pub use algorithm::{AlgorithmKey, AlgorithmProgress, AlgorithmStatus, ProgressBoard};
pub use controller::GenerationController;
pub use notification::{Notification, NotificationLevel, NotificationSink};
pub use tracker::{Epoch, GenerationTracker, TrackerSnapshot};
