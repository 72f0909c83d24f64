pub mod api;
pub mod backend;
pub mod config;
pub mod tracking;

pub use api::client::Client;
pub use api::session::Session;
pub use api::status::{GenerationStatus, LogEntry};
pub use config::TrackerConfig;
pub use tracking::{GenerationController, GenerationTracker};

/// Utility function to create a log timestamp (RFC 3339, UTC).
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
