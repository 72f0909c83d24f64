use thiserror::Error;

pub type TransportError = anyhow::Error;

/// The decoded body of a non-2xx response.
#[derive(Debug, Clone, Error)]
pub enum RestError {
    #[error("{status}: {message}")]
    Known { status: u16, message: String },
    #[error("Unknown {status} error:\n{body}")]
    Unknown { status: u16, body: String },
}

impl RestError {
    pub fn status(&self) -> u16 {
        match self {
            RestError::Known { status, .. } | RestError::Unknown { status, .. } => *status,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == 401
    }
}

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("a timetable generation is already in progress")]
    AlreadyRunning,
    #[error("the server rejected the session credentials")]
    Unauthorized,
    #[error("the server rejected the generation request: {0}")]
    Rejected(RestError),
    #[error("an error ocurred while talking to the server: {0:?}")]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("the server rejected the session credentials")]
    Unauthorized,
    #[error("the server rejected the status request: {0}")]
    Rejected(RestError),
    #[error("an error ocurred while talking to the server: {0:?}")]
    Transport(#[from] TransportError),
}
