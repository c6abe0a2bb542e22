use thiserror::Error;

use crate::structs::{BookingId, RoomId};

#[derive(Error, Debug)]
pub enum FrontDeskError {
    /// The remote service answered, but not with success.
    #[error("service error (status {:?}): {}", .status, .message.as_deref().unwrap_or("no message"))]
    Service {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("booking {0} not found")]
    BookingNotFound(BookingId),

    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("a check-in is already being processed")]
    Busy,

    #[error("permission denied: {0}")]
    Forbidden(&'static str),

    #[error("unreadable role id {0:?}")]
    InvalidRole(String),

    #[error("no delete is waiting for confirmation")]
    NothingToConfirm,

    #[error("invalid config: {0}")]
    Config(String),

    #[error("invalid config file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FrontDeskError {
    /// Build a service failure from the remote's optional message.
    pub fn service(status: Option<u16>, message: Option<String>) -> Self {
        FrontDeskError::Service { status, message }
    }

    /// Human readable message carried by the failure, if any. Stores fall
    /// back to their own wording when this is `None`.
    pub fn message(&self) -> Option<String> {
        match self {
            FrontDeskError::Service { message, .. } => {
                message.clone().filter(|m| !m.trim().is_empty())
            }
            other => Some(other.to_string()),
        }
    }
}
