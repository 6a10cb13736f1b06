use std::io;

use thiserror::Error;

use crate::domain::state::TicketState;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("no handler registered for '{0}'")]
    CommandNotFound(String),
    #[error("no ticket is registered for this channel")]
    TicketNotFound,
    #[error("a ticket is already registered for this channel")]
    TicketExists,
    #[error("transition from {from:?} to {to:?} is not allowed")]
    InvalidTransition { from: TicketState, to: TicketState },
    #[error("ticket in state {state:?} cannot be deleted; close it first")]
    NotDeletable { state: TicketState },
    #[error("permission denied")]
    PermissionDenied,
    #[error("channel administration error: {0}")]
    ChannelAdmin(String),
    #[error("messaging error: {0}")]
    Messaging(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
