use pdbw_client::ClientError;
use pdbw_core::CoreError;

/// Errors surfaced by the view models.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The page's capability flags forbid this action.
    #[error("{0} is not permitted on this page")]
    NotPermitted(&'static str),

    #[error("No dialog is open")]
    NoDialog,

    #[error("Unknown row: {0}")]
    UnknownRow(String),

    #[error("Unknown relationship: {0}")]
    UnknownRelationship(String),

    #[error("No record selected")]
    NoSelection,
}

impl ViewError {
    /// Message for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => e.user_message(),
            Self::Core(CoreError::Validation(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type ViewResult<T> = Result<T, ViewError>;
