/// Domain-level errors raised by pure client logic (parsing, validation,
/// key extraction). Transport failures live in `pdbw_client::ClientError`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(crate::forms::describe_errors(&errors))
    }
}
