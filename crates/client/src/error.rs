use pdbw_core::CoreError;

/// Errors from the HTTP client layer and the session store.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A domain-level error (validation, missing key) raised before any
    /// request was sent.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response was JSON but not in any shape the client understands.
    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),

    /// Reading or writing the persisted session store failed.
    #[error("Session storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Short message suitable for a user-facing notification.
    ///
    /// Prefers the backend's `{"error": ...}` or `{"message": ...}` body
    /// when present.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { status, body } => serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| {
                    ["error", "message"]
                        .iter()
                        .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
                })
                .unwrap_or_else(|| format!("Request failed with status {status}")),
            Self::Core(CoreError::Validation(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;
