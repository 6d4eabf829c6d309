/// Error taxonomy for workflow execution
///
/// Node executors never recover from a failure: they tag the node and hand the
/// error back to the orchestrator, which turns it into a terminal log entry.
/// The server and registry layers keep using `anyhow` like the rest of the crate.

use thiserror::Error;

/// Failure raised while executing a single workflow node
#[derive(Debug, Error)]
pub enum NodeError {
    /// Node is missing a required setting (e.g. a data source without a file)
    #[error("{0}")]
    Configuration(String),

    /// Node did not receive the upstream payload it needs
    #[error("{0}")]
    Input(String),

    /// Training API call failed at the transport or server level
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Run was cancelled while this node was in flight
    #[error("Workflow execution cancelled")]
    Cancelled,
}

impl NodeError {
    /// Stable error code for log consumers
    pub fn code(&self) -> &'static str {
        match self {
            NodeError::Configuration(_) => "CONFIGURATION_ERROR",
            NodeError::Input(_) => "INPUT_ERROR",
            NodeError::Api(e) => e.code(),
            NodeError::Cancelled => "CANCELLED",
        }
    }
}

/// Failure talking to the remote training API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never produced a response (connection refused, DNS, reset...)
    #[error("Cannot reach server: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status; message comes from its `error` field
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Server answered 2xx but the body was not what we expected
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "TRANSPORT_ERROR",
            ApiError::Server { .. } => "SERVER_ERROR",
            ApiError::InvalidResponse(_) => "INVALID_RESPONSE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_shown_verbatim() {
        let err = NodeError::Configuration("No file uploaded".to_string());
        assert_eq!(err.to_string(), "No file uploaded");
        assert_eq!(err.code(), "CONFIGURATION_ERROR");

        let err = NodeError::from(ApiError::Server {
            status: 400,
            message: "Unknown model: foo".to_string(),
        });
        assert_eq!(err.to_string(), "Unknown model: foo");
        assert_eq!(err.code(), "SERVER_ERROR");
    }
}
