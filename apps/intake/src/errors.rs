use thiserror::Error;

/// Client-side error type.
/// Every variant is caught at the action boundary and turned into a display message;
/// none of them is allowed to take a view down.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The exchange never completed (DNS, connect, aborted transfer, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("{path} failed: {status} {body}")]
    Http {
        status: u16,
        path: String,
        body: String,
    },

    /// A client-side precondition failed before any network call was made.
    #[error("{0}")]
    Validation(String),

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Message assigned to a `Failed` action state.
    /// Validation messages are shown verbatim; everything else is prefixed.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            other => format!("Failed: {other}"),
        }
    }
}

/// Body decode failures are `Decode`; everything else reqwest reports is `Network`.
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}
