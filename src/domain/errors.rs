use std::fmt;

// Fallback shown when a failed call carries no usable message at all.
pub const UNKNOWN_ERROR: &str = "Unknown Error";

// Structural token decode failures. These are handled locally during
// rehydration and never surfaced to callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenDecodeError {
    NotAToken,
    InvalidEncoding,
    InvalidClaims,
    MissingExpiry,
}

impl fmt::Display for TokenDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenDecodeError::NotAToken => {
                write!(f, "token is not three dot-separated segments")
            }
            TokenDecodeError::InvalidEncoding => {
                write!(f, "token claims segment is not valid base64")
            }
            TokenDecodeError::InvalidClaims => {
                write!(f, "token claims segment is not a valid claims object")
            }
            TokenDecodeError::MissingExpiry => write!(f, "token carries no expiry claim"),
        }
    }
}

impl std::error::Error for TokenDecodeError {}

// Failure of an outbound call, as reported by the transport collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiFailure {
    // The server answered with a non-success status, possibly carrying a
    // structured message in the response body.
    Upstream { status: u16, message: Option<String> },
    // The call never produced a server response.
    Transport(String),
}

impl ApiFailure {
    // Message surfaced to users: structured body message first, then the
    // transport-level error text, then a fixed fallback.
    pub fn extracted_message(&self) -> String {
        match self {
            ApiFailure::Upstream {
                message: Some(message),
                ..
            } => message.clone(),
            ApiFailure::Upstream { status, .. } => {
                format!("Request failed with status {status}")
            }
            ApiFailure::Transport(text) if !text.is_empty() => text.clone(),
            ApiFailure::Transport(_) => UNKNOWN_ERROR.to_string(),
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::Upstream {
                status,
                message: Some(message),
            } => {
                write!(f, "upstream error {status}: {message}")
            }
            ApiFailure::Upstream { status, .. } => write!(f, "upstream error {status}"),
            ApiFailure::Transport(text) => write!(f, "transport error: {text}"),
        }
    }
}

impl std::error::Error for ApiFailure {}

// Composite failure: the login call succeeded but the follow-up profile
// fetch did not, so the issued token was discarded without being persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileConfirmationError {
    pub profile_message: String,
}

impl fmt::Display for ProfileConfirmationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Login succeeded but the profile could not be confirmed: {}",
            self.profile_message
        )
    }
}

impl std::error::Error for ProfileConfirmationError {}
