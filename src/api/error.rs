use thiserror::Error;

/// Failure of a single API round trip.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Could not encode request: {0}")]
    Encode(String),
    #[error("Invalid session token: {0}")]
    InvalidToken(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network(format!("request timed out: {e}"))
        } else {
            Self::Network(e.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Build the error for a non-success response.
/// The human-readable field of a JSON error body is used verbatim when present.
pub(crate) fn from_response(status: u16, body: &str) -> ApiError {
    if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = err.msg.or(err.message).or(err.error) {
            return ApiError::Status { status, message };
        }
    }
    let snippet: String = body.trim().chars().take(200).collect();
    let message = if snippet.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {snippet}")
    };
    ApiError::Status { status, message }
}
