use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Longest slice of a non-JSON error body kept in an error message.
pub(crate) const MAX_BODY_CHARS: usize = 200;

/// Classification of a non-success HTTP status returned by LetzAI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 400: malformed parameters.
    BadRequest,
    /// 401: missing or invalid API key.
    Unauthorized,
    /// 403: valid key without access to the resource.
    Forbidden,
    /// 404: unknown or expired job.
    NotFound,
    /// 429: too many requests.
    RateLimited,
    /// 5xx.
    Server,
    /// Anything else.
    Other,
}

impl ApiErrorKind {
    /// Classify a status returned by `POST /images`.
    pub fn for_submission(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            429 => Self::RateLimited,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }

    /// Classify a status returned by `GET /images/{id}`.
    ///
    /// Only a missing job and a rejected key are told apart here.
    pub fn for_status_check(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 => Self::Unauthorized,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BadRequest => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found or expired",
            Self::RateLimited => "rate limited",
            Self::Server => "server error",
            Self::Other => "unexpected status",
        };
        f.write_str(s)
    }
}

/// Why a single request to the LetzAI API did not yield usable data.
#[derive(Error, Debug)]
pub enum RequestFailure {
    /// The API answered with a non-success status.
    #[error("API error ({kind}, HTTP {status}): {message}")]
    Api {
        kind: ApiErrorKind,
        status: u16,
        message: String,
    },

    /// The request never completed at the transport level.
    #[error("network error ({context}): {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// The API answered with success but the body lacked expected fields.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl RequestFailure {
    /// Returns the API classification, if this was an HTTP-level failure.
    pub fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Errors returned by LetzAI operations.
#[derive(Error, Debug)]
pub enum LetzError {
    /// A required input was empty or out of range. Raised before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Submitting the generation request failed.
    #[error("Submission failed: {0}")]
    SubmissionFailed(RequestFailure),

    /// Checking job status failed.
    #[error("Status check failed: {0}")]
    PollingFailed(RequestFailure),

    /// LetzAI reported the job as failed.
    #[error("Image generation failed: {0}")]
    GenerationFailed(String),

    /// The job did not finish within the allowed wait.
    #[error("Image generation timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the job.
    #[error("Image generation cancelled by user")]
    Cancelled,

    /// LetzAI reported a status outside the known lifecycle.
    #[error("Unknown status: {0}")]
    UnrecognizedStatus(String),

    /// The finished image could not be fetched or decoded.
    #[error("Failed to download or convert image: {0}")]
    DownloadFailed(String),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LetzError>;

/// Extract a human-readable message from an error response body.
///
/// Uses the JSON `message` field when present, otherwise the raw text
/// truncated to [`MAX_BODY_CHARS`] characters.
pub(crate) fn api_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_BODY_CHARS {
        let cut: String = trimmed.chars().take(MAX_BODY_CHARS).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}
