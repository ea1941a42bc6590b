use thiserror::Error;

/// Failures surfaced by the API client.
///
/// The service reports errors as `{"detail": "..."}` bodies; those arrive
/// here as `Api` with the detail preserved so the UI can show it verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Could not reach the service, the request timed out, or the response
    /// body failed to decode.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{detail}")]
    Api { status: u16, detail: String },
}

impl ApiError {
    /// True when the service rejected the caller's credentials. The shell
    /// treats this as the signal to force a fresh login.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Api { status: 401 | 403, .. })
    }
}
