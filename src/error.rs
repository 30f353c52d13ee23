use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures a request can hit after deserialization. Upstream non-success
/// responses are carried as data (status + body text) rather than thrown,
/// so the handler decides propagation explicitly.
#[derive(Debug, Error)]
pub enum Error {
    #[error("upstream API error ({status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("attachment content is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("create-page response carried no page id")]
    MissingPageId,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            // Bad attachment bytes are the caller's fault.
            Error::Decode(_) => StatusCode::BAD_REQUEST,
            Error::Api { .. } | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::MissingPageId => StatusCode::BAD_GATEWAY,
        };
        (status, self.to_string()).into_response()
    }
}
