#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-200 status from the portal. Not retried.
    #[error("HTTP error performing {service} request: {status} {reason}")]
    Http {
        service: String,
        status: u16,
        reason: String,
    },

    /// Connection-level failure before any status was received.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Structurally invalid XML, or a well-formed document missing a
    /// mandatory element or attribute.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// An `<error>` payload embedded in an otherwise valid envelope. This
    /// is how the portal reports failed authentication, invalid sessions
    /// and invalid parameters.
    #[error("{code}: {message}")]
    Response { message: String, code: String },

    #[error("internal error")]
    Internal,
}

impl From<roxmltree::Error> for Error {
    fn from(error: roxmltree::Error) -> Self {
        Error::MalformedResponse(error.to_string())
    }
}
