use thiserror::Error;

/// Delivery failure for a single announcement.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The chat API answered with a non-success status.
    #[error("chat API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode chat API response: {0}")]
    Decode(String),

    #[error("notifier task join failure: {0}")]
    Join(String),

    /// Credentials or channel do not match the configuration.
    #[error("notifier misconfigured: {0}")]
    Misconfigured(String),
}

impl From<ureq::Error> for NotifyError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => NotifyError::Http {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => NotifyError::Transport(transport.to_string()),
        }
    }
}
