use thiserror::Error;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The HTTP client could not be built or the request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Notification server returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The sink refused the notification.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotificationError>;
