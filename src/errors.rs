use thiserror::Error;

/// Game Jolt client errors.
#[derive(Debug, Error)]
pub enum GameJoltError {
    /// The request never produced a usable body (connection refused, timeout, unreadable body).
    #[error("Failed to send a request to the Game Jolt API ({url}): {reason}")]
    Transport { url: String, reason: String },

    /// The Game Jolt API answered with a status outside the 2xx range.
    #[error("The Game Jolt API returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// A response line had no `:` separator. `line` is 0-based.
    #[error("Game Jolt parse error in line {line}: {content:?}")]
    Decode { line: usize, content: String },

    /// A trophy line used a field name the catalog does not know.
    #[error("Unknown trophy field {field:?} in line {line}")]
    UnknownField { line: usize, field: String },

    /// A trophy field appeared before any `id` line opened a record.
    #[error("Attaching field {field:?} in line {line} to non-existent trophy")]
    Attachment { line: usize, field: String },

    /// A trophy `id` value was not an integer.
    #[error("Invalid trophy id {0:?}")]
    InvalidTrophyId(String),

    /// The reply was well formed but `success` was not `"true"`.
    #[error("Game Jolt request failed: {message}")]
    Service { message: String },

    /// Credentials were rejected before any request was made.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(&'static str),
}

impl GameJoltError {
    /// Network level failure. These are the only errors worth retrying.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GameJoltError::Transport { .. } | GameJoltError::HttpStatus { .. }
        )
    }

    /// The reply could not be understood.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            GameJoltError::Decode { .. }
                | GameJoltError::UnknownField { .. }
                | GameJoltError::Attachment { .. }
                | GameJoltError::InvalidTrophyId(_)
        )
    }

    /// The service understood the request and said no.
    pub fn is_service(&self) -> bool {
        matches!(self, GameJoltError::Service { .. })
    }
}
