use std::fmt;

use crate::errors::GameJoltError;

pub mod client;
pub mod trophy;
pub mod user;

/// Identity of a player in one game. Fixed once a `User` is created.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub game_id: String,
    /// Game private key. Only ever used as signature input, never sent.
    pub private_key: String,
    pub username: String,
    /// The player's game token (not their password).
    pub token: String,
}

impl Credentials {
    pub fn new(
        game_id: impl Into<String>,
        private_key: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, GameJoltError> {
        let credentials = Self {
            game_id: game_id.into(),
            private_key: private_key.into(),
            username: username.into(),
            token: token.into(),
        };

        if credentials.game_id.trim().is_empty() {
            return Err(GameJoltError::InvalidCredentials("game id is empty"));
        }

        if credentials.private_key.is_empty() {
            return Err(GameJoltError::InvalidCredentials("private key is empty"));
        }

        if credentials.username.trim().is_empty() {
            return Err(GameJoltError::InvalidCredentials("username is empty"));
        }

        Ok(credentials)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("game_id", &self.game_id)
            .field("private_key", &"<redacted>")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
