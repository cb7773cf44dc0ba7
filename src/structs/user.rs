use super::client::{Client, Query};
use super::trophy::{TrophyCatalog, TrophyFilter};
use super::Credentials;
use crate::decode::ResponseRecord;
use crate::errors::GameJoltError;

/// An authenticated player, returned from `client.login()`.
///
/// A failed login still produces a `User`; check `logged_in()` before relying
/// on any of the calls below.
#[derive(Debug, Clone)]
pub struct User {
    client: Client,
    credentials: Credentials,
    logged_in: bool,
}

impl User {
    pub(crate) fn new(client: Client, credentials: Credentials, logged_in: bool) -> Self {
        Self {
            client,
            credentials,
            logged_in,
        }
    }

    /// `true` if `users/auth` accepted the credentials.
    pub fn logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Submits a score for this player. `score` is the display text
    /// ("12 000 points"), `sort` the numeric value used for ranking.
    pub fn submit_score(
        &self,
        score: &str,
        sort: &str,
        table_id: Option<&str>,
    ) -> Result<bool, GameJoltError> {
        let query = Query::new()
            .text("score", score)
            .param("sort", sort)
            .optional("table_id", table_id);

        let record = self.user_api_call("scores/add", query)?;
        Ok(record.is_success())
    }

    /// Fetches scores for this player.
    pub fn fetch_scores(
        &self,
        limit: Option<&str>,
        table_id: Option<&str>,
    ) -> Result<ResponseRecord, GameJoltError> {
        let Credentials {
            game_id,
            private_key,
            username,
            token,
        } = &self.credentials;

        self.client.fetch_scores(
            Some((username.as_str(), token.as_str())),
            game_id,
            private_key,
            limit,
            table_id,
        )
    }

    /// Keeps the open game session alive. The service closes sessions that
    /// are not pinged for a while; scheduling the pings is up to the caller.
    pub fn ping(&self) -> Result<(), GameJoltError> {
        self.user_api_call("sessions/ping", Query::new()).map(|_| ())
    }

    /// Opens a game session. The service allows one open session per player
    /// and closes any previous one itself.
    pub fn open_session(&self) -> Result<(), GameJoltError> {
        self.user_api_call("sessions/open", Query::new()).map(|_| ())
    }

    /// Same as `open_session()`.
    pub fn start_session(&self) -> Result<(), GameJoltError> {
        self.open_session()
    }

    pub fn close_session(&self) -> Result<(), GameJoltError> {
        self.user_api_call("sessions/close", Query::new()).map(|_| ())
    }

    pub fn award_trophy(&self, id: &str) -> Result<bool, GameJoltError> {
        let query = Query::new().param("trophy_id", id);
        let record = self.user_api_call("trophies/add-achieved", query)?;
        Ok(record.is_success())
    }

    /// Fetches every trophy of the game along with this player's progress.
    pub fn fetch_trophies(&self) -> Result<TrophyCatalog, GameJoltError> {
        self.fetch_trophies_filtered(TrophyFilter::All)
    }

    pub fn fetch_trophies_filtered(
        &self,
        filter: TrophyFilter,
    ) -> Result<TrophyCatalog, GameJoltError> {
        let table = self
            .client
            .fetch_trophy_table(&self.credentials, filter.apply(Query::new()))?;

        Ok(TrophyCatalog::new(
            table,
            self.client.clone(),
            self.credentials.clone(),
        ))
    }

    pub fn user_api_call(&self, action: &str, query: Query) -> Result<ResponseRecord, GameJoltError> {
        self.client.user_call(&self.credentials, action, query)
    }
}
