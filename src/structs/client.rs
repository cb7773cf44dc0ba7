use super::trophy::{parse_trophies, TrophyTable};
use super::user::User;
use super::Credentials;
use crate::decode::{decode, decode_lenient, ResponseRecord};
use crate::errors::GameJoltError;
use crate::signature::sign;
use crate::transport::{HttpTransport, Transport};
use colorful::Color;
use colorful::Colorful;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SERVICE_ROOT: &str = "https://api.gamejolt.com/api/game/v1";

/// Called once for every service or decode error the client raises,
/// before the error is returned or swallowed.
pub type ErrorHook = Arc<dyn Fn(&GameJoltError) + Send + Sync>;

/// What the client does when the service says `success:"false"` or a reply is malformed.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the error to the caller.
    #[default]
    Propagate,
    /// Log the failure and hand back whatever was decoded. Malformed lines are
    /// skipped, `success:"false"` replies come back as `Ok` and must be checked
    /// with `ResponseRecord::is_success`. Transport errors still propagate.
    LogAndContinue,
}

/// Game Jolt client options. Pass this into `Client::new()`.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Root of the game API, without a trailing slash.
    pub service_root: String,
    /// Per-request timeout applied by the HTTP transport.
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Whether the client should print colored request/response traffic to stdout.
    pub debug: bool,
    /// How service and decode failures reach the caller. Default is `Propagate`.
    pub policy: FailurePolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            service_root: DEFAULT_SERVICE_ROOT.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("gamejolt-client/", env!("CARGO_PKG_VERSION")).to_string(),
            debug: false,
            policy: FailurePolicy::Propagate,
        }
    }
}

impl ClientOptions {
    /// Defaults overridden by `GAMEJOLT_API_ROOT`, `GAMEJOLT_TIMEOUT_SECS` and `GAMEJOLT_DEBUG`.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(root) = std::env::var("GAMEJOLT_API_ROOT") {
            options.service_root = root.trim_end_matches('/').to_string();
        }

        if let Some(secs) = std::env::var("GAMEJOLT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            options.timeout = Duration::from_secs(secs);
        }

        if let Ok(debug) = std::env::var("GAMEJOLT_DEBUG") {
            options.debug = matches!(debug.as_str(), "1" | "true" | "yes");
        }

        options
    }
}

/// Query string builder. Pairs are joined with `&` in insertion order.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<String>,
}

impl Query {
    /// Empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key=value` as is.
    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.pairs.push(format!("{}={}", key, value));
        self
    }

    /// Adds free text, with spaces escaped as `+`.
    pub fn text(self, key: &str, value: &str) -> Self {
        self.param(key, &value.replace(' ', "+"))
    }

    /// Adds `key=value` only when a non-empty value is given.
    pub fn optional(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) if !value.is_empty() => self.param(key, value),
            _ => self,
        }
    }

    /// Appends the player identity and game id every user request carries.
    pub fn identity(self, credentials: &Credentials) -> Self {
        self.param("username", &credentials.username)
            .param("user_token", &credentials.token)
            .param("game_id", &credentials.game_id)
    }

    /// `true` when no parameter was added yet.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pairs.join("&"))
    }
}

/// Game Jolt client. Signs requests, sends them through a `Transport` and
/// decodes the replies.
///
/// Cloning is cheap and clones share the transport and error hook.
#[derive(Clone)]
pub struct Client {
    pub options: ClientOptions,
    transport: Arc<dyn Transport>,
    on_error: Option<ErrorHook>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.options)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl Client {
    /// Creates a client that talks HTTP through `reqwest`.
    pub fn new(options: ClientOptions) -> Result<Self, GameJoltError> {
        let transport = HttpTransport::new(options.timeout, &options.user_agent)?;
        Ok(Self::with_transport(options, transport))
    }

    /// Creates a client on top of any transport.
    pub fn with_transport(options: ClientOptions, transport: impl Transport + 'static) -> Self {
        Self {
            options,
            transport: Arc::new(transport),
            on_error: None,
        }
    }

    /// Installs a hook that sees every service or decode error.
    pub fn on_error(mut self, hook: impl Fn(&GameJoltError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Full request URL including the `signature` parameter.
    pub fn signed_url(&self, action: &str, query: &Query, secret: &str) -> String {
        let url = format!("{}/{}/?{}", self.options.service_root, action, query);
        let signature = sign(&url, secret);
        format!("{}&signature={}", url, signature)
    }

    /// Sends a signed request and returns the raw reply body.
    pub fn fetch(&self, action: &str, query: &Query, secret: &str) -> Result<String, GameJoltError> {
        let url = self.signed_url(action, query, secret);
        self.chat(&format!("[REQUEST] {}", url));

        let body = self.transport.get(&url).map_err(|err| {
            self.chat(&format!("[REQUEST] Failed: {}", err));
            err
        })?;

        tracing::trace!(action, body = %body, "Game Jolt reply");
        Ok(body)
    }

    /// Sends a signed request and decodes the reply.
    ///
    /// With `FailurePolicy::Propagate` a reply without `success:"true"` becomes
    /// `GameJoltError::Service`, carrying the server message when there is one.
    pub fn execute(
        &self,
        action: &str,
        query: &Query,
        secret: &str,
    ) -> Result<ResponseRecord, GameJoltError> {
        let body = self.fetch(action, query, secret)?;

        let record = match self.options.policy {
            FailurePolicy::Propagate => match decode(&body) {
                Ok(record) => record,
                Err(err) => return self.fail(err, ResponseRecord::default()),
            },
            FailurePolicy::LogAndContinue => {
                let (record, skipped) = decode_lenient(&body);
                for err in &skipped {
                    self.report(err);
                }
                record
            }
        };

        for (key, value) in record.iter() {
            tracing::trace!("\t{} = '{}'", key, value);
        }

        if record.is_success() {
            return Ok(record);
        }

        let message = match record.message() {
            Some(message) => message.to_string(),
            None => format!(
                "no message (success={:?}, {} lines): {}",
                record.success(),
                body.lines().count(),
                body
            ),
        };

        self.fail(GameJoltError::Service { message }, record)
    }

    /// Reports `err` and applies the failure policy: `Err(err)` when
    /// propagating, `Ok(fallback)` otherwise.
    pub(crate) fn fail<T>(&self, err: GameJoltError, fallback: T) -> Result<T, GameJoltError> {
        self.report(&err);
        match self.options.policy {
            FailurePolicy::Propagate => Err(err),
            FailurePolicy::LogAndContinue => Ok(fallback),
        }
    }

    pub(crate) fn report(&self, err: &GameJoltError) {
        tracing::warn!("GAMEJOLT ERROR: {}", err);

        if self.options.debug {
            #[cfg(windows)]
            println!("[GAMEJOLT] Error: {}", err);

            #[cfg(not(windows))]
            println!(
                "{} {}",
                "[GAMEJOLT] Error:".color(Color::Red),
                err.to_string().color(Color::LightRed)
            );
        }

        if let Some(hook) = &self.on_error {
            hook(err);
        }
    }

    fn chat(&self, msg: &str) {
        tracing::debug!("{}", msg);

        if self.options.debug {
            #[cfg(windows)]
            println!("{}", msg);

            #[cfg(not(windows))]
            println!(
                "{}",
                msg.gradient_with_color(Color::Cyan, Color::SpringGreen4)
            );
        }
    }

    /// Request on behalf of a player: the identity is appended to `query`.
    pub fn user_call(
        &self,
        credentials: &Credentials,
        action: &str,
        query: Query,
    ) -> Result<ResponseRecord, GameJoltError> {
        self.execute(action, &query.identity(credentials), &credentials.private_key)
    }

    /// Fetches the trophy table for a player.
    pub(crate) fn fetch_trophy_table(
        &self,
        credentials: &Credentials,
        query: Query,
    ) -> Result<TrophyTable, GameJoltError> {
        let body = self.fetch(
            "trophies",
            &query.identity(credentials),
            &credentials.private_key,
        )?;

        match parse_trophies(&body) {
            Ok(table) => Ok(table),
            Err(err) => self.fail(err, TrophyTable::new()),
        }
    }

    /// Authenticates a player. Never fails: a rejected or unreachable login
    /// yields a `User` with `logged_in() == false`.
    pub fn login(&self, credentials: Credentials) -> User {
        self.chat(&format!("[AUTH] Authenticating {}...", credentials.username));

        let logged_in = match self.user_call(&credentials, "users/auth", Query::new()) {
            Ok(record) => record.is_success(),
            Err(err) => {
                // service and decode errors were already reported by `execute`
                if err.is_transport() {
                    tracing::warn!("Login request failed: {}", err);
                }
                false
            }
        };

        if logged_in {
            self.chat(&format!("[AUTH] Welcome, {}.", credentials.username));
        } else {
            self.chat(&format!("[AUTH] Failed to authenticate {}.", credentials.username));
        }

        User::new(self.clone(), credentials, logged_in)
    }

    /// Submits a score as a guest. No login needed.
    pub fn submit_guest_score(
        &self,
        guest_name: &str,
        game_id: &str,
        private_key: &str,
        score: &str,
        sort: &str,
        table_id: Option<&str>,
    ) -> Result<bool, GameJoltError> {
        let query = Query::new()
            .text("score", score)
            .param("sort", sort)
            .optional("table_id", table_id)
            .text("guest", guest_name)
            .param("game_id", game_id);

        let record = self.execute("scores/add", &query, private_key)?;
        Ok(record.is_success())
    }

    /// Fetches scores with explicit credentials. Without a `user` the
    /// request is not tied to a player.
    pub fn fetch_scores(
        &self,
        user: Option<(&str, &str)>,
        game_id: &str,
        private_key: &str,
        limit: Option<&str>,
        table_id: Option<&str>,
    ) -> Result<ResponseRecord, GameJoltError> {
        let mut query = Query::new();
        if let Some((username, token)) = user.filter(|(username, _)| !username.is_empty()) {
            query = query.param("username", username).param("user_token", token);
        }

        let query = query
            .optional("limit", limit)
            .optional("table_id", table_id)
            .param("game_id", game_id);

        self.execute("scores", &query, private_key)
    }
}
