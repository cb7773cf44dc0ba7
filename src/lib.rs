//! Client for the Game Jolt game API.
//!
//! ```no_run
//! use gamejolt_client::{Client, ClientOptions, Credentials};
//!
//! # fn main() -> Result<(), gamejolt_client::GameJoltError> {
//! let client = Client::new(ClientOptions::default())?;
//! let user = client.login(Credentials::new("12345", "private-key", "player", "token")?);
//!
//! if user.logged_in() {
//!     user.submit_score("12 000 points", "12000", None)?;
//!
//!     for trophy in user.fetch_trophies()?.iter() {
//!         println!("{} ({}): {}", trophy.name, trophy.trophy_class, trophy.achieved());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod decode;
pub mod errors;
pub mod signature;
pub mod structs;
pub mod transport;

pub use decode::ResponseRecord;
pub use errors::GameJoltError;
pub use structs::client::{Client, ClientOptions, ErrorHook, FailurePolicy, Query};
pub use structs::trophy::{parse_trophies, Trophy, TrophyCatalog, TrophyFilter, TrophyTable};
pub use structs::user::User;
pub use structs::Credentials;
pub use transport::{HttpTransport, Transport};

#[cfg(test)]
mod tests;
