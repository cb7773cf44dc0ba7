//! Trophy table parsing.
//!
//! A `trophies` reply lists every trophy back to back in the same
//! `key:"value"` format as any other reply:
//!
//! ```text
//! success:"true"
//! id:"5"
//! title:"First Blood"
//! difficulty:"Bronze"
//! description:"Kill one enemy"
//! image_url:"http://x/1.png"
//! achieved:"false"
//! id:"6"
//! ...
//! ```
//!
//! The service always sends `id` first for each trophy, so every field is
//! attached to the trophy opened by the most recent `id` line. A field seen
//! before any `id` is an error rather than something to guess about.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::client::{Client, Query};
use super::Credentials;
use crate::decode::{lines, split_field};
use crate::errors::GameJoltError;

/// Trophies keyed by their id.
pub type TrophyTable = BTreeMap<i64, Trophy>;

/// A trophy as defined for the game, plus whether this player has it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trophy {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image_url: String,
    /// Tier label: Bronze, Silver, Gold or Platinum.
    pub trophy_class: String,
    /// When the player achieved it, or `"false"` if they have not.
    pub achieved_date: String,
}

impl Trophy {
    fn new(id: i64) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            image_url: String::new(),
            trophy_class: String::new(),
            achieved_date: "false".to_string(),
        }
    }

    pub fn achieved(&self) -> bool {
        self.achieved_date != "false"
    }
}

/// Which trophies a fetch asks for.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrophyFilter {
    #[default]
    All,
    Achieved,
    Unachieved,
}

impl TrophyFilter {
    pub(crate) fn apply(self, query: Query) -> Query {
        match self {
            TrophyFilter::All => query,
            TrophyFilter::Achieved => query.param("achieved", "true"),
            TrophyFilter::Unachieved => query.param("achieved", "false"),
        }
    }
}

/// Removes one pair of surrounding double quotes, if present.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn find_message(body: &str) -> Option<String> {
    lines(body)
        .filter_map(|(_, line)| split_field(line))
        .find(|(key, _)| key.eq_ignore_ascii_case("message"))
        .map(|(_, value)| unquote(value.trim()).to_string())
}

/// Builds the trophy table from a raw `trophies` reply.
///
/// Nothing partial is ever returned: any error discards the whole table.
pub fn parse_trophies(body: &str) -> Result<TrophyTable, GameJoltError> {
    let mut trophies = TrophyTable::new();
    let mut current: Option<i64> = None;
    let mut succeeded = false;

    for (index, line) in lines(body) {
        let (key, raw) = split_field(line).ok_or_else(|| GameJoltError::Decode {
            line: index,
            content: line.to_string(),
        })?;
        let value = unquote(raw.trim());
        let field = key.to_ascii_lowercase();

        match field.as_str() {
            "success" => {
                if value != "true" {
                    let message = find_message(body).unwrap_or_else(|| "no message".to_string());
                    return Err(GameJoltError::Service { message });
                }
                succeeded = true;
            }
            // failed replies stop at `success`, so this is only ever seen before it
            "message" if !succeeded => {}
            "id" => match value.parse::<i64>() {
                Ok(id) => {
                    trophies.insert(id, Trophy::new(id));
                    current = Some(id);
                }
                Err(_) => {
                    let err = GameJoltError::InvalidTrophyId(value.to_string());
                    tracing::warn!("Skipping trophy in line {}: {}", index, err);
                    current = None;
                }
            },
            "title" | "difficulty" | "description" | "image_url" | "achieved" => {
                let trophy = current
                    .and_then(|id| trophies.get_mut(&id))
                    .ok_or_else(|| GameJoltError::Attachment {
                        line: index,
                        field: key.to_string(),
                    })?;

                let slot = match field.as_str() {
                    "title" => &mut trophy.name,
                    "difficulty" => &mut trophy.trophy_class,
                    "description" => &mut trophy.description,
                    "image_url" => &mut trophy.image_url,
                    _ => &mut trophy.achieved_date,
                };
                *slot = value.to_string();
            }
            _ => {
                return Err(GameJoltError::UnknownField {
                    line: index,
                    field: key.to_string(),
                })
            }
        }
    }

    if !succeeded {
        return Err(GameJoltError::Service {
            message: format!(
                "no message (no success field, {} lines): {}",
                body.lines().count(),
                body
            ),
        });
    }

    tracing::debug!("Parsed {} trophies", trophies.len());
    Ok(trophies)
}

/// Lets a catalog award trophies without holding on to the `User` it came from.
#[derive(Debug, Clone)]
struct AwardCapability {
    client: Client,
    credentials: Credentials,
}

/// A freshly fetched trophy table for one player.
#[derive(Debug, Clone)]
pub struct TrophyCatalog {
    trophies: TrophyTable,
    awarder: AwardCapability,
}

impl TrophyCatalog {
    pub(crate) fn new(trophies: TrophyTable, client: Client, credentials: Credentials) -> Self {
        Self {
            trophies,
            awarder: AwardCapability {
                client,
                credentials,
            },
        }
    }

    pub fn get(&self, id: i64) -> Option<&Trophy> {
        self.trophies.get(&id)
    }

    pub fn len(&self) -> usize {
        self.trophies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trophies.is_empty()
    }

    /// Trophies in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Trophy> {
        self.trophies.values()
    }

    pub fn achieved(&self) -> impl Iterator<Item = &Trophy> {
        self.iter().filter(|trophy| trophy.achieved())
    }

    pub fn table(&self) -> &TrophyTable {
        &self.trophies
    }

    pub fn into_table(self) -> TrophyTable {
        self.trophies
    }

    /// Awards trophy `id` to the player this catalog was fetched for.
    /// The local table is not updated; fetch again to see the change.
    pub fn award(&self, id: i64) -> Result<bool, GameJoltError> {
        let AwardCapability {
            client,
            credentials,
        } = &self.awarder;
        let query = Query::new().param("trophy_id", &id.to_string());
        let record = client.user_call(credentials, "trophies/add-achieved", query)?;
        Ok(record.is_success())
    }
}
