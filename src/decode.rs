//! Decoder for the Game Jolt `key:"value"` text format.
//!
//! Every non-blank line of a reply is one field. Repeated field names are kept
//! apart by numbering the later occurrences: `score`, `score1`, `score2`, ...

use crate::errors::GameJoltError;

/// One decoded reply. Field order follows the order of the lines in the body.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    fields: Vec<(String, String)>,
}

impl ResponseRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Raw value of the `success` field, if the reply had one.
    pub fn success(&self) -> Option<&str> {
        self.get("success")
    }

    pub fn is_success(&self) -> bool {
        self.success() == Some("true")
    }

    /// Failure description sent by the service.
    pub fn message(&self) -> Option<&str> {
        self.get("message")
    }

    /// All values stored under `base`, `base1`, `base2`, ... in order.
    ///
    /// Multi-row replies (a `scores` listing for instance) repeat the same
    /// field names once per row, so this yields one value per row.
    pub fn values_of(&self, base: &str) -> Vec<&str> {
        let mut values = Vec::new();
        let Some(first) = self.get(base) else {
            return values;
        };
        values.push(first);

        let mut n = 1;
        while let Some(value) = self.get(&format!("{}{}", base, n)) {
            values.push(value);
            n += 1;
        }
        values
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Stores `value` under `key`, or under the first free `key<n>` when `key` is taken.
    fn insert_numbered(&mut self, key: &str, value: String) {
        let mut slot = key.to_string();
        let mut n = 0;
        while self.contains_key(&slot) {
            n += 1;
            slot = format!("{}{}", key, n);
        }
        self.fields.push((slot, value));
    }
}

impl<'a> IntoIterator for &'a ResponseRecord {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Splits a trimmed, non-blank line on its first colon.
pub(crate) fn split_field(line: &str) -> Option<(&str, &str)> {
    line.split_once(':').map(|(k, v)| (k.trim(), v))
}

/// Non-blank lines of `body` with their 0-based index.
pub(crate) fn lines(body: &str) -> impl Iterator<Item = (usize, &str)> {
    body.trim()
        .split('\n')
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
}

/// Decodes a reply body. A line without a colon fails the whole decode.
pub fn decode(body: &str) -> Result<ResponseRecord, GameJoltError> {
    let mut record = ResponseRecord::default();

    for (index, line) in lines(body) {
        let (key, value) = split_field(line).ok_or_else(|| GameJoltError::Decode {
            line: index,
            content: line.to_string(),
        })?;
        record.insert_numbered(key, clean_value(value));
    }

    Ok(record)
}

/// Decodes a reply body, skipping malformed lines instead of failing.
/// The skipped lines are returned as errors so the caller can report them.
pub(crate) fn decode_lenient(body: &str) -> (ResponseRecord, Vec<GameJoltError>) {
    let mut record = ResponseRecord::default();
    let mut skipped = Vec::new();

    for (index, line) in lines(body) {
        match split_field(line) {
            Some((key, value)) => record.insert_numbered(key, clean_value(value)),
            None => skipped.push(GameJoltError::Decode {
                line: index,
                content: line.to_string(),
            }),
        }
    }

    (record, skipped)
}

fn clean_value(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}
