//! Identifier types used throughout blueentities.
//!
//! Generated ids are 11 base-62 characters encoding the low 64 bits of a
//! v4 UUID. Caller-supplied ids are accepted through [`EntityId::parse`].

use crate::{Error, INDEX_SUFFIX, Result, SEPARATOR};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of every generated id.
pub const ID_LENGTH: usize = 11;

/// Longest id accepted from callers.
pub const MAX_ID_LENGTH: usize = 64;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Unique identifier for an entity instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Generates a new random id.
    #[must_use]
    pub fn new() -> Self {
        let bits = Uuid::new_v4().as_u64_pair().1;
        Self(encode_base62(bits))
    }

    /// Parses a caller-supplied id.
    ///
    /// Rejects empty ids, ids longer than [`MAX_ID_LENGTH`], ids containing the
    /// key separator (unrecoverable from a record key) and [`INDEX_SUFFIX`]
    /// (its record key would collide with the index key).
    pub fn parse(s: &str) -> Result<Self> {
        let reason = if s.is_empty() {
            Some("id is empty")
        } else if s.chars().count() > MAX_ID_LENGTH {
            Some("id is too long")
        } else if s.contains(SEPARATOR) {
            Some("id contains the key separator")
        } else if s == INDEX_SUFFIX {
            Some("id is reserved for index keys")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidId {
                id: s.to_string(),
                reason,
            }),
            None => Ok(Self(s.to_string())),
        }
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn encode_base62(mut bits: u64) -> String {
    let mut out = [b'0'; ID_LENGTH];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(bits % 62) as usize];
        bits /= 62;
    }
    // 62^11 > 2^64, so every u64 fits and the buffer is always ASCII.
    out.iter().map(|&b| b as char).collect()
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}
