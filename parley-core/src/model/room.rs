use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const GENERATED_LEN: usize = 6;
const MIN_LEN: usize = 4;
const MAX_LEN: usize = 12;

/// Short, human-typeable room identifier such as `AB12CD`.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Draws a fresh random id. Uniqueness among live rooms is the registry's job.
    pub fn generate() -> Self {
        let entropy = Uuid::new_v4();
        let id = entropy.as_bytes()[..GENERATED_LEN]
            .iter()
            .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
            .collect();
        Self(id)
    }

    /// Normalises user input (trim, uppercase) and checks it looks like a room id.
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_uppercase();
        let valid_len = (MIN_LEN..=MAX_LEN).contains(&normalized.len());
        if valid_len && normalized.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Some(Self(normalized))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
