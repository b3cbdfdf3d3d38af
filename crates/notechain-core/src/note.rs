use crate::clock::Clock;
use serde::{Deserialize, Serialize};

/// A plaintext note as produced by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Note {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
        clock: &dyn Clock,
    ) -> Self {
        let now = clock.now_millis();
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the edited note. `id` and `created_at` are carried over.
    ///
    /// Any block already sealed for this note keeps attesting the old
    /// contents; nothing is re-chained.
    pub fn update(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            id: self.id.clone(),
            title: title.into(),
            content: content.into(),
            tags,
            created_at: self.created_at,
            updated_at: clock.now_millis(),
        }
    }
}

/// Ciphertext of a note plus the note's identity and timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    pub id: String,
    pub encrypted_data: String,
    pub created_at: u64,
    pub updated_at: u64,
}

/// The part of a note that goes through the cipher.
#[derive(Serialize, Deserialize)]
pub(crate) struct NoteBody {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}
