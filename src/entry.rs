//! Stored records

use crate::embedding::{embed, is_separator};
use crate::error::{StoreError, StoreResult};
use crate::vector::Embedding;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the id prefix shown in listings.
pub const SHORT_ID_LEN: usize = 8;

/// A stored text together with its embedding.
///
/// Entries are never mutated after creation; the JSON form is
/// `{"id", "text", "embedding", "timestamp"}` with the timestamp in epoch
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub text: String,
    pub embedding: Embedding,
    pub timestamp: i64,
}

impl Entry {
    pub fn new(id: impl Into<String>, text: impl Into<String>, embedding: Embedding, timestamp: i64) -> Entry {
        Entry { id: id.into(), text: text.into(), embedding, timestamp }
    }

    /// Vectorizes `text` into a new entry with a random id and the current time.
    ///
    /// The stored text is trimmed. Text that is blank after trimming is refused.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashvdb::{Entry, EMBEDDING_DIM};
    ///
    /// let entry = Entry::from_text("  Rust is fast  ").unwrap();
    /// assert_eq!(entry.text, "Rust is fast");
    /// assert_eq!(entry.embedding.len(), EMBEDDING_DIM);
    ///
    /// assert!(Entry::from_text("   ").is_err());
    /// ```
    pub fn from_text(text: &str) -> StoreResult<Entry> {
        let trimmed = text.trim_matches(is_separator);
        if trimmed.is_empty() {
            return Err(StoreError::EmptyText);
        }

        Ok(Entry {
            id: Uuid::new_v4().to_string(),
            text: trimmed.to_string(),
            embedding: embed(text),
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    /// First [`SHORT_ID_LEN`] characters of the id.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(SHORT_ID_LEN) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }

    /// Creation time, if the timestamp is within chrono's range.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
