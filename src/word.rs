//! Word aggregate types shared across the lookup pipeline and the store.
//!
//! A [`WordAggregate`] is the single internal shape for dictionary data:
//! the normalizer produces it from the raw upstream payload, the enricher
//! attaches Vietnamese translations to it, and the store persists it. The
//! API serves a [`StoredWord`], which wraps the aggregate with its row
//! identity and creation timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// License attribution carried by the upstream dictionary source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// License name (e.g., "CC BY-SA 3.0").
    pub name: String,

    /// URL of the license text, if provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A single pronunciation entry.
///
/// At least one of `text` (IPA transcription) or `audio` (URL of a
/// recording) is present; entries with neither are dropped during
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phonetic {
    /// IPA transcription (e.g., "/həˈləʊ/").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// URL of an audio recording.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,

    /// URL of the page this entry was sourced from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// License covering the audio recording.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// One sense of a word: a part of speech with its definitions.
///
/// Meanings are shared vocabulary senses: two words whose part of speech,
/// synonyms, and antonyms all match converge on the same stored meaning
/// row. The association lives in the store; in memory each aggregate
/// simply carries its own ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meaning {
    /// Part of speech (e.g., "noun", "verb").
    pub part_of_speech: String,

    /// Synonyms listed at the meaning level.
    #[serde(default)]
    pub synonyms: Vec<String>,

    /// Antonyms listed at the meaning level.
    #[serde(default)]
    pub antonyms: Vec<String>,

    /// Definitions under this sense, in source order.
    pub definitions: Vec<Definition>,
}

/// A single definition with its optional example and translations.
///
/// `definition` is always non-empty; empty entries are dropped during
/// normalization. The Vietnamese fields stay `None` when translation was
/// not attempted or failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// The definition text.
    pub definition: String,

    /// A usage example, if the source provided one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,

    /// Vietnamese translation of the definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vietnamese_definition: Option<String>,

    /// Vietnamese translation of the example.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vietnamese_example: Option<String>,
}

/// The full dictionary record for one headword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordAggregate {
    /// The headword, always lowercase.
    pub word: String,

    /// Vietnamese translation of the headword.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vietnamese_word: Option<String>,

    /// Pronunciation entries, in source order.
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,

    /// Senses of the word, in source order.
    #[serde(default)]
    pub meanings: Vec<Meaning>,

    /// URLs of the source pages.
    #[serde(default)]
    pub source_urls: Vec<String>,

    /// License covering the dictionary data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// A persisted word record: row identity plus the aggregate.
///
/// Serializes as `{"id": .., "word": .., "data": {..}, "created_at": ..}`,
/// the shape the API has always served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWord {
    /// Row id, unique across the store.
    pub id: i64,

    /// The lowercase headword.
    pub word: String,

    /// The full aggregate.
    pub data: WordAggregate,

    /// When this record was first stored. Never changes afterwards.
    pub created_at: DateTime<Utc>,
}

/// Canonicalizes a headword for storage and comparison.
///
/// Lookups are case-insensitive: "Hello", "HELLO", and " hello " all key
/// the same record.
pub fn normalize_headword(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_headword_lowercases() {
        assert_eq!(normalize_headword("Hello"), "hello");
        assert_eq!(normalize_headword("HELLO"), "hello");
        assert_eq!(normalize_headword("hello"), "hello");
    }

    #[test]
    fn test_normalize_headword_trims() {
        assert_eq!(normalize_headword("  serendipity \n"), "serendipity");
        assert_eq!(normalize_headword("   "), "");
    }

    #[test]
    fn test_stored_word_wire_shape() {
        let stored = StoredWord {
            id: 7,
            word: "hello".to_string(),
            data: WordAggregate {
                word: "hello".to_string(),
                vietnamese_word: Some("xin chào".to_string()),
                phonetics: vec![],
                meanings: vec![],
                source_urls: vec![],
                license: None,
            },
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        };

        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["word"], "hello");
        assert_eq!(json["data"]["vietnamese_word"], "xin chào");
        // Absent optional fields are omitted, not serialized as null
        assert!(json["data"].get("license").is_none());
    }
}
