//! Normalization of raw dictionary payloads.
//!
//! The upstream dictionary returns loosely structured JSON: fields may be
//! missing, empty, or of an unexpected shape. This module converts that
//! payload into a [`WordAggregate`] without ever failing — every field
//! access is optional-with-default, and entries that carry no usable
//! content are dropped rather than stored.

use crate::word::{normalize_headword, Definition, License, Meaning, Phonetic, WordAggregate};
use serde_json::Value;

/// Converts a raw dictionary payload into a [`WordAggregate`].
///
/// The aggregate is keyed on the lowercased `headword` the lookup was made
/// with, not on whatever casing the payload carries. Phonetic entries with
/// neither text nor audio, definitions with empty text, and meanings left
/// with no definitions are all skipped.
pub fn normalize(headword: &str, raw: &Value) -> WordAggregate {
    WordAggregate {
        word: normalize_headword(headword),
        vietnamese_word: None,
        phonetics: raw
            .get("phonetics")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(parse_phonetic).collect())
            .unwrap_or_default(),
        meanings: raw
            .get("meanings")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(parse_meaning).collect())
            .unwrap_or_default(),
        source_urls: parse_strings(raw.get("sourceUrls")),
        license: raw.get("license").and_then(parse_license),
    }
}

/// Extracts a trimmed, non-empty string.
fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extracts an array of non-empty strings, defaulting to empty.
fn parse_strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| non_empty_str(Some(item)))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_license(value: &Value) -> Option<License> {
    let name = non_empty_str(value.get("name"))?;
    Some(License {
        name,
        url: non_empty_str(value.get("url")),
    })
}

/// Parses one phonetic entry; `None` when it has neither text nor audio.
fn parse_phonetic(value: &Value) -> Option<Phonetic> {
    let text = non_empty_str(value.get("text"));
    let audio = non_empty_str(value.get("audio"));
    if text.is_none() && audio.is_none() {
        return None;
    }

    Some(Phonetic {
        text,
        audio,
        source_url: non_empty_str(value.get("sourceUrl")),
        license: value.get("license").and_then(parse_license),
    })
}

/// Parses one meaning; `None` when no definitions survive filtering.
fn parse_meaning(value: &Value) -> Option<Meaning> {
    let definitions: Vec<Definition> = value
        .get("definitions")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(parse_definition).collect())
        .unwrap_or_default();
    if definitions.is_empty() {
        return None;
    }

    Some(Meaning {
        part_of_speech: non_empty_str(value.get("partOfSpeech")).unwrap_or_default(),
        synonyms: parse_strings(value.get("synonyms")),
        antonyms: parse_strings(value.get("antonyms")),
        definitions,
    })
}

/// Parses one definition; `None` when the definition text is empty.
fn parse_definition(value: &Value) -> Option<Definition> {
    let definition = non_empty_str(value.get("definition"))?;
    Some(Definition {
        definition,
        example: non_empty_str(value.get("example")),
        vietnamese_definition: None,
        vietnamese_example: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_full_payload() {
        let raw = json!({
            "word": "Hello",
            "phonetics": [
                {"text": "/həˈləʊ/", "audio": "https://example.org/hello.mp3",
                 "sourceUrl": "https://example.org/hello",
                 "license": {"name": "BY-SA 4.0", "url": "https://example.org/license"}},
                {"text": "", "audio": ""}
            ],
            "meanings": [
                {"partOfSpeech": "noun",
                 "definitions": [
                     {"definition": "A greeting.", "example": "She gave him a cheery hello."},
                     {"definition": ""}
                 ],
                 "synonyms": ["greeting"],
                 "antonyms": []},
                {"partOfSpeech": "verb", "definitions": []}
            ],
            "license": {"name": "CC BY-SA 3.0"},
            "sourceUrls": ["https://en.wiktionary.org/wiki/hello"]
        });

        let aggregate = normalize("Hello", &raw);

        assert_eq!(aggregate.word, "hello");
        assert_eq!(aggregate.vietnamese_word, None);

        // The empty phonetic entry is dropped
        assert_eq!(aggregate.phonetics.len(), 1);
        assert_eq!(aggregate.phonetics[0].text.as_deref(), Some("/həˈləʊ/"));
        assert_eq!(
            aggregate.phonetics[0].license.as_ref().map(|l| l.name.as_str()),
            Some("BY-SA 4.0")
        );

        // The verb meaning has no definitions and is dropped; the empty
        // definition under "noun" is dropped as well
        assert_eq!(aggregate.meanings.len(), 1);
        assert_eq!(aggregate.meanings[0].part_of_speech, "noun");
        assert_eq!(aggregate.meanings[0].synonyms, vec!["greeting"]);
        assert_eq!(aggregate.meanings[0].definitions.len(), 1);
        assert_eq!(aggregate.meanings[0].definitions[0].definition, "A greeting.");
        assert_eq!(
            aggregate.meanings[0].definitions[0].example.as_deref(),
            Some("She gave him a cheery hello.")
        );

        assert_eq!(aggregate.source_urls.len(), 1);
        assert_eq!(aggregate.license.as_ref().unwrap().name, "CC BY-SA 3.0");
        assert_eq!(aggregate.license.as_ref().unwrap().url, None);
    }

    #[test]
    fn test_normalize_missing_sections() {
        let aggregate = normalize("ghost", &json!({"word": "ghost"}));

        assert_eq!(aggregate.word, "ghost");
        assert!(aggregate.phonetics.is_empty());
        assert!(aggregate.meanings.is_empty());
        assert!(aggregate.source_urls.is_empty());
        assert_eq!(aggregate.license, None);
    }

    #[test]
    fn test_normalize_wrong_shapes() {
        // Sections of entirely the wrong type must not panic
        let raw = json!({
            "phonetics": "not-an-array",
            "meanings": [{"partOfSpeech": 42, "definitions": "nope"}, 7],
            "sourceUrls": {"oops": true},
            "license": []
        });

        let aggregate = normalize("odd", &raw);
        assert!(aggregate.phonetics.is_empty());
        assert!(aggregate.meanings.is_empty());
        assert!(aggregate.source_urls.is_empty());
        assert_eq!(aggregate.license, None);
    }

    #[test]
    fn test_normalize_meaning_without_part_of_speech() {
        let raw = json!({
            "meanings": [{"definitions": [{"definition": "Something."}]}]
        });

        let aggregate = normalize("thing", &raw);
        assert_eq!(aggregate.meanings.len(), 1);
        assert_eq!(aggregate.meanings[0].part_of_speech, "");
    }

    #[test]
    fn test_normalize_headword_casing_wins_over_payload() {
        let raw = json!({"word": "HELLO"});
        assert_eq!(normalize("HeLLo", &raw).word, "hello");
    }
}
