//! Enrichment of a word aggregate with Vietnamese translations.
//!
//! Walks a normalized aggregate and translates its textual fields in a
//! fixed order: the headword first, then each meaning's definitions in
//! source order (definition text, then example). Translation failures
//! leave the corresponding field absent; enrichment itself never fails.

use crate::translate::Translate;
use crate::word::WordAggregate;
use tracing::debug;

/// Attaches Vietnamese translations to an aggregate in place.
///
/// An aggregate that already carries a Vietnamese headword has been
/// enriched before and is left untouched.
pub async fn enrich<T>(translator: &T, aggregate: &mut WordAggregate)
where
    T: Translate + ?Sized,
{
    if aggregate
        .vietnamese_word
        .as_deref()
        .is_some_and(|word| !word.is_empty())
    {
        debug!("'{}' is already enriched, skipping", aggregate.word);
        return;
    }

    aggregate.vietnamese_word = non_empty(translator.translate(&aggregate.word).await);

    for meaning in &mut aggregate.meanings {
        for definition in &mut meaning.definitions {
            definition.vietnamese_definition =
                non_empty(translator.translate(&definition.definition).await);

            if let Some(example) = &definition.example {
                definition.vietnamese_example = non_empty(translator.translate(example).await);
            }
        }
    }
}

/// An empty translation means the call failed; the field stays absent.
fn non_empty(translated: String) -> Option<String> {
    if translated.is_empty() {
        None
    } else {
        Some(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{Definition, Meaning};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Prefixes every fragment with "vi:" and counts calls.
    struct PrefixTranslator {
        calls: AtomicU32,
    }

    impl PrefixTranslator {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Translate for PrefixTranslator {
        async fn translate(&self, text: &str) -> String {
            self.calls.fetch_add(1, Ordering::Relaxed);
            format!("vi:{text}")
        }
    }

    /// Simulates a translation service that is down.
    struct FailingTranslator;

    #[async_trait]
    impl Translate for FailingTranslator {
        async fn translate(&self, _text: &str) -> String {
            String::new()
        }
    }

    fn sample_aggregate() -> WordAggregate {
        WordAggregate {
            word: "hello".to_string(),
            vietnamese_word: None,
            phonetics: vec![],
            meanings: vec![Meaning {
                part_of_speech: "noun".to_string(),
                synonyms: vec![],
                antonyms: vec![],
                definitions: vec![
                    Definition {
                        definition: "A greeting.".to_string(),
                        example: Some("She said hello.".to_string()),
                        vietnamese_definition: None,
                        vietnamese_example: None,
                    },
                    Definition {
                        definition: "A call for attention.".to_string(),
                        example: None,
                        vietnamese_definition: None,
                        vietnamese_example: None,
                    },
                ],
            }],
            source_urls: vec![],
            license: None,
        }
    }

    #[tokio::test]
    async fn test_enrich_translates_all_fields() {
        let translator = PrefixTranslator::new();
        let mut aggregate = sample_aggregate();

        enrich(&translator, &mut aggregate).await;

        assert_eq!(aggregate.vietnamese_word.as_deref(), Some("vi:hello"));
        let definitions = &aggregate.meanings[0].definitions;
        assert_eq!(
            definitions[0].vietnamese_definition.as_deref(),
            Some("vi:A greeting.")
        );
        assert_eq!(
            definitions[0].vietnamese_example.as_deref(),
            Some("vi:She said hello.")
        );
        assert_eq!(
            definitions[1].vietnamese_definition.as_deref(),
            Some("vi:A call for attention.")
        );
        // No example, so no example translation call
        assert_eq!(definitions[1].vietnamese_example, None);
        assert_eq!(translator.calls.load(Ordering::Relaxed), 4);
    }

    #[tokio::test]
    async fn test_enrich_is_idempotent() {
        let translator = PrefixTranslator::new();
        let mut aggregate = sample_aggregate();
        aggregate.vietnamese_word = Some("xin chào".to_string());

        enrich(&translator, &mut aggregate).await;

        assert_eq!(aggregate.vietnamese_word.as_deref(), Some("xin chào"));
        assert_eq!(translator.calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_enrich_degrades_when_translation_fails() {
        let mut aggregate = sample_aggregate();

        enrich(&FailingTranslator, &mut aggregate).await;

        assert_eq!(aggregate.vietnamese_word, None);
        let definitions = &aggregate.meanings[0].definitions;
        assert_eq!(definitions[0].vietnamese_definition, None);
        assert_eq!(definitions[0].vietnamese_example, None);
        // The untranslated content is intact
        assert_eq!(definitions[0].definition, "A greeting.");
    }
}
