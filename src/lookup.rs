//! The lookup pipeline.
//!
//! One lookup request runs: cache check → external fetch → normalize →
//! enrich → store → return. The fast path is a cache hit. On a miss the
//! pipeline builds the record from the external dictionary, attaches
//! Vietnamese translations best-effort, and persists it.
//!
//! Concurrent misses for the same headword are allowed to fetch and
//! normalize redundantly; the unique headword constraint plus
//! reconcile-on-conflict at the store step makes them converge on one row.
//! No per-headword lock exists anywhere.

use crate::dictionary::DictionarySource;
use crate::enrich::enrich;
use crate::normalize::normalize;
use crate::store::{Store, StoreError};
use crate::translate::Translate;
use crate::word::{normalize_headword, StoredWord};
use anyhow::anyhow;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Terminal failures of a lookup request.
///
/// Everything else (translation failures, insert races) is absorbed inside
/// the pipeline.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The external dictionary has no entry for this headword.
    #[error("word not found in dictionary")]
    NotFound,

    /// A storage invariant broke unexpectedly.
    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

/// Looks up a word, serving it from the store or building and caching it.
pub async fn lookup<D, T>(
    store: &Store,
    dictionary: &D,
    translator: &T,
    word: &str,
) -> Result<StoredWord, LookupError>
where
    D: DictionarySource + ?Sized,
    T: Translate + ?Sized,
{
    let headword = normalize_headword(word);
    if headword.is_empty() {
        return Err(LookupError::NotFound);
    }

    if let Some(existing) = store.find(&headword).map_err(internal)? {
        debug!("Cache hit for '{}'", headword);
        return Ok(existing);
    }

    let Some(raw) = dictionary.fetch(&headword).await else {
        debug!("Dictionary has no entry for '{}'", headword);
        return Err(LookupError::NotFound);
    };

    let mut aggregate = normalize(&headword, &raw);
    enrich(translator, &mut aggregate).await;

    match store.insert(&aggregate) {
        Ok(stored) => {
            info!("Stored new word '{}' (id {})", stored.word, stored.id);
            Ok(stored)
        }
        Err(StoreError::Conflict) => {
            // A concurrent lookup of the same headword won the insert;
            // its row is the record.
            debug!("Lost insert race for '{}', reconciling", headword);
            match store.find(&headword) {
                Ok(Some(stored)) => Ok(stored),
                Ok(None) => {
                    warn!("Reconcile found no row for '{}' after conflict", headword);
                    Err(LookupError::Internal(anyhow!(
                        "insert conflict for '{headword}' but no stored row"
                    )))
                }
                Err(e) => Err(internal(e)),
            }
        }
        Err(e) => Err(internal(e)),
    }
}

fn internal(e: StoreError) -> LookupError {
    LookupError::Internal(anyhow::Error::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Serves a fixed payload (or nothing) and counts fetches.
    struct FakeDictionary {
        payload: Option<Value>,
        delay: Duration,
        fetches: AtomicU32,
    }

    impl FakeDictionary {
        fn with_payload(payload: Value) -> Self {
            Self {
                payload: Some(payload),
                delay: Duration::ZERO,
                fetches: AtomicU32::new(0),
            }
        }

        fn empty() -> Self {
            Self {
                payload: None,
                delay: Duration::ZERO,
                fetches: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl DictionarySource for FakeDictionary {
        async fn fetch(&self, _word: &str) -> Option<Value> {
            self.fetches.fetch_add(1, Ordering::Relaxed);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.payload.clone()
        }
    }

    struct PrefixTranslator;

    #[async_trait]
    impl Translate for PrefixTranslator {
        async fn translate(&self, text: &str) -> String {
            format!("vi:{text}")
        }
    }

    struct FailingTranslator;

    #[async_trait]
    impl Translate for FailingTranslator {
        async fn translate(&self, _text: &str) -> String {
            String::new()
        }
    }

    fn hello_payload() -> Value {
        json!({
            "word": "hello",
            "meanings": [{
                "partOfSpeech": "noun",
                "definitions": [{"definition": "A greeting.", "example": "Hello there."}]
            }]
        })
    }

    #[tokio::test]
    async fn test_miss_then_hit_converges_on_one_row() {
        let store = Store::in_memory(10);
        let dictionary = FakeDictionary::with_payload(hello_payload());

        let first = lookup(&store, &dictionary, &PrefixTranslator, "Hello")
            .await
            .unwrap();
        assert_eq!(first.word, "hello");
        assert_eq!(first.data.vietnamese_word.as_deref(), Some("vi:hello"));
        assert_eq!(
            first.data.meanings[0].definitions[0]
                .vietnamese_definition
                .as_deref(),
            Some("vi:A greeting.")
        );
        assert_eq!(store.count().unwrap(), 1);

        // Different casing hits the same cached row, with no new fetch
        let second = lookup(&store, &dictionary, &PrefixTranslator, "HELLO")
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(dictionary.fetches.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_unknown_word_is_not_found_and_not_stored() {
        let store = Store::in_memory(10);
        let dictionary = FakeDictionary::empty();

        let result = lookup(&store, &dictionary, &PrefixTranslator, "zzzz").await;
        assert!(matches!(result, Err(LookupError::NotFound)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_word_is_not_found_without_fetch() {
        let store = Store::in_memory(10);
        let dictionary = FakeDictionary::with_payload(hello_payload());

        let result = lookup(&store, &dictionary, &PrefixTranslator, "   ").await;
        assert!(matches!(result, Err(LookupError::NotFound)));
        assert_eq!(dictionary.fetches.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_translation_outage_still_stores() {
        let store = Store::in_memory(10);
        let dictionary = FakeDictionary::with_payload(hello_payload());

        let stored = lookup(&store, &dictionary, &FailingTranslator, "hello")
            .await
            .unwrap();

        assert_eq!(stored.data.vietnamese_word, None);
        assert_eq!(
            stored.data.meanings[0].definitions[0].vietnamese_definition,
            None
        );
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_converge() {
        let store = Store::in_memory(10);
        let dictionary = FakeDictionary {
            payload: Some(hello_payload()),
            delay: Duration::from_millis(20),
            fetches: AtomicU32::new(0),
        };

        // Both tasks miss the cache, fetch redundantly, and race the
        // insert; the loser reconciles onto the winner's row.
        let (a, b) = tokio::join!(
            lookup(&store, &dictionary, &PrefixTranslator, "hello"),
            lookup(&store, &dictionary, &PrefixTranslator, "HELLO"),
        );

        let a = a.unwrap();
        let b = b.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(dictionary.fetches.load(Ordering::Relaxed), 2);
    }
}
