//! Bounded persistent word store backed by SQLite.
//!
//! Holds at most `capacity` word records; inserting into a full store
//! evicts the oldest record first, inside the same transaction as the
//! insert. Headwords are unique, so two concurrent lookups that both miss
//! the cache converge through [`StoreError::Conflict`] and a re-find on
//! the caller's side.
//!
//! Schema: a `words` row owns its `phonetics` and `definitions` children
//! (deleted with it), while `meanings` rows are shared vocabulary senses
//! linked through the `word_meanings` association table and survive the
//! deletion of any referencing word.

use crate::word::{Definition, License, Meaning, Phonetic, StoredWord, WordAggregate};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

/// Storage failures that are part of the store's contract.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same headword already exists.
    #[error("a record for this headword already exists")]
    Conflict,

    /// No record with the requested id.
    #[error("no record with that id")]
    NotFound,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// Bounded persistent word store.
#[derive(Debug, Clone)]
pub struct Store {
    /// Database connection (shared across clones).
    conn: Arc<Mutex<Connection>>,

    /// Maximum number of word records kept.
    capacity: usize,
}

impl Store {
    /// Opens (or creates) the store at `path` with the given capacity.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create data directory")?;
            }
        }

        let conn = Connection::open(path).context("Failed to open word database")?;
        init_schema(&conn).context("Failed to initialize store schema")?;

        info!("Word store initialized at {:?} (capacity {})", path, capacity);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            capacity,
        })
    }

    /// Looks up a record by its exact (lowercased) headword.
    pub fn find(&self, headword: &str) -> Result<Option<StoredWord>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM words WHERE word = ?1",
                params![headword],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => Ok(read_word(&conn, id)?),
            None => Ok(None),
        }
    }

    /// Fetches a record by id.
    pub fn get(&self, id: i64) -> Result<Option<StoredWord>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        Ok(read_word(&conn, id)?)
    }

    /// Lists stored records, newest first.
    pub fn list(&self, skip: i64, limit: i64) -> Result<Vec<StoredWord>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        let mut stmt = conn.prepare(
            "SELECT id FROM words ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let ids: Vec<i64> = stmt
            .query_map(params![limit.max(0), skip.max(0)], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        let mut words = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(word) = read_word(&conn, id)? {
                words.push(word);
            }
        }
        Ok(words)
    }

    /// Number of stored word records.
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Inserts a new aggregate, evicting the oldest record first if the
    /// store is full.
    ///
    /// Eviction and insert are one transaction: a failed insert rolls the
    /// eviction back too. Returns [`StoreError::Conflict`] when a record
    /// with the same headword already exists; the caller is expected to
    /// re-`find` and use the winning row.
    pub fn insert(&self, aggregate: &WordAggregate) -> Result<StoredWord, StoreError> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;

        // Detect the duplicate before touching anything, so a racing
        // insert of an already-stored headword cannot evict its own row.
        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM words WHERE word = ?1",
                params![aggregate.word],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::Conflict);
        }

        // Evict oldest-first until there is room. Ties on created_at are
        // broken by the lower id.
        loop {
            let count: i64 = tx.query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?;
            if (count as usize) < self.capacity {
                break;
            }

            let oldest: Option<(i64, String)> = tx
                .query_row(
                    "SELECT id, word FROM words ORDER BY created_at ASC, id ASC LIMIT 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match oldest {
                Some((id, word)) => {
                    tx.execute("DELETE FROM words WHERE id = ?1", params![id])?;
                    debug!("Evicted oldest word '{}' (id {}) to make room", word, id);
                }
                None => break,
            }
        }

        let inserted = tx.execute(
            "INSERT INTO words (word, vietnamese_word, source_urls, license_name, license_url)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                aggregate.word,
                aggregate.vietnamese_word,
                serde_json::to_string(&aggregate.source_urls)?,
                aggregate.license.as_ref().map(|l| l.name.as_str()),
                aggregate.license.as_ref().and_then(|l| l.url.as_deref()),
            ],
        );
        match inserted {
            Ok(_) => {}
            // Backstop for writers outside this process; the unique index
            // reports the same race the pre-check catches.
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::Conflict);
            }
            Err(e) => return Err(e.into()),
        }
        let word_id = tx.last_insert_rowid();

        for (position, phonetic) in aggregate.phonetics.iter().enumerate() {
            tx.execute(
                "INSERT INTO phonetics (word_id, text, audio, source_url, license_name, license_url, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    word_id,
                    phonetic.text,
                    phonetic.audio,
                    phonetic.source_url,
                    phonetic.license.as_ref().map(|l| l.name.as_str()),
                    phonetic.license.as_ref().and_then(|l| l.url.as_deref()),
                    position as i64,
                ],
            )?;
        }

        for (position, meaning) in aggregate.meanings.iter().enumerate() {
            let synonyms = serde_json::to_string(&meaning.synonyms)?;
            let antonyms = serde_json::to_string(&meaning.antonyms)?;

            // Reuse an existing sense when part of speech, synonyms, and
            // antonyms all match; meanings are shared across words.
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM meanings
                     WHERE part_of_speech = ?1 AND synonyms = ?2 AND antonyms = ?3",
                    params![meaning.part_of_speech, synonyms, antonyms],
                    |row| row.get(0),
                )
                .optional()?;
            let meaning_id = match existing {
                Some(id) => id,
                None => {
                    tx.execute(
                        "INSERT INTO meanings (part_of_speech, synonyms, antonyms)
                         VALUES (?1, ?2, ?3)",
                        params![meaning.part_of_speech, synonyms, antonyms],
                    )?;
                    tx.last_insert_rowid()
                }
            };

            tx.execute(
                "INSERT OR IGNORE INTO word_meanings (word_id, meaning_id, position)
                 VALUES (?1, ?2, ?3)",
                params![word_id, meaning_id, position as i64],
            )?;

            for (def_position, definition) in meaning.definitions.iter().enumerate() {
                tx.execute(
                    "INSERT INTO definitions
                     (word_id, meaning_id, definition, example,
                      vietnamese_definition, vietnamese_example, position)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        word_id,
                        meaning_id,
                        definition.definition,
                        definition.example,
                        definition.vietnamese_definition,
                        definition.vietnamese_example,
                        def_position as i64,
                    ],
                )?;
            }
        }

        let stored = read_word(&tx, word_id)?.ok_or(StoreError::NotFound)?;
        tx.commit()?;

        Ok(stored)
    }

    /// Creates a store over an in-memory database, for tests.
    #[cfg(test)]
    pub fn in_memory(capacity: usize) -> Self {
        let conn = Connection::open_in_memory().expect("in-memory database");
        init_schema(&conn).expect("schema");

        Self {
            conn: Arc::new(Mutex::new(conn)),
            capacity,
        }
    }

    /// Deletes a record by id.
    ///
    /// Cascades to the record's phonetics, definitions, and meaning
    /// associations; shared meaning rows are left in place.
    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");

        let deleted = conn.execute("DELETE FROM words WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }

        debug!("Deleted word id {}", id);
        Ok(())
    }
}

/// Creates tables and indexes, and sets the connection pragmas.
fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    // WAL mode for concurrent read/write; NORMAL sync is sufficient for a
    // cache. Foreign keys drive the delete cascade.
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA synchronous=NORMAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word TEXT NOT NULL UNIQUE,
            vietnamese_word TEXT,
            source_urls TEXT NOT NULL DEFAULT '[]',
            license_name TEXT,
            license_url TEXT,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_words_created_at ON words(created_at);

        CREATE TABLE IF NOT EXISTS phonetics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
            text TEXT,
            audio TEXT,
            source_url TEXT,
            license_name TEXT,
            license_url TEXT,
            position INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_phonetics_word ON phonetics(word_id);

        CREATE TABLE IF NOT EXISTS meanings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            part_of_speech TEXT NOT NULL,
            synonyms TEXT NOT NULL DEFAULT '[]',
            antonyms TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS word_meanings (
            word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
            meaning_id INTEGER NOT NULL REFERENCES meanings(id),
            position INTEGER NOT NULL,
            PRIMARY KEY (word_id, meaning_id)
        );

        CREATE TABLE IF NOT EXISTS definitions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
            meaning_id INTEGER NOT NULL REFERENCES meanings(id),
            definition TEXT NOT NULL,
            example TEXT,
            vietnamese_definition TEXT,
            vietnamese_example TEXT,
            position INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_definitions_word ON definitions(word_id);
        ",
    )
}

/// Assembles a full record from the `words` row and its children.
fn read_word(conn: &Connection, id: i64) -> rusqlite::Result<Option<StoredWord>> {
    let header = conn
        .query_row(
            "SELECT word, vietnamese_word, source_urls, license_name, license_url, created_at
             FROM words WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((word, vietnamese_word, source_urls, license_name, license_url, created_at)) = header
    else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT text, audio, source_url, license_name, license_url
         FROM phonetics WHERE word_id = ?1 ORDER BY position",
    )?;
    let phonetics: Vec<Phonetic> = stmt
        .query_map(params![id], |row| {
            Ok(Phonetic {
                text: row.get(0)?,
                audio: row.get(1)?,
                source_url: row.get(2)?,
                license: license_from(row.get(3)?, row.get(4)?),
            })
        })?
        .collect::<rusqlite::Result<_>>()?;

    let mut stmt = conn.prepare(
        "SELECT m.id, m.part_of_speech, m.synonyms, m.antonyms
         FROM meanings m
         JOIN word_meanings wm ON wm.meaning_id = m.id
         WHERE wm.word_id = ?1
         ORDER BY wm.position",
    )?;
    let senses: Vec<(i64, String, String, String)> = stmt
        .query_map(params![id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<rusqlite::Result<_>>()?;

    let mut def_stmt = conn.prepare(
        "SELECT definition, example, vietnamese_definition, vietnamese_example
         FROM definitions WHERE word_id = ?1 AND meaning_id = ?2 ORDER BY position",
    )?;
    let mut meanings = Vec::with_capacity(senses.len());
    for (meaning_id, part_of_speech, synonyms, antonyms) in senses {
        let definitions: Vec<Definition> = def_stmt
            .query_map(params![id, meaning_id], |row| {
                Ok(Definition {
                    definition: row.get(0)?,
                    example: row.get(1)?,
                    vietnamese_definition: row.get(2)?,
                    vietnamese_example: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        meanings.push(Meaning {
            part_of_speech,
            synonyms: decode_list(&synonyms),
            antonyms: decode_list(&antonyms),
            definitions,
        });
    }

    Ok(Some(StoredWord {
        id,
        word: word.clone(),
        data: WordAggregate {
            word,
            vietnamese_word,
            phonetics,
            meanings,
            source_urls: decode_list(&source_urls),
            license: license_from(license_name, license_url),
        },
        created_at: DateTime::<Utc>::from_timestamp(created_at, 0).unwrap_or_default(),
    }))
}

fn license_from(name: Option<String>, url: Option<String>) -> Option<License> {
    name.map(|name| License { name, url })
}

/// Decodes a JSON string-list column, tolerating corrupt values.
fn decode_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
