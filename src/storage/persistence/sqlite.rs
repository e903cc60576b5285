//! `SQLite`-based symbol store.
//!
//! Provides durable storage of text entries and aliases using `SQLite` as the
//! authoritative source of truth.

use crate::models::{SaveOutcome, SaveRequest, SaveStatus, Symbol, Taxonomy, TextEntry};
use crate::services::ContentHasher;
use crate::storage::sqlite::{
    acquire_lock, configure_connection, in_immediate_transaction, record_operation_metrics,
};
use crate::storage::traits::SymbolStore;
use crate::{Error, Result, current_timestamp_iso};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use tracing::instrument;

const ENTRY_COLUMNS: &str = "symbol, body, cat, subcat, hash, ts_created, ts_updated";

/// `SQLite`-based symbol store.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` for thread-safe access within a process.
/// Every save runs in its own `BEGIN IMMEDIATE` transaction, so the previous
/// taxonomy it reports is the state its own write replaced. Across
/// processes, `SQLite`'s WAL mode and `busy_timeout` pragma serialize writers.
///
/// # Schema
///
/// - `texts(symbol PRIMARY KEY, body, cat, subcat, hash, ts_created, ts_updated)`
/// - `aliases(alias PRIMARY KEY, symbol)`
///
/// Upserts use `ON CONFLICT DO UPDATE`, which keeps the row's `rowid`; the
/// `rowid` order is the insertion order used by [`SymbolStore::scan_classified`].
pub struct SqliteSymbolStore {
    /// Connection to the `SQLite` database.
    ///
    /// Protected by Mutex because `rusqlite::Connection` is not `Sync`.
    conn: Mutex<Connection>,
    /// Path to the `SQLite` database (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteSymbolStore {
    /// Opens (and if needed creates) a store at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use symmem::storage::SqliteSymbolStore;
    ///
    /// let store = SqliteSymbolStore::new("./sm.db")?;
    /// # Ok::<(), symmem::Error>(())
    /// ```
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::operation("create_db_dir", e))?;
        }
        let conn = Connection::open(&db_path).map_err(|e| Error::operation("open_sqlite", e))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };

        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::operation("open_sqlite_in_memory", e))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };

        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Creates the `texts` and `aliases` tables and their indexes.
    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);

        configure_connection(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS texts (
                symbol TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                cat TEXT NULL,
                subcat TEXT NULL,
                hash TEXT NOT NULL,
                ts_created TEXT NOT NULL,
                ts_updated TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| Error::operation("create_texts_table", e))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS aliases (
                alias TEXT PRIMARY KEY,
                symbol TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| Error::operation("create_aliases_table", e))?;

        Self::create_indexes(&conn);

        Ok(())
    }

    /// Creates indexes for the taxonomy scan and reverse alias lookups.
    fn create_indexes(conn: &Connection) {
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_texts_cat_sub ON texts(cat, subcat)",
            [],
        );
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_alias_symbol ON aliases(symbol)",
            [],
        );
    }

    /// Returns every alias pointing at `symbol`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn aliases_for(&self, symbol: &str) -> Result<Vec<String>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare("SELECT alias FROM aliases WHERE symbol = ?1 ORDER BY alias")
            .map_err(|e| Error::operation("prepare_aliases_for", e))?;
        let rows = stmt
            .query_map(params![symbol], |row| row.get::<_, String>(0))
            .map_err(|e| Error::operation("aliases_for", e))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::operation("aliases_for", e))
    }

    fn resolve_locked(conn: &Connection, symbol_or_alias: &str) -> Result<Option<String>> {
        let exact: Option<String> = conn
            .query_row(
                "SELECT symbol FROM texts WHERE symbol = ?1",
                params![symbol_or_alias],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::operation("resolve_symbol", e))?;
        if exact.is_some() {
            return Ok(exact);
        }

        conn.query_row(
            "SELECT symbol FROM aliases WHERE alias = ?1",
            params![symbol_or_alias],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::operation("resolve_alias", e))
    }

    fn save_locked(conn: &Connection, request: &SaveRequest) -> Result<SaveOutcome> {
        let hash = ContentHasher::hash(&request.text);
        let now = current_timestamp_iso();

        in_immediate_transaction(conn, |conn| {
            let existing: Option<(Option<String>, Option<String>, String)> = conn
                .query_row(
                    "SELECT cat, subcat, ts_created FROM texts WHERE symbol = ?1",
                    params![request.symbol],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
                .map_err(|e| Error::operation("read_previous_taxonomy", e))?;

            conn.execute(
                "INSERT INTO texts (symbol, body, cat, subcat, hash, ts_created, ts_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(symbol) DO UPDATE SET
                    body = excluded.body,
                    cat = excluded.cat,
                    subcat = excluded.subcat,
                    hash = excluded.hash,
                    ts_updated = excluded.ts_updated",
                params![
                    request.symbol,
                    request.text,
                    request.category,
                    request.subcategory,
                    hash,
                    now,
                ],
            )
            .map_err(|e| Error::operation("upsert_text", e))?;

            for alias in &request.aliases {
                conn.execute(
                    "INSERT INTO aliases (alias, symbol) VALUES (?1, ?2)
                     ON CONFLICT(alias) DO UPDATE SET symbol = excluded.symbol",
                    params![alias, request.symbol],
                )
                .map_err(|e| Error::operation("upsert_alias", e))?;
            }

            let (status, ts_created, prev) = match existing {
                Some((category, subcategory, created)) => (
                    SaveStatus::Updated,
                    created,
                    Taxonomy::new(category, subcategory),
                ),
                None => (SaveStatus::Created, now.clone(), Taxonomy::default()),
            };

            Ok(SaveOutcome {
                status,
                symbol: Symbol::new(request.symbol.as_str()),
                hash: hash.clone(),
                ts_created,
                ts_updated: now.clone(),
                prev,
            })
        })
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<TextEntry> {
    Ok(TextEntry {
        symbol: Symbol::new(row.get::<_, String>(0)?),
        body: row.get(1)?,
        category: row.get(2)?,
        subcategory: row.get(3)?,
        content_hash: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const fn status_label<T>(result: &Result<T>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}

impl SymbolStore for SqliteSymbolStore {
    #[instrument(
        skip(self, request),
        fields(operation = "save", backend = "sqlite", symbol = %request.symbol)
    )]
    fn save(&self, request: &SaveRequest) -> Result<SaveOutcome> {
        let start = Instant::now();
        let result = request.clone().validate().and_then(|request| {
            let conn = acquire_lock(&self.conn);
            Self::save_locked(&conn, &request)
        });

        if let Ok(outcome) = &result {
            tracing::debug!(status = outcome.status.as_str(), "Saved text entry");
        }
        record_operation_metrics("sqlite", "save", start, status_label(&result));
        result
    }

    #[instrument(skip(self), fields(operation = "resolve", backend = "sqlite"))]
    fn resolve(&self, symbol_or_alias: &str) -> Result<Option<Symbol>> {
        let start = Instant::now();
        let result = {
            let conn = acquire_lock(&self.conn);
            Self::resolve_locked(&conn, symbol_or_alias)
        };

        record_operation_metrics("sqlite", "resolve", start, status_label(&result));
        Ok(result?.map(Symbol::new))
    }

    #[instrument(skip(self), fields(operation = "get", backend = "sqlite"))]
    fn get(&self, symbol_or_alias: &str) -> Result<Option<TextEntry>> {
        let start = Instant::now();
        let result: Result<Option<TextEntry>> = (|| {
            let conn = acquire_lock(&self.conn);
            let Some(symbol) = Self::resolve_locked(&conn, symbol_or_alias)? else {
                return Ok(None);
            };

            conn.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM texts WHERE symbol = ?1"),
                params![symbol],
                entry_from_row,
            )
            .optional()
            .map_err(|e| Error::operation("get_text", e))
        })();

        record_operation_metrics("sqlite", "get", start, status_label(&result));
        result
    }

    #[instrument(skip(self), fields(operation = "taxonomy", backend = "sqlite"))]
    fn taxonomy(&self, symbol: &str) -> Result<Option<Taxonomy>> {
        let conn = acquire_lock(&self.conn);
        conn.query_row(
            "SELECT cat, subcat FROM texts WHERE symbol = ?1",
            params![symbol],
            |row| Ok(Taxonomy::new(row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|e| Error::operation("get_taxonomy", e))
    }

    #[instrument(skip(self), fields(operation = "scan_classified", backend = "sqlite"))]
    fn scan_classified(&self, limit: usize) -> Result<Vec<TextEntry>> {
        let start = Instant::now();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let result: Result<Vec<TextEntry>> = (|| {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM texts
                     WHERE cat IS NOT NULL OR subcat IS NOT NULL
                     ORDER BY rowid
                     LIMIT ?1"
                ))
                .map_err(|e| Error::operation("prepare_scan_classified", e))?;
            let rows = stmt
                .query_map(params![limit], entry_from_row)
                .map_err(|e| Error::operation("scan_classified", e))?;

            rows.collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::operation("scan_classified", e))
        })();

        record_operation_metrics("sqlite", "scan_classified", start, status_label(&result));
        result
    }

    fn count(&self) -> Result<usize> {
        let conn = acquire_lock(&self.conn);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM texts", [], |row| row.get(0))
            .map_err(|e| Error::operation("count_texts", e))?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}
