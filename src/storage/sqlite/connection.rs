//! Connection handling for the `SQLite` symbol store.
//!
//! Provides mutex acquisition with poison recovery, pragma configuration,
//! and a helper that runs a closure inside `BEGIN IMMEDIATE` / `COMMIT`.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (due to a panic in a previous critical section),
/// we recover the inner value and log a warning so one failed operation does
/// not take every later call down with it.
///
/// # Examples
///
/// ```ignore
/// use std::sync::Mutex;
/// use symmem::storage::sqlite::acquire_lock;
///
/// let mutex = Mutex::new(connection);
/// let guard = acquire_lock(&mutex);
/// ```
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a `SQLite` connection for concurrent access.
///
/// # Configuration Applied
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **NORMAL synchronous**: balances durability with performance
/// - **`busy_timeout`**: waits up to 5 seconds on a locked database
///
/// Separate processes sharing one database file are serialized by
/// `SQLite`'s own locking; the `busy_timeout` keeps a second writer waiting
/// instead of failing with `SQLITE_BUSY`.
///
/// # Errors
///
/// Currently infallible; pragma failures leave `SQLite` defaults in place.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // Some pragmas echo their new value as a row; results are ignored.
    // In-memory databases stay in "memory" journal mode.
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");

    Ok(())
}

/// Runs `f` inside a `BEGIN IMMEDIATE` transaction.
///
/// Commits when `f` succeeds and rolls back otherwise. The write lock is
/// taken up front, so a read performed inside `f` sees the state the
/// subsequent write replaces.
///
/// # Errors
///
/// Returns the error from `f`, or [`Error::OperationFailed`] if the
/// transaction cannot be started or committed.
pub fn in_immediate_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    conn.execute("BEGIN IMMEDIATE", [])
        .map_err(|e| Error::operation("begin_transaction", e))?;

    match f(conn) {
        Ok(value) => {
            if let Err(e) = conn.execute("COMMIT", []) {
                let _ = conn.execute("ROLLBACK", []);
                return Err(Error::operation("commit_transaction", e));
            }
            Ok(value)
        },
        Err(err) => {
            let _ = conn.execute("ROLLBACK", []);
            Err(err)
        },
    }
}
