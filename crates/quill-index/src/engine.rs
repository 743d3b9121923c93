//! The transactional SQL execution façade.
//!
//! Wraps a single SQLite connection behind a mutex: one write transaction in
//! flight at a time, reads free to interleave between writes. The engine
//! owns the backing file for its whole lifetime — acquired on `open`,
//! released on `close` (or drop).
//!
//! Security note: tamper-evidence lives in the signed envelope layer, not
//! here. SQLite is just the container for records that were verified before
//! they reached this crate.

use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::error::Result;

/// Handle to the backing store. Construct once, share by `Arc` with each DAO.
pub struct Engine {
    conn: Mutex<Connection>,
}

impl Engine {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent read/write performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        info!("Database opened: {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (tests, ephemeral indexes).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Close the backing connection, releasing the file.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().unwrap_or_else(|e| e.into_inner());
        conn.close().map_err(|(_, e)| e)?;
        info!("Database closed");
        Ok(())
    }

    /// Run a single write statement. Returns the number of affected rows.
    pub fn exec(&self, sql: &str, params: impl rusqlite::Params) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.execute(sql, params)?)
    }

    /// Run a batch of semicolon-separated statements (schema setup).
    pub fn exec_batch(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Run a query expected to yield at most one row.
    pub fn first<T>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row(sql, params, map).optional()?)
    }

    /// Stream every row of a query through the callback, in order.
    pub fn each(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        mut f: impl FnMut(&Row<'_>) -> rusqlite::Result<()>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        while let Some(row) = rows.next()? {
            f(row)?;
        }
        Ok(())
    }

    /// Run `f` inside a transaction: every statement commits together, or
    /// any failure rolls back the whole block.
    ///
    /// This is what makes "insert envelope + update derived counters" atomic
    /// and crash-safe. The mutex serializes writers; concurrent callers
    /// block until the active transaction resolves.
    pub fn with_tx<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}
