//! Database connection management with pragma configuration.
//!
//! Opens the SQLite database backing the key-value store, applies the
//! pragmas needed for concurrent access (WAL mode), and runs migrations.

use super::migrations;
use crate::Error;
use crate::clock::{Clock, SystemClock};
use std::path::Path;
use std::sync::Arc;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
                       PRAGMA synchronous=NORMAL;
                       PRAGMA temp_store=MEMORY;
                       PRAGMA foreign_keys=ON;";

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread. Expiry is evaluated against the attached clock.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
    pub(crate) clock: Arc<dyn Clock>,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn, Arc::new(SystemClock)).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        Self::open_in_memory_with_clock(Arc::new(SystemClock)).await
    }

    /// Open an in-memory database whose expiry follows `clock`.
    pub async fn open_in_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn, clock).await
    }

    async fn init(conn: Connection, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn, clock })
    }
}
