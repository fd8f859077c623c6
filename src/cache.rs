//! SQLite-backed cache of the LGPN name list.
//!
//! The cache is populated exactly once, in a single transaction, from the
//! record stream produced by the fetcher. Reads are full scans streamed one
//! row at a time; nothing here ever updates or deletes rows.

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::error;

use crate::cancel::CancellationToken;
use crate::lgpn::NameRecord;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS names (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  not_before INTEGER NOT NULL,
  not_after INTEGER NOT NULL
)";

/// How many rows may sit between the scan task and a slow consumer.
const SCAN_BUFFER: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
  #[error("unable to create cache directory {}: {}", .dir.display(), .source)]
  CreateDir {
    dir: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("cache database error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("cache population interrupted by cancellation")]
  Interrupted,
}

/// Open handle to the name cache database.
pub struct NameCache {
  conn: Connection,
}

impl NameCache {
  /// Open the cache under `dir`, creating the directory, the database file
  /// and the schema as needed. Safe to call against an existing cache.
  pub fn open(dir: &Path) -> Result<Self, CacheError> {
    std::fs::create_dir_all(dir).map_err(|source| CacheError::CreateDir {
      dir: dir.to_path_buf(),
      source,
    })?;

    let conn = Connection::open(dir.join("lgpn.sqlite3"))?;
    conn.execute_batch(SCHEMA)?;

    Ok(Self { conn })
  }

  /// Number of cached names. Zero means the cache still needs population.
  pub fn count(&self) -> Result<u64, CacheError> {
    let count = self
      .conn
      .query_row("SELECT COUNT(*) FROM names", [], |row| row.get(0))?;

    Ok(count)
  }

  /// Insert every record drawn from `rows`, in arrival order, inside a single
  /// transaction. Parks on the channel between records, so insertion proceeds
  /// at whatever pace the producer supplies them; run it on a blocking thread.
  ///
  /// The transaction commits only once the channel closes with the token
  /// still live. An insert failure, or cancellation observed mid-stream,
  /// rolls the whole transaction back: no partial population is ever visible.
  pub fn populate(
    &mut self,
    mut rows: mpsc::Receiver<NameRecord>,
    cancel: &CancellationToken,
  ) -> Result<(), CacheError> {
    // Dropping the transaction without committing rolls it back.
    let tx = self.conn.transaction()?;

    {
      let mut stmt =
        tx.prepare("INSERT INTO names (name, not_before, not_after) VALUES (?, ?, ?)")?;

      while let Some(record) = rows.blocking_recv() {
        if cancel.is_cancelled() {
          return Err(CacheError::Interrupted);
        }

        stmt.execute(params![record.name, record.not_before, record.not_after])?;
      }
    }

    // The producer closes the channel on cancellation too; don't mistake
    // that for a completed download.
    if cancel.is_cancelled() {
      return Err(CacheError::Interrupted);
    }

    tx.commit()?;
    Ok(())
  }

  /// Stream every cached name in insertion order.
  ///
  /// The connection moves into a blocking task that owns the scan; it is
  /// released when the last row has been delivered, the receiver is dropped,
  /// or the token is cancelled, whichever comes first. A row error after the
  /// scan has started is logged and truncates the stream.
  pub fn into_name_stream(
    self,
    cancel: CancellationToken,
  ) -> Result<mpsc::Receiver<String>, CacheError> {
    // The statement can't outlive the connection's move into the task, so
    // validate it here; a broken table surfaces as an error instead of an
    // empty stream.
    self.conn.prepare(SCAN_QUERY)?;

    let (tx, rx) = mpsc::channel(SCAN_BUFFER);

    tokio::task::spawn_blocking(move || {
      if let Err(err) = scan(&self.conn, &tx, &cancel) {
        error!("unable to read cached names: {err}");
      }
    });

    Ok(rx)
  }
}

const SCAN_QUERY: &str = "SELECT name FROM names ORDER BY id";

fn scan(
  conn: &Connection,
  tx: &mpsc::Sender<String>,
  cancel: &CancellationToken,
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(SCAN_QUERY)?;
  let mut rows = stmt.query([])?;

  while let Some(row) = rows.next()? {
    if cancel.is_cancelled() {
      break;
    }

    let name: String = row.get(0)?;
    if tx.blocking_send(name).is_err() {
      // Receiver dropped; the consumer walked away.
      break;
    }
  }

  Ok(())
}
