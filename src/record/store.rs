//! Per-session SQLite stores.
//!
//! One database file holds all packets from one session, named after the
//! session UID. The manager keeps at most one store open at a time: a batch
//! for a new session always closes the previous store before the new one is
//! opened.

use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::error::{PaddockError, Result};
use crate::types::SessionRecord;

/// SQL that creates the `packets` table in a fresh session store.
const CREATE_PACKETS_TABLE: &str = "\
CREATE TABLE packets (
    pkt_id            INTEGER  PRIMARY KEY, -- Alias for SQLite's rowid.
    timestamp         REAL     NOT NULL,    -- POSIX time right after capture.
    packetFormat      INTEGER  NOT NULL,    -- Header field: packet format.
    gameMajorVersion  INTEGER  NOT NULL,    -- Header field: game major version.
    gameMinorVersion  INTEGER  NOT NULL,    -- Header field: game minor version.
    packetVersion     INTEGER  NOT NULL,    -- Header field: packet version.
    packetId          INTEGER  NOT NULL,    -- Header field: packet type.
    sessionUID        CHAR(16) NOT NULL,    -- Header field: session id as hex string.
    sessionTime       REAL     NOT NULL,    -- Header field: session time.
    frameIdentifier   INTEGER  NOT NULL,    -- Header field: frame identifier.
    playerCarIndex    INTEGER  NOT NULL,    -- Header field: player car index.
    packet            BLOB     NOT NULL     -- The raw datagram.
)";

const INSERT_PACKET: &str = "\
INSERT INTO packets (
    timestamp,
    packetFormat, gameMajorVersion, gameMinorVersion, packetVersion, packetId, sessionUID,
    sessionTime, frameIdentifier, playerCarIndex,
    packet) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

/// Column layout an existing store must match before we append to it.
const EXPECTED_COLUMNS: [&str; 12] = [
    "pkt_id",
    "timestamp",
    "packetFormat",
    "gameMajorVersion",
    "gameMinorVersion",
    "packetVersion",
    "packetId",
    "sessionUID",
    "sessionTime",
    "frameIdentifier",
    "playerCarIndex",
    "packet",
];

struct OpenStore {
    conn: Connection,
    path: PathBuf,
    session_uid: String,
}

/// Owns the at-most-one open session store.
pub struct SessionStoreManager {
    storage_dir: PathBuf,
    open: Option<OpenStore>,
}

impl SessionStoreManager {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self { storage_dir: storage_dir.into(), open: None }
    }

    /// Deterministic store filename for a session UID (fixed-width lowercase
    /// hex, see [`crate::protocol::PacketHeader::session_uid_hex`]).
    pub fn store_path(storage_dir: &Path, session_uid: &str) -> PathBuf {
        storage_dir.join(format!("F1_2019_{session_uid}.sqlite3"))
    }

    /// Persist one same-session batch as a single transaction.
    ///
    /// Precondition: every record in `records` carries the same session UID.
    /// An empty batch is a no-op. A store open for a different session is
    /// flushed and closed first; a missing store is created lazily.
    pub fn write_batch(&mut self, records: &[SessionRecord]) -> Result<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };

        if self.open.as_ref().is_some_and(|s| s.session_uid != first.session_uid) {
            self.close();
        }
        if self.open.is_none() {
            self.open = Some(OpenStore::open(&self.storage_dir, &first.session_uid)?);
        }
        if let Some(store) = self.open.as_mut() {
            store.insert_batch(records)?;
        }
        Ok(())
    }

    /// No records arrived for `age` seconds; close any open store so a
    /// finished session is finalized even without an explicit end event.
    pub fn close_if_idle(&mut self, age: f64) {
        if self.open.is_none() {
            info!("No packets to record for {age:.3} seconds");
        } else {
            info!("No packets to record for {age:.3} seconds; closing store due to inactivity");
            self.close();
        }
    }

    /// Close the open store, if any. Idempotent.
    pub fn close(&mut self) {
        if let Some(store) = self.open.take() {
            info!("Closing session store {}", store.path.display());
            if let Err((_conn, e)) = store.conn.close() {
                error!("Error closing session store {}: {e}", store.path.display());
            }
        }
    }

    /// Session UID of the currently open store, if any.
    pub fn open_session_uid(&self) -> Option<&str> {
        self.open.as_ref().map(|s| s.session_uid.as_str())
    }
}

impl Drop for SessionStoreManager {
    fn drop(&mut self) {
        self.close();
    }
}

impl OpenStore {
    fn open(storage_dir: &Path, session_uid: &str) -> Result<Self> {
        let path = SessionStoreManager::store_path(storage_dir, session_uid);
        info!("Opening session store {}", path.display());

        let conn =
            Connection::open(&path).map_err(|e| PaddockError::store_error(&path, e))?;

        let table_exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'packets'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| PaddockError::store_error(&path, e))?;

        if table_exists == 0 {
            conn.execute(CREATE_PACKETS_TABLE, [])
                .map_err(|e| PaddockError::store_error(&path, e))?;
            info!("    (created new file)");
        } else {
            validate_schema(&conn, &path)?;
            info!("    (appending to existing file)");
        }

        Ok(Self { conn, path, session_uid: session_uid.to_string() })
    }

    fn insert_batch(&mut self, records: &[SessionRecord]) -> Result<()> {
        let started = Instant::now();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| PaddockError::store_error(&self.path, e))?;
        {
            let mut stmt = tx
                .prepare_cached(INSERT_PACKET)
                .map_err(|e| PaddockError::store_error(&self.path, e))?;
            for record in records {
                stmt.execute(params![
                    record.timestamp,
                    record.packet_format,
                    record.game_major_version,
                    record.game_minor_version,
                    record.packet_version,
                    record.packet_id,
                    record.session_uid,
                    record.session_time,
                    record.frame_identifier,
                    record.player_car_index,
                    record.bytes,
                ])
                .map_err(|e| PaddockError::store_error(&self.path, e))?;
            }
        }
        tx.commit().map_err(|e| PaddockError::store_error(&self.path, e))?;

        debug!(
            "Committed {} records to {} in {:.3} ms",
            records.len(),
            self.path.display(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }
}

/// Structural check for existing files: the exact column list, in order.
/// Anything else is a fatal conflict for that file.
fn validate_schema(conn: &Connection, path: &Path) -> Result<()> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(packets)")
        .map_err(|e| PaddockError::store_error(path, e))?;
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| PaddockError::store_error(path, e))?
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| PaddockError::store_error(path, e))?;

    if columns.iter().map(String::as_str).ne(EXPECTED_COLUMNS) {
        return Err(PaddockError::store_schema_error(
            path,
            format!("expected columns {EXPECTED_COLUMNS:?}, found {columns:?}"),
        ));
    }
    Ok(())
}
