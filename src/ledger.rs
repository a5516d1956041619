use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use snafu::{Location, ResultExt, Snafu};

use crate::model::Timestamp;

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS videos (
    video_id   TEXT PRIMARY KEY,
    username   TEXT,
    views      INTEGER,
    alert_sent INTEGER DEFAULT 0,
    checked_at TEXT
)";

/// Persistent record of which videos have already fired an alert.
///
/// One row per video. `alert_sent` only ever moves from 0 to 1, so a video
/// alerts at most once across runs no matter how its view count changes.
#[derive(Debug)]
pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    /// Open (or create) the ledger file and make sure the table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).context(OpenSnafu { path })?;

        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context(StatementSnafu)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(SCHEMA, []).context(StatementSnafu)?;
        Ok(Self { conn })
    }

    /// Record the latest snapshot of a video. First sight inserts the row
    /// with `alert_sent = 0`; later sightings refresh everything else and
    /// leave `alert_sent` alone.
    pub fn upsert(
        &self,
        video_id: &str,
        username: &str,
        views: u64,
        checked_at: Timestamp,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO videos (video_id, username, views, checked_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(video_id) DO UPDATE SET
                     username = excluded.username,
                     views = excluded.views,
                     checked_at = excluded.checked_at",
                params![video_id, username, views as i64, checked_at.to_rfc3339()],
            )
            .context(StatementSnafu)?;

        Ok(())
    }

    /// Whether this video warrants a fresh alert: at or above the threshold
    /// and never alerted before. Reads persisted state, so an earlier
    /// `mark_sent` in the same run is honored.
    pub fn should_alert(&self, video_id: &str, views: u64, threshold: u64) -> Result<bool> {
        if views < threshold {
            return Ok(false);
        }

        let alert_sent: Option<i64> = self
            .conn
            .query_row(
                "SELECT alert_sent FROM videos WHERE video_id = ?1",
                params![video_id],
                |row| row.get(0),
            )
            .optional()
            .context(StatementSnafu)?;

        Ok(matches!(alert_sent, None | Some(0)))
    }

    /// Mark a video as alerted. Idempotent, and nothing ever clears the flag.
    pub fn mark_sent(&self, video_id: &str) -> Result<()> {
        self.conn
            .execute(
                "UPDATE videos SET alert_sent = 1 WHERE video_id = ?1",
                params![video_id],
            )
            .context(StatementSnafu)?;

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum LedgerError {
    /// could not open the ledger database at {path:?}
    Open {
        path: PathBuf,
        source: rusqlite::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// a ledger statement failed
    Statement {
        source: rusqlite::Error,
        #[snafu(implicit)]
        location: Location,
    },
}
