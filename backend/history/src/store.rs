use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::record::{HistoryRecord, HistoryStatus};

/// SQLite-backed, append-only log of analysis results.
///
/// Records are only ever inserted; there is no update or delete.
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    /// Open or create the history store at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        info!(path = %path, "History store opened");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("history store lock poisoned"))
    }

    fn init_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS history (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                product_name TEXT NOT NULL,
                compliance_score INTEGER NOT NULL,
                date TEXT NOT NULL,
                status TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Append a record to the end of the log.
    pub fn append(&self, record: &HistoryRecord) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO history (id, product_name, compliance_score, date, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id.to_string(),
                    record.product_name,
                    record.compliance_score,
                    record.date.to_rfc3339(),
                    record.status.to_string(),
                ],
            )
            .context("Failed to append history record")?;
        debug!(id = %record.id, score = record.compliance_score, "History record appended");
        Ok(())
    }

    /// All records in insertion order.
    pub fn list(&self) -> Result<Vec<HistoryRecord>> {
        self.query(
            "SELECT seq, id, product_name, compliance_score, date, status
             FROM history ORDER BY seq ASC",
            None,
        )
    }

    /// The most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        self.query(
            "SELECT seq, id, product_name, compliance_score, date, status
             FROM history ORDER BY seq DESC LIMIT ?1",
            Some(limit),
        )
    }

    /// Count all records in the store.
    pub fn count(&self) -> Result<usize> {
        let count: usize = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Rows that fail to decode abort the read rather than shrinking the log.
    fn query(&self, sql: &str, limit: Option<usize>) -> Result<Vec<HistoryRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = match limit {
            Some(limit) => stmt.query_map(params![limit as i64], raw_row)?,
            None => stmt.query_map([], raw_row)?,
        };

        let records = rows
            .map(|row| {
                let (seq, raw) = row.context("Failed to read history row")?;
                decode(raw).with_context(|| format!("Corrupt history row seq={}", seq))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }
}

struct RawRow {
    id: String,
    product_name: String,
    compliance_score: i64,
    date: String,
    status: String,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<(i64, RawRow)> {
    Ok((
        row.get(0)?,
        RawRow {
            id: row.get(1)?,
            product_name: row.get(2)?,
            compliance_score: row.get(3)?,
            date: row.get(4)?,
            status: row.get(5)?,
        },
    ))
}

fn decode(raw: RawRow) -> Result<HistoryRecord> {
    let compliance_score = u8::try_from(raw.compliance_score)
        .ok()
        .filter(|score| *score <= 100)
        .ok_or_else(|| anyhow!("score {} out of range", raw.compliance_score))?;

    let status = match raw.status.as_str() {
        "passed" => HistoryStatus::Passed,
        "failed" => HistoryStatus::Failed,
        other => bail!("unknown status '{}'", other),
    };

    Ok(HistoryRecord {
        id: uuid::Uuid::parse_str(&raw.id)
            .with_context(|| format!("invalid id '{}'", raw.id))?,
        product_name: raw.product_name,
        compliance_score,
        date: chrono::DateTime::parse_from_rfc3339(&raw.date)
            .with_context(|| format!("invalid date '{}'", raw.date))?
            .with_timezone(&chrono::Utc),
        status,
    })
}
