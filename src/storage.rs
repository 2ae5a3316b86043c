//! SQLite journal of committed calls
//!
//! Every committed call is stored with its principal, command and resulting
//! event record. Replaying the journal in order rebuilds the ledger.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

use crate::command::Command;
use crate::events::EventRecord;
use crate::types::Principal;

/// One committed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub principal: Principal,
    pub command: Command,
    pub record: EventRecord,
}

pub struct LedgerJournal {
    conn: Mutex<Connection>,
}

impl LedgerJournal {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open journal at {}", path.display()))?;
        let journal = Self {
            conn: Mutex::new(conn),
        };
        journal.run_migrations()?;
        info!("Journal opened at {}", path.display());
        Ok(journal)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let journal = Self {
            conn: Mutex::new(conn),
        };
        journal.run_migrations()?;
        Ok(journal)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS journal (
                seq INTEGER PRIMARY KEY,
                principal TEXT NOT NULL,
                command TEXT NOT NULL,
                event TEXT NOT NULL,
                digest TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );",
        )
        .context("Failed to create journal table")?;
        Ok(())
    }

    /// Persist a call. Fails if `record.seq` is already taken.
    pub fn append(&self, principal: &Principal, command: &Command, record: &EventRecord) -> Result<()> {
        let command_json = serde_json::to_string(command)?;
        let event_json = serde_json::to_string(&record.event)?;
        let seq = i64::try_from(record.seq).context("Sequence number out of range")?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO journal (seq, principal, command, event, digest, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                seq,
                principal.as_str(),
                command_json,
                event_json,
                record.digest,
                record.recorded_at.to_rfc3339(),
            ],
        )
        .with_context(|| format!("Failed to append journal entry #{}", record.seq))?;
        Ok(())
    }

    /// All entries in sequence order.
    pub fn load(&self) -> Result<Vec<JournalEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT seq, principal, command, event, digest, recorded_at
             FROM journal ORDER BY seq ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(seq, principal, command, event, digest, recorded_at)| {
                let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
                    .with_context(|| format!("Bad timestamp in journal entry #{}", seq))?
                    .with_timezone(&Utc);
                Ok(JournalEntry {
                    principal: Principal::new(principal),
                    command: serde_json::from_str(&command)
                        .with_context(|| format!("Bad command in journal entry #{}", seq))?,
                    record: EventRecord {
                        seq: u64::try_from(seq).context("Negative sequence number")?,
                        recorded_at,
                        event: serde_json::from_str(&event)
                            .with_context(|| format!("Bad event in journal entry #{}", seq))?,
                        digest,
                    },
                })
            })
            .collect()
    }

    pub fn len(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM journal", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
