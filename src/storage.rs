//! Durable storage boundary for the counting session.

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TasbeehError};
use crate::session::SessionRecord;

/// Flat record written to durable storage. Round progress is not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub current_target: u32,
    pub current_dhikr: String,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
    /// SQLite stores this as a signed integer and saturates at `i64::MAX`
    #[serde(default)]
    pub total_lifetime_count: u64,
    #[serde(default = "default_haptic")]
    pub haptic_enabled: bool,
}

fn default_haptic() -> bool {
    true
}

pub trait SessionStorage {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<PersistedSession>>;
    fn save(&mut self, state: &PersistedSession) -> Result<()>;
}

impl<T: SessionStorage + ?Sized> SessionStorage for Box<T> {
    fn load(&self) -> Result<Option<PersistedSession>> {
        (**self).load()
    }

    fn save(&mut self, state: &PersistedSession) -> Result<()> {
        (**self).save(state)
    }
}

/// Pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<PersistedSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&mut self, state: &PersistedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(state)?;
        // Write beside the target and rename so a crash never leaves half a file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// SQLite database with one state row and a table of history records
#[derive(Debug)]
pub struct SqliteSessionStorage {
    conn: Connection,
}

impl SqliteSessionStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS counter_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                current_target INTEGER NOT NULL,
                current_dhikr TEXT NOT NULL,
                total_lifetime_count INTEGER NOT NULL,
                haptic_enabled BOOLEAN NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS session_records (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                count INTEGER NOT NULL,
                target INTEGER NOT NULL,
                dhikr TEXT NOT NULL,
                completed_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_session_records_position ON session_records(position)",
            [],
        )?;

        Ok(Self { conn })
    }

    fn load_records(&self) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, count, target, dhikr, completed_at
            FROM session_records
            ORDER BY position ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let completed_at: String = row.get(4)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
                })?
                .with_timezone(&Local);

            Ok(SessionRecord {
                id: row.get(0)?,
                count: row.get(1)?,
                target: row.get(2)?,
                dhikr: row.get(3)?,
                completed_at,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }
}

impl SessionStorage for SqliteSessionStorage {
    fn load(&self) -> Result<Option<PersistedSession>> {
        let state = self
            .conn
            .query_row(
                r#"
                SELECT current_target, current_dhikr, total_lifetime_count, haptic_enabled
                FROM counter_state WHERE id = 1
                "#,
                [],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((current_target, current_dhikr, total_lifetime_count, haptic_enabled)) = state else {
            return Ok(None);
        };
        let total_lifetime_count = u64::try_from(total_lifetime_count).unwrap_or(0);

        Ok(Some(PersistedSession {
            current_target,
            current_dhikr,
            sessions: self.load_records()?,
            total_lifetime_count,
            haptic_enabled,
        }))
    }

    fn save(&mut self, state: &PersistedSession) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO counter_state (id, current_target, current_dhikr, total_lifetime_count, haptic_enabled, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                current_target = excluded.current_target,
                current_dhikr = excluded.current_dhikr,
                total_lifetime_count = excluded.total_lifetime_count,
                haptic_enabled = excluded.haptic_enabled,
                updated_at = excluded.updated_at
            "#,
            params![
                state.current_target,
                state.current_dhikr,
                i64::try_from(state.total_lifetime_count).unwrap_or(i64::MAX),
                state.haptic_enabled,
            ],
        )?;

        tx.execute("DELETE FROM session_records", [])?;
        for (position, record) in state.sessions.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO session_records (id, position, count, target, dhikr, completed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    record.id,
                    position as i64,
                    record.count,
                    record.target,
                    record.dhikr,
                    record.completed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

/// In-process storage. Failure switches simulate an unavailable disk.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    state: Option<PersistedSession>,
    saves: usize,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedSession) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn state(&self) -> Option<&PersistedSession> {
        self.state.as_ref()
    }

    /// Successful saves so far
    pub fn saves(&self) -> usize {
        self.saves
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn unavailable() -> TasbeehError {
        TasbeehError::Io(std::io::Error::other("storage unavailable"))
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<PersistedSession>> {
        if self.fail_reads {
            return Err(Self::unavailable());
        }
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &PersistedSession) -> Result<()> {
        if self.fail_writes {
            return Err(Self::unavailable());
        }
        self.state = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}
