//! Process-wide store state shared by every HTTP handler.
//!
//! `CoreState` owns the one in-memory SQLite connection behind a `Mutex`.
//! That mutex is the store's only exclusion boundary: every operation runs
//! start to finish while the guard is held, which makes id assignment,
//! booking check-then-insert and status transitions atomic.

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config;
use crate::db;
use crate::error::StoreError;

/// Maximum audit buffer size before flush.
const AUDIT_BUFFER_CAPACITY: usize = 100;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Wrapped in `Arc` at startup and cloned into the router state.
pub struct CoreState {
    db: Mutex<Connection>,
    /// Request audit trail, buffered then flushed into `audit_log`.
    audit: AuditLogger,
}

impl CoreState {
    /// Open a fresh in-memory store with the schema and doctor roster loaded.
    pub fn new() -> Result<Self, CoreError> {
        let conn = db::open_memory_database()?;
        Ok(Self {
            db: Mutex::new(conn),
            audit: AuditLogger::new(),
        })
    }

    /// Acquire the store lock.
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.db.lock().map_err(|_| CoreError::LockPoisoned)
    }

    /// Run one store operation under the lock.
    pub fn with_db<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self.lock_db()?;
        op(&conn)
    }

    // ── Audit logging ───────────────────────────────────────

    /// Log an access event. Auto-flushes to the store when the buffer is full.
    pub fn log_access(&self, source: AccessSource, action: &str, entity: &str) {
        let needs_flush = self.audit.log(source, action, entity);
        if needs_flush {
            if let Err(e) = self.flush_audit() {
                tracing::warn!("Auto-flush audit failed: {e}");
            }
        }
    }

    /// Current audit buffer contents.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.entries()
    }

    /// Move buffered audit entries into the `audit_log` table.
    pub fn flush_audit(&self) -> Result<usize, CoreError> {
        let conn = self.lock_db()?;
        self.audit.flush_to_db(&conn, config::AUDIT_LOG_RETENTION)
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LockPoisoned => StoreError::LockPoisoned,
            CoreError::Database(e) => StoreError::Database(e),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Access source tracking
// ═══════════════════════════════════════════════════════════

/// Identifies who touched the store, for audit logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessSource {
    /// A request through the HTTP API. `client` is the forwarded address
    /// when a proxy supplied one.
    Api { client: Option<String> },
    /// In-process maintenance (startup, shutdown flush).
    System,
}

impl std::fmt::Display for AccessSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api { client: Some(client) } => write!(f, "api:{client}"),
            Self::Api { client: None } => write!(f, "api"),
            Self::System => write!(f, "system"),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Audit logger
// ═══════════════════════════════════════════════════════════

/// In-memory audit log buffer. Entries are flushed to SQLite
/// when the buffer reaches capacity or on explicit flush.
pub struct AuditLogger {
    buffer: Mutex<Vec<AuditEntry>>,
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub timestamp: String,
    pub source: AccessSource,
    pub action: String,
    pub entity: String,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(AUDIT_BUFFER_CAPACITY)),
        }
    }

    /// Append to the buffer. Returns `true` once the flush threshold is reached.
    pub fn log(&self, source: AccessSource, action: &str, entity: &str) -> bool {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.push(AuditEntry {
                timestamp: db::now_timestamp(),
                source,
                action: action.to_string(),
                entity: entity.to_string(),
            });
            buf.len() >= AUDIT_BUFFER_CAPACITY
        } else {
            false
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    pub fn drain(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|mut buf| buf.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    /// Write buffered entries to `audit_log`, then trim the table to the
    /// newest `retain` rows. Returns how many entries were written.
    pub fn flush_to_db(&self, conn: &Connection, retain: usize) -> Result<usize, CoreError> {
        let entries = self.drain();
        if entries.is_empty() {
            return Ok(0);
        }

        let tuples: Vec<(String, String, String, String)> = entries
            .into_iter()
            .map(|e| (e.timestamp, e.source.to_string(), e.action, e.entity))
            .collect();

        let count = tuples.len();
        db::insert_audit_entries(conn, &tuples)?;
        let pruned = db::prune_audit_log(conn, retain)?;

        tracing::debug!(count, pruned, "Flushed audit entries to database");
        Ok(count)
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
