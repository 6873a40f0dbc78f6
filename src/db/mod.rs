//! SQLite persistence for submission records
//!
//! One parent `projects` table serves both variants; `species` and
//! `evidence_files` are cascade-deleted children. Evidence bytes are not
//! stored here; rows carry blob-store locators.

pub mod projects;
pub mod record;
pub mod schema;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::RegistryError;

/// Registry database handle
pub struct RegistryDb {
    conn: Mutex<Connection>,
}

impl RegistryDb {
    /// Open or create the registry database
    pub fn open(path: &Path) -> Result<Self, RegistryError> {
        info!("Opening registry database at {:?}", path);

        let conn = Connection::open(path)
            .map_err(|e| RegistryError::Internal(format!("Failed to open SQLite: {}", e)))?;

        // WAL for concurrent reads; foreign_keys so cascade deletes hold.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )
        .map_err(|e| RegistryError::Internal(format!("Failed to set PRAGMA: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, RegistryError> {
        debug!("Opening in-memory registry database");

        let conn = Connection::open_in_memory()
            .map_err(|e| RegistryError::Internal(format!("Failed to open in-memory SQLite: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| RegistryError::Internal(format!("Failed to set PRAGMA: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), RegistryError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RegistryError::Internal(format!("Lock poisoned: {}", e)))?;
        schema::init_schema(&conn)
    }

    /// Run a read operation against the connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&Connection) -> Result<T, RegistryError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RegistryError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Run a write operation with exclusive access (transactions need
    /// `&mut Connection`)
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&mut Connection) -> Result<T, RegistryError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RegistryError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, RegistryError> {
        self.with_conn(|conn| {
            let count = |sql: &str| -> Result<i64, RegistryError> {
                conn.query_row(sql, [], |row| row.get(0))
                    .map_err(|e| RegistryError::Internal(format!("Query failed: {}", e)))
            };

            Ok(DbStats {
                project_count: count("SELECT COUNT(*) FROM projects")? as u64,
                pending_count: count("SELECT COUNT(*) FROM projects WHERE status = 'pending'")?
                    as u64,
                species_count: count("SELECT COUNT(*) FROM species")? as u64,
                evidence_count: count("SELECT COUNT(*) FROM evidence_files")? as u64,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub project_count: u64,
    pub pending_count: u64,
    pub species_count: u64,
    pub evidence_count: u64,
}

// Re-exports
pub use record::{NewEvidence, NewSpecies, ProjectRecord, ProjectSummary, SubmissionStatus};
