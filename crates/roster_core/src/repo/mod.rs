//! Persistence gateway: repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Keep SQL, joins and cascade mechanics out of service orchestration.
//!
//! # Invariants
//! - Write paths validate entities before any SQL mutation.
//! - Cascading deletes run inside one IMMEDIATE transaction.
//! - Optimistic concurrency is a single conditional `UPDATE`, never a
//!   read-then-write pair.
//! - Repositories borrow a caller-owned connection and hold no other state.

pub mod course_repo;
pub mod enrollment_repo;
pub mod student_repo;

mod rows;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::Connection;
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Gateway error taxonomy shared by every repository.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Payload is structurally invalid.
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// Addressed id and payload id disagree.
    #[error("identity mismatch: addressed {path_id} but payload carries {body_id}")]
    IdentityMismatch { path_id: i64, body_id: i64 },
    /// Target row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    /// Conditional write matched no row: removed or changed concurrently.
    #[error("{entity} {id} was changed or removed by another writer")]
    ConcurrencyConflict { entity: &'static str, id: i64 },
    /// A required parent row for a foreign key is absent.
    #[error("referenced {entity} does not exist: {id}")]
    MissingReference { entity: &'static str, id: i64 },
    /// Client-supplied primary key is already taken.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: i64 },
    /// Connection is not migrated to the schema this binary expects.
    #[error("repository requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    #[error("repository requires table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("{0}")]
    Db(#[from] DbError),
    /// Persisted data cannot be converted back into the entity model.
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    /// Whether the failure was caused by caller input rather than storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::IdentityMismatch { .. }
                | Self::NotFound { .. }
                | Self::MissingReference { .. }
                | Self::AlreadyExists { .. }
        )
    }
}

/// Rejects connections that did not go through `db::open_db*`.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["students", "courses", "enrollments"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
