pub mod models;
pub mod repositories;

use crate::config::SpongebookPaths;
use crate::error::{ServiceError, ServiceResult};
use anyhow::{anyhow, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) const MIGRATIONS: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS friends (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        follower TEXT NOT NULL,
        followee TEXT NOT NULL,
        mutual INTEGER NOT NULL DEFAULT 0,
        not_read INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        CHECK (follower <> followee),
        UNIQUE (follower, followee)
    );

    CREATE INDEX IF NOT EXISTS idx_friends_followee ON friends(followee, mutual);
    CREATE INDEX IF NOT EXISTS idx_friends_pending ON friends(followee, not_read);

    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        author TEXT NOT NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL DEFAULT '',
        visibility TEXT NOT NULL DEFAULT 'PUBLIC',
        unlisted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author);
    CREATE INDEX IF NOT EXISTS idx_posts_listing ON posts(unlisted, visibility);
"#;

/// Shared handle to the SQLite store. Every access goes through the
/// connection mutex, so two closures never interleave their statements.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    newly_created: bool,
}

impl Database {
    pub fn connect(paths: &SpongebookPaths) -> Result<Self> {
        let newly_created = !paths.db_path.exists();
        let conn = Connection::open(&paths.db_path)?;
        Ok(Self::from_connection(conn, newly_created))
    }

    pub fn from_connection(conn: Connection, newly_created: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            newly_created,
        }
    }

    /// Applies the schema and reports whether the database file was created
    /// by this process.
    pub fn ensure_migrations(&self) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATIONS)?;
            Ok(())
        })?;
        Ok(self.newly_created)
    }

    /// Runs `f` against the bare connection, outside of any transaction.
    pub fn with_repositories<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> Result<T>,
    {
        self.with_conn(|conn| {
            let repos = repositories::SqliteRepositories::new(conn);
            f(repos)
        })
    }

    /// Runs `f` inside an IMMEDIATE transaction. The write lock is taken up
    /// front, and any error returned by `f` rolls back every statement it
    /// issued.
    pub fn with_write_transaction<T, F>(&self, f: F) -> ServiceResult<T>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> ServiceResult<T>,
    {
        self.transaction(TransactionBehavior::Immediate, f)
    }

    /// Runs `f` inside a deferred transaction so that all of its reads
    /// observe one snapshot of the store.
    pub fn with_read_snapshot<T, F>(&self, f: F) -> ServiceResult<T>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> ServiceResult<T>,
    {
        self.transaction(TransactionBehavior::Deferred, f)
    }

    fn transaction<T, F>(&self, behavior: TransactionBehavior, f: F) -> ServiceResult<T>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> ServiceResult<T>,
    {
        let guard = self.lock().map_err(ServiceError::Internal)?;
        let tx = Transaction::new_unchecked(&guard, behavior)?;
        let value = f(repositories::SqliteRepositories::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self.lock()?;
        f(&guard)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))
    }
}

#[cfg(test)]
pub(crate) fn open_in_memory() -> Database {
    let conn = Connection::open_in_memory().expect("in-memory db");
    let db = Database::from_connection(conn, true);
    db.ensure_migrations().expect("migrations");
    db
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewFriendRecord;
    use crate::database::repositories::FriendRepository;

    #[test]
    fn migrations_are_idempotent() {
        let db = open_in_memory();
        assert!(db.ensure_migrations().expect("second run"));
    }

    #[test]
    fn failed_write_transaction_rolls_back() {
        let db = open_in_memory();
        let outcome: ServiceResult<()> = db.with_write_transaction(|repos| {
            repos.friends().create(&NewFriendRecord::request("alice", "bob"))?;
            Err(ServiceError::Conflict("abort".into()))
        });
        assert!(matches!(outcome, Err(ServiceError::Conflict(_))));

        let edges = db
            .with_repositories(|repos| repos.friends().query(&Default::default()))
            .expect("query");
        assert!(edges.is_empty());
    }

    #[test]
    fn self_follow_rejected_by_schema() {
        let db = open_in_memory();
        let outcome = db.with_repositories(|repos| {
            repos
                .friends()
                .create(&NewFriendRecord::request("alice", "alice"))
        });
        assert!(outcome.is_err());
    }
}
