use std::{path::Path, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

use crate::{
    domain::{Activity, ActivityId, Alarm, AlarmId, ChatId, NewActivity, User, UserKey},
    store::DomainStore,
    Error, Result,
};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// Length checks mirror `NewActivity` so direct writes hit the same bounds.
const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id INTEGER UNIQUE
    );

    CREATE TABLE IF NOT EXISTS activities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 100),
        description TEXT CHECK (description IS NULL OR length(description) <= 500),
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS alarms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        activity_id INTEGER NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
        time TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_activities_user_id ON activities(user_id);
    CREATE INDEX IF NOT EXISTS idx_alarms_activity_id ON alarms(activity_id);
"#;

/// SQLite-backed [`DomainStore`] over an r2d2 connection pool.
///
/// Blocking SQLite work runs on tokio's blocking pool. Every pooled connection
/// has foreign keys enabled, which is what makes the `ON DELETE CASCADE`
/// clauses effective.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Open (or create) a database file and bring the schema up to date.
    pub fn open(path: &Path, pool_size: u32) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(init_connection);
        Self::from_manager(manager, pool_size.max(1))
    }

    /// Private in-memory database. The pool holds a single connection so all
    /// callers see the same data.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        Self::from_manager(manager, 1)
    }

    fn from_manager(manager: SqliteConnectionManager, max_size: u32) -> Result<Self> {
        let pool = Pool::builder().max_size(max_size).build(manager)?;
        let conn = pool.get()?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(max_size, "sqlite store ready");
        Ok(Self { pool })
    }

    pub fn connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Run `f` inside an immediate transaction: committed if `f` returns `Ok`,
    /// rolled back otherwise. Blocks the calling thread; async callers use
    /// [`SqliteStore::unit_of_work`].
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// [`SqliteStore::transaction`] on tokio's blocking pool.
    pub async fn unit_of_work<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
    {
        self.run_blocking(move |s| s.transaction(f)).await
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| Error::Internal(format!("store task failed: {e}")))?
    }
}

fn init_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)
}

fn ensure_user_in(conn: &Connection, chat_id: ChatId) -> Result<User> {
    conn.execute(
        "INSERT OR IGNORE INTO users (chat_id) VALUES (?1)",
        params![chat_id.0],
    )?;
    let id: i64 = conn.query_row(
        "SELECT id FROM users WHERE chat_id = ?1",
        params![chat_id.0],
        |row| row.get(0),
    )?;
    Ok(User {
        id: UserKey(id),
        chat_id: Some(chat_id),
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: ActivityId(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        user_id: UserKey(row.get(3)?),
    })
}

fn find_owned_activity(conn: &Connection, owner: ChatId, id: ActivityId) -> Result<Activity> {
    conn.query_row(
        "SELECT a.id, a.title, a.description, a.user_id
         FROM activities a JOIN users u ON u.id = a.user_id
         WHERE a.id = ?1 AND u.chat_id = ?2",
        params![id.0, owner.0],
        activity_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("activity {} for chat {}", id.0, owner.0)))
}

#[async_trait]
impl DomainStore for SqliteStore {
    async fn ensure_user(&self, chat_id: ChatId) -> Result<User> {
        self.run_blocking(move |s| ensure_user_in(&*s.connection()?, chat_id))
            .await
    }

    async fn list_activities(&self, owner: ChatId) -> Result<Vec<Activity>> {
        self.run_blocking(move |s| {
            let conn = s.connection()?;
            let mut stmt = conn.prepare(
                "SELECT a.id, a.title, a.description, a.user_id
                 FROM activities a JOIN users u ON u.id = a.user_id
                 WHERE u.chat_id = ?1
                 ORDER BY a.id",
            )?;
            let rows = stmt.query_map(params![owner.0], activity_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn create_activity(
        &self,
        owner: ChatId,
        title: &str,
        description: Option<&str>,
    ) -> Result<Activity> {
        let new = NewActivity::new(title, description)?;
        self.run_blocking(move |s| {
            s.transaction(|tx| {
                let user = ensure_user_in(tx, owner)?;
                tx.execute(
                    "INSERT INTO activities (title, description, user_id) VALUES (?1, ?2, ?3)",
                    params![new.title(), new.description(), user.id.0],
                )?;
                Ok(Activity {
                    id: ActivityId(tx.last_insert_rowid()),
                    title: new.title().to_string(),
                    description: new.description().map(str::to_string),
                    user_id: user.id,
                })
            })
        })
        .await
    }

    async fn find_activity(&self, owner: ChatId, id: ActivityId) -> Result<Activity> {
        self.run_blocking(move |s| find_owned_activity(&*s.connection()?, owner, id))
            .await
    }

    async fn delete_activity(&self, owner: ChatId, id: ActivityId) -> Result<()> {
        self.run_blocking(move |s| {
            let removed = s.connection()?.execute(
                "DELETE FROM activities
                 WHERE id = ?1 AND user_id IN (SELECT id FROM users WHERE chat_id = ?2)",
                params![id.0, owner.0],
            )?;
            if removed == 0 {
                return Err(Error::NotFound(format!(
                    "activity {} for chat {}",
                    id.0, owner.0
                )));
            }
            Ok(())
        })
        .await
    }

    async fn create_alarm(
        &self,
        owner: ChatId,
        activity: ActivityId,
        time: DateTime<Utc>,
    ) -> Result<Alarm> {
        self.run_blocking(move |s| {
            s.transaction(|tx| {
                find_owned_activity(tx, owner, activity)?;
                tx.execute(
                    "INSERT INTO alarms (activity_id, time) VALUES (?1, ?2)",
                    params![activity.0, time],
                )?;
                Ok(Alarm {
                    id: AlarmId(tx.last_insert_rowid()),
                    activity_id: activity,
                    time,
                })
            })
        })
        .await
    }

    async fn list_alarms(&self, activity: ActivityId) -> Result<Vec<Alarm>> {
        self.run_blocking(move |s| {
            let conn = s.connection()?;
            let mut stmt = conn.prepare(
                "SELECT id, activity_id, time FROM alarms
                 WHERE activity_id = ?1
                 ORDER BY time, id",
            )?;
            let rows = stmt.query_map(params![activity.0], |row| {
                Ok(Alarm {
                    id: AlarmId(row.get(0)?),
                    activity_id: ActivityId(row.get(1)?),
                    time: row.get(2)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }
}
