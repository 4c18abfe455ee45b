//! Domain store: the only writer of users, activities and alarms.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{Activity, ActivityId, Alarm, ChatId, User},
    Result,
};

mod sqlite;

pub use sqlite::{DbConnection, DbPool, SqliteStore};

/// Hexagonal port for persistence.
///
/// Each call is atomic on its own. Calls for different owners may run
/// concurrently. Work that must be atomic across several statements goes
/// through [`SqliteStore::unit_of_work`] on the concrete store: it takes a
/// closure over the open transaction, which cannot be called through
/// `dyn DomainStore`.
#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Return the user bound to `chat_id`, creating it on first contact.
    async fn ensure_user(&self, chat_id: ChatId) -> Result<User>;

    /// Activities owned by the chat's user, in insertion order. Empty when the
    /// user is unknown.
    async fn list_activities(&self, owner: ChatId) -> Result<Vec<Activity>>;

    async fn create_activity(
        &self,
        owner: ChatId,
        title: &str,
        description: Option<&str>,
    ) -> Result<Activity>;

    async fn find_activity(&self, owner: ChatId, id: ActivityId) -> Result<Activity>;

    /// Removes the activity and, by cascade, all of its alarms.
    async fn delete_activity(&self, owner: ChatId, id: ActivityId) -> Result<()>;

    async fn create_alarm(
        &self,
        owner: ChatId,
        activity: ActivityId,
        time: DateTime<Utc>,
    ) -> Result<Alarm>;

    async fn list_alarms(&self, activity: ActivityId) -> Result<Vec<Alarm>>;
}
