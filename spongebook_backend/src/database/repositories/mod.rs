mod friends;
mod posts;

use super::models::{
    FriendFilter, FriendRecord, FriendUpdate, NewFriendRecord, PostFilter, PostRecord,
};
use anyhow::Result;
use rusqlite::Connection;

/// Store of directed follow rows. Implementations perform no policy checks;
/// reciprocity is maintained by the friend service.
pub trait FriendRepository {
    fn get(&self, id: i64) -> Result<Option<FriendRecord>>;
    fn find(&self, follower: &str, followee: &str) -> Result<Option<FriendRecord>>;
    /// Matching rows ordered by id.
    fn query(&self, filter: &FriendFilter) -> Result<Vec<FriendRecord>>;
    fn create(&self, record: &NewFriendRecord) -> Result<FriendRecord>;
    fn update(&self, id: i64, update: &FriendUpdate) -> Result<Option<FriendRecord>>;
    /// Returns false when no row had that id.
    fn delete(&self, id: i64) -> Result<bool>;
}

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    fn update(&self, record: &PostRecord) -> Result<bool>;
    fn delete(&self, id: &str) -> Result<bool>;
    /// Matching posts, newest first.
    fn query(&self, filter: &PostFilter) -> Result<Vec<PostRecord>>;
}

/// Hands out rusqlite-backed repositories borrowing a single connection (or
/// an open transaction, which derefs to one).
pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn friends(&self) -> impl FriendRepository + '_ {
        friends::SqliteFriendRepository { conn: self.conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }
}
