use crate::database::models::{FriendFilter, FriendRecord, FriendUpdate, NewFriendRecord};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteFriendRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_friend(row: &Row<'_>) -> rusqlite::Result<FriendRecord> {
    Ok(FriendRecord {
        id: row.get(0)?,
        follower: row.get(1)?,
        followee: row.get(2)?,
        mutual: row.get::<_, i64>(3)? != 0,
        not_read: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
    })
}

impl<'conn> super::FriendRepository for SqliteFriendRepository<'conn> {
    fn get(&self, id: i64) -> Result<Option<FriendRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, follower, followee, mutual, not_read, created_at
                FROM friends
                WHERE id = ?1
                "#,
                params![id],
                map_friend,
            )
            .optional()?)
    }

    fn find(&self, follower: &str, followee: &str) -> Result<Option<FriendRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, follower, followee, mutual, not_read, created_at
                FROM friends
                WHERE follower = ?1 AND followee = ?2
                "#,
                params![follower, followee],
                map_friend,
            )
            .optional()?)
    }

    fn query(&self, filter: &FriendFilter) -> Result<Vec<FriendRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, follower, followee, mutual, not_read, created_at
            FROM friends
            WHERE (?1 IS NULL OR follower = ?1)
              AND (?2 IS NULL OR followee = ?2)
              AND (?3 IS NULL OR mutual = ?3)
              AND (?4 IS NULL OR not_read = ?4)
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt.query_map(
            params![
                filter.follower,
                filter.followee,
                filter.mutual.map(i64::from),
                filter.not_read.map(i64::from)
            ],
            map_friend,
        )?;
        let mut edges = Vec::new();
        for row in rows {
            edges.push(row?);
        }
        Ok(edges)
    }

    fn create(&self, record: &NewFriendRecord) -> Result<FriendRecord> {
        self.conn
            .execute(
                r#"
                INSERT INTO friends (follower, followee, mutual, not_read, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    record.follower,
                    record.followee,
                    if record.mutual { 1 } else { 0 },
                    if record.not_read { 1 } else { 0 },
                    record.created_at
                ],
            )
            .with_context(|| {
                format!(
                    "failed to insert friend row {} -> {}",
                    record.follower, record.followee
                )
            })?;
        Ok(FriendRecord {
            id: self.conn.last_insert_rowid(),
            follower: record.follower.clone(),
            followee: record.followee.clone(),
            mutual: record.mutual,
            not_read: record.not_read,
            created_at: record.created_at.clone(),
        })
    }

    fn update(&self, id: i64, update: &FriendUpdate) -> Result<Option<FriendRecord>> {
        let changed = self.conn.execute(
            r#"
            UPDATE friends
            SET mutual = COALESCE(?2, mutual),
                not_read = COALESCE(?3, not_read)
            WHERE id = ?1
            "#,
            params![
                id,
                update.mutual.map(i64::from),
                update.not_read.map(i64::from)
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get(id)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let removed = self.conn.execute(
            r#"
            DELETE FROM friends
            WHERE id = ?1
            "#,
            params![id],
        )?;
        Ok(removed > 0)
    }
}
