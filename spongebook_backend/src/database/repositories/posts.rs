use crate::database::models::{PostFilter, PostRecord};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        author: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        visibility: row.get(4)?,
        unlisted: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (id, author, title, content, visibility, unlisted, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.id,
                record.author,
                record.title,
                record.content,
                record.visibility,
                if record.unlisted { 1 } else { 0 },
                record.created_at,
                record.updated_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, author, title, content, visibility, unlisted, created_at, updated_at
                FROM posts
                WHERE id = ?1
                "#,
                params![id],
                map_post,
            )
            .optional()?)
    }

    fn update(&self, record: &PostRecord) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE posts
            SET title = ?2,
                content = ?3,
                visibility = ?4,
                unlisted = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.title,
                record.content,
                record.visibility,
                if record.unlisted { 1 } else { 0 },
                record.updated_at
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.conn.execute(
            r#"
            DELETE FROM posts
            WHERE id = ?1
            "#,
            params![id],
        )?;
        Ok(removed > 0)
    }

    fn query(&self, filter: &PostFilter) -> Result<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, author, title, content, visibility, unlisted, created_at, updated_at
            FROM posts
            WHERE (?1 IS NULL OR author = ?1)
              AND (?2 IS NULL OR visibility = ?2)
              AND (?3 IS NULL OR unlisted = ?3)
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;
        let rows = stmt.query_map(
            params![
                filter.author,
                filter.visibility,
                filter.unlisted.map(i64::from)
            ],
            map_post,
        )?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }
}
