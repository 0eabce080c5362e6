use crate::database::models::PostRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const COLUMNS: &str = "id, user_id, title, content, category, images, is_anonymous, custom_time, \
                       region, user_title, user_identity, user_rank, views, likes, is_pinned, \
                       sort_order, custom_replies_count, created_at, updated_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        category: row.get(4)?,
        images: row.get(5)?,
        is_anonymous: row.get::<_, i64>(6)? != 0,
        custom_time: row.get(7)?,
        region: row.get(8)?,
        user_title: row.get(9)?,
        user_identity: row.get(10)?,
        user_rank: row.get(11)?,
        views: row.get(12)?,
        likes: row.get(13)?,
        is_pinned: row.get::<_, i64>(14)? != 0,
        sort_order: row.get(15)?,
        custom_replies_count: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (id, user_id, title, content, category, images, is_anonymous,
                               custom_time, region, user_title, user_identity, user_rank, views,
                               likes, is_pinned, sort_order, custom_replies_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                record.id,
                record.user_id,
                record.title,
                record.content,
                record.category,
                record.images,
                if record.is_anonymous { 1 } else { 0 },
                record.custom_time,
                record.region,
                record.user_title,
                record.user_identity,
                record.user_rank,
                record.views,
                record.likes,
                if record.is_pinned { 1 } else { 0 },
                record.sort_order,
                record.custom_replies_count,
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
                &format!("SELECT {COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?)
    }

    fn list(&self, category: Option<&str>, limit: usize, offset: usize) -> Result<Vec<PostRecord>> {
        // Pinned first, then editorial sort_order, then recency.
        let order = "ORDER BY is_pinned DESC, sort_order ASC, datetime(created_at) DESC \
                     LIMIT ?1 OFFSET ?2";
        let mut posts = Vec::new();
        match category {
            Some(category) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM posts WHERE category = ?3 {order}"
                ))?;
                let rows =
                    stmt.query_map(params![limit as i64, offset as i64, category], map_row)?;
                for row in rows {
                    posts.push(row?);
                }
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("SELECT {COLUMNS} FROM posts {order}"))?;
                let rows = stmt.query_map(params![limit as i64, offset as i64], map_row)?;
                for row in rows {
                    posts.push(row?);
                }
            }
        }
        Ok(posts)
    }

    fn update(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE posts
            SET user_id = ?2, title = ?3, content = ?4, category = ?5, images = ?6,
                is_anonymous = ?7, custom_time = ?8, region = ?9, user_title = ?10,
                user_identity = ?11, user_rank = ?12, views = ?13, likes = ?14, is_pinned = ?15,
                sort_order = ?16, custom_replies_count = ?17, updated_at = ?18
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.user_id,
                record.title,
                record.content,
                record.category,
                record.images,
                if record.is_anonymous { 1 } else { 0 },
                record.custom_time,
                record.region,
                record.user_title,
                record.user_identity,
                record.user_rank,
                record.views,
                record.likes,
                if record.is_pinned { 1 } else { 0 },
                record.sort_order,
                record.custom_replies_count,
                record.updated_at
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1", params![id])?)
    }

    fn increment_views(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE posts SET views = views + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn adjust_likes(&self, id: &str, delta: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE posts SET likes = likes + ?2 WHERE id = ?1",
            params![id, delta],
        )?;
        Ok(())
    }

    fn reply_count(&self, post_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM replies WHERE post_id = ?1",
            params![post_id],
            |row| row.get(0),
        )?)
    }
}
