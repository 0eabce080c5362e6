use crate::database::models::ReplyRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteReplyRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const COLUMNS: &str = "id, post_id, user_id, content, images, is_anonymous, custom_time, region, \
                       user_title, user_identity, user_rank, floor_number, parent_reply_id, \
                       likes, sort_order, created_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<ReplyRecord> {
    Ok(ReplyRecord {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        images: row.get(4)?,
        is_anonymous: row.get::<_, i64>(5)? != 0,
        custom_time: row.get(6)?,
        region: row.get(7)?,
        user_title: row.get(8)?,
        user_identity: row.get(9)?,
        user_rank: row.get(10)?,
        floor_number: row.get(11)?,
        parent_reply_id: row.get(12)?,
        likes: row.get(13)?,
        sort_order: row.get(14)?,
        created_at: row.get(15)?,
    })
}

impl<'conn> super::ReplyRepository for SqliteReplyRepository<'conn> {
    fn create(&self, record: &ReplyRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO replies (id, post_id, user_id, content, images, is_anonymous, custom_time,
                                 region, user_title, user_identity, user_rank, floor_number,
                                 parent_reply_id, likes, sort_order, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                record.id,
                record.post_id,
                record.user_id,
                record.content,
                record.images,
                if record.is_anonymous { 1 } else { 0 },
                record.custom_time,
                record.region,
                record.user_title,
                record.user_identity,
                record.user_rank,
                record.floor_number,
                record.parent_reply_id,
                record.likes,
                record.sort_order,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ReplyRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM replies WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?)
    }

    fn list_for_post(&self, post_id: &str) -> Result<Vec<ReplyRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM replies WHERE post_id = ?1 \
             ORDER BY COALESCE(floor_number, 9223372036854775807) ASC, sort_order ASC, \
                      created_at ASC"
        ))?;
        let rows = stmt.query_map(params![post_id], map_row)?;
        let mut replies = Vec::new();
        for row in rows {
            replies.push(row?);
        }
        Ok(replies)
    }

    fn max_floor_for_post(&self, post_id: &str) -> Result<Option<i64>> {
        Ok(self.conn.query_row(
            "SELECT MAX(floor_number) FROM replies WHERE post_id = ?1",
            params![post_id],
            |row| row.get(0),
        )?)
    }

    fn update(&self, record: &ReplyRecord) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE replies
            SET user_id = ?2, content = ?3, images = ?4, is_anonymous = ?5, custom_time = ?6,
                region = ?7, user_title = ?8, user_identity = ?9, user_rank = ?10,
                floor_number = ?11, parent_reply_id = ?12, likes = ?13, sort_order = ?14
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.user_id,
                record.content,
                record.images,
                if record.is_anonymous { 1 } else { 0 },
                record.custom_time,
                record.region,
                record.user_title,
                record.user_identity,
                record.user_rank,
                record.floor_number,
                record.parent_reply_id,
                record.likes,
                record.sort_order
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM replies WHERE id = ?1", params![id])?)
    }

    fn adjust_likes(&self, id: &str, delta: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE replies SET likes = likes + ?2 WHERE id = ?1",
            params![id, delta],
        )?;
        Ok(())
    }
}
