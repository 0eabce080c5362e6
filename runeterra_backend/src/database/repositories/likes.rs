use crate::database::models::LikeRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteLikeRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::LikeRepository for SqliteLikeRepository<'conn> {
    fn add(&self, record: &LikeRecord) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO likes (post_id, user_id, created_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![record.post_id, record.user_id, record.created_at],
        )?;
        Ok(changed > 0)
    }

    fn remove(&self, post_id: &str, user_id: &str) -> Result<usize> {
        Ok(self.conn.execute(
            "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?)
    }

    fn exists(&self, post_id: &str, user_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
