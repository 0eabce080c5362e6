use crate::database::models::UserRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteUserRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const COLUMNS: &str = "id, username, credential, avatar, rank, title, identity, created_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        credential: row.get(2)?,
        avatar: row.get(3)?,
        rank: row.get(4)?,
        title: row.get(5)?,
        identity: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl<'conn> super::UserRepository for SqliteUserRepository<'conn> {
    fn create(&self, record: &UserRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (id, username, credential, avatar, rank, title, identity, created_at)
            VALUES (?1, ?2, ?3, COALESCE(?4, 'avatars/default-avatar.png'), COALESCE(?5, '坚韧黑铁'), COALESCE(?6, ''), COALESCE(?7, ''), ?8)
            "#,
            params![
                record.id,
                record.username,
                record.credential,
                record.avatar,
                record.rank,
                record.title,
                record.identity,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?)
    }

    fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                map_row,
            )
            .optional()?)
    }

    fn list(&self) -> Result<Vec<UserRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM users ORDER BY username ASC"))?;
        let rows = stmt.query_map([], map_row)?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    fn update(&self, record: &UserRecord) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE users
            SET username = ?2, credential = ?3, avatar = ?4, rank = ?5, title = ?6, identity = ?7
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.username,
                record.credential,
                record.avatar,
                record.rank,
                record.title,
                record.identity
            ],
        )?;
        Ok(())
    }
}
