pub mod models;
pub mod repositories;

use crate::config::RuneterraPaths;
use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub(crate) const MIGRATIONS: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT UNIQUE NOT NULL,
        credential TEXT NOT NULL,
        avatar TEXT DEFAULT 'avatars/default-avatar.png',
        rank TEXT DEFAULT '坚韧黑铁',
        title TEXT DEFAULT '',
        identity TEXT DEFAULT '',
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        user_id TEXT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        category TEXT NOT NULL,
        images TEXT DEFAULT '[]',
        is_anonymous INTEGER DEFAULT 0,
        custom_time TEXT,
        region TEXT DEFAULT '',
        user_title TEXT,
        user_identity TEXT,
        user_rank TEXT,
        views INTEGER DEFAULT 0,
        likes INTEGER DEFAULT 0,
        is_pinned INTEGER DEFAULT 0,
        sort_order INTEGER DEFAULT 0,
        custom_replies_count INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id)
    );

    -- parent_reply_id intentionally carries no foreign key: deleting a reply
    -- leaves quoting replies with a dangling reference that the read path
    -- degrades over instead of failing.
    CREATE TABLE IF NOT EXISTS replies (
        id TEXT PRIMARY KEY,
        post_id TEXT NOT NULL,
        user_id TEXT,
        content TEXT NOT NULL,
        images TEXT DEFAULT '[]',
        is_anonymous INTEGER DEFAULT 0,
        custom_time TEXT,
        region TEXT DEFAULT '',
        user_title TEXT,
        user_identity TEXT,
        user_rank TEXT,
        floor_number INTEGER,
        parent_reply_id TEXT,
        likes INTEGER DEFAULT 0,
        sort_order INTEGER DEFAULT 0,
        created_at TEXT NOT NULL,
        FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
        FOREIGN KEY (user_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS likes (
        post_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (post_id, user_id),
        FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
        FOREIGN KEY (user_id) REFERENCES users(id)
    );

    CREATE INDEX IF NOT EXISTS idx_posts_category ON posts(category);
    CREATE INDEX IF NOT EXISTS idx_replies_post ON replies(post_id);
    CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id);
"#;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    newly_created: bool,
}

impl Database {
    pub fn connect(paths: &RuneterraPaths) -> Result<Self> {
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

    pub fn ensure_migrations(&self) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATIONS)?;
            self.ensure_post_editorial_columns(conn)?;
            self.ensure_reply_editorial_columns(conn)?;
            Ok(())
        })?;
        Ok(self.newly_created)
    }

    pub fn with_repositories<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> Result<T>,
    {
        self.with_conn(|conn| {
            let repos = repositories::SqliteRepositories::new(conn);
            f(repos)
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))?;
        f(&guard)
    }

    // Databases created before the editorial rework predate the override and
    // counter columns; back-fill them the same way new fields were always
    // added.
    fn ensure_post_editorial_columns(&self, conn: &Connection) -> Result<()> {
        let existing = Self::column_names(conn, "posts")?;
        let wanted: &[(&str, &str)] = &[
            ("is_pinned", "INTEGER DEFAULT 0"),
            ("sort_order", "INTEGER DEFAULT 0"),
            ("custom_replies_count", "INTEGER"),
            ("user_rank", "TEXT"),
        ];
        for (column, definition) in wanted {
            if !existing.iter().any(|name| name.eq_ignore_ascii_case(column)) {
                conn.execute(
                    &format!("ALTER TABLE posts ADD COLUMN {column} {definition}"),
                    [],
                )?;
            }
        }
        Ok(())
    }

    fn ensure_reply_editorial_columns(&self, conn: &Connection) -> Result<()> {
        let existing = Self::column_names(conn, "replies")?;
        let wanted: &[(&str, &str)] = &[
            ("floor_number", "INTEGER"),
            ("parent_reply_id", "TEXT"),
            ("sort_order", "INTEGER DEFAULT 0"),
            ("user_rank", "TEXT"),
        ];
        for (column, definition) in wanted {
            if !existing.iter().any(|name| name.eq_ignore_ascii_case(column)) {
                conn.execute(
                    &format!("ALTER TABLE replies ADD COLUMN {column} {definition}"),
                    [],
                )?;
            }
        }
        Ok(())
    }

    fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(1)?;
            Ok(name)
        })?;
        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }
}
