mod likes;
mod posts;
mod replies;
mod users;

use super::models::{LikeRecord, PostRecord, ReplyRecord, UserRecord};
use anyhow::Result;
use rusqlite::Connection;

pub trait UserRepository {
    fn create(&self, record: &UserRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<UserRecord>>;
    fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>>;
    fn list(&self) -> Result<Vec<UserRecord>>;
    fn update(&self, record: &UserRecord) -> Result<()>;
}

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    fn list(&self, category: Option<&str>, limit: usize, offset: usize) -> Result<Vec<PostRecord>>;
    fn update(&self, record: &PostRecord) -> Result<()>;
    fn delete(&self, id: &str) -> Result<usize>;
    fn increment_views(&self, id: &str) -> Result<()>;
    fn adjust_likes(&self, id: &str, delta: i64) -> Result<()>;
    fn reply_count(&self, post_id: &str) -> Result<i64>;
}

pub trait ReplyRepository {
    fn create(&self, record: &ReplyRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<ReplyRecord>>;
    /// Replies in canonical order: stored floor_number ascending with nulls
    /// last, then sort_order, then creation time.
    fn list_for_post(&self, post_id: &str) -> Result<Vec<ReplyRecord>>;
    fn max_floor_for_post(&self, post_id: &str) -> Result<Option<i64>>;
    fn update(&self, record: &ReplyRecord) -> Result<()>;
    fn delete(&self, id: &str) -> Result<usize>;
    fn adjust_likes(&self, id: &str, delta: i64) -> Result<()>;
}

pub trait LikeRepository {
    /// Returns true if the like row was inserted, false if it already existed.
    fn add(&self, record: &LikeRecord) -> Result<bool>;
    fn remove(&self, post_id: &str, user_id: &str) -> Result<usize>;
    fn exists(&self, post_id: &str, user_id: &str) -> Result<bool>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn users(&self) -> impl UserRepository + '_ {
        users::SqliteUserRepository { conn: self.conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn replies(&self) -> impl ReplyRepository + '_ {
        replies::SqliteReplyRepository { conn: self.conn }
    }

    pub fn likes(&self) -> impl LikeRepository + '_ {
        likes::SqliteLikeRepository { conn: self.conn }
    }

    pub fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MIGRATIONS;
    use crate::utils::now_utc_iso;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(MIGRATIONS).expect("base migrations");
        conn
    }

    fn user(id: &str, username: &str) -> UserRecord {
        UserRecord {
            id: id.into(),
            username: username.into(),
            credential: "1234567".into(),
            avatar: None,
            rank: None,
            title: None,
            identity: None,
            created_at: now_utc_iso(),
        }
    }

    fn post(id: &str, user_id: &str) -> PostRecord {
        PostRecord {
            id: id.into(),
            user_id: Some(user_id.into()),
            title: "召唤师峡谷见闻".into(),
            content: "body".into(),
            category: "plaza".into(),
            images: "[]".into(),
            is_anonymous: false,
            custom_time: None,
            region: None,
            user_title: None,
            user_identity: None,
            user_rank: None,
            views: 0,
            likes: 0,
            is_pinned: false,
            sort_order: 0,
            custom_replies_count: None,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    fn reply(id: &str, post_id: &str, floor: Option<i64>, created_at: &str) -> ReplyRecord {
        ReplyRecord {
            id: id.into(),
            post_id: post_id.into(),
            user_id: None,
            content: "reply".into(),
            images: "[]".into(),
            is_anonymous: false,
            custom_time: None,
            region: None,
            user_title: None,
            user_identity: None,
            user_rank: None,
            floor_number: floor,
            parent_reply_id: None,
            likes: 0,
            sort_order: 0,
            created_at: created_at.into(),
        }
    }

    #[test]
    fn user_and_post_repositories_work() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);

        repos.users().create(&user("user-1", "德玛西亚之力")).unwrap();
        let fetched = repos.users().get_by_username("德玛西亚之力").unwrap().unwrap();
        assert_eq!(fetched.id, "user-1");
        assert_eq!(fetched.rank.as_deref(), Some("坚韧黑铁"));

        repos.posts().create(&post("post-1", "user-1")).unwrap();
        let fetched = repos.posts().get("post-1").unwrap().unwrap();
        assert_eq!(fetched.title, "召唤师峡谷见闻");
        assert_eq!(fetched.views, 0);

        repos.posts().increment_views("post-1").unwrap();
        let fetched = repos.posts().get("post-1").unwrap().unwrap();
        assert_eq!(fetched.views, 1);
    }

    #[test]
    fn reply_listing_uses_canonical_order() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);

        repos.users().create(&user("user-1", "author")).unwrap();
        repos.posts().create(&post("post-1", "user-1")).unwrap();

        // Stored floors [null, 2, null]; nulls must sort last, creation time
        // breaking the tie.
        repos
            .replies()
            .create(&reply("r1", "post-1", None, "2024-01-01T00:00:01Z"))
            .unwrap();
        repos
            .replies()
            .create(&reply("r2", "post-1", Some(2), "2024-01-01T00:00:02Z"))
            .unwrap();
        repos
            .replies()
            .create(&reply("r3", "post-1", None, "2024-01-01T00:00:03Z"))
            .unwrap();

        let ids: Vec<String> = repos
            .replies()
            .list_for_post("post-1")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["r2", "r1", "r3"]);

        assert_eq!(repos.replies().max_floor_for_post("post-1").unwrap(), Some(2));
        assert_eq!(repos.replies().max_floor_for_post("post-2").unwrap(), None);
    }

    #[test]
    fn like_rows_are_unique_per_user() {
        let conn = setup_conn();
        let repos = SqliteRepositories::new(&conn);

        repos.users().create(&user("user-1", "liker")).unwrap();
        repos.posts().create(&post("post-1", "user-1")).unwrap();

        let like = LikeRecord {
            post_id: "post-1".into(),
            user_id: "user-1".into(),
            created_at: now_utc_iso(),
        };
        assert!(repos.likes().add(&like).unwrap());
        assert!(!repos.likes().add(&like).unwrap());
        assert!(repos.likes().exists("post-1", "user-1").unwrap());
        assert_eq!(repos.likes().remove("post-1", "user-1").unwrap(), 1);
        assert!(!repos.likes().exists("post-1", "user-1").unwrap());
    }
}
