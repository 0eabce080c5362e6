use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub credential: String,
    pub avatar: Option<String>,
    pub rank: Option<String>,
    pub title: Option<String>,
    pub identity: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub content: String,
    pub category: String,
    /// JSON array of image references.
    pub images: String,
    pub is_anonymous: bool,
    pub custom_time: Option<String>,
    pub region: Option<String>,
    pub user_title: Option<String>,
    pub user_identity: Option<String>,
    pub user_rank: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub is_pinned: bool,
    pub sort_order: i64,
    pub custom_replies_count: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub id: String,
    pub post_id: String,
    pub user_id: Option<String>,
    pub content: String,
    pub images: String,
    pub is_anonymous: bool,
    pub custom_time: Option<String>,
    pub region: Option<String>,
    pub user_title: Option<String>,
    pub user_identity: Option<String>,
    pub user_rank: Option<String>,
    pub floor_number: Option<i64>,
    pub parent_reply_id: Option<String>,
    pub likes: i64,
    pub sort_order: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRecord {
    pub post_id: String,
    pub user_id: String,
    pub created_at: String,
}
