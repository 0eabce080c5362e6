//! Posts, replies, likes, and the editorial reorder path.
//!
//! `PostService` owns the two read/write invariants that matter here: reply
//! floor numbering (see `floors`) and the view-time identity projection (see
//! `attribution`). Everything a reader receives is a `PostView`/`ReplyView`
//! projected from raw rows on each read.

use crate::accounts::UserService;
use crate::attribution::{
    self, AvatarDirectory, ItemOverrides, NoAvatarDirectory, StaticAvatarDirectory,
};
use crate::config::RuneterraPaths;
use crate::database::models::{LikeRecord, PostRecord, ReplyRecord, UserRecord};
use crate::database::repositories::{
    LikeRepository, PostRepository, ReplyRepository, SqliteRepositories, UserRepository,
};
use crate::database::Database;
use crate::error::{ForumError, ForumResult};
use crate::floors;
use crate::utils::now_utc_iso;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Keyed mutual exclusion for per-post floor/order mutations.
///
/// Auto-floor creation and batch reorder are read-compute-write sequences
/// that must not interleave for the same post; operations on different posts
/// never wait on each other.
#[derive(Clone, Default)]
pub struct PostLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl PostLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn for_post(&self, post_id: &str) -> Arc<Mutex<()>> {
        let mut map = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(post_id.to_string()).or_default().clone()
    }
}

#[derive(Clone)]
pub struct PostService {
    database: Database,
    locks: PostLocks,
    avatars: Arc<dyn AvatarDirectory>,
}

impl PostService {
    pub fn new(database: Database, locks: PostLocks) -> Self {
        Self {
            database,
            locks,
            avatars: Arc::new(NoAvatarDirectory),
        }
    }

    /// Resolves fallback avatars against the mounted upload directory.
    pub fn with_avatar_paths(database: Database, locks: PostLocks, paths: &RuneterraPaths) -> Self {
        Self {
            database,
            locks,
            avatars: Arc::new(StaticAvatarDirectory::new(&paths.avatars_dir)),
        }
    }

    // ── posts ────────────────────────────────────────────────────────────

    pub fn list_posts(
        &self,
        category: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> ForumResult<Vec<PostView>> {
        self.database
            .with_repositories(|repos| {
                let records = repos.posts().list(category, limit, offset)?;
                let mut views = Vec::with_capacity(records.len());
                for record in records {
                    views.push(build_post_view(&repos, self.avatars.as_ref(), record)?);
                }
                Ok(views)
            })
            .map_err(ForumError::from_anyhow)
    }

    /// Fetches one post, counting the view first the way the board always
    /// has.
    pub fn get_post(&self, post_id: &str) -> ForumResult<PostView> {
        self.database
            .with_repositories(|repos| {
                repos.posts().increment_views(post_id)?;
                let record = repos
                    .posts()
                    .get(post_id)?
                    .ok_or_else(|| not_found("post", post_id))?;
                build_post_view(&repos, self.avatars.as_ref(), record)
            })
            .map_err(ForumError::from_anyhow)
    }

    pub fn create_post(&self, input: CreatePostInput) -> ForumResult<PostView> {
        if input.title.trim().is_empty()
            || input.content.trim().is_empty()
            || input.category.trim().is_empty()
        {
            return Err(ForumError::Validation(
                "title, content and category may not be empty".into(),
            ));
        }

        let user_id =
            self.resolve_attribution(input.is_anonymous, input.user_id, input.username.as_deref())?;
        let created_at = input.created_at.unwrap_or_else(now_utc_iso);
        let record = PostRecord {
            id: Uuid::new_v4().to_string(),
            user_id,
            title: input.title,
            content: input.content,
            category: input.category,
            images: encode_images(&input.images),
            is_anonymous: input.is_anonymous,
            custom_time: input.custom_time,
            region: input.region,
            user_title: input.user_title,
            user_identity: input.user_identity,
            user_rank: input.user_rank,
            views: 0,
            likes: 0,
            is_pinned: false,
            sort_order: input.sort_order.unwrap_or(0),
            custom_replies_count: None,
            created_at: created_at.clone(),
            updated_at: created_at,
        };

        self.database
            .with_repositories(|repos| {
                repos.posts().create(&record)?;
                build_post_view(&repos, self.avatars.as_ref(), record.clone())
            })
            .map_err(ForumError::from_anyhow)
    }

    pub fn update_post(&self, post_id: &str, patch: PostPatch) -> ForumResult<PostView> {
        let mut record = self
            .database
            .with_repositories(|repos| repos.posts().get(post_id))
            .map_err(ForumError::from_anyhow)?
            .ok_or_else(|| ForumError::NotFound(format!("post {post_id} not found")))?;

        let is_anonymous = patch.is_anonymous.unwrap_or(record.is_anonymous);
        if let Some(username) = patch
            .username
            .as_deref()
            .filter(|name| !is_anonymous && !name.trim().is_empty())
        {
            let user = self.accounts().resolve_or_create(username)?;
            record.user_id = Some(user.id);
        } else if let Some(user_id) = patch.user_id {
            record.user_id = user_id;
        }

        if let Some(title) = patch.title {
            record.title = title;
        }
        if let Some(content) = patch.content {
            record.content = content;
        }
        if let Some(category) = patch.category {
            record.category = category;
        }
        record.is_anonymous = is_anonymous;
        if let Some(custom_time) = patch.custom_time {
            record.custom_time = custom_time;
        }
        if let Some(region) = patch.region {
            record.region = Some(region);
        }
        if let Some(user_title) = patch.user_title {
            record.user_title = user_title;
        }
        if let Some(user_identity) = patch.user_identity {
            record.user_identity = user_identity;
        }
        if let Some(user_rank) = patch.user_rank {
            record.user_rank = user_rank;
        }
        if let Some(images) = patch.images {
            record.images = encode_images(&images);
        }
        if let Some(views) = patch.views {
            record.views = views;
        }
        if let Some(likes) = patch.likes {
            record.likes = likes;
        }
        if let Some(is_pinned) = patch.is_pinned {
            record.is_pinned = is_pinned;
        }
        if let Some(sort_order) = patch.sort_order {
            record.sort_order = sort_order;
        }
        if let Some(custom_replies_count) = patch.custom_replies_count {
            record.custom_replies_count = custom_replies_count;
        }
        record.updated_at = now_utc_iso();

        self.database
            .with_repositories(|repos| {
                repos.posts().update(&record)?;
                build_post_view(&repos, self.avatars.as_ref(), record.clone())
            })
            .map_err(ForumError::from_anyhow)
    }

    pub fn delete_post(&self, post_id: &str) -> ForumResult<()> {
        let deleted = self
            .database
            .with_repositories(|repos| repos.posts().delete(post_id))
            .map_err(ForumError::from_anyhow)?;
        if deleted == 0 {
            return Err(ForumError::NotFound(format!("post {post_id} not found")));
        }
        Ok(())
    }

    // ── replies ──────────────────────────────────────────────────────────

    pub fn list_replies(&self, post_id: &str) -> ForumResult<Vec<ReplyView>> {
        self.database
            .with_repositories(|repos| {
                if repos.posts().get(post_id)?.is_none() {
                    return Err(not_found("post", post_id));
                }
                build_reply_views(&repos, self.avatars.as_ref(), post_id)
            })
            .map_err(ForumError::from_anyhow)
    }

    pub fn create_reply(&self, post_id: &str, input: CreateReplyInput) -> ForumResult<ReplyView> {
        if input.content.trim().is_empty() {
            return Err(ForumError::Validation("reply content may not be empty".into()));
        }

        let user_id =
            self.resolve_attribution(input.is_anonymous, input.user_id, input.username.as_deref())?;
        let created_at = input.created_at.unwrap_or_else(now_utc_iso);
        let reply_id = Uuid::new_v4().to_string();

        // Critical section: reading the max floor and inserting must not
        // interleave with another create or a reorder on the same post.
        let lock = self.locks.for_post(post_id);
        let _guard = lock
            .lock()
            .map_err(|_| ForumError::Internal(anyhow!("post lock poisoned")))?;

        self.database
            .with_repositories(|repos| {
                if repos.posts().get(post_id)?.is_none() {
                    return Err(not_found("post", post_id));
                }
                let floor_number = match input.floor_number {
                    Some(pinned) => pinned,
                    None => {
                        floors::next_floor_number(repos.replies().max_floor_for_post(post_id)?)
                    }
                };
                let record = ReplyRecord {
                    id: reply_id.clone(),
                    post_id: post_id.to_string(),
                    user_id: user_id.clone(),
                    content: input.content.clone(),
                    images: encode_images(&input.images),
                    is_anonymous: input.is_anonymous,
                    custom_time: input.custom_time.clone(),
                    region: input.region.clone(),
                    user_title: input.user_title.clone(),
                    user_identity: input.user_identity.clone(),
                    user_rank: input.user_rank.clone(),
                    floor_number: Some(floor_number),
                    parent_reply_id: input.parent_reply_id.clone(),
                    likes: 0,
                    sort_order: input.sort_order.unwrap_or(0),
                    created_at: created_at.clone(),
                };
                repos.replies().create(&record)?;
                Ok(())
            })
            .map_err(ForumError::from_anyhow)?;
        drop(_guard);

        self.reply_view(post_id, &reply_id)
    }

    pub fn update_reply(&self, reply_id: &str, patch: ReplyPatch) -> ForumResult<ReplyView> {
        let mut record = self
            .database
            .with_repositories(|repos| repos.replies().get(reply_id))
            .map_err(ForumError::from_anyhow)?
            .ok_or_else(|| ForumError::NotFound(format!("reply {reply_id} not found")))?;

        let is_anonymous = patch.is_anonymous.unwrap_or(record.is_anonymous);
        if let Some(username) = patch
            .username
            .as_deref()
            .filter(|name| !is_anonymous && !name.trim().is_empty())
        {
            let user = self.accounts().resolve_or_create(username)?;
            record.user_id = Some(user.id);
        } else if let Some(user_id) = patch.user_id {
            record.user_id = user_id;
        }

        if let Some(content) = patch.content {
            record.content = content;
        }
        record.is_anonymous = is_anonymous;
        if let Some(custom_time) = patch.custom_time {
            record.custom_time = custom_time;
        }
        if let Some(region) = patch.region {
            record.region = Some(region);
        }
        if let Some(user_title) = patch.user_title {
            record.user_title = user_title;
        }
        if let Some(user_identity) = patch.user_identity {
            record.user_identity = user_identity;
        }
        if let Some(user_rank) = patch.user_rank {
            record.user_rank = user_rank;
        }
        if let Some(floor_number) = patch.floor_number {
            record.floor_number = floor_number;
        }
        if let Some(parent_reply_id) = patch.parent_reply_id {
            record.parent_reply_id = parent_reply_id;
        }
        if let Some(images) = patch.images {
            record.images = encode_images(&images);
        }
        if let Some(likes) = patch.likes {
            record.likes = likes;
        }
        if let Some(sort_order) = patch.sort_order {
            record.sort_order = sort_order;
        }

        let post_id = record.post_id.clone();
        self.database
            .with_repositories(|repos| repos.replies().update(&record))
            .map_err(ForumError::from_anyhow)?;

        self.reply_view(&post_id, reply_id)
    }

    /// Removes one reply. Nothing else is renumbered: floor gaps stay, and
    /// replies quoting the deleted one keep their now-dangling reference.
    pub fn delete_reply(&self, reply_id: &str) -> ForumResult<()> {
        let deleted = self
            .database
            .with_repositories(|repos| repos.replies().delete(reply_id))
            .map_err(ForumError::from_anyhow)?;
        if deleted == 0 {
            return Err(ForumError::NotFound(format!("reply {reply_id} not found")));
        }
        Ok(())
    }

    /// Applies a drag-reorder: the full id sequence becomes the new display
    /// order, `sort_order = index` and `floor_number = index + 1` for every
    /// entry. The whole batch is one transaction; an unknown id or an id from
    /// another post rejects it with no partial effect, previously pinned
    /// floors included.
    pub fn reorder_replies(&self, post_id: &str, ordered_reply_ids: &[String]) -> ForumResult<()> {
        if ordered_reply_ids.is_empty() {
            return Err(ForumError::Validation("reorder sequence may not be empty".into()));
        }

        let lock = self.locks.for_post(post_id);
        let _guard = lock
            .lock()
            .map_err(|_| ForumError::Internal(anyhow!("post lock poisoned")))?;

        self.database
            .with_repositories(|repos| {
                if repos.posts().get(post_id)?.is_none() {
                    return Err(not_found("post", post_id));
                }
                let tx = repos.conn().unchecked_transaction()?;
                for (index, reply_id) in ordered_reply_ids.iter().enumerate() {
                    let owner = repos
                        .replies()
                        .get(reply_id)?
                        .map(|reply| reply.post_id)
                        .ok_or_else(|| {
                            anyhow::Error::new(ForumError::Validation(format!(
                                "unknown reply {reply_id} in reorder sequence"
                            )))
                        })?;
                    if owner != post_id {
                        return Err(anyhow::Error::new(ForumError::Validation(format!(
                            "reply {reply_id} belongs to a different post"
                        ))));
                    }
                    tx.execute(
                        "UPDATE replies SET sort_order = ?1, floor_number = ?2 WHERE id = ?3",
                        rusqlite::params![index as i64, (index + 1) as i64, reply_id],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .map_err(ForumError::from_anyhow)
    }

    // ── likes ────────────────────────────────────────────────────────────

    /// Toggles the (post, user) like pair and keeps the denormalized counter
    /// in step. Returns whether the post ends up liked.
    pub fn toggle_like(&self, post_id: &str, user_id: &str) -> ForumResult<bool> {
        self.database
            .with_repositories(|repos| {
                if repos.posts().get(post_id)?.is_none() {
                    return Err(not_found("post", post_id));
                }
                if repos.users().get(user_id)?.is_none() {
                    return Err(not_found("user", user_id));
                }
                let like = LikeRecord {
                    post_id: post_id.to_string(),
                    user_id: user_id.to_string(),
                    created_at: now_utc_iso(),
                };
                if repos.likes().add(&like)? {
                    repos.posts().adjust_likes(post_id, 1)?;
                    Ok(true)
                } else {
                    repos.likes().remove(post_id, user_id)?;
                    repos.posts().adjust_likes(post_id, -1)?;
                    Ok(false)
                }
            })
            .map_err(ForumError::from_anyhow)
    }

    pub fn is_liked(&self, post_id: &str, user_id: &str) -> ForumResult<bool> {
        self.database
            .with_repositories(|repos| repos.likes().exists(post_id, user_id))
            .map_err(ForumError::from_anyhow)
    }

    // ── internals ────────────────────────────────────────────────────────

    fn accounts(&self) -> UserService {
        UserService::new(self.database.clone())
    }

    /// Picks the stored author for a new or edited item. A free-text username
    /// resolves through get-or-create, but never for anonymous items, whose
    /// stored author is display-irrelevant anyway.
    fn resolve_attribution(
        &self,
        is_anonymous: bool,
        user_id: Option<String>,
        username: Option<&str>,
    ) -> ForumResult<Option<String>> {
        match username.filter(|name| !name.trim().is_empty()) {
            Some(name) if !is_anonymous => {
                let user = self.accounts().resolve_or_create(name)?;
                Ok(Some(user.id))
            }
            _ => Ok(user_id),
        }
    }

    fn reply_view(&self, post_id: &str, reply_id: &str) -> ForumResult<ReplyView> {
        let views = self
            .database
            .with_repositories(|repos| build_reply_views(&repos, self.avatars.as_ref(), post_id))
            .map_err(ForumError::from_anyhow)?;
        views
            .into_iter()
            .find(|view| view.id == reply_id)
            .ok_or_else(|| ForumError::NotFound(format!("reply {reply_id} not found")))
    }
}

fn not_found(kind: &str, id: &str) -> anyhow::Error {
    anyhow::Error::new(ForumError::NotFound(format!("{kind} {id} not found")))
}

fn encode_images(images: &[String]) -> String {
    serde_json::to_string(images).unwrap_or_else(|_| "[]".to_string())
}

fn decode_images(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn load_user(
    repos: &SqliteRepositories<'_>,
    cache: &mut HashMap<String, Option<UserRecord>>,
    user_id: Option<&str>,
) -> Result<Option<UserRecord>> {
    let Some(user_id) = user_id else {
        return Ok(None);
    };
    if let Some(cached) = cache.get(user_id) {
        return Ok(cached.clone());
    }
    let user = repos.users().get(user_id)?;
    cache.insert(user_id.to_string(), user.clone());
    Ok(user)
}

fn build_post_view(
    repos: &SqliteRepositories<'_>,
    avatars: &dyn AvatarDirectory,
    record: PostRecord,
) -> Result<PostView> {
    let user = match record.user_id.as_deref() {
        Some(user_id) => repos.users().get(user_id)?,
        None => None,
    };
    let identity = attribution::resolve_identity(
        ItemOverrides {
            is_anonymous: record.is_anonymous,
            title: record.user_title.as_deref(),
            identity: record.user_identity.as_deref(),
            rank: record.user_rank.as_deref(),
        },
        user.as_ref(),
        avatars,
    );
    // The displayed count honors the editorial override, zero included; only
    // a cleared override falls back to the real row count.
    let replies_count = match record.custom_replies_count {
        Some(count) => count,
        None => repos.posts().reply_count(&record.id)?,
    };
    let display_time =
        attribution::display_time(record.custom_time.as_deref(), &record.created_at);

    Ok(PostView {
        id: record.id,
        user_id: record.user_id,
        title: record.title,
        content: record.content,
        category: record.category,
        images: decode_images(&record.images),
        is_anonymous: record.is_anonymous,
        custom_time: record.custom_time,
        region: record.region.unwrap_or_default(),
        views: record.views,
        likes: record.likes,
        is_pinned: record.is_pinned,
        sort_order: record.sort_order,
        replies_count,
        username: identity.username,
        avatar: identity.avatar,
        rank: identity.rank,
        user_title: identity.title,
        identity: identity.identity,
        display_time,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

fn build_reply_views(
    repos: &SqliteRepositories<'_>,
    avatars: &dyn AvatarDirectory,
    post_id: &str,
) -> Result<Vec<ReplyView>> {
    let records = repos.replies().list_for_post(post_id)?;
    let stored_floors: Vec<Option<i64>> = records.iter().map(|r| r.floor_number).collect();
    let display_floors = floors::assign_display_floors(&stored_floors);

    // Displayed floor per reply id, for quote resolution against this same
    // listing pass.
    let floors_by_id: HashMap<&str, i64> = records
        .iter()
        .zip(display_floors.iter())
        .map(|(record, floor)| (record.id.as_str(), *floor))
        .collect();
    let records_by_id: HashMap<&str, &ReplyRecord> = records
        .iter()
        .map(|record| (record.id.as_str(), record))
        .collect();

    let mut users: HashMap<String, Option<UserRecord>> = HashMap::new();
    let mut views = Vec::with_capacity(records.len());
    for (record, display_floor) in records.iter().zip(display_floors.iter()) {
        let user = load_user(repos, &mut users, record.user_id.as_deref())?;
        let identity = attribution::resolve_identity(
            ItemOverrides {
                is_anonymous: record.is_anonymous,
                title: record.user_title.as_deref(),
                identity: record.user_identity.as_deref(),
                rank: record.user_rank.as_deref(),
            },
            user.as_ref(),
            avatars,
        );

        // A parent that is gone (or somehow points outside this post) just
        // means no quote block; the read never fails over it.
        let quote = match record.parent_reply_id.as_deref() {
            Some(parent_id) => match records_by_id.get(parent_id) {
                Some(parent) => {
                    let parent_user = load_user(repos, &mut users, parent.user_id.as_deref())?;
                    let parent_identity = attribution::resolve_identity(
                        ItemOverrides {
                            is_anonymous: parent.is_anonymous,
                            title: parent.user_title.as_deref(),
                            identity: parent.user_identity.as_deref(),
                            rank: parent.user_rank.as_deref(),
                        },
                        parent_user.as_ref(),
                        avatars,
                    );
                    Some(QuoteView {
                        reply_id: parent.id.clone(),
                        floor_number: floors_by_id.get(parent_id).copied().unwrap_or(0),
                        username: parent_identity.username,
                        content: parent.content.clone(),
                    })
                }
                None => None,
            },
            None => None,
        };

        views.push(ReplyView {
            id: record.id.clone(),
            post_id: record.post_id.clone(),
            user_id: record.user_id.clone(),
            content: record.content.clone(),
            images: decode_images(&record.images),
            is_anonymous: record.is_anonymous,
            custom_time: record.custom_time.clone(),
            region: record.region.clone().unwrap_or_default(),
            floor_number: *display_floor,
            sort_order: record.sort_order,
            likes: record.likes,
            username: identity.username,
            avatar: identity.avatar,
            rank: identity.rank,
            title: identity.title,
            identity: identity.identity,
            quote,
            display_time: attribution::display_time(
                record.custom_time.as_deref(),
                &record.created_at,
            ),
            created_at: record.created_at.clone(),
        });
    }
    Ok(views)
}

// ── wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Free-text attribution; resolved via get-or-create.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub custom_time: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub user_title: Option<String>,
    #[serde(default)]
    pub user_identity: Option<String>,
    #[serde(default)]
    pub user_rank: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
    /// Editorial timestamp override; defaults to now.
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateReplyInput {
    pub content: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub custom_time: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub user_title: Option<String>,
    #[serde(default)]
    pub user_identity: Option<String>,
    #[serde(default)]
    pub user_rank: Option<String>,
    /// Pinned floor anchor; omitted means one past the current maximum.
    #[serde(default)]
    pub floor_number: Option<i64>,
    #[serde(default)]
    pub parent_reply_id: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Partial post update. An absent field changes nothing; a present null
/// clears the nullable columns (`Option<Option<..>>` fields).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub user_id: Option<Option<String>>,
    pub username: Option<String>,
    pub is_anonymous: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub custom_time: Option<Option<String>>,
    pub region: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub user_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub user_identity: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub user_rank: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub is_pinned: Option<bool>,
    pub sort_order: Option<i64>,
    #[serde(default, deserialize_with = "custom_count_patch")]
    pub custom_replies_count: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyPatch {
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub user_id: Option<Option<String>>,
    pub username: Option<String>,
    pub is_anonymous: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub custom_time: Option<Option<String>>,
    pub region: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub user_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub user_identity: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub user_rank: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub floor_number: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_reply_id: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub likes: Option<i64>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub images: Vec<String>,
    pub is_anonymous: bool,
    pub custom_time: Option<String>,
    pub region: String,
    pub views: i64,
    pub likes: i64,
    pub is_pinned: bool,
    pub sort_order: i64,
    pub replies_count: i64,
    pub username: String,
    pub avatar: String,
    pub rank: String,
    /// Displayed title badge; the post's own title lives in `title`.
    pub user_title: String,
    pub identity: String,
    pub display_time: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyView {
    pub id: String,
    pub post_id: String,
    pub user_id: Option<String>,
    pub content: String,
    pub images: Vec<String>,
    pub is_anonymous: bool,
    pub custom_time: Option<String>,
    pub region: String,
    /// Displayed floor, after gap-filling over the canonical order.
    pub floor_number: i64,
    pub sort_order: i64,
    pub likes: i64,
    pub username: String,
    pub avatar: String,
    pub rank: String,
    pub title: String,
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<QuoteView>,
    pub display_time: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteView {
    pub reply_id: String,
    /// The parent's displayed floor in the same listing pass.
    pub floor_number: i64,
    pub username: String,
    pub content: String,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// `custom_replies_count` patches arrive as a number, a numeric string, an
/// empty string, or null; the last two clear the override.
fn custom_count_patch<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let patch = match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(raw) if raw.trim().is_empty() => None,
        serde_json::Value::String(raw) => Some(raw.trim().parse::<i64>().unwrap_or(0)),
        serde_json::Value::Number(number) => Some(number.as_i64().unwrap_or(0)),
        other => {
            return Err(serde::de::Error::custom(format!(
                "invalid replies count: {other}"
            )))
        }
    };
    Ok(Some(patch))
}
