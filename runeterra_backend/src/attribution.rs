//! Effective display identity for posts and replies.
//!
//! Stored rows keep the raw pieces — an anonymity flag, per-item override
//! fields, and a link to a user account. What a reader sees is projected from
//! those pieces on every read; the resolved values are never written back.

use crate::database::models::UserRecord;
use chrono::{DateTime, Datelike, Timelike};
use regex::Regex;
use std::path::Path;

pub const ANONYMOUS_USERNAME: &str = "匿名用户";
pub const DEFAULT_AVATAR: &str = "avatars/default-avatar.png";
pub const DEFAULT_RANK: &str = "坚韧黑铁";
/// Credential written for accounts manufactured by get-or-create.
pub const DEFAULT_CREDENTIAL: &str = "1234567";

const EPOCH_LABEL: &str = "瓦罗兰历";
/// Valoran year 1 maps to this Gregorian year.
const EPOCH_BASE_YEAR: i32 = 2000;

/// Per-item override fields shared by posts and replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemOverrides<'a> {
    pub is_anonymous: bool,
    pub title: Option<&'a str>,
    pub identity: Option<&'a str>,
    pub rank: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveIdentity {
    pub username: String,
    pub avatar: String,
    pub rank: String,
    pub title: String,
    pub identity: String,
}

/// Lookup for per-username fallback avatars (static champion art and the
/// like). The collection itself lives outside this crate.
pub trait AvatarDirectory: Send + Sync {
    fn lookup(&self, username: &str) -> Option<String>;
}

/// Used when no avatar collection is mounted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAvatarDirectory;

impl AvatarDirectory for NoAvatarDirectory {
    fn lookup(&self, _username: &str) -> Option<String> {
        None
    }
}

/// Probes a directory on disk for `{username}.{jpg,jpeg,webp}`.
#[derive(Debug, Clone)]
pub struct StaticAvatarDirectory {
    dir: std::path::PathBuf,
}

impl StaticAvatarDirectory {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl AvatarDirectory for StaticAvatarDirectory {
    fn lookup(&self, username: &str) -> Option<String> {
        for ext in ["jpg", "jpeg", "webp"] {
            let candidate = self.dir.join(format!("{username}.{ext}"));
            if candidate.is_file() {
                return Some(format!("avatars/{username}.{ext}"));
            }
        }
        None
    }
}

/// Projects the displayed identity for one post or reply.
///
/// Anonymity short-circuits everything: stored overrides and the linked
/// profile are ignored even when populated. Otherwise each field falls from
/// the item override to the linked user's profile to a fixed default, with
/// empty strings treated as unset.
pub fn resolve_identity(
    overrides: ItemOverrides<'_>,
    user: Option<&UserRecord>,
    avatars: &dyn AvatarDirectory,
) -> EffectiveIdentity {
    if overrides.is_anonymous {
        return EffectiveIdentity {
            username: ANONYMOUS_USERNAME.to_string(),
            avatar: DEFAULT_AVATAR.to_string(),
            rank: DEFAULT_RANK.to_string(),
            title: String::new(),
            identity: String::new(),
        };
    }

    let username = user
        .map(|u| u.username.clone())
        .unwrap_or_else(|| ANONYMOUS_USERNAME.to_string());

    let stored_avatar = user
        .and_then(|u| u.avatar.as_deref())
        .filter(|path| !path.is_empty() && *path != DEFAULT_AVATAR);
    let avatar = stored_avatar
        .map(str::to_string)
        .or_else(|| avatars.lookup(&username))
        .unwrap_or_else(|| DEFAULT_AVATAR.to_string());

    EffectiveIdentity {
        username,
        avatar,
        rank: pick(overrides.rank, user.and_then(|u| u.rank.as_deref()), DEFAULT_RANK),
        title: pick(overrides.title, user.and_then(|u| u.title.as_deref()), ""),
        identity: pick(
            overrides.identity,
            user.and_then(|u| u.identity.as_deref()),
            "",
        ),
    }
}

fn pick(item: Option<&str>, user: Option<&str>, default: &str) -> String {
    item.filter(|value| !value.is_empty())
        .or_else(|| user.filter(|value| !value.is_empty()))
        .unwrap_or(default)
        .to_string()
}

/// Renders the timestamp a reader sees.
///
/// A stored custom time wins: bare `YY(YY)-MM-DD HH:MM` stamps get the epoch
/// label prefixed (years 1-9 padded to two digits), stamps already carrying
/// an epoch marker pass through verbatim, anything else is labelled as-is.
/// Without a custom time the real creation instant converts into the Valoran
/// calendar, a fixed linear offset from the Gregorian one.
pub fn display_time(custom_time: Option<&str>, created_at: &str) -> String {
    if let Some(custom) = custom_time.filter(|value| !value.trim().is_empty()) {
        let plain = Regex::new(r"^\d{2,4}-\d{2}-\d{2} \d{2}:\d{2}$").unwrap();
        if plain.is_match(custom) {
            let (date_part, time_part) = custom.split_once(' ').unwrap_or((custom, ""));
            let mut pieces = date_part.splitn(3, '-');
            let year = pieces.next().unwrap_or_default();
            let month = pieces.next().unwrap_or_default();
            let day = pieces.next().unwrap_or_default();
            let year = match year.parse::<i64>() {
                Ok(value) if value < 10 => format!("{value:02}"),
                _ => year.to_string(),
            };
            return format!("{EPOCH_LABEL} {year}-{month}-{day} {time_part}");
        }
        if custom.contains(EPOCH_LABEL) || custom.contains("瓦罗兰纪元") || custom.contains("AN") {
            return custom.to_string();
        }
        return format!("{EPOCH_LABEL} {custom}");
    }

    match DateTime::parse_from_rfc3339(created_at) {
        Ok(instant) => {
            let year = instant.year() - EPOCH_BASE_YEAR + 1;
            let year = if (0..10).contains(&year) {
                format!("{year:02}")
            } else {
                year.to_string()
            };
            format!(
                "{EPOCH_LABEL} {year}-{:02}-{:02} {:02}:{:02}",
                instant.month(),
                instant.day(),
                instant.hour(),
                instant.minute()
            )
        }
        // Imported rows sometimes carry timestamps we cannot parse; show them
        // untranslated rather than failing the read.
        Err(_) => created_at.to_string(),
    }
}
