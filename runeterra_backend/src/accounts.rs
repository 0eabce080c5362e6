use crate::attribution::DEFAULT_CREDENTIAL;
use crate::database::models::UserRecord;
use crate::database::repositories::UserRepository;
use crate::database::Database;
use crate::error::{ForumError, ForumResult};
use crate::utils::now_utc_iso;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    database: Database,
}

impl UserService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn register(&self, input: RegisterInput) -> ForumResult<UserView> {
        let username = input.username.trim().to_string();
        if username.is_empty() || input.password.is_empty() {
            return Err(ForumError::Validation(
                "username and password may not be empty".into(),
            ));
        }

        let record = new_user_record(&username, &input.password);
        let created = self
            .database
            .with_repositories(|repos| repos.users().create(&record));
        match created {
            Ok(()) => Ok(UserView::from_record(record)),
            Err(err) if is_unique_violation(&err) => Err(ForumError::Validation(format!(
                "username {username} already exists"
            ))),
            Err(err) => Err(ForumError::Internal(err)),
        }
    }

    pub fn list(&self) -> ForumResult<Vec<UserView>> {
        self.database
            .with_repositories(|repos| {
                let users = repos.users().list()?;
                Ok(users.into_iter().map(UserView::from_record).collect())
            })
            .map_err(ForumError::from_anyhow)
    }

    pub fn get(&self, id: &str) -> ForumResult<Option<UserView>> {
        self.database
            .with_repositories(|repos| Ok(repos.users().get(id)?.map(UserView::from_record)))
            .map_err(ForumError::from_anyhow)
    }

    pub fn update_profile(&self, id: &str, input: UpdateUserInput) -> ForumResult<UserView> {
        let mut record = self
            .database
            .with_repositories(|repos| repos.users().get(id))
            .map_err(ForumError::from_anyhow)?
            .ok_or_else(|| ForumError::NotFound(format!("user {id} not found")))?;

        if let Some(username) = input.username {
            if username.trim().is_empty() {
                return Err(ForumError::Validation("username may not be empty".into()));
            }
            record.username = username;
        }
        if let Some(rank) = input.rank {
            record.rank = Some(rank);
        }
        if let Some(title) = input.title {
            record.title = Some(title);
        }
        if let Some(identity) = input.identity {
            record.identity = Some(identity);
        }
        if let Some(avatar) = input.avatar {
            record.avatar = Some(avatar);
        }

        let updated = self
            .database
            .with_repositories(|repos| repos.users().update(&record));
        match updated {
            Ok(()) => Ok(UserView::from_record(record)),
            Err(err) if is_unique_violation(&err) => Err(ForumError::Validation(format!(
                "username {} already exists",
                record.username
            ))),
            Err(err) => Err(ForumError::Internal(err)),
        }
    }

    /// Resolves a free-text display name to a user id, creating the account
    /// with the default credential when it does not exist yet.
    ///
    /// A concurrent creation of the same name is tolerated by re-querying
    /// once; if the name still cannot be found the conflict is fatal.
    pub fn resolve_or_create(&self, name: &str) -> ForumResult<UserRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ForumError::Validation("username may not be empty".into()));
        }

        if let Some(existing) = self.fetch_by_username(name)? {
            return Ok(existing);
        }

        let record = new_user_record(name, DEFAULT_CREDENTIAL);
        let created = self
            .database
            .with_repositories(|repos| repos.users().create(&record));
        match created {
            Ok(()) => self.fetch_by_username(name)?.ok_or_else(|| {
                ForumError::Internal(anyhow!("user creation lost newly inserted record"))
            }),
            Err(err) if is_unique_violation(&err) => {
                tracing::debug!(username = %name, "lost user creation race, re-querying");
                self.fetch_by_username(name)?.ok_or_else(|| {
                    ForumError::Conflict(format!(
                        "user {name} could not be created or found after retry"
                    ))
                })
            }
            Err(err) => Err(ForumError::Internal(err)),
        }
    }

    fn fetch_by_username(&self, name: &str) -> ForumResult<Option<UserRecord>> {
        self.database
            .with_repositories(|repos| repos.users().get_by_username(name))
            .map_err(ForumError::from_anyhow)
    }
}

fn new_user_record(username: &str, credential: &str) -> UserRecord {
    UserRecord {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        credential: credential.to_string(),
        avatar: None,
        rank: None,
        title: None,
        identity: None,
        created_at: now_utc_iso(),
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(failure, _))
            if failure.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub rank: Option<String>,
    pub title: Option<String>,
    pub identity: Option<String>,
    pub avatar: Option<String>,
}

/// Public profile shape; the stored credential never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub rank: String,
    pub title: String,
    pub identity: String,
}

impl UserView {
    fn from_record(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            avatar: record
                .avatar
                .unwrap_or_else(|| crate::attribution::DEFAULT_AVATAR.to_string()),
            rank: record
                .rank
                .unwrap_or_else(|| crate::attribution::DEFAULT_RANK.to_string()),
            title: record.title.unwrap_or_default(),
            identity: record.identity.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_service() -> UserService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        UserService::new(db)
    }

    #[test]
    fn register_applies_profile_defaults() {
        let service = setup_service();
        let user = service
            .register(RegisterInput {
                username: "疾风剑豪".into(),
                password: "hasagi".into(),
            })
            .expect("register");
        assert_eq!(user.username, "疾风剑豪");
        assert_eq!(user.rank, crate::attribution::DEFAULT_RANK);
        assert_eq!(user.avatar, crate::attribution::DEFAULT_AVATAR);
        assert_eq!(user.title, "");
    }

    #[test]
    fn register_rejects_duplicate_username() {
        let service = setup_service();
        service
            .register(RegisterInput {
                username: "盲僧".into(),
                password: "a".into(),
            })
            .expect("first register");
        let err = service
            .register(RegisterInput {
                username: "盲僧".into(),
                password: "b".into(),
            })
            .expect_err("duplicate must fail");
        assert!(matches!(err, ForumError::Validation(_)));
    }

    #[test]
    fn resolve_or_create_reuses_existing_account() {
        let service = setup_service();
        let first = service.resolve_or_create("寒冰射手").expect("create");
        let second = service.resolve_or_create("寒冰射手").expect("resolve");
        assert_eq!(first.id, second.id);
        assert_eq!(first.credential, DEFAULT_CREDENTIAL);
        assert_eq!(service.list().expect("list").len(), 1);
    }

    #[test]
    fn resolve_or_create_is_race_safe() {
        let service = setup_service();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let service = service.clone();
            handles.push(std::thread::spawn(move || {
                service.resolve_or_create("发条魔灵").expect("resolve or create")
            }));
        }
        let ids: Vec<String> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread").id)
            .collect();
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(service.list().expect("list").len(), 1);
    }

    #[test]
    fn profile_update_is_partial() {
        let service = setup_service();
        let user = service
            .register(RegisterInput {
                username: "皮城女警".into(),
                password: "a".into(),
            })
            .expect("register");
        let updated = service
            .update_profile(
                &user.id,
                UpdateUserInput {
                    rank: Some("最强王者".into()),
                    title: Some("皮尔特沃夫的守护者".into()),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(updated.username, "皮城女警");
        assert_eq!(updated.rank, "最强王者");
        assert_eq!(updated.title, "皮尔特沃夫的守护者");
    }
}
