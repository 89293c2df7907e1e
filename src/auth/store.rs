use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::AppError,
    users::repo_types::{NewUser, User},
};

/// Where the authorizer and the sign-up flow look users up.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact match on username, case-insensitive match on email.
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError>;

    /// Fails with `Conflict` when the username or email is taken.
    async fn create(&self, new: NewUser) -> Result<User, AppError>;
}

#[derive(Clone)]
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        Ok(User::find_by_login(&self.db, login).await?)
    }

    async fn create(&self, new: NewUser) -> Result<User, AppError> {
        match User::create(&self.db, &new).await {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::Conflict("Username or email already taken".into()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub use memory::InMemoryCredentialStore;

#[cfg(test)]
mod memory {
    use std::sync::Mutex;

    use time::OffsetDateTime;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryCredentialStore {
        users: Mutex<Vec<User>>,
    }

    impl InMemoryCredentialStore {
        pub fn len(&self) -> usize {
            self.users.lock().unwrap().len()
        }

        pub fn set_disabled(&self, username: &str, disabled: bool) {
            let mut users = self.users.lock().unwrap();
            if let Some(user) = users.iter_mut().find(|u| u.username == username) {
                user.disabled = disabled;
            }
        }
    }

    #[async_trait]
    impl CredentialStore for InMemoryCredentialStore {
        async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
            let users = self.users.lock().unwrap();
            let email = login.to_lowercase();
            let found = users
                .iter()
                .find(|u| u.username == login)
                .or_else(|| users.iter().find(|u| u.email.as_deref() == Some(email.as_str())));
            Ok(found.cloned())
        }

        async fn create(&self, new: NewUser) -> Result<User, AppError> {
            let mut users = self.users.lock().unwrap();
            let taken = users.iter().any(|u| {
                u.username == new.username
                    || (new.email.is_some() && u.email == new.email)
            });
            if taken {
                return Err(AppError::Conflict("Username or email already taken".into()));
            }
            let user = User {
                id: users.len() as i64 + 1,
                username: new.username,
                email: new.email,
                full_name: new.full_name,
                hashed_password: new.hashed_password,
                disabled: new.disabled,
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(user.clone());
            Ok(user)
        }
    }
}
