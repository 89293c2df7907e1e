//! Fixtures shared by the database-backed tests.

use std::{path::Path, sync::Arc};

use axum::{extract::FromRef, http::HeaderValue};
use sqlx::PgPool;

use crate::{
    auth::{jwt::JwtKeys, store::PgCredentialStore},
    state::AppState,
    users::repo_types::{NewUser, User},
};

/// Active user with a placeholder hash; bearer tests never sign in.
pub async fn insert_user(db: &PgPool, username: &str) -> User {
    User::create(
        db,
        &NewUser {
            username: username.into(),
            email: None,
            full_name: None,
            hashed_password: "unused".into(),
            disabled: false,
        },
    )
    .await
    .unwrap()
}

pub fn state_over(db: PgPool, media_root: &Path) -> AppState {
    let users = Arc::new(PgCredentialStore::new(db.clone()));
    AppState::with_pool(db, users, media_root)
}

pub fn bearer(state: &AppState, username: &str, scopes: &[&str]) -> HeaderValue {
    let scopes: Vec<String> = scopes.iter().map(|s| s.to_string()).collect();
    let token = JwtKeys::from_ref(state)
        .sign_access(username, &scopes)
        .unwrap();
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}
