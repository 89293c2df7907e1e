use std::marker::PhantomData;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{
    claims::Claims,
    jwt::JwtKeys,
    scope::{require, RequiredScopes},
    services::authorize,
};
use crate::{error::AppError, state::AppState, users::repo_types::User};

/// The authenticated user of a request whose token grants every scope in `R`.
pub struct Authorized<R: RequiredScopes = require::Authenticated> {
    pub user: User,
    pub claims: Claims,
    _scopes: PhantomData<R>,
}

#[async_trait]
impl<R: RequiredScopes> FromRequestParts<AppState> for Authorized<R> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let keys = JwtKeys::from_ref(state);
        let (user, claims) = authorize(&keys, state.users.as_ref(), token, R::SCOPES).await?;
        Ok(Self {
            user,
            claims,
            _scopes: PhantomData,
        })
    }
}

/// Token of an `Authorization: Bearer <token>` header, scheme case-insensitive.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        warn!("missing Authorization header");
        return Err(AppError::InvalidCredentials);
    };
    let value = value.to_str().map_err(|_| AppError::InvalidCredentials)?;
    let (scheme, token) = value.split_once(' ').ok_or(AppError::InvalidCredentials)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        warn!(scheme, "unsupported auth scheme");
        return Err(AppError::InvalidCredentials);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::InvalidCredentials);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{HeaderValue, Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{
        services::{register, Registration},
        store::InMemoryCredentialStore,
    };

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(bearer_token(&headers).unwrap(), "xyz");

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());
    }

    async fn protected(auth: Authorized<require::ItemsCreate>) -> String {
        auth.user.username
    }

    async fn call(app: Router, token: Option<&str>) -> StatusCode {
        let mut req = Request::builder().uri("/protected");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        app.oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn extractor_enforces_endpoint_scopes() {
        let store = Arc::new(InMemoryCredentialStore::default());
        register(
            store.as_ref(),
            Registration {
                username: "alice".into(),
                password: "long-enough-password".into(),
                email: None,
                full_name: None,
                disabled: false,
            },
        )
        .await
        .unwrap();

        let media_root = tempfile::tempdir().unwrap();
        let state = AppState::fake(store, media_root.path());
        let keys = JwtKeys::from_ref(&state);
        let app = Router::new()
            .route("/protected", get(protected))
            .with_state(state);

        assert_eq!(call(app.clone(), None).await, StatusCode::UNAUTHORIZED);

        let reader = keys.sign_access("alice", &["items:read".into()]).unwrap();
        assert_eq!(call(app.clone(), Some(&reader)).await, StatusCode::FORBIDDEN);

        let creator = keys.sign_access("alice", &["items:create".into()]).unwrap();
        assert_eq!(call(app, Some(&creator)).await, StatusCode::OK);
    }
}
