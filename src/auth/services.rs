use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use super::{
    claims::Claims,
    dto::TokenResponse,
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_password_blocking},
    scope::Scope,
    store::CredentialStore,
};
use crate::{
    error::AppError,
    users::repo_types::{NewUser, User},
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Trimmed, lower-cased email; blank input means "no email".
pub(crate) fn normalize_email(email: Option<String>) -> Result<Option<String>, AppError> {
    let Some(email) = email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    Ok(Some(email))
}

/// Parses an OAuth2 `scope` field (space separated) into canonical scope strings.
pub fn parse_scopes(raw: &str) -> Result<Vec<String>, AppError> {
    let mut scopes: Vec<String> = Vec::new();
    for item in raw.split_whitespace() {
        let scope: Scope = item
            .parse()
            .map_err(|e: super::scope::UnknownScope| AppError::BadRequest(e.to_string()))?;
        if !scopes.iter().any(|s| s == scope.as_str()) {
            scopes.push(scope.as_str().to_string());
        }
    }
    Ok(scopes)
}

pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: bool,
}

/// Creates a user after validating the input; duplicates fail with `Conflict`
/// and leave the store untouched.
pub async fn register(store: &dyn CredentialStore, reg: Registration) -> Result<User, AppError> {
    let username = reg.username.trim().to_string();
    if username.is_empty() || reg.password.is_empty() {
        return Err(AppError::BadRequest("Username or password not specified".into()));
    }
    validate_password(&reg.password)?;
    let email = normalize_email(reg.email)?;

    if store.find_by_login(&username).await?.is_some() {
        warn!(%username, "username already taken");
        return Err(AppError::Conflict("Username already taken".into()));
    }
    if let Some(email) = &email {
        if store.find_by_login(email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AppError::Conflict("Email already registered".into()));
        }
    }

    let hashed_password = hash_password_blocking(reg.password).await?;
    store
        .create(NewUser {
            username,
            email,
            full_name: reg
                .full_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            hashed_password,
            disabled: reg.disabled,
        })
        .await
}

pub(crate) fn ensure_active(user: &User) -> Result<(), AppError> {
    if user.disabled {
        warn!(user_id = user.id, "disabled user");
        return Err(AppError::InvalidCredentials);
    }
    Ok(())
}

/// Password check for sign-in. Unknown user, wrong password and disabled
/// account are indistinguishable to the caller.
pub async fn authenticate(
    store: &dyn CredentialStore,
    login: &str,
    password: &str,
) -> Result<User, AppError> {
    let login = login.trim();
    let Some(user) = store.find_by_login(login).await? else {
        warn!(login, "sign-in for unknown user");
        return Err(AppError::InvalidCredentials);
    };
    let ok = verify_password_blocking(password.to_string(), user.hashed_password.clone()).await?;
    if !ok {
        warn!(user_id = user.id, "sign-in with invalid password");
        return Err(AppError::InvalidCredentials);
    }
    ensure_active(&user)?;
    Ok(user)
}

/// Validates a bearer token and checks it against the endpoint's scopes.
///
/// Order matters: the token is verified and its user loaded and checked
/// for being active before any scope comparison, so an unknown subject is
/// reported as `InvalidCredentials` even when scopes are also missing.
pub async fn authorize(
    keys: &JwtKeys,
    store: &dyn CredentialStore,
    token: &str,
    required: &[Scope],
) -> Result<(User, Claims), AppError> {
    let claims = keys.verify_access(token)?;

    let Some(user) = store.find_by_login(&claims.sub).await? else {
        warn!(subject = %claims.sub, "token subject not found");
        return Err(AppError::InvalidCredentials);
    };
    ensure_active(&user)?;

    let missing = claims.missing(required);
    if !missing.is_empty() {
        warn!(user_id = user.id, missing = %Scope::join(&missing), "insufficient scopes");
        return Err(AppError::InsufficientPermission(Scope::join(required)));
    }

    debug!(user_id = user.id, "request authorized");
    Ok((user, claims))
}

pub fn issue_tokens(keys: &JwtKeys, user: &User, scopes: &[String]) -> anyhow::Result<TokenResponse> {
    Ok(TokenResponse {
        access_token: keys.sign_access(&user.username, scopes)?,
        refresh_token: keys.sign_refresh(&user.username, scopes)?,
        token_type: "bearer",
    })
}
