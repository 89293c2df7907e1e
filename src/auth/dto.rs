use serde::{Deserialize, Serialize};

/// `application/x-www-form-urlencoded` body of `POST /auth/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// OAuth2 password grant form of `POST /auth/signin`.
#[derive(Debug, Deserialize)]
pub struct SigninForm {
    /// Username or email.
    pub username: String,
    pub password: String,
    /// Space separated list of requested scopes.
    #[serde(default)]
    pub scope: String,
    pub grant_type: Option<String>,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}
