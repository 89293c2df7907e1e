use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{RefreshRequest, SigninForm, SignupForm, TokenResponse},
        jwt::JwtKeys,
        services::{authenticate, ensure_active, issue_tokens, parse_scopes, register, Registration},
    },
    error::AppError,
    state::AppState,
    users::dto::PublicUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/refresh", post(refresh))
}

#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = register(
        state.users.as_ref(),
        Registration {
            username: form.username,
            password: form.password,
            email: form.email,
            full_name: form.full_name,
            disabled: false,
        },
    )
    .await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn signin(
    State(state): State<AppState>,
    Form(form): Form<SigninForm>,
) -> Result<Json<TokenResponse>, AppError> {
    if let Some(grant) = form.grant_type.as_deref().filter(|g| !g.is_empty()) {
        if grant != "password" {
            return Err(AppError::BadRequest("grant_type must be \"password\"".into()));
        }
    }
    let scopes = parse_scopes(&form.scope)?;
    let user = authenticate(state.users.as_ref(), &form.username, &form.password).await?;

    // Trust assumption: there are no per-user grants, so every active
    // account receives whichever known scopes it asks for, `users:*`
    // included. Deployments must restrict who can sign up.
    let keys = JwtKeys::from_ref(&state);
    let tokens = issue_tokens(&keys, &user, &scopes)?;

    info!(
        user_id = user.id,
        scopes = ?scopes,
        grant = "self-requested",
        "user signed in"
    );
    Ok(Json(tokens))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token)?;

    let Some(user) = state.users.find_by_login(&claims.sub).await? else {
        warn!(subject = %claims.sub, "refresh for unknown user");
        return Err(AppError::InvalidCredentials);
    };
    ensure_active(&user)?;

    let tokens = issue_tokens(&keys, &user, &claims.scopes)?;
    info!(user_id = user.id, "tokens refreshed");
    Ok(Json(tokens))
}
