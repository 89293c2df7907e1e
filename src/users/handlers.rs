use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        password::hash_password_blocking,
        require,
        services::{normalize_email, register, validate_password, Registration},
        Authorized,
    },
    error::AppError,
    pagination::ListParams,
    state::AppState,
    users::{
        dto::{CreateUserRequest, PublicUser, UpdateUserRequest},
        repo_types::{User, UserChanges},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(get_me))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

#[instrument(skip(state, _auth, body), fields(username = %body.username))]
pub async fn create_user(
    State(state): State<AppState>,
    _auth: Authorized<require::UsersCreate>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = register(
        state.users.as_ref(),
        Registration {
            username: body.username,
            password: body.password,
            email: body.email,
            full_name: body.full_name,
            disabled: body.disabled,
        },
    )
    .await?;
    info!(user_id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, _auth))]
pub async fn list_users(
    State(state): State<AppState>,
    _auth: Authorized<require::UsersRead>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    params.validate()?;
    let users = User::list(&state.db, &params).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, _auth))]
pub async fn get_user(
    State(state): State<AppState>,
    _auth: Authorized<require::UsersRead>,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, AppError> {
    let user = User::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(Json(user.into()))
}

#[instrument(skip(auth))]
pub async fn get_me(auth: Authorized) -> Json<PublicUser> {
    Json(auth.user.into())
}

#[instrument(skip(state, _auth, body))]
pub async fn update_user(
    State(state): State<AppState>,
    _auth: Authorized<require::UsersUpdate>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let username = match body.username.map(|u| u.trim().to_string()) {
        Some(u) if u.is_empty() => {
            return Err(AppError::BadRequest("Username must not be empty".into()))
        }
        other => other,
    };
    let hashed_password = match body.password {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_password_blocking(password).await?)
        }
        None => None,
    };
    let changes = UserChanges {
        username,
        email: normalize_email(body.email)?,
        full_name: body.full_name,
        hashed_password,
        disabled: body.disabled,
    };

    let user = User::update(&state.db, id, &changes)
        .await?
        .ok_or_else(not_found)?;
    info!(user_id = user.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, _auth))]
pub async fn delete_user(
    State(state): State<AppState>,
    _auth: Authorized<require::UsersDelete>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let Some(covers) = User::delete(&state.db, id).await? else {
        return Err(not_found());
    };
    for url in &covers {
        state.media.remove(Some(url)).await;
    }
    info!(user_id = id, playlist_covers = covers.len(), "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
