use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateGenreRequest, UpdateGenreRequest},
    repo::{self, Genre},
};
use crate::{
    auth::{require, Authorized},
    error::AppError,
    pagination::ListParams,
    songs::repo::{self as songs, Song},
    state::AppState,
};

pub fn genre_routes() -> Router<AppState> {
    Router::new()
        .route("/genres", get(list_genres).post(create_genre))
        .route(
            "/genres/:id",
            get(get_genre).put(update_genre).delete(delete_genre),
        )
        .route("/genres/:id/songs", get(genre_songs))
}

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("Genre not found".into())
}

fn name_taken(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Genre name already exists".into())
        }
        _ => e.into(),
    }
}

#[instrument(skip(state, _auth, body))]
pub async fn create_genre(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsCreate>,
    Json(body): Json<CreateGenreRequest>,
) -> Result<(StatusCode, Json<Genre>), AppError> {
    let genre = repo::create(&state.db, &body.into_new()?)
        .await
        .map_err(name_taken)?;
    info!(genre_id = genre.id, name = %genre.name, "genre created");
    Ok((StatusCode::CREATED, Json(genre)))
}

#[instrument(skip(state, _auth))]
pub async fn list_genres(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Genre>>, AppError> {
    params.validate()?;
    Ok(Json(repo::list(&state.db, &params).await?))
}

#[instrument(skip(state, _auth))]
pub async fn get_genre(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<i64>,
) -> Result<Json<Genre>, AppError> {
    Ok(Json(repo::find(&state.db, id).await?.ok_or_else(not_found)?))
}

#[instrument(skip(state, _auth, body))]
pub async fn update_genre(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsUpdate>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateGenreRequest>,
) -> Result<Json<Genre>, AppError> {
    let genre = repo::update(&state.db, id, &body.into_changes()?)
        .await
        .map_err(name_taken)?
        .ok_or_else(not_found)?;
    info!(genre_id = id, "genre updated");
    Ok(Json(genre))
}

#[instrument(skip(state, _auth))]
pub async fn delete_genre(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsDelete>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !repo::delete(&state.db, id).await? {
        return Err(not_found());
    }
    info!(genre_id = id, "genre deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _auth))]
pub async fn genre_songs(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Song>>, AppError> {
    repo::find(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(Json(songs::list_by_genre(&state.db, id).await?))
}
