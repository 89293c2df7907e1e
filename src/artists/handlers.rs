use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateArtistRequest, UpdateArtistRequest},
    repo::{self, Artist},
};
use crate::{
    albums::repo::{self as albums, Album},
    auth::{require, Authorized},
    error::AppError,
    pagination::ListParams,
    songs::repo::{self as songs, Song},
    state::AppState,
};

pub fn artist_routes() -> Router<AppState> {
    Router::new()
        .route("/artists", get(list_artists).post(create_artist))
        .route(
            "/artists/:id",
            get(get_artist).put(update_artist).delete(delete_artist),
        )
        .route("/artists/:id/songs", get(artist_songs))
        .route("/artists/:id/albums", get(artist_albums))
}

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("Artist not found".into())
}

#[instrument(skip(state, _auth, body))]
pub async fn create_artist(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsCreate>,
    Json(body): Json<CreateArtistRequest>,
) -> Result<(StatusCode, Json<Artist>), AppError> {
    let artist = repo::create(&state.db, &body.into_new()?).await?;
    info!(artist_id = %artist.id, "artist created");
    Ok((StatusCode::CREATED, Json(artist)))
}

#[instrument(skip(state, _auth))]
pub async fn list_artists(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Artist>>, AppError> {
    params.validate()?;
    Ok(Json(repo::list(&state.db, &params).await?))
}

#[instrument(skip(state, _auth))]
pub async fn get_artist(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Artist>, AppError> {
    let artist = repo::find(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(Json(artist))
}

#[instrument(skip(state, _auth, body))]
pub async fn update_artist(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsUpdate>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateArtistRequest>,
) -> Result<Json<Artist>, AppError> {
    let artist = repo::update(&state.db, id, &body.into_changes()?)
        .await?
        .ok_or_else(not_found)?;
    info!(artist_id = %id, "artist updated");
    Ok(Json(artist))
}

#[instrument(skip(state, _auth))]
pub async fn delete_artist(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsDelete>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let artist = repo::delete(&state.db, id).await?.ok_or_else(not_found)?;
    state.media.remove(artist.image_url.as_deref()).await;
    info!(artist_id = %id, "artist deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _auth))]
pub async fn artist_songs(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Song>>, AppError> {
    repo::find(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(Json(songs::list_by_artist(&state.db, id).await?))
}

#[instrument(skip(state, _auth))]
pub async fn artist_albums(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Album>>, AppError> {
    repo::find(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(Json(albums::list_by_artist(&state.db, id).await?))
}
