use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateAlbumRequest, UpdateAlbumRequest},
    repo::{self, Album},
};
use crate::{
    artists::repo::{self as artists, Artist},
    auth::{require, Authorized},
    error::AppError,
    pagination::ListParams,
    songs::repo::{self as songs, Song},
    state::AppState,
};

pub fn album_routes() -> Router<AppState> {
    Router::new()
        .route("/albums", get(list_albums).post(create_album))
        .route(
            "/albums/:id",
            get(get_album).put(update_album).delete(delete_album),
        )
        .route("/albums/:id/songs", get(album_songs))
        .route("/albums/:id/artists", get(album_artists))
        .route(
            "/albums/:id/artists/:artist_id",
            post(add_artist).delete(remove_artist),
        )
}

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("Album not found".into())
}

async fn existing(state: &AppState, id: i64) -> Result<Album, AppError> {
    repo::find(&state.db, id).await?.ok_or_else(not_found)
}

#[instrument(skip(state, _auth, body))]
pub async fn create_album(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsCreate>,
    Json(body): Json<CreateAlbumRequest>,
) -> Result<(StatusCode, Json<Album>), AppError> {
    let album = repo::create(&state.db, &body.into_new()?).await?;
    info!(album_id = album.id, "album created");
    Ok((StatusCode::CREATED, Json(album)))
}

#[instrument(skip(state, _auth))]
pub async fn list_albums(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Album>>, AppError> {
    params.validate()?;
    Ok(Json(repo::list(&state.db, &params).await?))
}

#[instrument(skip(state, _auth))]
pub async fn get_album(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<i64>,
) -> Result<Json<Album>, AppError> {
    Ok(Json(existing(&state, id).await?))
}

#[instrument(skip(state, _auth, body))]
pub async fn update_album(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsUpdate>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateAlbumRequest>,
) -> Result<Json<Album>, AppError> {
    let album = repo::update(&state.db, id, &body.into_changes()?)
        .await?
        .ok_or_else(not_found)?;
    info!(album_id = id, "album updated");
    Ok(Json(album))
}

#[instrument(skip(state, _auth))]
pub async fn delete_album(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsDelete>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let album = repo::delete(&state.db, id).await?.ok_or_else(not_found)?;
    state.media.remove(album.image_url.as_deref()).await;
    info!(album_id = id, "album deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _auth))]
pub async fn album_songs(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Song>>, AppError> {
    existing(&state, id).await?;
    Ok(Json(songs::list_by_album(&state.db, id).await?))
}

#[instrument(skip(state, _auth))]
pub async fn album_artists(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Artist>>, AppError> {
    existing(&state, id).await?;
    Ok(Json(artists::list_by_album(&state.db, id).await?))
}

#[instrument(skip(state, _auth))]
pub async fn add_artist(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsCreate>,
    Path((id, artist_id)): Path<(i64, Uuid)>,
) -> Result<(StatusCode, Json<Vec<Artist>>), AppError> {
    existing(&state, id).await?;
    artists::find(&state.db, artist_id)
        .await?
        .ok_or_else(crate::artists::handlers::not_found)?;
    repo::link_artist(&state.db, id, artist_id).await?;
    info!(album_id = id, %artist_id, "artist linked to album");
    Ok((
        StatusCode::CREATED,
        Json(artists::list_by_album(&state.db, id).await?),
    ))
}

#[instrument(skip(state, _auth))]
pub async fn remove_artist(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsDelete>,
    Path((id, artist_id)): Path<(i64, Uuid)>,
) -> Result<StatusCode, AppError> {
    if !repo::unlink_artist(&state.db, id, artist_id).await? {
        return Err(AppError::NotFound("Artist is not linked to this album".into()));
    }
    info!(album_id = id, %artist_id, "artist unlinked from album");
    Ok(StatusCode::NO_CONTENT)
}
