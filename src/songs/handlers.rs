use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateSongRequest, UpdateSongRequest},
    repo::{self, Song},
};
use crate::{
    artists::repo::{self as artists, Artist},
    auth::{require, Authorized},
    error::AppError,
    genres::repo::{self as genres, Genre},
    pagination::ListParams,
    state::AppState,
};

pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/songs", get(list_songs).post(create_song))
        .route(
            "/songs/:id",
            get(get_song).put(update_song).delete(delete_song),
        )
        .route("/songs/:id/artists", get(song_artists))
        .route(
            "/songs/:id/artists/:artist_id",
            post(add_artist).delete(remove_artist),
        )
        .route("/songs/:id/genres", get(song_genres))
        .route(
            "/songs/:id/genres/:genre_id",
            post(add_genre).delete(remove_genre),
        )
}

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("Song not found".into())
}

async fn existing(state: &AppState, id: i64) -> Result<Song, AppError> {
    repo::find(&state.db, id).await?.ok_or_else(not_found)
}

#[instrument(skip(state, _auth, body))]
pub async fn create_song(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsCreate>,
    Json(body): Json<CreateSongRequest>,
) -> Result<(StatusCode, Json<Song>), AppError> {
    let song = repo::create(&state.db, &body.into_new()?).await?;
    info!(song_id = song.id, "song created");
    Ok((StatusCode::CREATED, Json(song)))
}

#[instrument(skip(state, _auth))]
pub async fn list_songs(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Song>>, AppError> {
    params.validate()?;
    Ok(Json(repo::list(&state.db, &params).await?))
}

#[instrument(skip(state, _auth))]
pub async fn get_song(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<i64>,
) -> Result<Json<Song>, AppError> {
    Ok(Json(existing(&state, id).await?))
}

#[instrument(skip(state, _auth, body))]
pub async fn update_song(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsUpdate>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSongRequest>,
) -> Result<Json<Song>, AppError> {
    let song = repo::update(&state.db, id, &body.into_changes()?)
        .await?
        .ok_or_else(not_found)?;
    info!(song_id = id, "song updated");
    Ok(Json(song))
}

#[instrument(skip(state, _auth))]
pub async fn delete_song(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsDelete>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let song = repo::delete(&state.db, id).await?.ok_or_else(not_found)?;
    state.media.remove(song.song_url.as_deref()).await;
    state.media.remove(song.image_url.as_deref()).await;
    info!(song_id = id, "song deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---- artists of a song ----

#[instrument(skip(state, _auth))]
pub async fn song_artists(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Artist>>, AppError> {
    existing(&state, id).await?;
    Ok(Json(artists::list_by_song(&state.db, id).await?))
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
    info!(song_id = id, %artist_id, "artist linked to song");
    Ok((
        StatusCode::CREATED,
        Json(artists::list_by_song(&state.db, id).await?),
    ))
}

#[instrument(skip(state, _auth))]
pub async fn remove_artist(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsDelete>,
    Path((id, artist_id)): Path<(i64, Uuid)>,
) -> Result<StatusCode, AppError> {
    if !repo::unlink_artist(&state.db, id, artist_id).await? {
        return Err(AppError::NotFound("Artist is not linked to this song".into()));
    }
    info!(song_id = id, %artist_id, "artist unlinked from song");
    Ok(StatusCode::NO_CONTENT)
}

// ---- genres of a song ----

#[instrument(skip(state, _auth))]
pub async fn song_genres(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Genre>>, AppError> {
    existing(&state, id).await?;
    Ok(Json(genres::list_by_song(&state.db, id).await?))
}

#[instrument(skip(state, _auth))]
pub async fn add_genre(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsCreate>,
    Path((id, genre_id)): Path<(i64, i64)>,
) -> Result<(StatusCode, Json<Vec<Genre>>), AppError> {
    existing(&state, id).await?;
    genres::find(&state.db, genre_id)
        .await?
        .ok_or_else(crate::genres::handlers::not_found)?;
    repo::link_genre(&state.db, id, genre_id).await?;
    info!(song_id = id, genre_id, "genre linked to song");
    Ok((
        StatusCode::CREATED,
        Json(genres::list_by_song(&state.db, id).await?),
    ))
}

#[instrument(skip(state, _auth))]
pub async fn remove_genre(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsDelete>,
    Path((id, genre_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    if !repo::unlink_genre(&state.db, id, genre_id).await? {
        return Err(AppError::NotFound("Genre is not linked to this song".into()));
    }
    info!(song_id = id, genre_id, "genre unlinked from song");
    Ok(StatusCode::NO_CONTENT)
}
