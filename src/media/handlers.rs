use std::future::Future;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    kind::MediaKind,
    range,
    store::{MediaStore, StoredFile},
};
use crate::{
    albums::repo::{self as albums, Album},
    artists::repo::{self as artists, Artist},
    auth::{require, Authorized},
    error::AppError,
    playlists::repo::{self as playlists, Playlist},
    songs::repo::{self as songs, Song},
    state::AppState,
};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn media_routes(max_upload_bytes: usize) -> Router<AppState> {
    let uploads = Router::new()
        .route("/uploads/songs/:id", post(upload_song_audio))
        .route("/uploads/images/:id", post(upload_song_image))
        .route("/uploads/albums/:id", post(upload_album_image))
        .route("/uploads/artists/:id", post(upload_artist_image))
        .route("/uploads/playlists/:id", post(upload_playlist_image))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ));

    Router::new()
        .merge(uploads)
        .route("/streams/:song_id", get(stream_song))
        .route("/downloads/audio/:song_id", get(download_song))
}

/// Reads the `file` part of an upload and checks it against the allow-list
/// of `kind` before the owning record is loaded with `lookup`. A rejected
/// file never reaches the database or the disk.
async fn receive<T, F>(
    media: &MediaStore,
    kind: MediaKind,
    owner: &str,
    mut multipart: Multipart,
    lookup: F,
    not_found: fn() -> AppError,
) -> Result<(T, StoredFile), AppError>
where
    F: Future<Output = sqlx::Result<Option<T>>>,
{
    let field = multipart
        .next_field()
        .await?
        .ok_or_else(|| AppError::BadRequest("Missing multipart field \"file\"".into()))?;
    if field.name() != Some("file") {
        return Err(AppError::BadRequest(
            "Expected the multipart field \"file\" first".into(),
        ));
    }
    let ext = kind.validate(field.content_type(), field.file_name())?;
    let record = lookup.await?.ok_or_else(not_found)?;
    let stored = media.save(kind, owner, &ext, field).await?;
    Ok((record, stored))
}

/// Last step of an upload. The record may have been deleted while the file
/// was streaming; the new file is then dropped again.
async fn attach<T>(
    media: &MediaStore,
    stored: &StoredFile,
    previous: Option<&str>,
    updated: Option<T>,
    not_found: fn() -> AppError,
) -> Result<T, AppError> {
    match updated {
        Some(record) => {
            media.discard_replaced(previous, &stored.url).await;
            Ok(record)
        }
        None => {
            warn!(url = %stored.url, "record deleted during upload");
            media.remove(Some(&stored.url)).await;
            Err(not_found())
        }
    }
}

// ---- uploads ----

#[instrument(skip(state, _auth, multipart))]
pub async fn upload_song_audio(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsCreate>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Song>, AppError> {
    let not_found = crate::songs::handlers::not_found;
    let (song, stored) = receive(
        &state.media,
        MediaKind::Audio,
        &id.to_string(),
        multipart,
        songs::find(&state.db, id),
        not_found,
    )
    .await?;
    let updated = songs::set_song_url(&state.db, id, &stored.url).await?;
    let updated = attach(&state.media, &stored, song.song_url.as_deref(), updated, not_found).await?;
    info!(song_id = id, size = stored.size, url = %stored.url, "song audio uploaded");
    Ok(Json(updated))
}

#[instrument(skip(state, _auth, multipart))]
pub async fn upload_song_image(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsCreate>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Song>, AppError> {
    let not_found = crate::songs::handlers::not_found;
    let (song, stored) = receive(
        &state.media,
        MediaKind::Image,
        &id.to_string(),
        multipart,
        songs::find(&state.db, id),
        not_found,
    )
    .await?;
    let updated = songs::set_image_url(&state.db, id, &stored.url).await?;
    let updated = attach(&state.media, &stored, song.image_url.as_deref(), updated, not_found).await?;
    info!(song_id = id, size = stored.size, "song image uploaded");
    Ok(Json(updated))
}

#[instrument(skip(state, _auth, multipart))]
pub async fn upload_album_image(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsCreate>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Album>, AppError> {
    let not_found = crate::albums::handlers::not_found;
    // Song, album and playlist ids overlap inside `image/`.
    let owner = format!("album_{}", id);
    let (album, stored) = receive(
        &state.media,
        MediaKind::Image,
        &owner,
        multipart,
        albums::find(&state.db, id),
        not_found,
    )
    .await?;
    let updated = albums::set_image_url(&state.db, id, &stored.url).await?;
    let updated = attach(&state.media, &stored, album.image_url.as_deref(), updated, not_found).await?;
    info!(album_id = id, size = stored.size, "album image uploaded");
    Ok(Json(updated))
}

#[instrument(skip(state, _auth, multipart))]
pub async fn upload_artist_image(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsCreate>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Artist>, AppError> {
    let not_found = crate::artists::handlers::not_found;
    let (artist, stored) = receive(
        &state.media,
        MediaKind::Image,
        &id.to_string(),
        multipart,
        artists::find(&state.db, id),
        not_found,
    )
    .await?;
    let updated = artists::set_image_url(&state.db, id, &stored.url).await?;
    let updated = attach(&state.media, &stored, artist.image_url.as_deref(), updated, not_found).await?;
    info!(artist_id = %id, size = stored.size, "artist image uploaded");
    Ok(Json(updated))
}

#[instrument(skip(state, auth, multipart), fields(user_id = auth.user.id))]
pub async fn upload_playlist_image(
    State(state): State<AppState>,
    auth: Authorized<require::ItemsCreate>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Playlist>, AppError> {
    let not_found = crate::playlists::handlers::not_found;
    let owner_id = auth.user.id;
    let owner = format!("playlist_{}", id);
    let (playlist, stored) = receive(
        &state.media,
        MediaKind::Image,
        &owner,
        multipart,
        playlists::find(&state.db, owner_id, id),
        not_found,
    )
    .await?;
    let updated = playlists::set_image_url(&state.db, owner_id, id, &stored.url).await?;
    let updated = attach(
        &state.media,
        &stored,
        playlist.image_url.as_deref(),
        updated,
        not_found,
    )
    .await?;
    info!(playlist_id = id, size = stored.size, "playlist image uploaded");
    Ok(Json(updated))
}

// ---- playback ----

async fn song_audio_path(state: &AppState, song_id: i64) -> Result<std::path::PathBuf, AppError> {
    let song = songs::find(&state.db, song_id)
        .await?
        .ok_or_else(crate::songs::handlers::not_found)?;
    let Some(url) = song.song_url else {
        return Err(AppError::NotFound("Song has no audio".into()));
    };
    state.media.resolve_url(&url).ok_or_else(|| {
        warn!(song_id, %url, "song url outside the media root");
        AppError::NotFound("File not found".into())
    })
}

/// Public so that `<audio>` elements can play without a bearer header.
#[instrument(skip(state, headers))]
pub async fn stream_song(
    State(state): State<AppState>,
    Path(song_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let path = song_audio_path(&state, song_id).await?;
    let range = headers
        .get(header::RANGE)
        .map(|v| {
            v.to_str()
                .map_err(|_| AppError::BadRequest("Range header is not valid text".into()))
        })
        .transpose()?;
    range::respond(&path, range).await
}

#[instrument(skip(state, _auth))]
pub async fn download_song(
    State(state): State<AppState>,
    _auth: Authorized<require::ItemsRead>,
    Path(song_id): Path<i64>,
) -> Result<Response, AppError> {
    let path = song_audio_path(&state, song_id).await?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_string();

    let mut response = range::respond(&path, None).await?;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    let disposition = format!("attachment; filename=\"song_{}.{}\"", song_id, ext);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).map_err(|e| AppError::Internal(e.into()))?,
    );
    info!(song_id, "song downloaded");
    Ok(response)
}
