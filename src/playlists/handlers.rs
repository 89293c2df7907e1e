use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreatePlaylistRequest, UpdatePlaylistRequest},
    repo::{self, Playlist},
};
use crate::{
    auth::{require, Authorized},
    error::AppError,
    pagination::ListParams,
    songs::repo::{self as songs, Song},
    state::AppState,
};

pub fn playlist_routes() -> Router<AppState> {
    Router::new()
        .route("/playlists", get(list_playlists).post(create_playlist))
        .route(
            "/playlists/:id",
            get(get_playlist).put(update_playlist).delete(delete_playlist),
        )
        .route("/playlists/:id/songs", get(playlist_songs))
        .route(
            "/playlists/:id/:song_id",
            post(add_song).delete(remove_song),
        )
}

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("Playlist not found".into())
}

#[instrument(skip(state, auth, body), fields(user_id = auth.user.id))]
pub async fn create_playlist(
    State(state): State<AppState>,
    auth: Authorized<require::ItemsCreate>,
    Json(body): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<Playlist>), AppError> {
    let playlist = repo::create(&state.db, auth.user.id, &body.into_new()?).await?;
    info!(playlist_id = playlist.id, "playlist created");
    Ok((StatusCode::CREATED, Json(playlist)))
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn list_playlists(
    State(state): State<AppState>,
    auth: Authorized<require::ItemsRead>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Playlist>>, AppError> {
    params.validate()?;
    Ok(Json(repo::list(&state.db, auth.user.id, &params).await?))
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn get_playlist(
    State(state): State<AppState>,
    auth: Authorized<require::ItemsRead>,
    Path(id): Path<i64>,
) -> Result<Json<Playlist>, AppError> {
    let playlist = repo::find(&state.db, auth.user.id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(playlist))
}

#[instrument(skip(state, auth, body), fields(user_id = auth.user.id))]
pub async fn update_playlist(
    State(state): State<AppState>,
    auth: Authorized<require::ItemsUpdate>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePlaylistRequest>,
) -> Result<Json<Playlist>, AppError> {
    let playlist = repo::update(&state.db, auth.user.id, id, &body.into_changes()?)
        .await?
        .ok_or_else(not_found)?;
    info!(playlist_id = id, "playlist updated");
    Ok(Json(playlist))
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn delete_playlist(
    State(state): State<AppState>,
    auth: Authorized<require::ItemsDelete>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let playlist = repo::delete(&state.db, auth.user.id, id)
        .await?
        .ok_or_else(not_found)?;
    state.media.remove(playlist.image_url.as_deref()).await;
    info!(playlist_id = id, "playlist deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn playlist_songs(
    State(state): State<AppState>,
    auth: Authorized<require::ItemsRead>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Song>>, AppError> {
    repo::find(&state.db, auth.user.id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(songs::list_by_playlist(&state.db, id).await?))
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn add_song(
    State(state): State<AppState>,
    auth: Authorized<require::ItemsCreate>,
    Path((id, song_id)): Path<(i64, i64)>,
) -> Result<(StatusCode, Json<Vec<Song>>), AppError> {
    repo::find(&state.db, auth.user.id, id)
        .await?
        .ok_or_else(not_found)?;
    songs::find(&state.db, song_id)
        .await?
        .ok_or_else(crate::songs::handlers::not_found)?;
    repo::add_song(&state.db, id, song_id).await?;
    info!(playlist_id = id, song_id, "song added to playlist");
    Ok((
        StatusCode::CREATED,
        Json(songs::list_by_playlist(&state.db, id).await?),
    ))
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn remove_song(
    State(state): State<AppState>,
    auth: Authorized<require::ItemsDelete>,
    Path((id, song_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    repo::find(&state.db, auth.user.id, id)
        .await?
        .ok_or_else(not_found)?;
    if !repo::remove_song(&state.db, id, song_id).await? {
        return Err(AppError::NotFound("Song is not in this playlist".into()));
    }
    info!(playlist_id = id, song_id, "song removed from playlist");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use sqlx::PgPool;
    use tower::ServiceExt;

    use crate::{
        playlists::repo::NewPlaylist,
        songs::repo::NewSong,
        test_support::{bearer, insert_user, state_over},
    };

    #[sqlx::test(migrations = "./migrations")]
    async fn someone_elses_playlist_is_not_found(db: PgPool) {
        let root = tempfile::tempdir().unwrap();
        let state = state_over(db.clone(), root.path());
        let alice = insert_user(&db, "alice").await;
        insert_user(&db, "bob").await;
        let playlist = repo::create(
            &db,
            alice.id,
            &NewPlaylist {
                name: "Private".into(),
                description: None,
                is_disabled: false,
            },
        )
        .await
        .unwrap();
        let song = songs::create(
            &db,
            &NewSong {
                title: "Intro".into(),
                description: None,
                album_id: None,
                is_disabled: false,
            },
        )
        .await
        .unwrap();

        let auth = bearer(&state, "bob", &["items:read", "items:create", "items:delete"]);
        let app = playlist_routes().with_state(state);
        let requests = [
            ("GET", format!("/playlists/{}", playlist.id)),
            ("DELETE", format!("/playlists/{}", playlist.id)),
            ("GET", format!("/playlists/{}/songs", playlist.id)),
            ("POST", format!("/playlists/{}/{}", playlist.id, song.id)),
        ];
        for (method, uri) in requests {
            let req = Request::builder()
                .method(method)
                .uri(&uri)
                .header(header::AUTHORIZATION, auth.clone())
                .body(Body::empty())
                .unwrap();
            let res = app.clone().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        }

        assert!(repo::find(&db, alice.id, playlist.id).await.unwrap().is_some());
        assert!(songs::list_by_playlist(&db, playlist.id).await.unwrap().is_empty());
    }
}
