use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::ListParams;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub song_url: Option<String>,
    pub image_url: Option<String>,
    pub album_id: Option<i64>,
    pub is_disabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub description: Option<String>,
    pub album_id: Option<i64>,
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SongChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub album_id: Option<i64>,
    pub is_disabled: Option<bool>,
}

const COLUMNS: &str =
    "s.id, s.title, s.description, s.song_url, s.image_url, s.album_id, s.is_disabled, s.created_at";

pub async fn create(db: &PgPool, new: &NewSong) -> sqlx::Result<Song> {
    sqlx::query_as::<_, Song>(&format!(
        r#"
        INSERT INTO songs AS s (title, description, album_id, is_disabled)
        VALUES ($1, $2, $3, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.album_id)
    .bind(new.is_disabled)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool, params: &ListParams) -> sqlx::Result<Vec<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM songs s
        WHERE ($1::text IS NULL OR s.title ILIKE $1)
        ORDER BY s.id
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(params.pattern())
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(db)
    .await
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>(&format!("SELECT {COLUMNS} FROM songs s WHERE s.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn update(db: &PgPool, id: i64, changes: &SongChanges) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        r#"
        UPDATE songs AS s
           SET title       = COALESCE($2, s.title),
               description = COALESCE($3, s.description),
               album_id    = COALESCE($4, s.album_id),
               is_disabled = COALESCE($5, s.is_disabled)
         WHERE s.id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&changes.title)
    .bind(&changes.description)
    .bind(changes.album_id)
    .bind(changes.is_disabled)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: i64) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        "DELETE FROM songs AS s WHERE s.id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn set_song_url(db: &PgPool, id: i64, url: &str) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        "UPDATE songs AS s SET song_url = $2 WHERE s.id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(url)
    .fetch_optional(db)
    .await
}

pub async fn set_image_url(db: &PgPool, id: i64, url: &str) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        "UPDATE songs AS s SET image_url = $2 WHERE s.id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(url)
    .fetch_optional(db)
    .await
}

// ---- Relations ----

pub async fn list_by_album(db: &PgPool, album_id: i64) -> sqlx::Result<Vec<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        "SELECT {COLUMNS} FROM songs s WHERE s.album_id = $1 ORDER BY s.id"
    ))
    .bind(album_id)
    .fetch_all(db)
    .await
}

pub async fn list_by_artist(db: &PgPool, artist_id: Uuid) -> sqlx::Result<Vec<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM songs s
          JOIN song_artists sa ON sa.song_id = s.id
         WHERE sa.artist_id = $1
         ORDER BY s.id
        "#
    ))
    .bind(artist_id)
    .fetch_all(db)
    .await
}

pub async fn list_by_genre(db: &PgPool, genre_id: i64) -> sqlx::Result<Vec<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM songs s
          JOIN song_genres sg ON sg.song_id = s.id
         WHERE sg.genre_id = $1
         ORDER BY s.id
        "#
    ))
    .bind(genre_id)
    .fetch_all(db)
    .await
}

/// Songs in the order they were added to the playlist.
pub async fn list_by_playlist(db: &PgPool, playlist_id: i64) -> sqlx::Result<Vec<Song>> {
    sqlx::query_as::<_, Song>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM songs s
          JOIN playlist_songs ps ON ps.song_id = s.id
         WHERE ps.playlist_id = $1
         ORDER BY ps.created_at, s.id
        "#
    ))
    .bind(playlist_id)
    .fetch_all(db)
    .await
}

pub async fn link_artist(db: &PgPool, song_id: i64, artist_id: Uuid) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO song_artists (song_id, artist_id) VALUES ($1, $2)")
        .bind(song_id)
        .bind(artist_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn unlink_artist(db: &PgPool, song_id: i64, artist_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM song_artists WHERE song_id = $1 AND artist_id = $2")
        .bind(song_id)
        .bind(artist_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn link_genre(db: &PgPool, song_id: i64, genre_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO song_genres (song_id, genre_id) VALUES ($1, $2)")
        .bind(song_id)
        .bind(genre_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn unlink_genre(db: &PgPool, song_id: i64, genre_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM song_genres WHERE song_id = $1 AND genre_id = $2")
        .bind(song_id)
        .bind(genre_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
