//! Every query is scoped to the owning user; a playlist of someone else is
//! indistinguishable from a missing one.

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::pagination::ListParams;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub user_id: i64,
    pub is_disabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub name: String,
    pub description: Option<String>,
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PlaylistChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_disabled: Option<bool>,
}

const COLUMNS: &str =
    "p.id, p.name, p.description, p.image_url, p.user_id, p.is_disabled, p.created_at";

pub async fn create(db: &PgPool, owner: i64, new: &NewPlaylist) -> sqlx::Result<Playlist> {
    sqlx::query_as::<_, Playlist>(&format!(
        r#"
        INSERT INTO playlists AS p (name, description, user_id, is_disabled)
        VALUES ($1, $2, $3, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&new.name)
    .bind(&new.description)
    .bind(owner)
    .bind(new.is_disabled)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool, owner: i64, params: &ListParams) -> sqlx::Result<Vec<Playlist>> {
    sqlx::query_as::<_, Playlist>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM playlists p
        WHERE p.user_id = $1
          AND ($2::text IS NULL OR p.name ILIKE $2)
        ORDER BY p.id
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(owner)
    .bind(params.pattern())
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(db)
    .await
}

pub async fn find(db: &PgPool, owner: i64, id: i64) -> sqlx::Result<Option<Playlist>> {
    sqlx::query_as::<_, Playlist>(&format!(
        "SELECT {COLUMNS} FROM playlists p WHERE p.id = $1 AND p.user_id = $2"
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(db)
    .await
}

pub async fn update(
    db: &PgPool,
    owner: i64,
    id: i64,
    changes: &PlaylistChanges,
) -> sqlx::Result<Option<Playlist>> {
    sqlx::query_as::<_, Playlist>(&format!(
        r#"
        UPDATE playlists AS p
           SET name        = COALESCE($3, p.name),
               description = COALESCE($4, p.description),
               is_disabled = COALESCE($5, p.is_disabled)
         WHERE p.id = $1 AND p.user_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(owner)
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(changes.is_disabled)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, owner: i64, id: i64) -> sqlx::Result<Option<Playlist>> {
    sqlx::query_as::<_, Playlist>(&format!(
        "DELETE FROM playlists AS p WHERE p.id = $1 AND p.user_id = $2 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(db)
    .await
}

pub async fn set_image_url(
    db: &PgPool,
    owner: i64,
    id: i64,
    url: &str,
) -> sqlx::Result<Option<Playlist>> {
    sqlx::query_as::<_, Playlist>(&format!(
        r#"
        UPDATE playlists AS p SET image_url = $3
         WHERE p.id = $1 AND p.user_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(owner)
    .bind(url)
    .fetch_optional(db)
    .await
}

pub async fn add_song(db: &PgPool, playlist_id: i64, song_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO playlist_songs (playlist_id, song_id) VALUES ($1, $2)")
        .bind(playlist_id)
        .bind(song_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove_song(db: &PgPool, playlist_id: i64, song_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = $1 AND song_id = $2")
        .bind(playlist_id)
        .bind(song_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
