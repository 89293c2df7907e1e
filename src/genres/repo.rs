use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::pagination::ListParams;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_disabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewGenre {
    pub name: String,
    pub description: Option<String>,
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GenreChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_disabled: Option<bool>,
}

const COLUMNS: &str = "g.id, g.name, g.description, g.is_disabled, g.created_at";

pub async fn create(db: &PgPool, new: &NewGenre) -> sqlx::Result<Genre> {
    sqlx::query_as::<_, Genre>(&format!(
        r#"
        INSERT INTO genres AS g (name, description, is_disabled)
        VALUES ($1, $2, $3)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.is_disabled)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool, params: &ListParams) -> sqlx::Result<Vec<Genre>> {
    sqlx::query_as::<_, Genre>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM genres g
        WHERE ($1::text IS NULL OR g.name ILIKE $1)
        ORDER BY g.name
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(params.pattern())
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(db)
    .await
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<Genre>> {
    sqlx::query_as::<_, Genre>(&format!("SELECT {COLUMNS} FROM genres g WHERE g.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn update(db: &PgPool, id: i64, changes: &GenreChanges) -> sqlx::Result<Option<Genre>> {
    sqlx::query_as::<_, Genre>(&format!(
        r#"
        UPDATE genres AS g
           SET name        = COALESCE($2, g.name),
               description = COALESCE($3, g.description),
               is_disabled = COALESCE($4, g.is_disabled)
         WHERE g.id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(changes.is_disabled)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM genres WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_by_song(db: &PgPool, song_id: i64) -> sqlx::Result<Vec<Genre>> {
    sqlx::query_as::<_, Genre>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM genres g
          JOIN song_genres sg ON sg.genre_id = g.id
         WHERE sg.song_id = $1
         ORDER BY g.name
        "#
    ))
    .bind(song_id)
    .fetch_all(db)
    .await
}
