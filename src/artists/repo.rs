use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::ListParams;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Artist {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_disabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewArtist {
    pub name: String,
    pub description: Option<String>,
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ArtistChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_disabled: Option<bool>,
}

const COLUMNS: &str = "a.id, a.name, a.description, a.image_url, a.is_disabled, a.created_at";

pub async fn create(db: &PgPool, new: &NewArtist) -> sqlx::Result<Artist> {
    sqlx::query_as::<_, Artist>(&format!(
        r#"
        INSERT INTO artists AS a (id, name, description, is_disabled)
        VALUES ($1, $2, $3, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.is_disabled)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool, params: &ListParams) -> sqlx::Result<Vec<Artist>> {
    sqlx::query_as::<_, Artist>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM artists a
        WHERE ($1::text IS NULL OR a.name ILIKE $1)
        ORDER BY a.name, a.id
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(params.pattern())
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(db)
    .await
}

pub async fn find(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Artist>> {
    sqlx::query_as::<_, Artist>(&format!("SELECT {COLUMNS} FROM artists a WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn update(db: &PgPool, id: Uuid, changes: &ArtistChanges) -> sqlx::Result<Option<Artist>> {
    sqlx::query_as::<_, Artist>(&format!(
        r#"
        UPDATE artists AS a
           SET name        = COALESCE($2, a.name),
               description = COALESCE($3, a.description),
               is_disabled = COALESCE($4, a.is_disabled)
         WHERE a.id = $1
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

pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Artist>> {
    sqlx::query_as::<_, Artist>(&format!(
        "DELETE FROM artists AS a WHERE a.id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn set_image_url(db: &PgPool, id: Uuid, url: &str) -> sqlx::Result<Option<Artist>> {
    sqlx::query_as::<_, Artist>(&format!(
        "UPDATE artists AS a SET image_url = $2 WHERE a.id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(url)
    .fetch_optional(db)
    .await
}

pub async fn list_by_song(db: &PgPool, song_id: i64) -> sqlx::Result<Vec<Artist>> {
    sqlx::query_as::<_, Artist>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM artists a
          JOIN song_artists sa ON sa.artist_id = a.id
         WHERE sa.song_id = $1
         ORDER BY sa.created_at, a.name
        "#
    ))
    .bind(song_id)
    .fetch_all(db)
    .await
}

pub async fn list_by_album(db: &PgPool, album_id: i64) -> sqlx::Result<Vec<Artist>> {
    sqlx::query_as::<_, Artist>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM artists a
          JOIN album_artists aa ON aa.artist_id = a.id
         WHERE aa.album_id = $1
         ORDER BY aa.created_at, a.name
        "#
    ))
    .bind(album_id)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn partial_update_keeps_omitted_fields(db: PgPool) {
        let artist = create(
            &db,
            &NewArtist {
                name: "Nova".into(),
                description: Some("synth duo".into()),
                is_disabled: false,
            },
        )
        .await
        .unwrap();

        let changes = ArtistChanges {
            name: Some("Nova Twins".into()),
            ..Default::default()
        };
        let updated = update(&db, artist.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.id, artist.id);
        assert_eq!(updated.name, "Nova Twins");
        assert_eq!(updated.description.as_deref(), Some("synth duo"));
        assert!(update(&db, Uuid::new_v4(), &changes).await.unwrap().is_none());
    }
}
