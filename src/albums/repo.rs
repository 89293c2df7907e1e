use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::ListParams;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub released_at: Option<OffsetDateTime>,
    pub is_disabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAlbum {
    pub title: String,
    pub description: Option<String>,
    pub released_at: Option<OffsetDateTime>,
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AlbumChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub released_at: Option<OffsetDateTime>,
    pub is_disabled: Option<bool>,
}

const COLUMNS: &str =
    "al.id, al.title, al.description, al.image_url, al.released_at, al.is_disabled, al.created_at";

pub async fn create(db: &PgPool, new: &NewAlbum) -> sqlx::Result<Album> {
    sqlx::query_as::<_, Album>(&format!(
        r#"
        INSERT INTO albums AS al (title, description, released_at, is_disabled)
        VALUES ($1, $2, $3, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.released_at)
    .bind(new.is_disabled)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool, params: &ListParams) -> sqlx::Result<Vec<Album>> {
    sqlx::query_as::<_, Album>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM albums al
        WHERE ($1::text IS NULL OR al.title ILIKE $1)
        ORDER BY al.id
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(params.pattern())
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(db)
    .await
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<Album>> {
    sqlx::query_as::<_, Album>(&format!("SELECT {COLUMNS} FROM albums al WHERE al.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn update(db: &PgPool, id: i64, changes: &AlbumChanges) -> sqlx::Result<Option<Album>> {
    sqlx::query_as::<_, Album>(&format!(
        r#"
        UPDATE albums AS al
           SET title       = COALESCE($2, al.title),
               description = COALESCE($3, al.description),
               released_at = COALESCE($4, al.released_at),
               is_disabled = COALESCE($5, al.is_disabled)
         WHERE al.id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&changes.title)
    .bind(&changes.description)
    .bind(changes.released_at)
    .bind(changes.is_disabled)
    .fetch_optional(db)
    .await
}

/// Songs of a deleted album keep existing with `album_id` cleared.
pub async fn delete(db: &PgPool, id: i64) -> sqlx::Result<Option<Album>> {
    sqlx::query_as::<_, Album>(&format!(
        "DELETE FROM albums AS al WHERE al.id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn set_image_url(db: &PgPool, id: i64, url: &str) -> sqlx::Result<Option<Album>> {
    sqlx::query_as::<_, Album>(&format!(
        "UPDATE albums AS al SET image_url = $2 WHERE al.id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(url)
    .fetch_optional(db)
    .await
}

pub async fn list_by_artist(db: &PgPool, artist_id: Uuid) -> sqlx::Result<Vec<Album>> {
    sqlx::query_as::<_, Album>(&format!(
        r#"
        SELECT {COLUMNS}
          FROM albums al
          JOIN album_artists aa ON aa.album_id = al.id
         WHERE aa.artist_id = $1
         ORDER BY al.released_at NULLS LAST, al.id
        "#
    ))
    .bind(artist_id)
    .fetch_all(db)
    .await
}

pub async fn link_artist(db: &PgPool, album_id: i64, artist_id: Uuid) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO album_artists (album_id, artist_id) VALUES ($1, $2)")
        .bind(album_id)
        .bind(artist_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn unlink_artist(db: &PgPool, album_id: i64, artist_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM album_artists WHERE album_id = $1 AND artist_id = $2")
        .bind(album_id)
        .bind(artist_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        artists::repo::{self as artists, NewArtist},
        error::AppError,
        songs::repo::{self as songs, NewSong},
    };

    fn debut() -> NewAlbum {
        NewAlbum {
            title: "Debut".into(),
            description: Some("first record".into()),
            released_at: Some(OffsetDateTime::UNIX_EPOCH),
            is_disabled: false,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn partial_update_keeps_omitted_fields(db: PgPool) {
        let album = create(&db, &debut()).await.unwrap();
        set_image_url(&db, album.id, "/public/image/album_1.png").await.unwrap();

        let changes = AlbumChanges {
            description: Some("remastered".into()),
            ..Default::default()
        };
        let updated = update(&db, album.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.title, "Debut");
        assert_eq!(updated.description.as_deref(), Some("remastered"));
        assert_eq!(updated.released_at, Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(updated.image_url.as_deref(), Some("/public/image/album_1.png"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn linking_an_artist_twice_conflicts(db: PgPool) {
        let album = create(&db, &debut()).await.unwrap();
        let artist = artists::create(
            &db,
            &NewArtist {
                name: "Nova".into(),
                description: None,
                is_disabled: false,
            },
        )
        .await
        .unwrap();

        link_artist(&db, album.id, artist.id).await.unwrap();
        let again = link_artist(&db, album.id, artist.id).await.unwrap_err();
        assert!(matches!(AppError::from(again), AppError::Conflict(_)));
        assert_eq!(list_by_artist(&db, artist.id).await.unwrap().len(), 1);

        assert!(unlink_artist(&db, album.id, artist.id).await.unwrap());
        assert!(!unlink_artist(&db, album.id, artist.id).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_an_album_keeps_its_songs(db: PgPool) {
        let album = create(&db, &debut()).await.unwrap();
        let song = songs::create(
            &db,
            &NewSong {
                title: "Intro".into(),
                description: None,
                album_id: Some(album.id),
                is_disabled: false,
            },
        )
        .await
        .unwrap();

        assert!(delete(&db, album.id).await.unwrap().is_some());
        let orphan = songs::find(&db, song.id).await.unwrap().unwrap();
        assert_eq!(orphan.album_id, None);
        assert!(delete(&db, album.id).await.unwrap().is_none());
    }
}
