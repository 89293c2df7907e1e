use sqlx::PgPool;

use crate::pagination::ListParams;
use crate::users::repo_types::{NewUser, User, UserChanges};

const COLUMNS: &str = "id, username, email, full_name, hashed_password, disabled, created_at";

impl User {
    pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Exact match on username, or on email ignoring case (emails are stored
    /// lower-cased). A username match wins over an email match.
    pub async fn find_by_login(db: &PgPool, login: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM users
            WHERE username = $1 OR email = lower($1)
            ORDER BY (username = $1) DESC
            LIMIT 1
            "#
        ))
        .bind(login)
        .fetch_optional(db)
        .await
    }

    pub async fn create(db: &PgPool, new: &NewUser) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, full_name, hashed_password, disabled)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.full_name)
        .bind(&new.hashed_password)
        .bind(new.disabled)
        .fetch_one(db)
        .await
    }

    pub async fn list(db: &PgPool, params: &ListParams) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM users
            WHERE ($1::text IS NULL OR username ILIKE $1 OR full_name ILIKE $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(params.pattern())
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(db)
        .await
    }

    pub async fn update(db: &PgPool, id: i64, changes: &UserChanges) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET username        = COALESCE($2, username),
                   email           = COALESCE($3, email),
                   full_name       = COALESCE($4, full_name),
                   hashed_password = COALESCE($5, hashed_password),
                   disabled        = COALESCE($6, disabled)
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(&changes.full_name)
        .bind(&changes.hashed_password)
        .bind(changes.disabled)
        .fetch_optional(db)
        .await
    }

    /// Deletes the user together with their playlists (by cascade) and
    /// returns the cover URLs of those playlists, or `None` when no such
    /// user existed.
    pub async fn delete(db: &PgPool, id: i64) -> sqlx::Result<Option<Vec<String>>> {
        let mut tx = db.begin().await?;
        let covers = sqlx::query_scalar::<_, String>(
            r#"
            SELECT image_url FROM playlists
             WHERE user_id = $1 AND image_url IS NOT NULL
               FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        tx.commit().await?;
        Ok(Some(covers))
    }
}
