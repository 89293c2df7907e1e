use serde::Deserialize;
use time::OffsetDateTime;

use super::repo::{AlbumChanges, NewAlbum};
use crate::{
    error::AppError,
    validation::{non_blank, non_blank_opt},
};

#[derive(Debug, Deserialize)]
pub struct CreateAlbumRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub released_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub is_disabled: bool,
}

impl CreateAlbumRequest {
    pub fn into_new(self) -> Result<NewAlbum, AppError> {
        Ok(NewAlbum {
            title: non_blank("title", &self.title)?,
            description: self.description,
            released_at: self.released_at,
            is_disabled: self.is_disabled,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAlbumRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub released_at: Option<OffsetDateTime>,
    pub is_disabled: Option<bool>,
}

impl UpdateAlbumRequest {
    pub fn into_changes(self) -> Result<AlbumChanges, AppError> {
        Ok(AlbumChanges {
            title: non_blank_opt("title", self.title.as_deref())?,
            description: self.description,
            released_at: self.released_at,
            is_disabled: self.is_disabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_date_is_rfc3339() {
        let req: CreateAlbumRequest = serde_json::from_value(serde_json::json!({
            "title": "Blue",
            "released_at": "1971-06-22T00:00:00Z"
        }))
        .unwrap();
        let new = req.into_new().unwrap();
        assert_eq!(new.released_at.map(|d| d.year()), Some(1971));

        let req: CreateAlbumRequest =
            serde_json::from_value(serde_json::json!({ "title": "Untitled" })).unwrap();
        assert!(req.released_at.is_none());

        let bad = serde_json::from_value::<CreateAlbumRequest>(serde_json::json!({
            "title": "Blue",
            "released_at": "June 1971"
        }));
        assert!(bad.is_err());
    }
}
