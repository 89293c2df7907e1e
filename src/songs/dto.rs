use serde::Deserialize;

use super::repo::{NewSong, SongChanges};
use crate::{
    error::AppError,
    validation::{non_blank, non_blank_opt},
};

/// Media URLs are absent on purpose: they are only set by uploads.
#[derive(Debug, Deserialize)]
pub struct CreateSongRequest {
    pub title: String,
    pub description: Option<String>,
    pub album_id: Option<i64>,
    #[serde(default)]
    pub is_disabled: bool,
}

impl CreateSongRequest {
    pub fn into_new(self) -> Result<NewSong, AppError> {
        Ok(NewSong {
            title: non_blank("title", &self.title)?,
            description: self.description,
            album_id: self.album_id,
            is_disabled: self.is_disabled,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSongRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub album_id: Option<i64>,
    pub is_disabled: Option<bool>,
}

impl UpdateSongRequest {
    pub fn into_changes(self) -> Result<SongChanges, AppError> {
        Ok(SongChanges {
            title: non_blank_opt("title", self.title.as_deref())?,
            description: self.description,
            album_id: self.album_id,
            is_disabled: self.is_disabled,
        })
    }
}
