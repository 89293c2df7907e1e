use serde::Deserialize;

use super::repo::{NewPlaylist, PlaylistChanges};
use crate::{
    error::AppError,
    validation::{non_blank, non_blank_opt},
};

/// The owner always comes from the token, never from the body.
#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_disabled: bool,
}

impl CreatePlaylistRequest {
    pub fn into_new(self) -> Result<NewPlaylist, AppError> {
        Ok(NewPlaylist {
            name: non_blank("name", &self.name)?,
            description: self.description,
            is_disabled: self.is_disabled,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_disabled: Option<bool>,
}

impl UpdatePlaylistRequest {
    pub fn into_changes(self) -> Result<PlaylistChanges, AppError> {
        Ok(PlaylistChanges {
            name: non_blank_opt("name", self.name.as_deref())?,
            description: self.description,
            is_disabled: self.is_disabled,
        })
    }
}
