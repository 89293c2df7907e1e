use serde::Deserialize;

use super::repo::{ArtistChanges, NewArtist};
use crate::{
    error::AppError,
    validation::{non_blank, non_blank_opt},
};

#[derive(Debug, Deserialize)]
pub struct CreateArtistRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_disabled: bool,
}

impl CreateArtistRequest {
    pub fn into_new(self) -> Result<NewArtist, AppError> {
        Ok(NewArtist {
            name: non_blank("name", &self.name)?,
            description: self.description,
            is_disabled: self.is_disabled,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateArtistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_disabled: Option<bool>,
}

impl UpdateArtistRequest {
    pub fn into_changes(self) -> Result<ArtistChanges, AppError> {
        Ok(ArtistChanges {
            name: non_blank_opt("name", self.name.as_deref())?,
            description: self.description,
            is_disabled: self.is_disabled,
        })
    }
}
