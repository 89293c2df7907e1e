use serde::Deserialize;

use super::repo::{GenreChanges, NewGenre};
use crate::{
    error::AppError,
    validation::{non_blank, non_blank_opt},
};

#[derive(Debug, Deserialize)]
pub struct CreateGenreRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_disabled: bool,
}

impl CreateGenreRequest {
    pub fn into_new(self) -> Result<NewGenre, AppError> {
        Ok(NewGenre {
            name: non_blank("name", &self.name)?,
            description: self.description,
            is_disabled: self.is_disabled,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGenreRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_disabled: Option<bool>,
}

impl UpdateGenreRequest {
    pub fn into_changes(self) -> Result<GenreChanges, AppError> {
        Ok(GenreChanges {
            name: non_blank_opt("name", self.name.as_deref())?,
            description: self.description,
            is_disabled: self.is_disabled,
        })
    }
}
