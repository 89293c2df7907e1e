use crate::error::AppError;

/// Trimmed value, rejecting blank input.
pub fn non_blank(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

/// Same as [`non_blank`] for optional update fields.
pub fn non_blank_opt(field: &str, value: Option<&str>) -> Result<Option<String>, AppError> {
    value.map(|v| non_blank(field, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(non_blank("title", "  Song  ").unwrap(), "Song");
        assert!(matches!(non_blank("title", " \t"), Err(AppError::BadRequest(m)) if m == "title must not be empty"));
        assert_eq!(non_blank_opt("name", None).unwrap(), None);
        assert!(non_blank_opt("name", Some("")).is_err());
    }
}
