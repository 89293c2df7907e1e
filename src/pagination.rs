use serde::Deserialize;

use crate::error::AppError;

pub const MAX_LIMIT: i64 = 100;

/// Query string shared by every list endpoint: `?offset=&limit=&q=`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub q: Option<String>,
}

fn default_limit() -> i64 {
    MAX_LIMIT
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
            q: None,
        }
    }
}

impl ListParams {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.offset < 0 {
            return Err(AppError::BadRequest("offset must be >= 0".into()));
        }
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        Ok(())
    }

    /// `ILIKE` pattern for the search term, `None` when no search was asked for.
    pub fn pattern(&self) -> Option<String> {
        let q = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())?;
        let escaped = q
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{}%", escaped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let p = ListParams::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.limit, 100);
        assert_eq!(p.pattern(), None);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let p = ListParams {
            offset: -1,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(AppError::BadRequest(_))));

        let p = ListParams {
            limit: 101,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn pattern_escapes_wildcards() {
        let p = ListParams {
            q: Some(" 100%_hits ".into()),
            ..Default::default()
        };
        assert_eq!(p.pattern().as_deref(), Some("%100\\%\\_hits%"));

        let blank = ListParams {
            q: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(blank.pattern(), None);
    }
}
