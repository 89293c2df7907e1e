use serde::{Deserialize, Serialize};

use super::scope::Scope;

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    #[serde(default)]
    pub scopes: Vec<String>, // granted scope strings
    pub exp: usize,     // expires at (unix timestamp)
    pub iat: usize,     // issued at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
    pub kind: TokenKind,
}

impl Claims {
    /// Exact string membership; `users:read` grants nothing beyond itself.
    pub fn grants(&self, scope: Scope) -> bool {
        self.scopes.iter().any(|s| s == scope.as_str())
    }

    /// Required scopes absent from the token, in the order they were asked for.
    pub fn missing(&self, required: &[Scope]) -> Vec<Scope> {
        required
            .iter()
            .copied()
            .filter(|scope| !self.grants(*scope))
            .collect()
    }
}
