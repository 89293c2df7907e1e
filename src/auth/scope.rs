use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fine grained permission, serialized as `resource:action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "users:create")]
    UsersCreate,
    #[serde(rename = "users:update")]
    UsersUpdate,
    #[serde(rename = "users:delete")]
    UsersDelete,
    #[serde(rename = "items:read")]
    ItemsRead,
    #[serde(rename = "items:create")]
    ItemsCreate,
    #[serde(rename = "items:update")]
    ItemsUpdate,
    #[serde(rename = "items:delete")]
    ItemsDelete,
}

impl Scope {
    pub const ALL: [Scope; 8] = [
        Scope::UsersRead,
        Scope::UsersCreate,
        Scope::UsersUpdate,
        Scope::UsersDelete,
        Scope::ItemsRead,
        Scope::ItemsCreate,
        Scope::ItemsUpdate,
        Scope::ItemsDelete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::UsersRead => "users:read",
            Scope::UsersCreate => "users:create",
            Scope::UsersUpdate => "users:update",
            Scope::UsersDelete => "users:delete",
            Scope::ItemsRead => "items:read",
            Scope::ItemsCreate => "items:create",
            Scope::ItemsUpdate => "items:update",
            Scope::ItemsDelete => "items:delete",
        }
    }

    /// Space separated form used by OAuth2 `scope` fields and `WWW-Authenticate`.
    pub fn join(scopes: &[Scope]) -> String {
        scopes
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown scope: {0}")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| UnknownScope(s.to_string()))
    }
}

/// Compile-time scope requirement attached to an endpoint through
/// [`Authorized`](super::extractors::Authorized).
pub trait RequiredScopes: Send + Sync + 'static {
    const SCOPES: &'static [Scope];
}

macro_rules! required_scopes {
    ($($(#[$meta:meta])* $name:ident => [$($scope:ident),*];)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl RequiredScopes for $name {
                const SCOPES: &'static [Scope] = &[$(Scope::$scope),*];
            }
        )*
    };
}

/// Marker types naming the scopes an endpoint demands.
pub mod require {
    use super::{RequiredScopes, Scope};

    required_scopes! {
        /// Any valid access token of an active user.
        Authenticated => [];
        UsersRead => [UsersRead];
        UsersCreate => [UsersCreate];
        UsersUpdate => [UsersUpdate];
        UsersDelete => [UsersDelete];
        ItemsRead => [ItemsRead];
        ItemsCreate => [ItemsCreate];
        ItemsUpdate => [ItemsUpdate];
        ItemsDelete => [ItemsDelete];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_forms_round_trip() {
        for scope in Scope::ALL {
            assert_eq!(scope.as_str().parse::<Scope>(), Ok(scope));
            let json = serde_json::to_string(&scope).unwrap();
            assert_eq!(json, format!("\"{}\"", scope.as_str()));
        }
    }

    #[test]
    fn unknown_and_wildcard_scopes_are_rejected() {
        assert!("users:*".parse::<Scope>().is_err());
        assert!("items".parse::<Scope>().is_err());
        assert!("ITEMS:READ".parse::<Scope>().is_err());
    }

    #[test]
    fn markers_expose_their_scopes() {
        assert!(require::Authenticated::SCOPES.is_empty());
        assert_eq!(require::ItemsCreate::SCOPES, &[Scope::ItemsCreate]);
        assert_eq!(Scope::join(&[Scope::UsersRead, Scope::ItemsRead]), "users:read items:read");
    }
}
