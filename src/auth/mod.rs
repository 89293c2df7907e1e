use crate::state::AppState;
use axum::Router;

pub mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod scope;
pub mod services;
pub mod store;

pub use extractors::Authorized;
pub use scope::require;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
