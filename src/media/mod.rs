use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod kind;
pub mod range;
pub mod store;

pub use store::MediaStore;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().merge(handlers::media_routes(max_upload_bytes))
}
