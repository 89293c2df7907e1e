use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{albums, artists, auth, genres, media, playlists, songs, state::AppState, users};

pub fn build_app(state: AppState) -> Router {
    let public = ServeDir::new(state.media.root());
    let max_upload_bytes = state.media.max_upload_bytes();

    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(users::router())
        .merge(songs::router())
        .merge(albums::router())
        .merge(artists::router())
        .merge(genres::router())
        .merge(playlists::router())
        .merge(media::router(max_upload_bytes))
        .nest_service("/public", public)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "up and running" }))
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::auth::store::InMemoryCredentialStore;

    fn app(root: &std::path::Path) -> Router {
        build_app(AppState::fake(
            Arc::new(InMemoryCredentialStore::default()),
            root,
        ))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn root_and_health_respond() {
        let root = tempfile::tempdir().unwrap();
        let app = app(root.path());

        let res = app.clone().oneshot(get("/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "up and running");

        let res = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn public_serves_the_media_root() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("image")).unwrap();
        std::fs::write(root.path().join("image").join("5.png"), b"png-bytes").unwrap();
        let app = app(root.path());

        let res = app.clone().oneshot(get("/public/image/5.png")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"png-bytes");

        let res = app.oneshot(get("/public/image/6.png")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn catalogue_requires_a_token() {
        let root = tempfile::tempdir().unwrap();
        let app = app(root.path());
        for uri in ["/songs", "/albums/1", "/artists", "/genres", "/playlists", "/users/me"] {
            let res = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
        }
    }
}
