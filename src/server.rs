//! HTTP transport.
//!
//! ```text
//! GET /{container}/{image_name}?w=300   → 200 image bytes
//! GET /{container}/{image_name}?h=200   → 200 image bytes
//! GET /health                           → 200 "ok"
//! ```
//!
//! Errors come back as plain text with the status from
//! [`ResizeError::status`]. Successful responses carry the derived
//! `Content-Type` and an `X-Resize-Outcome` header (`cached`, `passthrough`
//! or `generated`).
//!
//! Store and backend calls are blocking, so each request runs the
//! orchestrator on tokio's blocking pool.

use crate::imaging::ImageBackend;
use crate::params::ResizeQuery;
use crate::resize::{ResizeError, ResizedImage, Resizer};
use crate::store::ImageStore;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{Instrument, error, info, info_span};

/// Response header naming the [`Outcome`](crate::resize::Outcome).
pub const OUTCOME_HEADER: &str = "x-resize-outcome";

/// Build the service router around a shared orchestrator.
pub fn router<S, B>(resizer: Arc<Resizer<S, B>>) -> Router
where
    S: ImageStore + 'static,
    B: ImageBackend + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/{container}/{image_name}", get(get_image::<S, B>))
        .with_state(resizer)
}

/// Bind and serve until Ctrl-C.
pub async fn serve<S, B>(resizer: Arc<Resizer<S, B>>, bind: SocketAddr) -> std::io::Result<()>
where
    S: ImageStore + 'static,
    B: ImageBackend + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(resizer))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn health() -> &'static str {
    "ok"
}

/// `{unix_seconds}-{container}-{image}`, for correlating log lines.
fn request_id(container: &str, image_name: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{secs}-{container}-{image_name}")
}

async fn get_image<S, B>(
    State(resizer): State<Arc<Resizer<S, B>>>,
    Path((container, image_name)): Path<(String, String)>,
    Query(query): Query<ResizeQuery>,
) -> Response
where
    S: ImageStore + 'static,
    B: ImageBackend + 'static,
{
    let start = Instant::now();
    let span = info_span!("image_request", id = %request_id(&container, &image_name));

    async move {
        info!(container, image = image_name, "processing request");

        let task_span = tracing::Span::current();
        let result = tokio::task::spawn_blocking(move || {
            task_span.in_scope(|| resizer.handle(&container, &image_name, &query))
        })
        .await;

        let elapsed = start.elapsed().as_secs_f64();
        match result {
            Ok(Ok(image)) => {
                info!(
                    outcome = image.outcome.as_str(),
                    "request completed in {elapsed:.3}s"
                );
                image_response(image)
            }
            Ok(Err(e)) => error_response(&e),
            Err(e) => {
                error!("resize task failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error processing image: {e}"),
                )
                    .into_response()
            }
        }
    }
    .instrument(span)
    .await
}

fn image_response(image: ResizedImage) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, image.mime_type),
            (
                HeaderName::from_static(OUTCOME_HEADER),
                image.outcome.as_str().to_string(),
            ),
        ],
        image.data,
    )
        .into_response()
}

fn error_response(e: &ResizeError) -> Response {
    (e.status(), e.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(store: MemoryStore, backend: MockBackend) -> Router {
        router(Arc::new(Resizer::new(store, backend)))
    }

    fn seeded() -> MemoryStore {
        MemoryStore::new().with_object("images", "photo.jpg", b"original".to_vec())
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, headers, body)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, _, body) = get(app(MemoryStore::new(), MockBackend::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn generated_variant_has_content_type_and_outcome() {
        let app = app(seeded(), MockBackend::with_dimensions(1000, 500));

        let (status, headers, body) = get(app, "/images/photo.jpg?w=200").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(headers[OUTCOME_HEADER], "generated");
        assert_eq!(body, b"resized:200x100");
    }

    #[tokio::test]
    async fn second_request_is_cached() {
        let app = app(seeded(), MockBackend::with_dimensions(1000, 500));

        get(app.clone(), "/images/photo.jpg?h=100").await;
        let (status, headers, body) = get(app, "/images/photo.jpg?h=100").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[OUTCOME_HEADER], "cached");
        assert_eq!(body, b"resized:200x100");
    }

    #[tokio::test]
    async fn oversized_returns_original() {
        let app = app(seeded(), MockBackend::with_dimensions(100, 100));

        let (status, headers, body) = get(app, "/images/photo.jpg?w=5000").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[OUTCOME_HEADER], "passthrough");
        assert_eq!(body, b"original");
    }

    #[tokio::test]
    async fn bad_parameters_are_400_plain_text() {
        let app = app(seeded(), MockBackend::with_dimensions(100, 100));

        let (status, headers, body) = get(app.clone(), "/images/photo.jpg?w=12px").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            headers[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        assert_eq!(body, b"Width parameter must be a positive integer");

        let (status, _, body) = get(app.clone(), "/images/photo.jpg").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Must specify width or height");

        let (status, _, body) = get(app, "/images/photo.jpg?w=10&h=10").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Cannot specify both width and height");
    }

    #[tokio::test]
    async fn missing_image_is_404() {
        let app = app(seeded(), MockBackend::with_dimensions(100, 100));
        let (status, _, body) = get(app, "/images/nope.jpg?w=50").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Image not found");
    }

    #[tokio::test]
    async fn name_without_extension_is_500() {
        let app = app(seeded(), MockBackend::with_dimensions(100, 100));
        let (status, _, body) = get(app, "/images/photo?w=50").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"Error processing image: Invalid image name: photo");
    }

    #[tokio::test]
    async fn unknown_query_keys_are_ignored() {
        let app = app(seeded(), MockBackend::with_dimensions(1000, 500));
        let (status, _, _) = get(app, "/images/photo.jpg?w=200&format=webp").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn request_id_shape() {
        let id = request_id("images", "photo.jpg");
        let (secs, rest) = id.split_once('-').unwrap();
        assert!(secs.parse::<u64>().is_ok());
        assert_eq!(rest, "images-photo.jpg");
    }
}
