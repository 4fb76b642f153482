use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Build the CORS layer. The portal frontend only reads and posts read marks.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
