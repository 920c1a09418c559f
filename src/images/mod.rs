pub mod handlers;
pub mod normalize;
pub mod services;

use crate::state::AppState;
use axum::Router;

/// Upload endpoint plus the `/uploads/:file_name` reader, both mounted under `/api`.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(handlers::upload_routes(max_upload_bytes))
        .merge(handlers::serve_routes())
}
