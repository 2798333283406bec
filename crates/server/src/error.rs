use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Resolve(#[from] chess_core::resolve::ResolveError),

    #[error("invalid board: {0}")]
    Board(#[from] chess_core::board::BoardError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        tracing::error!("Request failed: {message}");
        // Flat error shape with no structured codes; everything is a 500.
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}
