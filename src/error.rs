use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{session::SessionError, store::StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Internal Server Error")]
    Store(#[from] StoreError),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Session failure")]
    Session(#[from] SessionError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Session { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
