use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use db::store::StoreError;
use services::services::{
    ai_client::AiClientError, media_insight::MediaInsightError,
    portfolio_import::PortfolioImportError,
};
use thiserror::Error;
use utils::{jwt::TokenError, response::ApiResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    PortfolioImport(#[from] PortfolioImportError),
    #[error(transparent)]
    Ai(#[from] AiClientError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
}

impl From<MediaInsightError> for ApiError {
    fn from(err: MediaInsightError) -> Self {
        match err {
            MediaInsightError::Ai(e) => ApiError::Ai(e),
            MediaInsightError::Store(e) => ApiError::Store(e),
            e @ MediaInsightError::MissingFileName => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PortfolioImport(e) => match e {
                PortfolioImportError::Database(_) | PortfolioImportError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            },
            ApiError::Ai(AiClientError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Ai(_) => StatusCode::BAD_GATEWAY,
            ApiError::Token(_) | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
            match status {
                StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
                _ => self.to_string(),
            }
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
            self.to_string()
        };

        (status, ResponseJson(ApiResponse::<()>::error(&message))).into_response()
    }
}
