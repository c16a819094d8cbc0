use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

use crate::services::caption_pipeline_service::PipelineError;

/// Every failure is terminal for the single operation that raised it.
#[derive(Error, Debug)]
pub enum AppError {
    /// No session; handled as a redirect, never shown as an error.
    #[error("sign-in required")]
    AuthRequired,

    #[error("could not load data: {0}")]
    DataFetch(String),

    #[error("could not save changes: {0}")]
    Mutation(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::DataFetch(e.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        AppError::Mutation(e.to_string())
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::AuthRequired => return Redirect::to("/login").into_response(),
            AppError::DataFetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Mutation(_) => StatusCode::BAD_GATEWAY,
        };

        let template = ErrorTemplate {
            message: self.to_string(),
        };
        match template.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(e) => {
                error!("Error template failed to render: {}", e);
                (status, self.to_string()).into_response()
            }
        }
    }
}
