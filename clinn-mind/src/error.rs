use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
  #[error(transparent)]
  Timetable(#[from] clinn_timetable::Error),

  #[error("Invalid {field} filter: {value:?}")]
  InvalidFilter { field: &'static str, value: String },
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = match &self {
      AppError::Timetable(clinn_timetable::Error::NotFound { .. }) => StatusCode::NOT_FOUND,
      AppError::Timetable(clinn_timetable::Error::OutOfRange { .. }) => StatusCode::BAD_REQUEST,
      AppError::Timetable(err) => {
        error!("Stored timetable data is unusable: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
      }
      AppError::InvalidFilter { .. } => StatusCode::BAD_REQUEST,
    };

    (status, self.to_string()).into_response()
  }
}
