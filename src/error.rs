use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use serde::Serialize;
use tower_governor::GovernorError;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] rejection::JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("auth error: {0}")]
	Auth(#[from] AuthError),
	#[error("store error: {0}")]
	Store(#[from] StoreError),
	#[error("rate limit error: {0}")]
	RateLimit(#[from] GovernorError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<String>,
}

impl IntoResponse for Error {
	fn into_response(self) -> Response<Body> {
		match self {
			Error::Validation(errors) => (
				StatusCode::BAD_REQUEST,
				Json(ErrorResponse {
					errors: errors
						.field_errors()
						.into_iter()
						.flat_map(|(field, errors)| {
							errors
								.iter()
								.map(move |error| format!("{field}: {error}"))
								.collect::<Vec<_>>()
						})
						.collect(),
					success: false,
				}),
			)
				.into_response(),
			Error::Json(error) => (
				StatusCode::BAD_REQUEST,
				Json(ErrorResponse {
					errors: vec![error.to_string()],
					success: false,
				}),
			)
				.into_response(),
			Error::Query(error) => (
				StatusCode::BAD_REQUEST,
				Json(ErrorResponse {
					errors: vec![error.to_string()],
					success: false,
				}),
			)
				.into_response(),
			Error::Auth(error) => (
				error.status(),
				Json(ErrorResponse {
					errors: vec![error.to_string()],
					success: false,
				}),
			)
				.into_response(),
			Error::RateLimit(GovernorError::TooManyRequests { .. }) => (
				StatusCode::TOO_MANY_REQUESTS,
				Json(ErrorResponse {
					errors: vec!["too many requests".to_string()],
					success: false,
				}),
			)
				.into_response(),
			Error::Store(..) | Error::RateLimit(..) => {
				tracing::error!(error = %self, "internal error");

				(
					StatusCode::INTERNAL_SERVER_ERROR,
					Json(ErrorResponse {
						errors: Vec::new(),
						success: false,
					}),
				)
					.into_response()
			}
		}
	}
}
