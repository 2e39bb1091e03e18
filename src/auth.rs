//! Authentication and authorization core: credential verification,
//! bearer-token issuance, principal resolution and the per-request
//! authorization gate.

pub mod digest;
pub mod gate;
pub mod resolver;
pub mod token;

use axum::{
	body::Body,
	http::{Response, StatusCode},
	response::IntoResponse,
};

use crate::store::{StoreError, UserStore};

use digest::CredentialDigest;
use token::{TokenCodec, TokenError};

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not
/// contain sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("invalid username or password")]
	InvalidCredentials,
	#[error("token error: {0}")]
	Token(#[from] TokenError),
	#[error("no session cookie")]
	NoSessionCookie,
	#[error("invalid session cookie")]
	InvalidSessionCookie,
	#[error("store error: {0}")]
	Store(#[from] StoreError),
}

impl AuthError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::InvalidCredentials
			| Self::Token(..)
			| Self::NoSessionCookie
			| Self::InvalidSessionCookie => StatusCode::UNAUTHORIZED,
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for AuthError {
	fn into_response(self) -> Response<Body> {
		crate::Error::from(self).into_response()
	}
}

/// Verifies a username/password pair against the stored credential digest
/// and mints a bearer token on success.
///
/// Unknown usernames, unset credentials and digest mismatches are all
/// collapsed into [`AuthError::InvalidCredentials`]; no side effects
/// beyond token issuance.
pub async fn authenticate(
	users: &dyn UserStore,
	digest: &dyn CredentialDigest,
	codec: &TokenCodec,
	username: &str,
	password: &str,
) -> Result<String, AuthError> {
	let user = users
		.find_by_username(username)
		.await?
		.ok_or(AuthError::InvalidCredentials)?;

	if user.credential_digest.is_empty()
		|| !digest.matches(password, &user.credential_digest)
	{
		return Err(AuthError::InvalidCredentials);
	}

	Ok(codec.issue(&user.username)?)
}
