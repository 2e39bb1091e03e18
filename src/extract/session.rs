use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{auth::AuthError, error::Error, model::User, session, store::Store};

/// Extracts the session and related user from the request.
///
/// If no session cookie is present, [`AuthError::NoSessionCookie`] is
/// returned. If the session or its user cannot be resolved,
/// [`AuthError::InvalidSessionCookie`] is returned.
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: User,
}

fn session_id(parts: &request::Parts) -> Result<Option<Uuid>, AuthError> {
	let cookies = parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok());

	let Some(cookie) = cookies
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)
	else {
		return Ok(None);
	};

	Uuid::parse_str(cookie.value())
		.map(Some)
		.map_err(|_| AuthError::InvalidSessionCookie)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Store: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let id = session_id(parts)?.ok_or(AuthError::NoSessionCookie)?;

		let store = Store::from_ref(state);

		let username = store
			.sessions
			.find(id)
			.await?
			.ok_or(AuthError::InvalidSessionCookie)?;

		let user = store
			.users
			.find_by_username(&username)
			.await?
			.ok_or(AuthError::InvalidSessionCookie)?;

		Ok(Self { id, user })
	}
}

/// Lenient companion to [`Session`]: resolves to `None` instead of
/// rejecting when the caller is anonymous or the cookie is stale, the way
/// browse-style pages treat missing authentication.
#[derive(Debug)]
pub struct MaybeUser(pub Option<User>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
	Store: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let Ok(Some(id)) = session_id(parts) else {
			return Ok(Self(None));
		};

		let store = Store::from_ref(state);

		let Some(username) = store.sessions.find(id).await?
		else {
			return Ok(Self(None));
		};

		let user = store
			.users
			.find_by_username(&username)
			.await?;

		Ok(Self(user))
	}
}
