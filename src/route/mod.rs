pub mod admin;
pub mod auth;
pub mod forum;
pub mod message;
pub mod project;
pub mod user;

use crate::{auth::resolver, error::Error, model::User, AppState};

/// Resolves the bearer token API clients send inside the request body.
///
/// Any verification or lookup failure resolves to `None`; API handlers
/// answer those with their closed response enum, never with a transport
/// error.
pub(crate) async fn bearer_user(state: &AppState, jwt: &str) -> Result<Option<User>, Error> {
	resolver::resolve_from_token(&state.tokens, state.store.users.as_ref(), jwt)
		.await
		.map_err(Error::Store)
}
