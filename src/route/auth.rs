use axum::{
	extract::State,
	http::header,
	response::IntoResponse,
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
	auth::{self, resolver, AuthError},
	extract::{Json, Session},
	model::{ApiResponse, User},
	session, AppState,
};

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new()
		.route("/login", post(login))
		.route("/get", post(get_user))
		.route("/oauth", post(oauth))
		.route("/logout", get(logout))
}

#[derive(Deserialize, Validate)]
pub struct LoginInput {
	#[validate(length(min = 1))]
	pub username: String,
	#[validate(length(min = 1))]
	pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
	pub jwt: String,
}

#[derive(Deserialize, Validate)]
pub struct TokenInput {
	#[validate(length(min = 1))]
	pub token: String,
}

/// Issues a bearer token for a valid username/credential pair.
///
/// Bad credentials answer `FAILED` with a 200, the closed-enum shape API
/// clients expect; only infrastructure failures become transport errors.
async fn login(
	State(state): State<AppState>,
	Json(input): Json<LoginInput>,
) -> Result<impl IntoResponse, crate::Error> {
	let issued = auth::authenticate(
		state.store.users.as_ref(),
		state.digest.as_ref(),
		&state.tokens,
		&input.username,
		&input.password,
	)
	.await;

	match issued {
		Ok(jwt) => Ok(Json(AuthResponse { jwt }).into_response()),
		Err(AuthError::InvalidCredentials) => {
			Ok(Json(ApiResponse::Failed).into_response())
		}
		Err(error) => Err(error.into()),
	}
}

/// Resolves a bearer token to its user record, `null` when the token or
/// the user is unknown.
async fn get_user(
	State(state): State<AppState>,
	Json(input): Json<TokenInput>,
) -> Result<Json<Option<User>>, crate::Error> {
	let user = super::bearer_user(&state, &input.token).await?;

	Ok(Json(user))
}

/// Accepts the identity handed over by the OAuth layer, provisioning or
/// reconciling the user record and opening a browser session.
async fn oauth(
	State(state): State<AppState>,
	Json(profile): Json<resolver::ExternalProfile>,
) -> Result<impl IntoResponse, crate::Error> {
	let user = resolver::resolve_from_external_login(state.store.users.as_ref(), &profile)
		.await?;

	let session_id = state
		.store
		.sessions
		.create(&user.username)
		.await?;

	let cookie = session::create_cookie(session_id);

	Ok((
		[(header::SET_COOKIE, cookie.to_string())],
		Json(user),
	))
}

/// Logs out of the authenticated account.
async fn logout(
	State(state): State<AppState>,
	session: Session,
) -> Result<impl IntoResponse, crate::Error> {
	state
		.store
		.sessions
		.delete(session.id)
		.await?;

	// Clear the session cookie
	Ok([(header::SET_COOKIE, session::clear_cookie().to_string())])
}
