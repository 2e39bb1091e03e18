use chrono::{Duration, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::model::User;
use crate::store::{StoreError, UserStore};

use super::token::TokenCodec;

/// Profile fields handed over by the OAuth provider after a successful
/// external login. Absent fields stay `None`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExternalProfile {
	#[validate(length(min = 1))]
	pub username: String,
	pub email: Option<String>,
	pub location: Option<String>,
	pub bio: Option<String>,
}

/// Resolves a bearer token to a canonical user record.
///
/// Invalid tokens and unknown subjects both resolve to `None`; callers
/// treat that as "anonymous", never as a fatal error. Store failures do
/// propagate.
pub async fn resolve_from_token(
	codec: &TokenCodec,
	users: &dyn UserStore,
	token: &str,
) -> Result<Option<User>, StoreError> {
	let Ok(subject) = codec.verify(token) else {
		return Ok(None);
	};

	users.find_by_username(&subject).await
}

/// Resolves an OAuth-provided identity to a canonical user record,
/// provisioning one on first login.
///
/// Existing records get mutable profile fields reconciled only when the
/// provider reports different values, and the last-seen timestamp is
/// refreshed at most once per day to bound write volume. At most one
/// store write happens per call.
pub async fn resolve_from_external_login(
	users: &dyn UserStore,
	profile: &ExternalProfile,
) -> Result<User, StoreError> {
	let Some(mut user) = users.find_by_username(&profile.username).await? else {
		let user = User::new(
			&profile.username,
			profile.email.clone(),
			profile.location.clone(),
			profile.bio.clone(),
		);

		users.save(user.clone()).await?;
		tracing::info!(username = %user.username, "provisioned first-time login");

		return Ok(user);
	};

	let mut changed = false;

	if user.email != profile.email {
		user.email = profile.email.clone();
		changed = true;
	}

	if user.country != profile.location {
		user.country = profile.location.clone();
		changed = true;
	}

	if user.bio != profile.bio {
		user.bio = profile.bio.clone();
		changed = true;
	}

	let now = Utc::now();
	if now - user.last_online >= Duration::days(1) {
		user.last_online = now;
		changed = true;
	}

	if changed {
		users.save(user.clone()).await?;
	}

	Ok(user)
}
