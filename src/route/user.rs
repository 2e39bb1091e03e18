use std::collections::BTreeMap;

use axum::{
	extract::{Path, State},
	routing::{get, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
	extract::{Json, Session},
	model::{ApiResponse, User},
	AppState,
};

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new()
		.route("/me", get(me))
		.route("/me/password", put(set_password))
		.route("/me/skills", put(set_skills))
		.route("/:username", get(get_user))
}

#[derive(Serialize)]
pub struct MeResponse {
	pub user: User,
	pub unread_messages: u32,
}

/// The fields of a user record anyone may see. Messaging state stays
/// private to the owner's session and the admin backup.
#[derive(Serialize)]
pub struct PublicProfile {
	pub username: String,
	pub github_link: String,
	pub email: Option<String>,
	pub country: Option<String>,
	pub bio: Option<String>,
	pub skills: BTreeMap<String, bool>,
	pub banned: bool,
	pub last_online: DateTime<Utc>,
	pub projects: Vec<String>,
	pub projects_applied_to: Vec<String>,
}

impl From<User> for PublicProfile {
	fn from(user: User) -> Self {
		Self {
			username: user.username,
			github_link: user.github_link,
			email: user.email,
			country: user.country,
			bio: user.bio,
			skills: user.skills,
			banned: user.banned,
			last_online: user.last_online,
			projects: user.projects,
			projects_applied_to: user.projects_applied_to,
		}
	}
}

#[derive(Deserialize, Validate)]
pub struct PasswordInput {
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct SkillsInput {
	/// Technology tags the user knows; everything else is reset to
	/// unknown.
	pub skills: Vec<String>,
}

/// Returns the authenticated user together with the unread-message
/// counter the dashboard shows.
async fn me(session: Session) -> Json<MeResponse> {
	let unread_messages = session.user.unread_messages();

	Json(MeResponse {
		user: session.user,
		unread_messages,
	})
}

/// Public profile lookup, `null` when the username is not registered.
async fn get_user(
	State(state): State<AppState>,
	Path(username): Path<String>,
) -> Result<Json<Option<PublicProfile>>, crate::Error> {
	let user = state
		.store
		.users
		.find_by_username(&username)
		.await?;

	Ok(Json(user.map(PublicProfile::from)))
}

/// Sets the API credential: the digest is stored, the raw secret never
/// is.
async fn set_password(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<PasswordInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let mut user = session.user;
	user.credential_digest = state.digest.digest(&input.password);

	state
		.store
		.users
		.save(user)
		.await?;

	Ok(Json(ApiResponse::Ok))
}

/// Replaces the known-skill selection. Tags outside the platform's
/// technology list answer `FAILED` and change nothing.
async fn set_skills(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<SkillsInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let mut user = session.user;

	if input
		.skills
		.iter()
		.any(|skill| !user.skills.contains_key(skill))
	{
		return Ok(Json(ApiResponse::Failed));
	}

	for known in user.skills.values_mut() {
		*known = false;
	}

	for skill in &input.skills {
		if let Some(known) = user.skills.get_mut(skill) {
			*known = true;
		}
	}

	state
		.store
		.users
		.save(user)
		.await?;

	Ok(Json(ApiResponse::Ok))
}
