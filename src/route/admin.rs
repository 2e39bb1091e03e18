use axum::{
	extract::State,
	routing::{get, post},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
	auth::gate,
	extract::{Json, MaybeUser},
	model::{ApiResponse, ForumPost, Message, Project, User},
	AppState,
};

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new()
		.route("/users", get(list_users))
		.route("/projects", get(list_projects))
		.route("/forum", get(list_forum))
		.route("/ban", post(ban))
		.route("/unban", post(unban))
		.route("/clear-projects", post(clear_projects))
		.route("/broadcast", post(broadcast))
}

#[derive(Deserialize, Validate)]
pub struct TargetInput {
	#[validate(length(min = 1))]
	pub username: String,
}

#[derive(Deserialize, Validate)]
pub struct BroadcastInput {
	#[validate(length(min = 1))]
	pub text: String,
}

fn is_admin(state: &AppState, user: Option<&User>) -> bool {
	gate::authorize(user, gate::Role::Admin, &state.config.admins)
		.permits(gate::Role::Admin)
}

/// Backup list of every user record. Non-admin callers get an empty
/// list, indistinguishable from an empty platform.
async fn list_users(
	State(state): State<AppState>,
	MaybeUser(user): MaybeUser,
) -> Result<Json<Vec<User>>, crate::Error> {
	if !is_admin(&state, user.as_ref()) {
		return Ok(Json(Vec::new()));
	}

	let users = state
		.store
		.users
		.find_all()
		.await?;

	Ok(Json(users))
}

/// Backup list of every project.
async fn list_projects(
	State(state): State<AppState>,
	MaybeUser(user): MaybeUser,
) -> Result<Json<Vec<Project>>, crate::Error> {
	if !is_admin(&state, user.as_ref()) {
		return Ok(Json(Vec::new()));
	}

	let projects = state
		.store
		.projects
		.find_all()
		.await?;

	Ok(Json(projects))
}

/// Backup list of every forum post.
async fn list_forum(
	State(state): State<AppState>,
	MaybeUser(user): MaybeUser,
) -> Result<Json<Vec<ForumPost>>, crate::Error> {
	if !is_admin(&state, user.as_ref()) {
		return Ok(Json(Vec::new()));
	}

	let posts = state
		.store
		.forum
		.find_all()
		.await?;

	Ok(Json(posts))
}

async fn set_banned(
	state: &AppState,
	caller: Option<&User>,
	username: &str,
	banned: bool,
) -> Result<ApiResponse, crate::Error> {
	if !is_admin(state, caller) {
		return Ok(ApiResponse::Failed);
	}

	let Some(mut user) = state
		.store
		.users
		.find_by_username(username)
		.await?
	else {
		return Ok(ApiResponse::Failed);
	};

	user.banned = banned;

	state
		.store
		.users
		.save(user)
		.await?;

	tracing::info!(username, banned, "moderation state changed");

	Ok(ApiResponse::Ok)
}

/// Bans a user: their forum, comment and project-application writes are
/// rejected from the next request on.
async fn ban(
	State(state): State<AppState>,
	MaybeUser(caller): MaybeUser,
	Json(input): Json<TargetInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	Ok(Json(
		set_banned(&state, caller.as_ref(), &input.username, true).await?,
	))
}

/// Lifts a ban. There is no automatic expiry; this is the only way back.
async fn unban(
	State(state): State<AppState>,
	MaybeUser(caller): MaybeUser,
	Json(input): Json<TargetInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	Ok(Json(
		set_banned(&state, caller.as_ref(), &input.username, false).await?,
	))
}

/// Deletes every project a user created, the quick cleanup for spam
/// accounts.
async fn clear_projects(
	State(state): State<AppState>,
	MaybeUser(caller): MaybeUser,
	Json(input): Json<TargetInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	if !is_admin(&state, caller.as_ref()) {
		return Ok(Json(ApiResponse::Failed));
	}

	let Some(mut user) = state
		.store
		.users
		.find_by_username(&input.username)
		.await?
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	for title in &user.projects {
		state
			.store
			.projects
			.delete(title)
			.await?;
	}

	user.projects.clear();

	state
		.store
		.users
		.save(user)
		.await?;

	Ok(Json(ApiResponse::Ok))
}

/// Drops a message into every user's inbox.
async fn broadcast(
	State(state): State<AppState>,
	MaybeUser(caller): MaybeUser,
	Json(input): Json<BroadcastInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let Some(caller) = caller else {
		return Ok(Json(ApiResponse::Failed));
	};

	if !is_admin(&state, Some(&caller)) {
		return Ok(Json(ApiResponse::Failed));
	}

	let message = Message::new(&caller.username, &input.text);

	for mut user in state
		.store
		.users
		.find_all()
		.await?
	{
		user.messages.push(message.clone());

		state
			.store
			.users
			.save(user)
			.await?;
	}

	Ok(Json(ApiResponse::Ok))
}
