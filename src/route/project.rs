use axum::{
	extract::{Path, State},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
	auth::gate,
	extract::{Json, Query},
	model::{ApiResponse, Project},
	AppState,
};

/// Listings shown per index page.
pub const PAGE_SIZE: usize = 20;

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new()
		.route("/", get(list_projects))
		.route("/submit", post(submit))
		.route("/apply", post(apply))
		.route("/unapply", post(unapply))
		.route("/delete", post(delete))
		.route("/:title", get(get_project))
}

fn one() -> i64 {
	1
}

#[derive(Deserialize, Validate)]
pub struct Paginate {
	#[serde(default = "one")]
	pub page: i64,
}

#[derive(Serialize)]
pub struct ProjectPage {
	pub projects: Vec<Project>,
	pub page: usize,
	pub pages: usize,
}

#[derive(Deserialize, Validate)]
pub struct SubmitInput {
	#[validate(length(min = 1))]
	pub jwt: String,
	#[validate(length(min = 1, max = 100))]
	pub title: String,
	#[validate(length(min = 1))]
	pub description: String,
	pub github_project_link: String,
	/// Technologies the project is looking for; at least one.
	#[validate(length(min = 1))]
	pub requirements: Vec<String>,
}

#[derive(Deserialize, Validate)]
pub struct ProjectActionInput {
	#[validate(length(min = 1))]
	pub jwt: String,
	#[validate(length(min = 1))]
	pub title: String,
}

/// Returns one index page of projects, newest first, together with the
/// page arithmetic the pager needs. Out-of-range pages clamp to the
/// nearest valid one.
async fn list_projects(
	State(state): State<AppState>,
	Query(paginate): Query<Paginate>,
) -> Result<Json<ProjectPage>, crate::Error> {
	let all = state
		.store
		.projects
		.find_all()
		.await?;

	let pages = all.len().div_ceil(PAGE_SIZE).max(1);
	let page = usize::try_from(paginate.page).unwrap_or(1).clamp(1, pages);

	let projects = all
		.into_iter()
		.rev()
		.skip((page - 1) * PAGE_SIZE)
		.take(PAGE_SIZE)
		.collect();

	Ok(Json(ProjectPage {
		projects,
		page,
		pages,
	}))
}

/// Single project lookup, `null` when the title is unknown.
async fn get_project(
	State(state): State<AppState>,
	Path(title): Path<String>,
) -> Result<Json<Option<Project>>, crate::Error> {
	let project = state
		.store
		.projects
		.find_by_title(&title)
		.await?;

	Ok(Json(project))
}

/// Publishes a new listing. Titles are unique; a duplicate answers
/// `FAILED` without touching the store.
async fn submit(
	State(state): State<AppState>,
	Json(input): Json<SubmitInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let Some(mut user) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed));
	};

	if gate::authorize(Some(&user), gate::Role::NotBanned, &state.config.admins)
		== gate::Decision::DeniedBanned
	{
		return Ok(Json(ApiResponse::YouAreBanned));
	}

	if state
		.store
		.projects
		.find_by_title(&input.title)
		.await?
		.is_some()
	{
		return Ok(Json(ApiResponse::Failed));
	}

	let project = Project::new(
		&input.title,
		&input.description,
		&input.github_project_link,
		&user.username,
		input.requirements,
	);

	state
		.store
		.projects
		.save(project)
		.await?;

	user.projects.push(input.title);
	state
		.store
		.users
		.save(user)
		.await?;

	Ok(Json(ApiResponse::Ok))
}

/// Applies to join a listing. Authors cannot apply to their own project
/// and double-applications answer `FAILED`.
async fn apply(
	State(state): State<AppState>,
	Json(input): Json<ProjectActionInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let Some(mut user) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed));
	};

	if gate::authorize(Some(&user), gate::Role::NotBanned, &state.config.admins)
		== gate::Decision::DeniedBanned
	{
		return Ok(Json(ApiResponse::YouAreBanned));
	}

	let Some(mut project) = state
		.store
		.projects
		.find_by_title(&input.title)
		.await?
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	if project.author == user.username || project.applied.contains(&user.username) {
		return Ok(Json(ApiResponse::Failed));
	}

	project.applied.push(user.username.clone());
	user.projects_applied_to.push(project.title.clone());

	state
		.store
		.projects
		.save(project)
		.await?;
	state
		.store
		.users
		.save(user)
		.await?;

	Ok(Json(ApiResponse::Ok))
}

/// Withdraws an application.
async fn unapply(
	State(state): State<AppState>,
	Json(input): Json<ProjectActionInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let Some(mut user) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed));
	};

	if gate::authorize(Some(&user), gate::Role::NotBanned, &state.config.admins)
		== gate::Decision::DeniedBanned
	{
		return Ok(Json(ApiResponse::YouAreBanned));
	}

	let Some(mut project) = state
		.store
		.projects
		.find_by_title(&input.title)
		.await?
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	if !project.applied.contains(&user.username) {
		return Ok(Json(ApiResponse::Failed));
	}

	project.applied.retain(|name| name != &user.username);
	user.projects_applied_to.retain(|title| title != &project.title);

	state
		.store
		.projects
		.save(project)
		.await?;
	state
		.store
		.users
		.save(user)
		.await?;

	Ok(Json(ApiResponse::Ok))
}

/// Deletes a listing. Only its author may do this; every applicant's
/// record is cleaned up along the way.
async fn delete(
	State(state): State<AppState>,
	Json(input): Json<ProjectActionInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let Some(mut user) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed));
	};

	let Some(project) = state
		.store
		.projects
		.find_by_title(&input.title)
		.await?
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	if project.author != user.username {
		return Ok(Json(ApiResponse::Failed));
	}

	for applicant in &project.applied {
		let Some(mut applicant) = state
			.store
			.users
			.find_by_username(applicant)
			.await?
		else {
			continue;
		};

		applicant
			.projects_applied_to
			.retain(|title| title != &project.title);
		state
			.store
			.users
			.save(applicant)
			.await?;
	}

	state
		.store
		.projects
		.delete(&project.title)
		.await?;

	user.projects.retain(|title| title != &project.title);
	state
		.store
		.users
		.save(user)
		.await?;

	Ok(Json(ApiResponse::Ok))
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn submit_apply_unapply_flow() {
		let (server, _store) = server();

		let author = token_for(&server, "author").await;
		let dev = token_for(&server, "dev").await;

		let response = server
			.post("/api/projects/submit")
			.json(&json!({
				"jwt": author,
				"title": "GitPals",
				"description": "find collaborators",
				"github_project_link": "https://github.com/author/gitpals",
				"requirements": ["Java"],
			}))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("OK"));

		// Duplicate title is rejected.
		let response = server
			.post("/api/projects/submit")
			.json(&json!({
				"jwt": dev,
				"title": "GitPals",
				"description": "copy",
				"github_project_link": "",
				"requirements": ["Java"],
			}))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("FAILED"));

		// The author cannot apply to their own project.
		let response = server
			.post("/api/projects/apply")
			.json(&json!({ "jwt": author, "title": "GitPals" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("FAILED"));

		let response = server
			.post("/api/projects/apply")
			.json(&json!({ "jwt": dev, "title": "GitPals" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("OK"));

		let project = server
			.get("/api/projects/GitPals")
			.await
			.json::<serde_json::Value>();
		assert_eq!(project["applied"], json!(["dev"]));

		let response = server
			.post("/api/projects/unapply")
			.json(&json!({ "jwt": dev, "title": "GitPals" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("OK"));

		let project = server
			.get("/api/projects/GitPals")
			.await
			.json::<serde_json::Value>();
		assert_eq!(project["applied"], json!([]));
	}

	#[tokio::test]
	async fn only_the_author_can_delete() {
		let (server, _store) = server();

		let author = token_for(&server, "author").await;
		let dev = token_for(&server, "dev").await;

		server
			.post("/api/projects/submit")
			.json(&json!({
				"jwt": author,
				"title": "GitPals",
				"description": "d",
				"github_project_link": "",
				"requirements": ["Java"],
			}))
			.await;

		let response = server
			.post("/api/projects/delete")
			.json(&json!({ "jwt": dev, "title": "GitPals" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("FAILED"));

		let response = server
			.post("/api/projects/delete")
			.json(&json!({ "jwt": author, "title": "GitPals" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("OK"));

		let response = server.get("/api/projects/GitPals").await;
		assert_eq!(response.json::<serde_json::Value>(), json!(null));
	}

	#[tokio::test]
	async fn banned_users_cannot_submit_or_apply() {
		let (server, store) = server();

		let jwt = token_for(&server, "troll").await;
		ban(&store, "troll").await;

		let response = server
			.post("/api/projects/submit")
			.json(&json!({
				"jwt": jwt,
				"title": "Spam",
				"description": "d",
				"github_project_link": "",
				"requirements": ["Java"],
			}))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("YOU_ARE_BANNED"));

		let response = server
			.post("/api/projects/apply")
			.json(&json!({ "jwt": jwt, "title": "Spam" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("YOU_ARE_BANNED"));
	}

	#[tokio::test]
	async fn pagination_is_newest_first_with_clamping() {
		let (server, _store) = server();

		let jwt = token_for(&server, "author").await;

		for index in 0..45 {
			server
				.post("/api/projects/submit")
				.json(&json!({
					"jwt": jwt,
					"title": format!("project-{index}"),
					"description": "d",
					"github_project_link": "",
					"requirements": ["Java"],
				}))
				.await;
		}

		let page = server.get("/api/projects").await.json::<serde_json::Value>();
		assert_eq!(page["pages"], json!(3));
		assert_eq!(page["page"], json!(1));
		assert_eq!(page["projects"][0]["title"], json!("project-44"));
		assert_eq!(page["projects"].as_array().unwrap().len(), 20);

		let page = server
			.get("/api/projects?page=3")
			.await
			.json::<serde_json::Value>();
		assert_eq!(page["projects"].as_array().unwrap().len(), 5);
		assert_eq!(page["projects"][4]["title"], json!("project-0"));

		// Past the end clamps to the last page.
		let page = server
			.get("/api/projects?page=99")
			.await
			.json::<serde_json::Value>();
		assert_eq!(page["page"], json!(3));

		// Below the start clamps to the first page.
		let page = server
			.get("/api/projects?page=0")
			.await
			.json::<serde_json::Value>();
		assert_eq!(page["page"], json!(1));

		let page = server
			.get("/api/projects?page=-3")
			.await
			.json::<serde_json::Value>();
		assert_eq!(page["page"], json!(1));
		assert_eq!(page["projects"][0]["title"], json!("project-44"));
	}
}
