use axum::{
	extract::{Path, State},
	response::IntoResponse,
	routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
	auth::gate,
	extract::Json,
	model::{ApiResponse, Comment, ForumPost, User},
	AppState,
};

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new()
		.route("/", get(list_posts))
		.route("/add", post(add_post))
		.route("/view", post(add_view))
		.route("/delete", post(delete_post))
		.route("/comment", post(add_comment))
		.route("/comment/edit", post(edit_comment))
		.route("/comment/delete", post(delete_comment))
		.route("/:key", get(get_post))
}

#[derive(Deserialize, Validate)]
pub struct AddPostInput {
	#[validate(length(min = 1))]
	pub jwt: String,
	#[validate(length(min = 1))]
	pub title: String,
	#[validate(length(min = 1))]
	pub content: String,
}

#[derive(Deserialize, Validate)]
pub struct PostActionInput {
	#[validate(length(min = 1))]
	pub jwt: String,
	pub post_key: Uuid,
}

#[derive(Deserialize, Validate)]
pub struct AddCommentInput {
	#[validate(length(min = 1))]
	pub jwt: String,
	pub post_key: Uuid,
	#[validate(length(min = 1))]
	pub text: String,
}

#[derive(Deserialize, Validate)]
pub struct CommentActionInput {
	#[validate(length(min = 1))]
	pub jwt: String,
	pub post_key: Uuid,
	pub comment_key: Uuid,
	/// New text, only used by the edit operation.
	pub text: Option<String>,
}

fn banned(state: &AppState, user: &User) -> bool {
	gate::authorize(Some(user), gate::Role::NotBanned, &state.config.admins)
		== gate::Decision::DeniedBanned
}

/// All forum posts; browsing stays open to everyone, banned included.
async fn list_posts(
	State(state): State<AppState>,
) -> Result<Json<Vec<ForumPost>>, crate::Error> {
	let posts = state
		.store
		.forum
		.find_all()
		.await?;

	Ok(Json(posts))
}

/// Single post lookup, `null` when the key is unknown.
async fn get_post(
	State(state): State<AppState>,
	Path(key): Path<Uuid>,
) -> Result<Json<Option<ForumPost>>, crate::Error> {
	let post = state
		.store
		.forum
		.find_by_key(key)
		.await?;

	Ok(Json(post))
}

/// Creates a forum post, returning it; the author lands in the view set
/// right away.
async fn add_post(
	State(state): State<AppState>,
	Json(input): Json<AddPostInput>,
) -> Result<impl IntoResponse, crate::Error> {
	let Some(user) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed).into_response());
	};

	if banned(&state, &user) {
		return Ok(Json(ApiResponse::YouAreBanned).into_response());
	}

	let title = input.title.trim();
	let content = input.content.trim();

	if title.is_empty() || content.is_empty() {
		return Ok(Json(ApiResponse::Failed).into_response());
	}

	let mut post = ForumPost::new(&user.username, title, content);
	post.views.insert(user.username);

	state
		.store
		.forum
		.save(post.clone())
		.await?;

	Ok(Json(post).into_response())
}

/// Marks a post as seen by the caller.
async fn add_view(
	State(state): State<AppState>,
	Json(input): Json<PostActionInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let Some(user) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed));
	};

	let Some(mut post) = state
		.store
		.forum
		.find_by_key(input.post_key)
		.await?
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	if post.views.insert(user.username) {
		state
			.store
			.forum
			.save(post)
			.await?;
	}

	Ok(Json(ApiResponse::Ok))
}

/// Deletes a post; only its author may.
async fn delete_post(
	State(state): State<AppState>,
	Json(input): Json<PostActionInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let Some(user) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed));
	};

	if banned(&state, &user) {
		return Ok(Json(ApiResponse::YouAreBanned));
	}

	let Some(post) = state
		.store
		.forum
		.find_by_key(input.post_key)
		.await?
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	if post.author != user.username {
		return Ok(Json(ApiResponse::Failed));
	}

	state
		.store
		.forum
		.delete(post.key)
		.await?;

	Ok(Json(ApiResponse::Ok))
}

/// Adds a comment to a post.
async fn add_comment(
	State(state): State<AppState>,
	Json(input): Json<AddCommentInput>,
) -> Result<impl IntoResponse, crate::Error> {
	let Some(user) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed).into_response());
	};

	if banned(&state, &user) {
		return Ok(Json(ApiResponse::YouAreBanned).into_response());
	}

	let Some(mut post) = state
		.store
		.forum
		.find_by_key(input.post_key)
		.await?
	else {
		return Ok(Json(ApiResponse::Failed).into_response());
	};

	let comment = Comment::new(&user.username, &input.text);
	post.comments.push(comment.clone());

	state
		.store
		.forum
		.save(post)
		.await?;

	Ok(Json(comment).into_response())
}

/// Rewrites a comment's text and marks it edited; only its author may.
async fn edit_comment(
	State(state): State<AppState>,
	Json(input): Json<CommentActionInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let Some(text) = input.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	let Some(user) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed));
	};

	if banned(&state, &user) {
		return Ok(Json(ApiResponse::YouAreBanned));
	}

	let Some(mut post) = state
		.store
		.forum
		.find_by_key(input.post_key)
		.await?
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	let Some(comment) = post
		.comments
		.iter_mut()
		.find(|comment| comment.key == input.comment_key)
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	if comment.author != user.username {
		return Ok(Json(ApiResponse::Failed));
	}

	comment.text = text.to_string();
	comment.edited = true;

	state
		.store
		.forum
		.save(post)
		.await?;

	Ok(Json(ApiResponse::Ok))
}

/// Removes a comment; only its author may.
async fn delete_comment(
	State(state): State<AppState>,
	Json(input): Json<CommentActionInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let Some(user) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed));
	};

	if banned(&state, &user) {
		return Ok(Json(ApiResponse::YouAreBanned));
	}

	let Some(mut post) = state
		.store
		.forum
		.find_by_key(input.post_key)
		.await?
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	let owned = post
		.comments
		.iter()
		.any(|comment| comment.key == input.comment_key && comment.author == user.username);

	if !owned {
		return Ok(Json(ApiResponse::Failed));
	}

	post.comments.retain(|comment| comment.key != input.comment_key);

	state
		.store
		.forum
		.save(post)
		.await?;

	Ok(Json(ApiResponse::Ok))
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn blank_posts_are_rejected_after_trimming() {
		let (server, _store) = server();

		let jwt = token_for(&server, "author").await;

		let response = server
			.post("/api/forum/add")
			.json(&json!({ "jwt": jwt, "title": "   ", "content": "   " }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("FAILED"));

		let response = server
			.post("/api/forum/add")
			.json(&json!({ "jwt": jwt, "title": "hello", "content": "\t\n" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("FAILED"));

		let posts = server.get("/api/forum").await.json::<serde_json::Value>();
		assert_eq!(posts, json!([]));
	}

	#[tokio::test]
	async fn post_and_comment_flow() {
		let (server, _store) = server();

		let author = token_for(&server, "author").await;
		let commenter = token_for(&server, "commenter").await;

		let post = server
			.post("/api/forum/add")
			.json(&json!({ "jwt": author, "title": "Hello", "content": "first post" }))
			.await
			.json::<serde_json::Value>();
		let post_key = post["key"].as_str().unwrap().to_string();
		assert_eq!(post["views"], json!(["author"]));

		let comment = server
			.post("/api/forum/comment")
			.json(&json!({ "jwt": commenter, "post_key": post_key, "text": "welcome" }))
			.await
			.json::<serde_json::Value>();
		let comment_key = comment["key"].as_str().unwrap().to_string();

		// Only the comment's author can edit it.
		let response = server
			.post("/api/forum/comment/edit")
			.json(&json!({
				"jwt": author,
				"post_key": post_key,
				"comment_key": comment_key,
				"text": "hijacked",
			}))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("FAILED"));

		let response = server
			.post("/api/forum/comment/edit")
			.json(&json!({
				"jwt": commenter,
				"post_key": post_key,
				"comment_key": comment_key,
				"text": "welcome!",
			}))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("OK"));

		let post = server
			.get(&format!("/api/forum/{post_key}"))
			.await
			.json::<serde_json::Value>();
		assert_eq!(post["comments"][0]["text"], json!("welcome!"));
		assert_eq!(post["comments"][0]["edited"], json!(true));
	}

	#[tokio::test]
	async fn banned_user_comment_is_rejected_and_not_persisted() {
		let (server, store) = server();

		let author = token_for(&server, "author").await;
		let troll = token_for(&server, "troll").await;

		let post = server
			.post("/api/forum/add")
			.json(&json!({ "jwt": author, "title": "Hello", "content": "content" }))
			.await
			.json::<serde_json::Value>();
		let post_key = post["key"].as_str().unwrap().to_string();

		ban(&store, "troll").await;

		let response = server
			.post("/api/forum/comment")
			.json(&json!({ "jwt": troll, "post_key": post_key, "text": "spam" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("YOU_ARE_BANNED"));

		let post = server
			.get(&format!("/api/forum/{post_key}"))
			.await
			.json::<serde_json::Value>();
		assert_eq!(post["comments"], json!([]));
	}

	#[tokio::test]
	async fn banned_user_can_still_browse() {
		let (server, store) = server();

		let author = token_for(&server, "author").await;
		server
			.post("/api/forum/add")
			.json(&json!({ "jwt": author, "title": "Hello", "content": "content" }))
			.await;

		ban(&store, "author").await;

		let posts = server.get("/api/forum").await.json::<serde_json::Value>();
		assert_eq!(posts.as_array().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn only_the_author_deletes_a_post() {
		let (server, _store) = server();

		let author = token_for(&server, "author").await;
		let other = token_for(&server, "other").await;

		let post = server
			.post("/api/forum/add")
			.json(&json!({ "jwt": author, "title": "Hello", "content": "content" }))
			.await
			.json::<serde_json::Value>();
		let post_key = post["key"].as_str().unwrap().to_string();

		let response = server
			.post("/api/forum/delete")
			.json(&json!({ "jwt": other, "post_key": post_key }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("FAILED"));

		let response = server
			.post("/api/forum/delete")
			.json(&json!({ "jwt": author, "post_key": post_key }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("OK"));
	}

	#[tokio::test]
	async fn view_set_records_each_reader_once() {
		let (server, _store) = server();

		let author = token_for(&server, "author").await;
		let reader = token_for(&server, "reader").await;

		let post = server
			.post("/api/forum/add")
			.json(&json!({ "jwt": author, "title": "Hello", "content": "content" }))
			.await
			.json::<serde_json::Value>();
		let post_key = post["key"].as_str().unwrap().to_string();

		for _ in 0..2 {
			let response = server
				.post("/api/forum/view")
				.json(&json!({ "jwt": reader, "post_key": post_key }))
				.await;
			assert_eq!(response.json::<serde_json::Value>(), json!("OK"));
		}

		let post = server
			.get(&format!("/api/forum/{post_key}"))
			.await
			.json::<serde_json::Value>();
		assert_eq!(post["views"], json!(["author", "reader"]));
	}
}
