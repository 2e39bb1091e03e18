use std::collections::BTreeMap;

use axum::{
	extract::State,
	routing::{get, post},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
	extract::{Json, Session},
	model::{ApiResponse, Dialog, Message},
	AppState,
};

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new()
		.route("/", get(dialogs))
		.route("/send", post(send))
		.route("/read", post(mark_read))
}

#[derive(Deserialize, Validate)]
pub struct SendInput {
	#[validate(length(min = 1))]
	pub jwt: String,
	#[validate(length(min = 1))]
	pub to: String,
	#[validate(length(min = 1))]
	pub text: String,
}

#[derive(Deserialize, Validate)]
pub struct ReadInput {
	#[validate(length(min = 1))]
	pub peer: String,
}

/// Delivers a direct message: appended to both dialog sides, bumping the
/// recipient's unread counter. Self-messaging and unknown recipients
/// answer `FAILED`.
async fn send(
	State(state): State<AppState>,
	Json(input): Json<SendInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let Some(mut sender) = super::bearer_user(&state, &input.jwt).await? else {
		return Ok(Json(ApiResponse::Failed));
	};

	if sender.username == input.to {
		return Ok(Json(ApiResponse::Failed));
	}

	let Some(mut recipient) = state
		.store
		.users
		.find_by_username(&input.to)
		.await?
	else {
		return Ok(Json(ApiResponse::Failed));
	};

	let message = Message::new(&sender.username, &input.text);

	sender
		.dialogs
		.entry(recipient.username.clone())
		.or_default()
		.messages
		.push(message.clone());

	let dialog = recipient.dialogs.entry(sender.username.clone()).or_default();
	dialog.messages.push(message);
	dialog.unread += 1;

	state
		.store
		.users
		.save(sender)
		.await?;
	state
		.store
		.users
		.save(recipient)
		.await?;

	Ok(Json(ApiResponse::Ok))
}

/// Returns the caller's dialogs keyed by peer.
async fn dialogs(session: Session) -> Json<BTreeMap<String, Dialog>> {
	Json(session.user.dialogs)
}

/// Resets the unread counter of one dialog.
async fn mark_read(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<ReadInput>,
) -> Result<Json<ApiResponse>, crate::Error> {
	let mut user = session.user;

	let Some(dialog) = user.dialogs.get_mut(&input.peer) else {
		return Ok(Json(ApiResponse::Failed));
	};

	dialog.unread = 0;

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
	async fn send_read_flow_updates_both_sides() {
		let (server, store) = server();

		let alice = token_for(&server, "alice").await;
		let _bob = token_for(&server, "bob").await;

		for text in ["hi bob", "how are you?"] {
			let response = server
				.post("/api/messages/send")
				.json(&json!({ "jwt": alice, "to": "bob", "text": text }))
				.await;
			assert_eq!(response.json::<serde_json::Value>(), json!("OK"));
		}

		// Bob sees two unread messages from alice.
		let bob_server = server_with(store.clone());
		login(&bob_server, "bob").await;

		let me = bob_server
			.get("/api/users/me")
			.await
			.json::<serde_json::Value>();
		assert_eq!(me["unread_messages"], json!(2));

		let dialogs = bob_server
			.get("/api/messages")
			.await
			.json::<serde_json::Value>();
		assert_eq!(dialogs["alice"]["unread"], json!(2));
		assert_eq!(dialogs["alice"]["messages"][0]["text"], json!("hi bob"));

		let response = bob_server
			.post("/api/messages/read")
			.json(&json!({ "peer": "alice" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("OK"));

		let me = bob_server
			.get("/api/users/me")
			.await
			.json::<serde_json::Value>();
		assert_eq!(me["unread_messages"], json!(0));

		// The sender's copy carries no unread counter.
		login(&server, "alice").await;
		let dialogs = server.get("/api/messages").await.json::<serde_json::Value>();
		assert_eq!(dialogs["bob"]["unread"], json!(0));
		assert_eq!(dialogs["bob"]["messages"].as_array().unwrap().len(), 2);
	}

	#[tokio::test]
	async fn unknown_recipient_and_self_send_fail() {
		let (server, _store) = server();

		let alice = token_for(&server, "alice").await;

		let response = server
			.post("/api/messages/send")
			.json(&json!({ "jwt": alice, "to": "ghost", "text": "hello?" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("FAILED"));

		let response = server
			.post("/api/messages/send")
			.json(&json!({ "jwt": alice, "to": "alice", "text": "note to self" }))
			.await;
		assert_eq!(response.json::<serde_json::Value>(), json!("FAILED"));
	}
}
