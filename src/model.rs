use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Technology tags a user can mark as known. New users are seeded with
/// every tag set to `false`.
pub const TECHNOLOGIES: &[&str] = &[
	"Web design",
	"Mobile design",
	"Java",
	"C++",
	"Python",
	"Machine learning",
	"Deep learning",
	"Ionic",
	"Photoshop",
	"React",
	"JavaScript",
	"Angular",
	"Analytics",
	"Ruby",
	"NodeJS",
	"Unreal Engine",
	"Unity",
	"Game development",
	"Computer architecture",
	"C",
	"GLSL",
	"OpenGL",
	"HTML5",
];

/// Closed set of outcomes returned to API callers for moderated
/// operations, instead of structured error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiResponse {
	Ok,
	Failed,
	YouAreBanned,
}

/// A direct or broadcast message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
	pub author: String,
	pub text: String,
	pub sent_at: DateTime<Utc>,
}

impl Message {
	pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			author: author.into(),
			text: text.into(),
			sent_at: Utc::now(),
		}
	}
}

/// One side of a conversation between two users: the unread counter and
/// the ordered message list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dialog {
	pub unread: u32,
	pub messages: Vec<Message>,
}

/// A model representing a single user.
///
/// The username is the primary key: unique, case-sensitive and immutable
/// once created. The credential digest is never serialized to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub username: String,
	pub github_link: String,
	pub email: Option<String>,
	pub country: Option<String>,
	pub bio: Option<String>,
	/// Technology name -> whether the user knows it.
	pub skills: BTreeMap<String, bool>,
	pub banned: bool,
	pub last_online: DateTime<Utc>,
	/// Hex digest of the API credential, empty until the user sets one.
	#[serde(skip_serializing, default)]
	pub credential_digest: String,
	/// Titles of projects this user created.
	pub projects: Vec<String>,
	pub projects_applied_to: Vec<String>,
	/// Broadcast/admin inbox.
	pub messages: Vec<Message>,
	/// Peer username -> dialog state.
	pub dialogs: BTreeMap<String, Dialog>,
}

impl User {
	/// Creates a user the way first-time OAuth provisioning does: profile
	/// fields copied from the provider (absent ones stay `None`) and the
	/// skill map seeded all-false from [`TECHNOLOGIES`].
	pub fn new(
		username: impl Into<String>,
		email: Option<String>,
		country: Option<String>,
		bio: Option<String>,
	) -> Self {
		let username = username.into();

		Self {
			github_link: format!("https://github.com/{username}"),
			username,
			email,
			country,
			bio,
			skills: TECHNOLOGIES
				.iter()
				.map(|tech| ((*tech).to_string(), false))
				.collect(),
			banned: false,
			last_online: Utc::now(),
			credential_digest: String::new(),
			projects: Vec::new(),
			projects_applied_to: Vec::new(),
			messages: Vec::new(),
			dialogs: BTreeMap::new(),
		}
	}

	/// Total number of unread direct messages across all dialogs.
	pub fn unread_messages(&self) -> u32 {
		self.dialogs.values().map(|dialog| dialog.unread).sum()
	}
}

/// A collaborative project listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
	/// Unique key among projects.
	pub title: String,
	pub description: String,
	pub github_project_link: String,
	pub author: String,
	/// Technology tags the project is looking for.
	pub requirements: Vec<String>,
	/// Usernames that applied to join.
	pub applied: Vec<String>,
	pub comments: Vec<Comment>,
	pub created_at: DateTime<Utc>,
}

impl Project {
	pub fn new(
		title: impl Into<String>,
		description: impl Into<String>,
		github_project_link: impl Into<String>,
		author: impl Into<String>,
		requirements: Vec<String>,
	) -> Self {
		Self {
			title: title.into(),
			description: description.into(),
			github_project_link: github_project_link.into(),
			author: author.into(),
			requirements,
			applied: Vec::new(),
			comments: Vec::new(),
			created_at: Utc::now(),
		}
	}
}

/// A forum post with threaded comments and a view set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumPost {
	pub key: Uuid,
	pub author: String,
	pub title: String,
	pub content: String,
	/// Usernames that have opened the post.
	pub views: BTreeSet<String>,
	pub comments: Vec<Comment>,
	pub created_at: DateTime<Utc>,
}

impl ForumPost {
	pub fn new(
		author: impl Into<String>,
		title: impl Into<String>,
		content: impl Into<String>,
	) -> Self {
		Self {
			key: Uuid::new_v4(),
			author: author.into(),
			title: title.into(),
			content: content.into(),
			views: BTreeSet::new(),
			comments: Vec::new(),
			created_at: Utc::now(),
		}
	}
}

/// A comment on a forum post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
	pub key: Uuid,
	pub author: String,
	pub text: String,
	/// Set once the author edits the comment.
	pub edited: bool,
	pub created_at: DateTime<Utc>,
}

impl Comment {
	pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			key: Uuid::new_v4(),
			author: author.into(),
			text: text.into(),
			edited: false,
			created_at: Utc::now(),
		}
	}
}
