//! Document-store persistence contract.
//!
//! The platform consumes storage through these find/save/delete traits;
//! the shipped backend is the in-memory [`MemoryStore`]. Writes are
//! last-write-wins with no optimistic-concurrency tokens, an accepted
//! limitation of the original design.

mod memory;

use std::sync::Arc;

use uuid::Uuid;

use crate::model::{ForumPost, Project, User};

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("store unavailable: {0}")]
	Unavailable(String),
}

#[axum::async_trait]
pub trait UserStore: Send + Sync {
	async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
	async fn find_all(&self) -> Result<Vec<User>, StoreError>;
	/// Inserts or replaces the record keyed by `user.username`.
	async fn save(&self, user: User) -> Result<(), StoreError>;
	async fn delete(&self, username: &str) -> Result<(), StoreError>;
}

#[axum::async_trait]
pub trait ProjectStore: Send + Sync {
	async fn find_by_title(&self, title: &str) -> Result<Option<Project>, StoreError>;
	/// All projects in insertion order, oldest first.
	async fn find_all(&self) -> Result<Vec<Project>, StoreError>;
	async fn save(&self, project: Project) -> Result<(), StoreError>;
	async fn delete(&self, title: &str) -> Result<(), StoreError>;
}

#[axum::async_trait]
pub trait ForumStore: Send + Sync {
	async fn find_by_key(&self, key: Uuid) -> Result<Option<ForumPost>, StoreError>;
	/// All posts in insertion order, oldest first.
	async fn find_all(&self) -> Result<Vec<ForumPost>, StoreError>;
	async fn save(&self, post: ForumPost) -> Result<(), StoreError>;
	async fn delete(&self, key: Uuid) -> Result<(), StoreError>;
}

/// Browser-session records: an opaque id mapped to a username.
#[axum::async_trait]
pub trait SessionStore: Send + Sync {
	async fn create(&self, username: &str) -> Result<Uuid, StoreError>;
	async fn find(&self, id: Uuid) -> Result<Option<String>, StoreError>;
	async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// The set of collections the handlers work against, cloneable into the
/// shared application state.
#[derive(Clone)]
pub struct Store {
	pub users: Arc<dyn UserStore>,
	pub projects: Arc<dyn ProjectStore>,
	pub forum: Arc<dyn ForumStore>,
	pub sessions: Arc<dyn SessionStore>,
}

impl Store {
	/// Wires every collection to a single in-memory backend.
	pub fn in_memory() -> Self {
		Self::from_memory(Arc::new(MemoryStore::default()))
	}

	pub fn from_memory(memory: Arc<MemoryStore>) -> Self {
		Self {
			users: memory.clone(),
			projects: memory.clone(),
			forum: memory.clone(),
			sessions: memory,
		}
	}
}
