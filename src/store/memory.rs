use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{ForumPost, Project, User};

use super::{ForumStore, ProjectStore, SessionStore, StoreError, UserStore};

/// In-memory backend for every collection.
///
/// Projects and forum posts keep insertion order in a `Vec`; lookups are
/// linear scans, matching the scale the platform is built for.
#[derive(Default)]
pub struct MemoryStore {
	users: RwLock<HashMap<String, User>>,
	projects: RwLock<Vec<Project>>,
	posts: RwLock<Vec<ForumPost>>,
	sessions: RwLock<HashMap<Uuid, String>>,
	user_saves: AtomicUsize,
}

impl MemoryStore {
	/// Number of user-record writes performed so far. Used by tests to
	/// assert write-volume bounds such as the daily last-seen refresh.
	#[cfg(test)]
	pub fn user_saves(&self) -> usize {
		self.user_saves.load(Ordering::Relaxed)
	}
}

#[axum::async_trait]
impl UserStore for MemoryStore {
	async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
		Ok(self.users.read().await.get(username).cloned())
	}

	async fn find_all(&self) -> Result<Vec<User>, StoreError> {
		let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
		users.sort_by(|a, b| a.username.cmp(&b.username));

		Ok(users)
	}

	async fn save(&self, user: User) -> Result<(), StoreError> {
		self.user_saves.fetch_add(1, Ordering::Relaxed);
		self.users
			.write()
			.await
			.insert(user.username.clone(), user);

		Ok(())
	}

	async fn delete(&self, username: &str) -> Result<(), StoreError> {
		self.users.write().await.remove(username);

		Ok(())
	}
}

#[axum::async_trait]
impl ProjectStore for MemoryStore {
	async fn find_by_title(&self, title: &str) -> Result<Option<Project>, StoreError> {
		Ok(self
			.projects
			.read()
			.await
			.iter()
			.find(|project| project.title == title)
			.cloned())
	}

	async fn find_all(&self) -> Result<Vec<Project>, StoreError> {
		Ok(self.projects.read().await.clone())
	}

	async fn save(&self, project: Project) -> Result<(), StoreError> {
		let mut projects = self.projects.write().await;

		// Replace in place to preserve insertion order.
		match projects.iter_mut().find(|p| p.title == project.title) {
			Some(slot) => *slot = project,
			None => projects.push(project),
		}

		Ok(())
	}

	async fn delete(&self, title: &str) -> Result<(), StoreError> {
		self.projects
			.write()
			.await
			.retain(|project| project.title != title);

		Ok(())
	}
}

#[axum::async_trait]
impl ForumStore for MemoryStore {
	async fn find_by_key(&self, key: Uuid) -> Result<Option<ForumPost>, StoreError> {
		Ok(self
			.posts
			.read()
			.await
			.iter()
			.find(|post| post.key == key)
			.cloned())
	}

	async fn find_all(&self) -> Result<Vec<ForumPost>, StoreError> {
		Ok(self.posts.read().await.clone())
	}

	async fn save(&self, post: ForumPost) -> Result<(), StoreError> {
		let mut posts = self.posts.write().await;

		match posts.iter_mut().find(|p| p.key == post.key) {
			Some(slot) => *slot = post,
			None => posts.push(post),
		}

		Ok(())
	}

	async fn delete(&self, key: Uuid) -> Result<(), StoreError> {
		self.posts.write().await.retain(|post| post.key != key);

		Ok(())
	}
}

#[axum::async_trait]
impl SessionStore for MemoryStore {
	async fn create(&self, username: &str) -> Result<Uuid, StoreError> {
		let id = Uuid::new_v4();

		self.sessions
			.write()
			.await
			.insert(id, username.to_string());

		Ok(id)
	}

	async fn find(&self, id: Uuid) -> Result<Option<String>, StoreError> {
		Ok(self.sessions.read().await.get(&id).cloned())
	}

	async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
		self.sessions.write().await.remove(&id);

		Ok(())
	}
}
