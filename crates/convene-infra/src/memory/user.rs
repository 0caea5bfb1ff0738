//! In-memory user repository.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use convene_core::repository::UserRepository;
use convene_types::error::RepositoryError;
use convene_types::user::User;

#[derive(Default)]
struct State {
    next_id: i64,
    users: HashMap<i64, User>,
}

/// Map-backed user store. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn create(&self, platform_id: i64, display_name: &str) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.platform_id == platform_id) {
            return Err(RepositoryError::Conflict(format!(
                "user with platform id {platform_id} already exists"
            )));
        }
        state.next_id += 1;
        let user = User {
            id: state.next_id,
            platform_id,
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> Result<User, RepositoryError> {
        let state = self.state.read().await;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_platform_id(&self, platform_id: i64) -> Result<User, RepositoryError> {
        let state = self.state.read().await;
        state
            .users
            .values()
            .find(|u| u.platform_id == platform_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}
