use async_trait::async_trait;
use std::sync::RwLock;
use time::OffsetDateTime;

use crate::users::{
    repo::{StoreError, UserRepository},
    repo_types::{NewUser, User, UserUpdate},
};

/// In-process user store for tests; mirrors the Postgres constraints.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users.iter().rev().cloned().collect())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i32, changes: UserUpdate) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().unwrap();
        if let Some(email) = &changes.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut users = self.users.write().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "someone".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn ids_are_max_plus_one() {
        let repo = MemoryUserRepository::new();
        let a = repo.create(new_user("a@example.com")).await.unwrap();
        let b = repo.create(new_user("b@example.com")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(repo.delete(b.id).await.unwrap());
        let c = repo.create(new_user("c@example.com")).await.unwrap();
        assert_eq!(c.id, 2);
    }

    #[tokio::test]
    async fn update_rejects_taken_email() {
        let repo = MemoryUserRepository::new();
        repo.create(new_user("a@example.com")).await.unwrap();
        let b = repo.create(new_user("b@example.com")).await.unwrap();
        let err = repo
            .update(
                b.id,
                UserUpdate {
                    email: Some("a@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }
}
