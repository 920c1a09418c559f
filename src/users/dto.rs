use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::users::repo_types::{Role, User};

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// User as returned by the users endpoints; never carries the hash.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserView>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedUserResponse {
    pub message: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct DeletedUserResponse {
    pub message: String,
    pub id: i32,
}
