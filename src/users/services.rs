use tracing::{info, warn};

use crate::{
    auth::{
        extractors::AuthContext,
        password::hash_password,
        services::{check_email, check_password_strength, normalize_email, required},
    },
    error::AppError,
    users::{
        dto::UpdateUserRequest,
        repo::UserRepository,
        repo_types::{Role, User, UserUpdate},
    },
};

pub async fn get_user(
    users: &dyn UserRepository,
    ctx: &AuthContext,
    id: i32,
) -> Result<User, AppError> {
    ctx.require_owner_or_role(id, Role::Admin)?;
    users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Applies a partial profile update. Only admins may change roles.
pub async fn update_user(
    users: &dyn UserRepository,
    ctx: &AuthContext,
    id: i32,
    req: UpdateUserRequest,
) -> Result<User, AppError> {
    ctx.require_owner_or_role(id, Role::Admin)?;
    if req.role.is_some() {
        ctx.require_role(Role::Admin)?;
    }

    let mut changes = UserUpdate {
        username: required(req.username),
        role: req.role,
        ..Default::default()
    };
    if let Some(email) = required(req.email) {
        let email = normalize_email(&email);
        check_email(&email)?;
        if let Some(existing) = users.find_by_email(&email).await? {
            if existing.id != id {
                warn!(email = %email, "email already registered");
                return Err(AppError::Conflict("Email already registered".into()));
            }
        }
        changes.email = Some(email);
    }
    if let Some(password) = req.password.filter(|p| !p.is_empty()) {
        check_password_strength(&password)?;
        changes.password_hash = Some(hash_password(&password)?);
    }
    if changes.is_empty() {
        return Err(AppError::validation("nothing to update"));
    }

    let user = users
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!(user_id = user.id, by = ctx.user_id, "user updated");
    Ok(user)
}

pub async fn delete_user(users: &dyn UserRepository, id: i32) -> Result<(), AppError> {
    if !users.delete(id).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!(user_id = id, "user deleted");
    Ok(())
}
