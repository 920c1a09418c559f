use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, validate_password, MIN_PASSWORD_LEN},
    },
    error::AppError,
    users::{
        repo::UserRepository,
        repo_types::{NewUser, Role},
    },
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns the trimmed value, or `None` if missing or blank.
pub(crate) fn required(field: Option<String>) -> Option<String> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn check_email(email: &str) -> Result<(), AppError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        warn!(email = %email, "invalid email");
        Err(AppError::validation("Invalid email"))
    }
}

pub(crate) fn check_password_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub async fn register(
    users: &dyn UserRepository,
    keys: &JwtKeys,
    payload: RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let (Some(username), Some(email), Some(password)) = (
        required(payload.username),
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation("username, email and password are required"));
    };
    let email = normalize_email(&email);
    check_email(&email)?;
    check_password_strength(&password)?;

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&password)?;
    let user = users
        .create(NewUser {
            username,
            email,
            password_hash,
            role: Role::User,
        })
        .await?;

    let token = keys.sign(user.id, user.role)?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        message: "User registered successfully".into(),
        user: PublicUser::from(&user),
        token,
    })
}

pub async fn login(
    users: &dyn UserRepository,
    keys: &JwtKeys,
    payload: LoginRequest,
) -> Result<AuthResponse, AppError> {
    let (Some(email), Some(password)) = (
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::validation("email and password are required"));
    };
    let email = normalize_email(&email);

    let Some(user) = users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !validate_password(&user, &password)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign(user.id, user.role)?;
    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(AuthResponse {
        message: "Login successful".into(),
        user: PublicUser::from(&user),
        token,
    })
}
