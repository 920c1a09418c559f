use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::{debug, warn};

use crate::{auth::jwt::JwtKeys, error::AppError, users::repo_types::Role};

/// Authenticated identity attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i32,
    pub role: Role,
}

impl AuthContext {
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            warn!(user_id = self.user_id, required = role.as_str(), "role check failed");
            Err(AppError::forbidden(format!("{} role required", role.as_str())))
        }
    }

    /// Passes when the caller owns the resource or holds `role`.
    pub fn require_owner_or_role(&self, owner_id: i32, role: Role) -> Result<(), AppError> {
        if self.role == role || self.user_id == owner_id {
            Ok(())
        } else {
            warn!(user_id = self.user_id, owner_id, "ownership check failed");
            Err(AppError::forbidden("Not allowed to access this resource"))
        }
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let raw = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingToken)?;

    let (scheme, token) = raw.split_once(' ').ok_or(AppError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::InvalidToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::MissingToken);
    }
    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(*ctx);
        }

        let token = bearer_token(&parts.headers)?;
        let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            AppError::from(e)
        })?;

        let ctx = AuthContext {
            user_id: claims.id,
            role: claims.role,
        };
        debug!(user_id = ctx.user_id, role = ctx.role.as_str(), "request authenticated");
        parts.extensions.insert(ctx);
        Ok(ctx)
    }
}

/// Authenticated caller holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AuthContext::from_request_parts(parts, state).await?;
        ctx.require_role(Role::Admin)?;
        Ok(AdminUser(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::http::Request;
    use std::time::Duration;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "gate-secret".into(),
            secret_is_fallback: false,
            ttl: Duration::from_secs(3600),
        })
    }

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn owner_or_role_gate() {
        let owner = AuthContext { user_id: 5, role: Role::User };
        let stranger = AuthContext { user_id: 7, role: Role::User };
        let admin = AuthContext { user_id: 7, role: Role::Admin };

        assert!(owner.require_owner_or_role(5, Role::Admin).is_ok());
        assert!(matches!(
            stranger.require_owner_or_role(5, Role::Admin),
            Err(AppError::Forbidden(_))
        ));
        assert!(admin.require_owner_or_role(5, Role::Admin).is_ok());
    }

    #[test]
    fn role_gate() {
        let user = AuthContext { user_id: 1, role: Role::User };
        let admin = AuthContext { user_id: 2, role: Role::Admin };
        assert!(matches!(user.require_role(Role::Admin), Err(AppError::Forbidden(_))));
        assert!(admin.require_role(Role::Admin).is_ok());
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(AppError::MissingToken)));

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");

        headers.insert(AUTHORIZATION, "bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc");

        headers.insert(AUTHORIZATION, "Bearer".parse().unwrap());
        assert!(matches!(bearer_token(&headers), Err(AppError::MissingToken)));

        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(matches!(bearer_token(&headers), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn authenticate_attaches_context() {
        let keys = keys();
        let token = keys.sign(9, Role::User).unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {token}")));

        let ctx = AuthContext::from_request_parts(&mut parts, &keys).await.unwrap();
        assert_eq!(ctx, AuthContext { user_id: 9, role: Role::User });
        assert_eq!(parts.extensions.get::<AuthContext>(), Some(&ctx));
    }

    #[tokio::test]
    async fn authenticate_rejects_missing_and_bad_tokens() {
        let keys = keys();

        let mut parts = parts_with(None);
        let err = AuthContext::from_request_parts(&mut parts, &keys).await.unwrap_err();
        assert!(matches!(err, AppError::MissingToken));

        let mut parts = parts_with(Some("Bearer nonsense"));
        let err = AuthContext::from_request_parts(&mut parts, &keys).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn admin_extractor_forbids_users() {
        let keys = keys();
        let token = keys.sign(3, Role::User).unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {token}")));
        let err = AdminUser::from_request_parts(&mut parts, &keys).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let token = keys.sign(4, Role::Admin).unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {token}")));
        let AdminUser(ctx) = AdminUser::from_request_parts(&mut parts, &keys).await.unwrap();
        assert_eq!(ctx.user_id, 4);
    }
}
