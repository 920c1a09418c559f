use std::time::Duration;

use anyhow::Context;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig, state::AppState, users::repo_types::Role};

/// Verification outcome exposed to callers. Deliberately coarse.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Holds JWT signing and verification keys with the token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: cfg.ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, user_id: i32, role: Role) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .context("token lifetime out of range")?;
        self.encode_claims(&Claims {
            id: user_id,
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        })
    }

    fn encode_claims(&self, claims: &Claims) -> anyhow::Result<String> {
        let token = encode(&Header::default(), claims, &self.encoding)?;
        debug!(user_id = claims.id, role = claims.role.as_str(), "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        debug!(user_id = data.claims.id, role = data.claims.role.as_str(), "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            secret_is_fallback: false,
            ttl: Duration::from_secs(24 * 60 * 60),
        })
    }

    fn now() -> usize {
        OffsetDateTime::now_utc().unix_timestamp() as usize
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(42, Role::Admin).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.id, 42);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let keys = make_keys("dev-secret");
        let issued = now() - 7200;
        let token = keys
            .encode_claims(&Claims {
                id: 1,
                role: Role::User,
                iat: issued,
                exp: issued + 3600,
            })
            .expect("sign");
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn just_expired_token_has_no_grace_period() {
        let keys = make_keys("dev-secret");
        let token = keys
            .encode_claims(&Claims {
                id: 1,
                role: Role::User,
                iat: now() - 100,
                exp: now() - 5,
            })
            .expect("sign");
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = make_keys("secret-one").sign(1, Role::User).expect("sign");
        assert_eq!(
            make_keys("secret-two").verify(&token).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn garbage_is_invalid() {
        let keys = make_keys("dev-secret");
        assert_eq!(keys.verify("not.a.jwt").unwrap_err(), TokenError::Invalid);
        assert_eq!(keys.verify("").unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(1, Role::User).expect("sign");
        let forged_payload = {
            let other = keys.sign(1, Role::Admin).expect("sign");
            other.split('.').nth(1).unwrap().to_string()
        };
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged_payload;
        let forged = parts.join(".");
        assert_eq!(keys.verify(&forged).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn out_of_range_lifetime_is_an_error_not_a_panic() {
        for secs in [200_000_000_000 * 86_400, u64::MAX] {
            let keys = JwtKeys::from_config(&JwtConfig {
                secret: "dev-secret".into(),
                secret_is_fallback: false,
                ttl: Duration::from_secs(secs),
            });
            let err = keys.sign(1, Role::User).unwrap_err();
            assert!(err.to_string().contains("out of range"));
        }
    }
}
