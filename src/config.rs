use std::{fmt, path::PathBuf, time::Duration};

use anyhow::Context;

/// Signing secret used when `JWT_SECRET` is not set. Never acceptable outside development.
pub const FALLBACK_JWT_SECRET: &str = "catalog-api-insecure-development-secret";

const DEFAULT_PRODUCTION_BASE_URL: &str = "https://ecommerce-serv.onrender.com";
const DEFAULT_PLACEHOLDER: &str = "/images/placeholder.jpg";
const DEFAULT_UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "production" || v == "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub secret_is_fallback: bool,
    pub ttl: Duration,
}

// Keeps the secret out of logs.
impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("secret_is_fallback", &self.secret_is_fallback)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub environment: Environment,
    pub production_base_url: String,
    pub development_base_url: String,
    pub placeholder: String,
}

#[derive(Clone)]
pub enum StorageConfig {
    Local {
        upload_dir: PathBuf,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        region: String,
    },
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageConfig::Local { upload_dir } => f
                .debug_struct("Local")
                .field("upload_dir", upload_dir)
                .finish(),
            StorageConfig::S3 {
                endpoint,
                bucket,
                region,
                ..
            } => f
                .debug_struct("S3")
                .field("endpoint", endpoint)
                .field("bucket", bucket)
                .field("region", region)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub images: ImageConfig,
    pub storage: StorageConfig,
    pub upload_max_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match get("APP_PORT") {
            Some(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            None => 8080,
        };
        let environment = Environment::parse(get("APP_ENV").as_deref());

        let (secret, secret_is_fallback) = match get("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(s) => (s, false),
            None => (FALLBACK_JWT_SECRET.to_string(), true),
        };
        let ttl = match get("JWT_EXPIRES_IN") {
            Some(v) => parse_ttl(&v)?,
            None => Duration::from_secs(24 * 60 * 60),
        };
        let jwt = JwtConfig {
            secret,
            secret_is_fallback,
            ttl,
        };

        let images = ImageConfig {
            environment,
            production_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PRODUCTION_BASE_URL.into()),
            development_base_url: get("DEV_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            placeholder: get("IMAGE_PLACEHOLDER").unwrap_or_else(|| DEFAULT_PLACEHOLDER.into()),
        };

        let storage = match get("STORAGE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("local") => StorageConfig::Local {
                upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".into())),
            },
            Some("s3") => StorageConfig::S3 {
                endpoint: get("S3_ENDPOINT").context("S3_ENDPOINT must be set for s3 storage")?,
                bucket: get("S3_BUCKET").context("S3_BUCKET must be set for s3 storage")?,
                access_key: get("S3_ACCESS_KEY")
                    .context("S3_ACCESS_KEY must be set for s3 storage")?,
                secret_key: get("S3_SECRET_KEY")
                    .context("S3_SECRET_KEY must be set for s3 storage")?,
                region: get("S3_REGION").unwrap_or_else(|| "us-east-1".into()),
            },
            Some(other) => anyhow::bail!("unknown STORAGE_BACKEND {:?}", other),
        };

        let upload_max_bytes = match get("UPLOAD_MAX_BYTES") {
            Some(v) => v
                .parse::<usize>()
                .context("UPLOAD_MAX_BYTES must be a byte count")?,
            None => DEFAULT_UPLOAD_MAX_BYTES,
        };

        Ok(Self {
            database_url,
            host,
            port,
            environment,
            jwt,
            images,
            storage,
            upload_max_bytes,
        })
    }
}

const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Parses token lifetimes such as `3600`, `45s`, `30m`, `24h` or `7d`.
pub fn parse_ttl(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid token lifetime {:?}", raw))?;
    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => anyhow::bail!("invalid token lifetime unit in {:?}", raw),
    };
    anyhow::ensure!(value > 0, "token lifetime must be positive");
    let secs = value
        .checked_mul(multiplier)
        .filter(|s| *s <= MAX_TTL_SECS)
        .with_context(|| format!("token lifetime {:?} exceeds 365 days", raw))?;
    Ok(Duration::from_secs(secs))
}
