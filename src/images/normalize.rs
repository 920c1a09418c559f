//! Turns stored image references into URLs a browser can fetch.

use tracing::trace;

use crate::config::{Environment, ImageConfig};

const UPLOAD_PREFIXES: [&str; 2] = ["/uploads/", "/api/uploads/"];

/// Public path under which uploaded files are served.
pub const UPLOADS_PATH: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct ImageUrls {
    base_url: String,
    placeholder: String,
}

impl ImageUrls {
    pub fn new(base_url: &str, placeholder: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            placeholder: placeholder.to_string(),
        }
    }

    /// Picks the production or development origin.
    pub fn from_config(cfg: &ImageConfig) -> Self {
        let base = match cfg.environment {
            Environment::Production => &cfg.production_base_url,
            Environment::Development => &cfg.development_base_url,
        };
        Self::new(base, &cfg.placeholder)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn normalize(&self, reference: Option<&str>) -> String {
        let reference = match reference.map(str::trim) {
            Some(r) if !r.is_empty() => r,
            _ => {
                trace!("no image reference, using placeholder");
                return self.placeholder.clone();
            }
        };

        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }

        if UPLOAD_PREFIXES.iter().any(|p| reference.starts_with(p)) {
            let file_name = reference.rsplit('/').next().unwrap_or_default();
            return format!("{}{}/{}", self.base_url, UPLOADS_PATH, file_name);
        }

        if reference.starts_with('/') {
            format!("{}{}", self.base_url, reference)
        } else {
            format!("{}/{}", self.base_url, reference)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_config(environment: Environment) -> ImageConfig {
        ImageConfig {
            environment,
            production_base_url: "https://api.shop.example/".into(),
            development_base_url: "http://localhost:3000".into(),
            placeholder: "/images/placeholder.jpg".into(),
        }
    }

    #[test]
    fn absent_or_blank_uses_placeholder() {
        let urls = ImageUrls::from_config(&image_config(Environment::Development));
        assert_eq!(urls.normalize(None), "/images/placeholder.jpg");
        assert_eq!(urls.normalize(Some("")), "/images/placeholder.jpg");
        assert_eq!(urls.normalize(Some("   ")), "/images/placeholder.jpg");
    }

    #[test]
    fn absolute_urls_pass_through() {
        let urls = ImageUrls::from_config(&image_config(Environment::Production));
        assert_eq!(urls.normalize(Some("https://x.com/a.png")), "https://x.com/a.png");
        assert_eq!(urls.normalize(Some("http://cdn.test/b.jpg")), "http://cdn.test/b.jpg");
    }

    #[test]
    fn upload_paths_use_environment_base() {
        let prod = ImageUrls::from_config(&image_config(Environment::Production));
        assert_eq!(
            prod.normalize(Some("/uploads/foo.jpg")),
            "https://api.shop.example/uploads/foo.jpg"
        );
        assert_eq!(
            prod.normalize(Some("/api/uploads/nested/bar.png")),
            "https://api.shop.example/uploads/bar.png"
        );

        let dev = ImageUrls::from_config(&image_config(Environment::Development));
        assert_eq!(
            dev.normalize(Some("/uploads/foo.jpg")),
            "http://localhost:3000/uploads/foo.jpg"
        );
    }

    #[test]
    fn other_relative_paths_get_a_separator() {
        let dev = ImageUrls::from_config(&image_config(Environment::Development));
        assert_eq!(
            dev.normalize(Some("images/cat.png")),
            "http://localhost:3000/images/cat.png"
        );
        assert_eq!(
            dev.normalize(Some("/images/cat.png")),
            "http://localhost:3000/images/cat.png"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let urls = ImageUrls::new("https://a.example///", "/p.jpg");
        assert_eq!(urls.base_url(), "https://a.example");
    }
}
