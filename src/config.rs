//! Environment-driven settings.
//!
//! All credentials come from the environment (`.env` is loaded in `main`).
//! Nothing here is fatal at boot: a missing key only fails the endpoint that
//! needs it, at call time.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    /// Directory holding the three JSON store files.
    pub data_dir: PathBuf,
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,
    pub gemini_api_key: Option<String>,
    pub tistory_access_token: Option<String>,
    pub tistory_blog_name: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            data_dir: env_var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            naver_client_id: env_var("NAVER_CLIENT_ID"),
            naver_client_secret: env_var("NAVER_CLIENT_SECRET"),
            gemini_api_key: env_var("GEMINI_API_KEY"),
            tistory_access_token: env_var("TISTORY_ACCESS_TOKEN"),
            tistory_blog_name: env_var("TISTORY_BLOG_NAME"),
        }
    }

    /// Both Naver credentials, or `None` if either is missing or a placeholder.
    pub fn naver_credentials(&self) -> Option<(String, String)> {
        let id = self.naver_client_id.clone()?;
        let secret = self.naver_client_secret.clone()?;
        if id.contains("YOUR_CLIENT_ID") {
            return None;
        }
        Some((id, secret))
    }
}

fn env_var(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}
