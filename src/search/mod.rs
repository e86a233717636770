//! Provider resolution and result normalization.
//!
//! Different upstream search APIs disagree on request shape, item envelope
//! depth, and field names. A `ProviderConfig` describes one upstream; the
//! normalizer maps whatever comes back into the canonical
//! `{title, link, description, pubDate}` record. Absent fields default
//! silently — a malformed upstream item should degrade, not abort the batch.

mod path;

pub use path::resolve_path;

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;
use crate::error::ApiError;

const NAVER_NEWS_URL: &str = "https://openapi.naver.com/v1/search/news.json";

/// Upstream fetch size for the builtin provider; the response is truncated
/// to the caller's requested count after exclusion filtering.
const BUILTIN_FETCH_COUNT: u32 = 50;

pub const DEFAULT_DISPLAY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// The fixed Naver news provider. Exactly one config carries this kind.
    #[serde(alias = "naver")]
    Builtin,
    Custom,
}

impl Default for ProviderKind {
    fn default() -> Self {
        ProviderKind::Custom
    }
}

/// One search source, either the builtin Naver provider or a user-registered
/// public API endpoint with its field mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ProviderKind,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub service_key: String,
    #[serde(default)]
    pub keyword_param: Option<String>,
    /// Dot-separated path locating the item array in the upstream response.
    #[serde(default)]
    pub item_path: Option<String>,
    #[serde(default)]
    pub map_title: Option<String>,
    #[serde(default)]
    pub map_link: Option<String>,
    #[serde(default)]
    pub map_desc: Option<String>,
    #[serde(default)]
    pub map_date: Option<String>,
    /// Merged into every request to this provider.
    #[serde(default)]
    pub extra_params: HashMap<String, Value>,
}

impl ProviderConfig {
    /// The seed entry written to an empty config store.
    pub fn builtin_seed() -> Self {
        Self {
            id: "naver".to_string(),
            name: "네이버 뉴스 (기본)".to_string(),
            kind: ProviderKind::Builtin,
            ..Default::default()
        }
    }

    pub fn keyword_param(&self) -> &str {
        non_empty_or(&self.keyword_param, "keyword")
    }
    pub fn map_title(&self) -> &str {
        non_empty_or(&self.map_title, "title")
    }
    pub fn map_link(&self) -> &str {
        non_empty_or(&self.map_link, "link")
    }
    pub fn map_desc(&self) -> &str {
        non_empty_or(&self.map_desc, "description")
    }
    pub fn map_date(&self) -> &str {
        non_empty_or(&self.map_date, "pubDate")
    }
}

fn non_empty_or<'a>(opt: &'a Option<String>, default: &'a str) -> &'a str {
    match opt.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => default,
    }
}

/// The normalized article record all providers map into. `link` is the
/// identity key for exclusion and collection membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "pubDate", default)]
    pub pub_date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(rename = "sourceId")]
    pub source_id: Option<String>,
    #[serde(default)]
    pub query: String,
    pub sort: Option<String>,
    pub display: Option<usize>,
}

/// Look up a provider by id, falling back to the builtin entry. Only an
/// empty store (builtin entry deleted) is a configuration error.
pub fn resolve_source<'a>(
    configs: &'a [ProviderConfig],
    source_id: Option<&str>,
) -> Result<&'a ProviderConfig, ApiError> {
    source_id
        .and_then(|id| configs.iter().find(|c| c.id == id))
        .or_else(|| configs.iter().find(|c| c.kind == ProviderKind::Builtin))
        .ok_or_else(|| {
            ApiError::Configuration("builtin search provider is missing from the config store".to_string())
        })
}

/// Map the located upstream items into canonical articles.
///
/// A non-array item sequence normalizes to the empty sequence. An item
/// missing a mapped field yields "" for text fields, the "#" sentinel for
/// `link` (it must never be empty, being the identity key), and the current
/// timestamp for `pubDate`.
pub fn normalize_items(config: &ProviderConfig, body: &Value) -> Vec<CanonicalArticle> {
    let located = match &config.item_path {
        Some(p) if !p.is_empty() => resolve_path(body, p),
        _ => Some(body),
    };
    let Some(items) = located.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| CanonicalArticle {
            title: field_string(item, config.map_title()).unwrap_or_default(),
            link: field_string(item, config.map_link()).unwrap_or_else(|| "#".to_string()),
            description: field_string(item, config.map_desc()).unwrap_or_default(),
            pub_date: field_string(item, config.map_date())
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
        })
        .collect()
}

fn field_string(item: &Value, field: &str) -> Option<String> {
    match item.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub fn filter_excluded(
    items: Vec<CanonicalArticle>,
    excluded: &[String],
) -> Vec<CanonicalArticle> {
    items
        .into_iter()
        .filter(|item| !excluded.iter().any(|l| l == &item.link))
        .collect()
}

/// Issues upstream search calls and normalizes their responses.
#[derive(Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    naver_credentials: Option<(String, String)>,
}

impl SearchClient {
    pub fn new(settings: &Settings) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsdesk/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            http,
            naver_credentials: settings.naver_credentials(),
        }
    }

    /// Resolve, fetch, normalize, filter. Never partially succeeds: any
    /// transport or parse failure surfaces as one `SearchFailed`.
    pub async fn search(
        &self,
        configs: &[ProviderConfig],
        excluded: &[String],
        params: &SearchParams,
    ) -> Result<Vec<CanonicalArticle>, ApiError> {
        let config = resolve_source(configs, params.source_id.as_deref())?;
        let display = params.display.unwrap_or(DEFAULT_DISPLAY);

        let items = match config.kind {
            ProviderKind::Builtin => {
                let items = self
                    .fetch_builtin(&params.query, params.sort.as_deref())
                    .await?;
                let mut filtered = filter_excluded(items, excluded);
                filtered.truncate(display);
                filtered
            }
            ProviderKind::Custom => {
                let items = self.fetch_custom(config, &params.query, display).await?;
                filter_excluded(items, excluded)
            }
        };
        Ok(items)
    }

    async fn fetch_builtin(
        &self,
        query: &str,
        sort: Option<&str>,
    ) -> Result<Vec<CanonicalArticle>, ApiError> {
        let (client_id, client_secret) = self.naver_credentials.clone().ok_or_else(|| {
            ApiError::Configuration("Naver API keys are not configured in .env file".to_string())
        })?;

        #[derive(Deserialize)]
        struct NaverResponse {
            #[serde(default)]
            items: Vec<CanonicalArticle>,
        }

        let display = BUILTIN_FETCH_COUNT.to_string();
        let response = self
            .http
            .get(NAVER_NEWS_URL)
            .query(&[
                ("query", query),
                ("display", display.as_str()),
                ("start", "1"),
                ("sort", sort.unwrap_or("sim")),
            ])
            .header("X-Naver-Client-Id", client_id)
            .header("X-Naver-Client-Secret", client_secret)
            .send()
            .await
            .map_err(|e| ApiError::SearchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::SearchFailed(format!(
                "upstream answered status {status}"
            )));
        }
        let body: NaverResponse = response
            .json()
            .await
            .map_err(|e| ApiError::SearchFailed(e.to_string()))?;
        Ok(body.items)
    }

    async fn fetch_custom(
        &self,
        config: &ProviderConfig,
        query: &str,
        display: usize,
    ) -> Result<Vec<CanonicalArticle>, ApiError> {
        let mut params: Vec<(String, String)> = vec![
            (config.keyword_param().to_string(), query.to_string()),
            ("serviceKey".to_string(), config.service_key.clone()),
            // Common output-format marker for data.go.kr style APIs.
            ("_type".to_string(), "json".to_string()),
            ("numOfRows".to_string(), display.to_string()),
        ];
        for (k, v) in &config.extra_params {
            let rendered = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            params.push((k.clone(), rendered));
        }

        let response = self
            .http
            .get(&config.url)
            .query(&params)
            .send()
            .await
            .map_err(|e| ApiError::SearchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::SearchFailed(format!(
                "upstream answered status {status}"
            )));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::SearchFailed(e.to_string()))?;
        Ok(normalize_items(config, &body))
    }
}
