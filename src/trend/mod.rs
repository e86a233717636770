//! Naver DataLab pass-through (search trends + shopping insight).
//!
//! These routes exist only to relay the front-end's chart queries to the
//! DataLab APIs with credentials attached and sane default date ranges.
//! Responses stream back to the caller unmodified.

use std::time::Duration;

use chrono::{Months, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::Settings;
use crate::error::ApiError;

const DATALAB_SEARCH_URL: &str = "https://openapi.naver.com/v1/datalab/search";
const DATALAB_SHOPPING_URL: &str = "https://openapi.naver.com/v1/datalab/shopping/categories";

/// Filters shared by all trend queries. Empty strings and empty lists mean
/// "no filter" and are dropped from the upstream body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendFilters {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub time_unit: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub ages: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendRequest {
    pub keyword: String,
    #[serde(flatten)]
    pub filters: TrendFilters,
}

#[derive(Debug, Deserialize)]
pub struct MultiTrendRequest {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub filters: TrendFilters,
}

#[derive(Debug, Deserialize)]
pub struct ShoppingTrendRequest {
    pub category: String,
    #[serde(flatten)]
    pub filters: TrendFilters,
}

#[derive(Clone)]
pub struct TrendClient {
    http: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl TrendClient {
    pub fn new(settings: &Settings) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsdesk/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            credentials: settings.naver_credentials(),
        }
    }

    pub async fn search_trend(&self, request: &MultiTrendRequest) -> Result<Value, ApiError> {
        if request.keywords.is_empty() {
            return Err(ApiError::Configuration("키워드를 입력하세요.".to_string()));
        }
        let groups: Vec<Value> = request
            .keywords
            .iter()
            .map(|k| json!({ "groupName": k, "keywords": [k] }))
            .collect();
        let mut body = base_body(&request.filters);
        body.insert("keywordGroups".to_string(), Value::Array(groups));
        self.post(DATALAB_SEARCH_URL, Value::Object(body)).await
    }

    pub async fn shopping_trend(&self, request: &ShoppingTrendRequest) -> Result<Value, ApiError> {
        let mut body = base_body(&request.filters);
        body.insert("category".to_string(), Value::String(request.category.clone()));
        self.post(DATALAB_SHOPPING_URL, Value::Object(body)).await
    }

    async fn post(&self, url: &str, body: Value) -> Result<Value, ApiError> {
        let (client_id, client_secret) = self.credentials.clone().ok_or_else(|| {
            ApiError::Configuration("Naver API keys are not configured in .env file".to_string())
        })?;

        let response = self
            .http
            .post(url)
            .header("X-Naver-Client-Id", client_id)
            .header("X-Naver-Client-Secret", client_secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::UpstreamTransport(e.to_string()))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| ApiError::UpstreamProtocol(e.to_string()))?;
        if !status.is_success() {
            let message = payload
                .pointer("/errMsg")
                .or_else(|| payload.pointer("/error/message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("upstream answered status {status}"));
            return Err(ApiError::UpstreamProtocol(message));
        }
        Ok(payload)
    }
}

/// Common body fields with derived defaults: a missing date range spans the
/// last year, the time unit defaults to monthly.
fn base_body(filters: &TrendFilters) -> Map<String, Value> {
    let today = Utc::now().date_naive();
    let year_ago = today
        .checked_sub_months(Months::new(12))
        .unwrap_or(today);

    let mut body = Map::new();
    body.insert(
        "startDate".to_string(),
        Value::String(non_empty(&filters.start_date).unwrap_or_else(|| year_ago.to_string())),
    );
    body.insert(
        "endDate".to_string(),
        Value::String(non_empty(&filters.end_date).unwrap_or_else(|| today.to_string())),
    );
    body.insert(
        "timeUnit".to_string(),
        Value::String(non_empty(&filters.time_unit).unwrap_or_else(|| "month".to_string())),
    );
    if let Some(device) = non_empty(&filters.device) {
        body.insert("device".to_string(), Value::String(device));
    }
    if let Some(gender) = non_empty(&filters.gender) {
        body.insert("gender".to_string(), Value::String(gender));
    }
    if !filters.ages.is_empty() {
        body.insert(
            "ages".to_string(),
            Value::Array(filters.ages.iter().cloned().map(Value::String).collect()),
        );
    }
    body
}

fn non_empty(opt: &Option<String>) -> Option<String> {
    opt.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
