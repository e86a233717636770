//! AI draft generation with model fallback and JSON recovery.
//!
//! Upstream model availability shifts frequently, so a short fixed fallback
//! chain of model identifiers is tried strictly in order. A "model not
//! found" answer advances to the next identifier; any other failure (quota,
//! auth, transport) aborts the whole sequence, so real failures are never
//! masked by retries across irrelevant model names.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::ApiError;

/// Model identifiers tried in order until one succeeds.
pub const MODEL_FALLBACK: [&str; 4] = [
    "gemini-1.5-flash",
    "gemini-flash-latest",
    "gemini-1.5-pro",
    "gemini-pro-latest",
];

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// The structured blog-post proposal. Ephemeral: produced per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftResult {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Outcome classes for one model attempt. Only `ModelNotFound` lets the
/// fallback loop advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    ModelNotFound(String),
    Failed(String),
}

/// One raw generation call against an upstream model API. Separated behind a
/// trait so the fallback policy can be exercised against scripted fakes.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    /// Fails fast before any model is tried (e.g. missing credential).
    fn ready(&self) -> Result<(), ApiError> {
        Ok(())
    }

    /// Returns the raw generated text for one model identifier.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;
}

pub type DynGenerationApi = Arc<dyn GenerationApi>;

/// Google Gemini `generateContent`, asking for a strict JSON response body.
pub struct GeminiApi {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl GeminiApi {
    pub fn new(settings: &Settings) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsdesk/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: settings.gemini_api_key.clone(),
        }
    }
}

#[async_trait]
impl GenerationApi for GeminiApi {
    fn ready(&self) -> Result<(), ApiError> {
        if self.api_key.is_none() {
            return Err(ApiError::Configuration(
                "Gemini API 키가 설정되지 않았습니다. .env 파일을 확인해 주세요.".to_string(),
            ));
        }
        Ok(())
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().unwrap_or_default().trim().to_string();
        let url = format!("{GEMINI_BASE_URL}/{model}:generateContent");

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "response_mime_type": "application/json" }
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = upstream_error_message(response).await;
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(GenerationError::ModelNotFound(message));
            }
            return Err(GenerationError::Failed(message));
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Content,
        }
        #[derive(Deserialize)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }
        #[derive(Deserialize)]
        struct Part {
            #[serde(default)]
            text: String,
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| GenerationError::Failed("empty generation response".to_string()))
    }
}

/// Prefer the upstream-supplied error message over a generic status line.
async fn upstream_error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let fallback = format!("upstream answered status {status}");
    let Ok(body) = response.json::<serde_json::Value>().await else {
        return fallback;
    };
    body.pointer("/error/message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or(fallback)
}

/// Tries the fallback sequence and repairs imperfect JSON payloads.
#[derive(Clone)]
pub struct DraftGenerator {
    api: DynGenerationApi,
    models: Vec<String>,
}

impl DraftGenerator {
    pub fn new(api: DynGenerationApi) -> Self {
        Self {
            api,
            models: MODEL_FALLBACK.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Override the fallback sequence (used by tests).
    pub fn with_models(api: DynGenerationApi, models: &[&str]) -> Self {
        Self {
            api,
            models: models.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub async fn generate(&self, title: &str, description: &str) -> Result<DraftResult, ApiError> {
        self.api.ready()?;

        let clean_title = strip_html(if title.is_empty() { "제목 없음" } else { title });
        let clean_desc = strip_html(if description.is_empty() { "설명 없음" } else { description });
        let prompt = render_prompt(&clean_title, &clean_desc);

        let mut last_error: Option<String> = None;
        for model in &self.models {
            info!(%model, "generating draft");
            match self.api.generate(model, &prompt).await {
                Ok(text) => match parse_draft(&text) {
                    Ok(draft) => {
                        info!(%model, "draft generated");
                        return Ok(draft);
                    }
                    Err(parse_err) => {
                        // Parse failure is not a "not found", so it does not
                        // advance to the next identifier.
                        warn!(%model, error = %parse_err, "could not parse generated draft");
                        last_error = Some(parse_err);
                        break;
                    }
                },
                Err(GenerationError::ModelNotFound(message)) => {
                    warn!(%model, "model not found, trying next");
                    last_error = Some(message);
                }
                Err(GenerationError::Failed(message)) => {
                    warn!(%model, error = %message, "generation failed, aborting sequence");
                    last_error = Some(message);
                    break;
                }
            }
        }

        Err(ApiError::DraftGenerationFailed(
            last_error.unwrap_or_else(|| "no model produced a draft".to_string()),
        ))
    }
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));
static JSON_SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("span regex"));

/// Best-effort sanitation: drop any `<...>` span, decode HTML entities.
/// Not a full HTML parser.
pub fn strip_html(input: &str) -> String {
    let stripped = TAG_RE.replace_all(input, "");
    html_escape::decode_html_entities(stripped.as_ref())
        .trim()
        .to_string()
}

fn render_prompt(title: &str, description: &str) -> String {
    format!(
        r#"아래 뉴스 기사 정보를 참고하여, 사람 냄새가 나는 블로그 포스팅 초안을 작성해줘.
단순 기사 요약이 아니라, 블로그 독자가 이해하기 쉽게 풀어서 설명하는 방식으로 작성해줘.

[뉴스 정보]
- 제목: {title}
- 요약: {description}

[작성 원칙]
- 원문 기사 문장을 그대로 복사하지 말고, 반드시 새롭게 재구성할 것
- AI가 쓴 글처럼 보이지 않도록 자연스러운 문장으로 작성
- 광고·과장 표현은 사용하지 말 것
- 사실이 불확실한 내용은 단정적으로 표현하지 말 것

[본문 작성 가이드]
1. 블로그 제목
- 검색과 클릭을 고려한 자연스러운 제목
- 25자 내외 권장

2. 서론
- 뉴스의 핵심 이슈를 일상적인 말투로 간단히 소개
- 독자의 관심을 끄는 질문 또는 상황 제시

3. 본론 (3가지 포인트)
- 각 포인트마다 소제목 사용
- 소제목은 핵심 내용을 한눈에 알 수 있게 작성
- 뉴스 내용을 블로그 독자 기준으로 쉽게 설명

4. 결론
- 핵심 요약
- 앞으로의 전망 또는 독자에게 도움이 되는 한 줄 정리

[말투 및 형식]
- 말투: 친절하고 정중한 '~해요' 체
- 문단은 너무 길지 않게 2~3줄 단위로 구성
- 마크다운 사용 가능 (소제목, 강조, 목록 등)

[출력 규칙 – 매우 중요]
- 반드시 아래 JSON 형식으로만 출력
- 코드 블록(```) 사용 금지
- JSON 외의 텍스트 절대 출력 금지
- 줄바꿈, 따옴표 깨짐 없이 올바른 JSON 형태 유지

{{
"title": "추천 블로그 제목",
"content": "블로그 본문 내용 (마크다운 사용)",
"tags": ["핵심키워드", "뉴스주제", "이슈", "관련어", "트렌드"]
}}"#
    )
}

/// Two-stage parse: strict first, then the first brace span pulled out of
/// surrounding prose or code-fence markers. No further heuristics beyond
/// these two stages.
pub fn parse_draft(text: &str) -> Result<DraftResult, String> {
    match serde_json::from_str::<DraftResult>(text.trim()) {
        Ok(draft) => Ok(draft),
        Err(strict_err) => {
            let Some(span) = JSON_SPAN_RE.find(text) else {
                return Err(strict_err.to_string());
            };
            serde_json::from_str::<DraftResult>(span.as_str()).map_err(|e| e.to_string())
        }
    }
}
