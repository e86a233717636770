//! Tistory publishing boundary.
//!
//! Tistory expects HTML, so the draft's markdown-ish content goes through a
//! small fixed set of substitutions before the write call. Posts default to
//! private visibility.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::config::Settings;
use crate::draft::DraftResult;
use crate::error::ApiError;

const TISTORY_WRITE_URL: &str = "https://www.tistory.com/apis/post/write";

static H2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"## (.*)").expect("h2 regex"));
static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"# (.*)").expect("h1 regex"));

/// Heading markers, paragraph breaks, line breaks. Nothing more.
pub fn markdown_to_html(content: &str) -> String {
    let content = H2_RE.replace_all(content, "<h2>$1</h2>");
    let content = H1_RE.replace_all(&content, "<h1>$1</h1>");
    content.replace("\n\n", "<p></p>").replace('\n', "<br>")
}

#[derive(Clone)]
pub struct TistoryPublisher {
    http: reqwest::Client,
    access_token: Option<String>,
    blog_name: Option<String>,
}

impl TistoryPublisher {
    pub fn new(settings: &Settings) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsdesk/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            http,
            access_token: settings.tistory_access_token.clone(),
            blog_name: settings.tistory_blog_name.clone(),
        }
    }

    /// Publish a draft as a private post; returns the post URL.
    pub async fn publish(&self, draft: &DraftResult) -> Result<String, ApiError> {
        let (access_token, blog_name) = match (&self.access_token, &self.blog_name) {
            (Some(t), Some(b)) => (t.clone(), b.clone()),
            _ => {
                return Err(ApiError::Configuration(
                    "Tistory API 설정(Access Token, Blog Name)이 .env 파일에 없습니다.".to_string(),
                ))
            }
        };

        let html_content = markdown_to_html(&draft.content);
        let params = [
            ("access_token", access_token),
            ("output", "json".to_string()),
            ("blogName", blog_name),
            ("title", draft.title.clone()),
            ("content", html_content),
            // 0 = private, the safe default.
            ("visibility", "0".to_string()),
            ("category", "0".to_string()),
            ("tag", draft.tags.join(",")),
        ];

        #[derive(Deserialize)]
        struct TistoryEnvelope {
            tistory: TistoryBody,
        }
        #[derive(Deserialize)]
        struct TistoryBody {
            status: String,
            url: Option<String>,
            error_message: Option<String>,
        }

        let response = self
            .http
            .post(TISTORY_WRITE_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| ApiError::Publish(e.to_string()))?;

        let body: TistoryEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::Publish(e.to_string()))?;

        if body.tistory.status == "200" {
            Ok(body.tistory.url.unwrap_or_default())
        } else {
            Err(ApiError::Publish(
                body.tistory
                    .error_message
                    .unwrap_or_else(|| "Tistory API 응답 오류".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_headings_paragraphs_and_breaks() {
        let md = "# 제목\n\n## 소제목\n본문 첫 줄\n둘째 줄";
        let html = markdown_to_html(md);
        assert!(html.contains("<h1>제목</h1>"));
        assert!(html.contains("<h2>소제목</h2>"));
        assert!(html.contains("<p></p>"));
        assert!(html.contains("본문 첫 줄<br>둘째 줄"));
    }

    #[test]
    fn h2_wins_over_h1_on_double_hash() {
        let html = markdown_to_html("## 포인트");
        assert_eq!(html, "<h2>포인트</h2>");
    }
}
