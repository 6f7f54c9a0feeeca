//! Remote article extraction through a generative-language endpoint.
//!
//! The page (or raw PDF text) is sent with a system instruction and a JSON
//! response schema; the model answers with an [`ArticleRecord`]-shaped JSON
//! document embedded in the response envelope at
//! `candidates[0].content.parts[0].text`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::article::ArticleRecord;
use crate::fetch::{Attempt, FetchConfig, classify_send_error, is_retryable_status, with_backoff};
use crate::preprocess::strip_for_remote;
use crate::sanitize::sanitize_fragment;
use crate::{PaperfoldError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

const EMPTY_RESPONSE: &str = "AI model returned an empty or invalid response.";
const INVALID_JSON: &str = "Received invalid JSON from the API.";

const ARTICLE_INSTRUCTION: &str = "You are an expert web content extraction agent. Your task is to analyze the provided HTML of a web article and return a clean, structured JSON object.
The JSON object must contain: the main title, author's name, publication date, the publication's name (e.g., 'The New York Times'), the URL of the main feature image, and the complete, unabridged body of the article in clean HTML format.
CRITICAL INSTRUCTIONS:
1. 'articleBodyHtml': You MUST return the ENTIRE text of the article, from the first word to the very last. Do not summarize, shorten, or truncate the content in any way.
2. 'publicationName': Extract the name of the website or publication.
3. 'featureImageUrl': Ensure the image URL is absolute.
4. 'articleBodyHtml': You MUST OMIT the main feature image from the HTML body, as it will be handled separately.
5. Exclude all non-essential elements: navigation, headers, footers, ads, social media, comments, and related article links.
6. Sanitize the HTML, preserving only basic formatting: <p>, <b>, <strong>, <i>, <em>, <ul>, <ol>, <li>, <blockquote>, <h1>-<h6> for subheadings, <a> for links, and <hr> for horizontal rules.
7. Ensure all image URLs within the article body are absolute (though typically you will remove them).";

const PDF_INSTRUCTION: &str = "You are an expert text formatting agent. You will be given raw, unstructured text extracted from a PDF. Your task is to analyze the text and return a clean, structured JSON object.
The JSON object must contain: a 'title' (which you should infer from the text, or use the original filename as a fallback), and the 'articleBodyHtml' which is the full body of the text formatted into clean HTML with <p> tags for paragraphs.
CRITICAL INSTRUCTIONS:
1. Reconstruct the paragraphs from the raw text. The text may have erratic line breaks; your job is to create a readable, flowing article.
2. Do not omit any text. The 'articleBodyHtml' must contain the complete, unabridged content.
3. You may optionally include 'author' and 'publicationDate' if they can be clearly identified in the text.";

/// Endpoint, model and credential for remote extraction.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL; the request goes to `{endpoint}/{model}:generateContent`.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Request timeout in seconds. Model calls are slower than page fetches.
    pub timeout: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { endpoint: DEFAULT_ENDPOINT.to_string(), model: DEFAULT_MODEL.to_string(), api_key: None, timeout: 120 }
    }
}

impl RemoteConfig {
    /// The configured key, trimmed, if it is non-empty.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }

    fn request_url(&self, key: &str) -> String {
        format!("{}/{}:generateContent?key={}", self.endpoint.trim_end_matches('/'), self.model, key)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

impl Content {
    fn text(text: impl Into<String>) -> Self {
        Self { parts: vec![Part { text: text.into() }] }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn response_schema(fields: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> =
        fields.iter().map(|field| (field.to_string(), json!({ "type": "STRING" }))).collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": ["title", "articleBodyHtml"],
    })
}

fn article_request(html: &str, url: &str) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content::text(format!("Original URL: {url}\n\nHTML:\n{}", strip_for_remote(html)))],
        system_instruction: Content::text(ARTICLE_INSTRUCTION),
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(&[
                "title",
                "author",
                "publicationDate",
                "publicationName",
                "featureImageUrl",
                "articleBodyHtml",
            ]),
        },
    }
}

fn pdf_request(text: &str, filename: &str) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content::text(format!("Original Filename: {filename}\n\nRaw Text:\n{text}"))],
        system_instruction: Content::text(PDF_INSTRUCTION),
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(&["title", "author", "publicationDate", "articleBodyHtml"]),
        },
    }
}

/// Unwraps the response envelope and decodes the embedded article JSON.
///
/// The body is sanitized to the same allow-list as locally extracted HTML.
pub fn parse_response(body: &str) -> Result<ArticleRecord> {
    let envelope: GenerateResponse =
        serde_json::from_str(body).map_err(|_| PaperfoldError::RemoteFormat(EMPTY_RESPONSE.to_string()))?;

    let text = envelope
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| PaperfoldError::RemoteFormat(EMPTY_RESPONSE.to_string()))?;

    let mut article: ArticleRecord = serde_json::from_str(&text).map_err(|err| {
        warn!(error = %err, "model answered with malformed article JSON");
        PaperfoldError::RemoteFormat(INVALID_JSON.to_string())
    })?;
    article.article_body_html = sanitize_fragment(&article.article_body_html);

    Ok(article)
}

/// Client for the remote extraction endpoint.
pub struct RemoteExtractor<'a> {
    config: &'a RemoteConfig,
    fetch: &'a FetchConfig,
}

impl<'a> RemoteExtractor<'a> {
    /// Uses `fetch` for the user agent and retry policy.
    pub fn new(config: &'a RemoteConfig, fetch: &'a FetchConfig) -> Self {
        Self { config, fetch }
    }

    /// Extracts an article from a web page.
    pub async fn extract_html(&self, html: &str, url: &str) -> Result<ArticleRecord> {
        info!(model = %self.config.model, "extracting article with AI");
        self.generate(&article_request(html, url)).await
    }

    /// Rebuilds an article from raw text pulled out of a PDF.
    pub async fn extract_pdf_text(&self, text: &str, filename: &str) -> Result<ArticleRecord> {
        info!(model = %self.config.model, filename, "formatting PDF text with AI");
        self.generate(&pdf_request(text, filename)).await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ArticleRecord> {
        let key = self
            .config
            .credential()
            .ok_or_else(|| PaperfoldError::Credential("No API key is configured for AI extraction.".to_string()))?;

        let url = self.config.request_url(key);
        let timeout = self.config.timeout;
        let client = FetchConfig { timeout, ..self.fetch.clone() }.client()?;

        let body = with_backoff(&self.fetch.retry, |_| {
            let request = client.post(&url).json(request);
            async move {
                let response = match request.send().await {
                    Ok(response) => response,
                    Err(err) => return Attempt::Retry(classify_send_error(err.without_url(), timeout)),
                };

                let status = response.status().as_u16();
                let text = match response.text().await {
                    Ok(text) => text,
                    Err(err) => return Attempt::Retry(classify_send_error(err.without_url(), timeout)),
                };

                if (200..300).contains(&status) {
                    return Attempt::Done(text);
                }
                if status == 401 {
                    return Attempt::Fail(PaperfoldError::Credential(
                        "API error: 401 Unauthorized. The API key may be invalid or missing.".to_string(),
                    ));
                }

                let err = PaperfoldError::Fetch { status: Some(status), message: format!("API error: {status} {text}") };
                if is_retryable_status(status) {
                    warn!(status, "extraction endpoint returned a retryable status");
                    Attempt::Retry(err)
                } else {
                    Attempt::Fail(err)
                }
            }
        })
        .await?;

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(text: &str) -> String {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
    }

    #[test]
    fn test_article_request_shape() {
        let request = article_request(
            "<html><body><nav>Menu</nav><p>Story</p></body></html>",
            "https://example.com/a",
        );
        let value = serde_json::to_value(&request).unwrap();

        let user_text = value["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(user_text.starts_with("Original URL: https://example.com/a\n\nHTML:\n"));
        assert!(user_text.contains("<p>Story</p>"));
        assert!(!user_text.contains("Menu"));

        assert!(value["systemInstruction"]["parts"][0]["text"].as_str().unwrap().contains("articleBodyHtml"));
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        let schema = &value["generationConfig"]["responseSchema"];
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["required"], json!(["title", "articleBodyHtml"]));
        assert_eq!(schema["properties"]["featureImageUrl"]["type"], "STRING");
    }

    #[test]
    fn test_pdf_request_shape() {
        let value = serde_json::to_value(pdf_request("raw words", "paper.pdf")).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Original Filename: paper.pdf\n\nRaw Text:\nraw words");
        let properties = &value["generationConfig"]["responseSchema"]["properties"];
        assert!(properties.get("publicationName").is_none());
        assert!(properties.get("featureImageUrl").is_none());
        assert!(properties.get("author").is_some());
    }

    #[test]
    fn test_request_url() {
        let config = RemoteConfig { api_key: Some("k".into()), ..Default::default() };
        assert_eq!(
            config.request_url("k"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent?key=k"
        );
    }

    #[test]
    fn test_credential_trims_and_rejects_blank() {
        let blank = RemoteConfig { api_key: Some("   ".into()), ..Default::default() };
        assert_eq!(blank.credential(), None);
        let set = RemoteConfig { api_key: Some(" abc ".into()), ..Default::default() };
        assert_eq!(set.credential(), Some("abc"));
    }

    #[test]
    fn test_parse_response_decodes_article() {
        let article_json = json!({
            "title": "Remote Title",
            "author": "A. Writer",
            "articleBodyHtml": "<div><p class=\"x\">Body text</p><img src=\"a.png\"></div>",
        })
        .to_string();

        let article = parse_response(&envelope(&article_json)).unwrap();
        assert_eq!(article.title, "Remote Title");
        assert_eq!(article.author_line(), Some("A. Writer"));
        assert_eq!(article.article_body_html, "<p>Body text</p>");
    }

    #[test]
    fn test_parse_response_accepts_null_title() {
        let article_json = json!({ "title": null, "articleBodyHtml": "<p>Body text</p>" }).to_string();

        let article = parse_response(&envelope(&article_json)).unwrap();
        assert_eq!(article.display_title(), "Untitled");
        assert_eq!(article.article_body_html, "<p>Body text</p>");
    }

    #[test]
    fn test_parse_response_missing_text() {
        let err = parse_response(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, PaperfoldError::RemoteFormat(ref m) if m == EMPTY_RESPONSE));

        let err = parse_response(r#"{"candidates": [{"content": {"parts": [{}]}}]}"#).unwrap_err();
        assert!(matches!(err, PaperfoldError::RemoteFormat(ref m) if m == EMPTY_RESPONSE));
    }

    #[test]
    fn test_parse_response_invalid_embedded_json() {
        let err = parse_response(&envelope("{not json")).unwrap_err();
        assert_eq!(err.to_string(), INVALID_JSON);
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let remote = RemoteConfig { endpoint: "http://127.0.0.1:9".into(), ..Default::default() };
        let fetch = FetchConfig::default();
        let err = RemoteExtractor::new(&remote, &fetch).extract_html("<p>x</p>", "https://example.com").await.unwrap_err();
        assert!(matches!(err, PaperfoldError::Credential(_)));
    }
}
