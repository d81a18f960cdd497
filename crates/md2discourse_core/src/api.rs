use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{DEFAULT_USER_AGENT, DiscourseConfig};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Everything except RFC 3986 unreserved characters and `/` gets escaped.
const TITLE_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Status and body of one Discourse call. Decoding is left to the caller so the
/// best-effort lookups can decide how to treat odd responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).context("failed to decode Discourse JSON response")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub title: String,
    pub raw: String,
    pub category: u64,
    pub tags: Vec<String>,
}

impl NewTopic {
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("title".to_string(), self.title.clone()),
            ("raw".to_string(), self.raw.clone()),
            ("category".to_string(), self.category.to_string()),
        ];
        for tag in &self.tags {
            fields.push(("tags[]".to_string(), tag.clone()));
        }
        fields
    }
}

/// The four Discourse endpoints this tool talks to. `Err` means the request never
/// produced an HTTP response; any status code comes back as `Ok`.
pub trait DiscourseApi {
    fn search_by_title(&mut self, title: &str) -> Result<ApiResponse>;
    fn list_tags(&mut self) -> Result<ApiResponse>;
    fn create_post(&mut self, topic: &NewTopic) -> Result<ApiResponse>;
    fn get_site(&mut self) -> Result<ApiResponse>;
    fn request_count(&self) -> usize;
}

#[derive(Debug, Clone)]
pub struct DiscourseClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_username: String,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl DiscourseClientConfig {
    pub fn from_config(config: &DiscourseConfig) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            api_username: config.api_username.clone(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: env_value_u64("DISCOURSE_HTTP_TIMEOUT_MS", DEFAULT_TIMEOUT_MS),
        }
    }
}

pub struct DiscourseClient {
    client: Client,
    config: DiscourseClientConfig,
    request_count: usize,
}

impl DiscourseClient {
    pub fn from_config(config: &DiscourseConfig) -> Result<Self> {
        Self::new(DiscourseClientConfig::from_config(config))
    }

    pub fn new(config: DiscourseClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .context("failed to build Discourse HTTP client")?;

        Ok(Self {
            client,
            config,
            request_count: 0,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", self.config.api_key.as_str())
            .header("Api-Username", self.config.api_username.as_str())
    }

    fn send(&mut self, url: &str, request: RequestBuilder) -> Result<ApiResponse> {
        debug!(url, "connecting to Discourse");
        self.request_count += 1;
        let response = self
            .authorized(request)
            .send()
            .with_context(|| format!("failed to call Discourse API at {url}"))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .with_context(|| format!("failed to read Discourse response body from {url}"))?;
        debug!(status, body = body.as_str(), "Discourse response");
        Ok(ApiResponse { status, body })
    }

    fn get(&mut self, url: String) -> Result<ApiResponse> {
        let request = self.client.get(&url);
        self.send(&url, request)
    }
}

impl DiscourseApi for DiscourseClient {
    fn search_by_title(&mut self, title: &str) -> Result<ApiResponse> {
        let url = self.endpoint(&search_path(title));
        self.get(url)
    }

    fn list_tags(&mut self) -> Result<ApiResponse> {
        let url = self.endpoint("tags.json");
        self.get(url)
    }

    fn create_post(&mut self, topic: &NewTopic) -> Result<ApiResponse> {
        let url = self.endpoint("posts.json");
        let request = self.client.post(&url).form(&topic.form_fields());
        self.send(&url, request)
    }

    fn get_site(&mut self) -> Result<ApiResponse> {
        let url = self.endpoint("site.json");
        self.get(url)
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

/// `search.json?q=title:"<escaped>"&page=1`, relative to the forum base.
pub fn search_path(title: &str) -> String {
    format!(
        "search.json?q=title:\"{}\"&page=1",
        utf8_percent_encode(title, TITLE_ESCAPE)
    )
}

fn env_value_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
