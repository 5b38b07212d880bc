use std::sync::LazyLock;

use async_trait::async_trait;
use futures_util::{Stream, TryStreamExt};
use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::core::VideoInfo;
use crate::error::{Result, YtteError};
use crate::selection::DownloadRequest;

static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*?\s*=\s*(?:UTF-8'')?"?([^";]+)"?"#).expect("valid regex")
});

/// Source of video metadata
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Title, thumbnail and raw formats for a source URL
    async fn fetch_info(&self, source_url: &str) -> Result<VideoInfo>;
}

/// Body the service sends instead of a file when a download fails
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// An open download response
pub struct Download {
    pub url: Url,
    /// Name suggested by the service
    pub file_name: Option<String>,
    pub content_length: Option<u64>,
    response: reqwest::Response,
}

impl Download {
    pub fn bytes_stream(self) -> impl Stream<Item = Result<bytes::Bytes>> {
        self.response.bytes_stream().map_err(YtteError::from)
    }
}

/// Client for the `/info` and `/download` endpoints
#[derive(Debug, Clone)]
pub struct HttpService {
    client: reqwest::Client,
    config: Config,
}

impl HttpService {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.config.user_agent)?);
        Ok(headers)
    }

    /// GET with status checking
    async fn execute_request(&self, url: &Url) -> Result<reqwest::Response> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .headers(self.default_headers()?)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    YtteError::RequestTimeout(url.to_string())
                } else {
                    YtteError::NetworkError(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(YtteError::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }

    pub fn info_url(&self, source_url: &str) -> Result<Url> {
        let mut url = self.config.endpoint("info")?;
        url.set_query(Some(&format!("url={}", urlencoding::encode(source_url))));
        Ok(url)
    }

    /// Link that makes the service produce the file
    pub fn download_url(&self, request: &DownloadRequest) -> Result<Url> {
        request.url(&self.config)
    }

    /// Start a download. The service reports failures as a JSON body.
    pub async fn open_download(&self, request: &DownloadRequest) -> Result<Download> {
        let url = self.download_url(request)?;
        let response = self.execute_request(&url).await?;

        if is_json(response.headers()) {
            let text = response.text().await?;
            return Err(match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => YtteError::ServiceRejected(body.error),
                Err(_) => YtteError::ServiceRejected(text),
            });
        }

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_disposition);
        let content_length = response.content_length();
        Ok(Download {
            url,
            file_name,
            content_length,
            response,
        })
    }
}

#[async_trait]
impl MetadataService for HttpService {
    async fn fetch_info(&self, source_url: &str) -> Result<VideoInfo> {
        let url = self.info_url(source_url)?;
        let response = self.execute_request(&url).await?;
        let text = response.text().await?;
        let info: VideoInfo = serde_json::from_str(&text)?;
        debug!(title = %info.title, formats = info.formats.len(), "fetched info");
        Ok(info)
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// File name from a `Content-Disposition` header value
pub fn parse_content_disposition(value: &str) -> Option<String> {
    let raw = FILENAME_RE.captures(value)?.get(1)?.as_str().trim();
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    let name = sanitize_filename::sanitize(decoded);
    if name.is_empty() { None } else { Some(name) }
}
