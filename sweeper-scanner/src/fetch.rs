use crate::config::SweepConfig;
use crate::error::{FetchError, RenderError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Produces the rendered HTML of a page.
///
/// A headless browser can sit behind this trait; [`HttpClient`] simply
/// returns the served markup.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, timeout: Duration) -> std::result::Result<String, RenderError>;
}

/// Raw HTTP access used for embedded resources and the link audit.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str, timeout: Duration)
    -> std::result::Result<Vec<u8>, FetchError>;

    async fn fetch_status(&self, url: &str, timeout: Duration) -> std::result::Result<u16, FetchError>;
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &SweepConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn status_with(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<StatusCode, FetchError> {
        let response = self
            .client
            .request(method, url)
            .timeout(timeout)
            .send()
            .await?;
        Ok(response.status())
    }
}

#[async_trait]
impl Renderer for HttpClient {
    async fn render(&self, url: &str, timeout: Duration) -> std::result::Result<String, RenderError> {
        debug!("Rendering {}", url);
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // A missing content-type is given the benefit of the doubt.
        if let Some(ct) = content_type
            && !ct.contains("html")
        {
            return Err(RenderError::NotHtml(ct));
        }

        let body = response.text().await.map_err(FetchError::from)?;
        Ok(body)
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch_bytes(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        debug!("Downloading {}", url);
        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// `HEAD` first; servers that refuse it get a `GET`.
    async fn fetch_status(&self, url: &str, timeout: Duration) -> std::result::Result<u16, FetchError> {
        let status = self.status_with(Method::HEAD, url, timeout).await?;
        if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
            debug!("HEAD refused by {}, retrying with GET", url);
            let status = self.status_with(Method::GET, url, timeout).await?;
            return Ok(status.as_u16());
        }
        Ok(status.as_u16())
    }
}
