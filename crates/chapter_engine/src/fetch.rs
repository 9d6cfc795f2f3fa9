use std::collections::BTreeMap;
use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::header::{ACCEPT, COOKIE, REFERER, USER_AGENT};

use crate::{FailureKind, FetchError, FetchedImage};

/// Accept header preferring modern image formats, wildcard fallback.
const ACCEPT_IMAGES: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

/// Browser User-Agent pool used when the caller does not supply one.
/// A request picks uniformly at random from this list.
pub const DEFAULT_USER_AGENTS: [&str; 9] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:116.0) Gecko/20100101 Firefox/116.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13.5; rv:116.0) Gecko/20100101 Firefox/116.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36 Edg/115.0.1901.203",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.5845.140 Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; Pixel 7 Pro) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.5845.141 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 13; SM-G998B) AppleWebKit/537.36 (KHTML, like Gecko) SamsungBrowser/23.0 Chrome/116.0.5845.140 Mobile Safari/537.36",
];

/// True for placeholder/branding assets that must never be fetched.
pub fn is_branding_asset(url: &str) -> bool {
    url.contains("brand") || url.contains("logo")
}

/// Read-only request context shared by every fetch in a run.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub referer: String,
    pub cookies: BTreeMap<String, String>,
    pub user_agents: Vec<String>,
}

impl FetchContext {
    pub fn new(referer: impl Into<String>, cookies: BTreeMap<String, String>) -> Self {
        Self {
            referer: referer.into(),
            cookies,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the default User-Agent pool. An empty pool is ignored.
    pub fn with_user_agents(mut self, pool: Vec<String>) -> Self {
        if !pool.is_empty() {
            self.user_agents = pool;
        }
        self
    }

    fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(20),
        }
    }
}

#[async_trait::async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Retrieve and decode one page image.
    ///
    /// Returns `Ok(None)` when the location is a branding asset and was
    /// skipped without a network call.
    async fn fetch(
        &self,
        location: &str,
        context: &FetchContext,
    ) -> Result<Option<FetchedImage>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestImageFetcher {
    settings: FetchSettings,
}

impl ReqwestImageFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ImageFetcher for ReqwestImageFetcher {
    async fn fetch(
        &self,
        location: &str,
        context: &FetchContext,
    ) -> Result<Option<FetchedImage>, FetchError> {
        if is_branding_asset(location) {
            return Ok(None);
        }

        let parsed = reqwest::Url::parse(location)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = self.build_client()?;

        let mut request = client
            .get(parsed)
            .header(REFERER, context.referer.as_str())
            .header(ACCEPT, ACCEPT_IMAGES)
            .header(USER_AGENT, context.pick_user_agent());
        if let Some(cookie) = context.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        let (width, height) = (image.width(), image.height());

        Ok(Some(FetchedImage {
            location: location.to_string(),
            image,
            width,
            height,
        }))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
