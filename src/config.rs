use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Everything the engine needs from the environment, collected once at
/// startup. Whoever builds the engine owns this; no module-level globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the generative-content service.
    pub api_endpoint: String,
    /// Credential for the service. When absent the daemon still runs and
    /// every answer comes from the canned generator.
    pub api_key: Option<String>,
    pub model: String,
    /// Path to the scraped-content JSON blob.
    pub corpus_path: PathBuf,
    /// Upper bound on the concatenated corpus, in bytes.
    pub corpus_limit: usize,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub port: u16,
    /// Page URL embedded in outbound share links.
    pub page_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok();
        if api_key.is_none() {
            info!("No GEMINI_API_KEY set, answers will use the canned generator only.");
        }

        let request_timeout = std::env::var("ICHATROBO_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let port = std::env::var("ICHATROBO_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        Ok(Self {
            api_endpoint: std::env::var("GEMINI_API_ENDPOINT")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            api_key,
            model: std::env::var("ICHATROBO_MODEL")
                .unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
            corpus_path: std::env::var("ICHATROBO_CORPUS")
                .unwrap_or_else(|_| "scraped_content.json".to_string())
                .into(),
            corpus_limit: 400_000,
            request_timeout: Duration::from_secs(request_timeout),
            connect_timeout: Duration::from_secs(10),
            port,
            page_url: std::env::var("ICHATROBO_PAGE_URL")
                .unwrap_or_else(|_| "https://www.binarysemantics.com".to_string()),
        })
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: "http://localhost:0".to_string(),
            api_key: None,
            model: "test-model".to_string(),
            corpus_path: "scraped_content.json".into(),
            corpus_limit: 400_000,
            request_timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(1),
            port: 0,
            page_url: "https://www.binarysemantics.com".to_string(),
        }
    }
}
