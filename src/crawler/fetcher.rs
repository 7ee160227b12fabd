//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building the HTTP client with the configured user agent
//! - GET requests for listing and topic pages
//! - Bounded retry with exponential backoff on rate limiting
//!
//! Waits between attempts go through the [`Sleeper`] trait so the retry
//! schedule can be observed without wall-clock time.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Delay after any failure other than HTTP 429
pub const FIXED_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Body of a 2xx response
    Content(String),

    /// Every attempt failed
    Unavailable {
        /// Number of attempts made
        attempts: u32,
        /// Description of the last failure
        last_error: String,
    },
}

impl FetchResult {
    pub fn is_content(&self) -> bool {
        matches!(self, FetchResult::Content(_))
    }
}

/// Something that can wait between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use talkscan::config::UserAgentConfig;
/// use talkscan::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "Talkscan".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, 30).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page fetcher with bounded retry
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    sleeper: Arc<dyn Sleeper>,
}

impl Fetcher {
    /// Creates a fetcher that waits on the tokio timer
    pub fn new(client: Client) -> Self {
        Self::with_sleeper(client, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(client: Client, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { client, sleeper }
    }

    /// Fetches a URL, retrying failed attempts
    ///
    /// # Retry Logic
    ///
    /// `max_retries` is the total number of attempts; 0 is treated as 1.
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return the body |
    /// | HTTP 429 | Wait `2^attempt` seconds (attempt counted from 0), retry |
    /// | Other status | Wait 1 s, retry |
    /// | Transport error | Wait 1 s, retry |
    ///
    /// Nothing is waited after the final attempt.
    pub async fn fetch(&self, url: &str, max_retries: u32) -> FetchResult {
        let attempts = max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            let delay = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => {
                                tracing::debug!("Fetched {} ({} bytes)", url, body.len());
                                return FetchResult::Content(body);
                            }
                            Err(e) => {
                                tracing::error!("Failed to read body of {}: {}", url, e);
                                last_error = format!("body read failed: {}", e);
                                FIXED_RETRY_DELAY
                            }
                        }
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        let delay = backoff_delay(attempt);
                        tracing::warn!(
                            "Rate limited on {} (attempt {}/{}), backing off {:?}",
                            url,
                            attempt + 1,
                            attempts,
                            delay
                        );
                        last_error = format!("HTTP {}", status.as_u16());
                        delay
                    } else {
                        tracing::warn!(
                            "HTTP {} for {} (attempt {}/{})",
                            status.as_u16(),
                            url,
                            attempt + 1,
                            attempts
                        );
                        last_error = format!("HTTP {}", status.as_u16());
                        FIXED_RETRY_DELAY
                    }
                }
                Err(e) => {
                    tracing::error!(
                        "Request to {} failed (attempt {}/{}): {}",
                        url,
                        attempt + 1,
                        attempts,
                        e
                    );
                    last_error = e.to_string();
                    FIXED_RETRY_DELAY
                }
            };

            if attempt + 1 < attempts {
                self.sleeper.sleep(delay).await;
            }
        }

        tracing::warn!("Giving up on {} after {} attempts", url, attempts);
        FetchResult::Unavailable {
            attempts,
            last_error,
        }
    }
}

/// Backoff after a 429 on the given 0-based attempt
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records every requested wait instead of sleeping
    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn waits(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    fn recording_fetcher() -> (Fetcher, Arc<RecordingSleeper>) {
        let client = build_http_client(&create_test_config(), 5).unwrap();
        let sleeper = Arc::new(RecordingSleeper::default());
        (Fetcher::with_sleeper(client, sleeper.clone()), sleeper)
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&create_test_config(), 30).is_ok());
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let (fetcher, sleeper) = recording_fetcher();
        let result = fetcher.fetch(&format!("{}/page", server.uri()), 3).await;

        assert_eq!(result, FetchResult::Content("hello".to_string()));
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(3)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
            .mount(&server)
            .await;

        let (fetcher, sleeper) = recording_fetcher();
        let result = fetcher.fetch(&format!("{}/page", server.uri()), 4).await;

        assert_eq!(result, FetchResult::Content("finally".to_string()));
        assert_eq!(
            sleeper.waits(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[tokio::test]
    async fn test_rate_limited_exhausts_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let (fetcher, sleeper) = recording_fetcher();
        let result = fetcher.fetch(&format!("{}/page", server.uri()), 3).await;

        assert_eq!(
            result,
            FetchResult::Unavailable {
                attempts: 3,
                last_error: "HTTP 429".to_string()
            }
        );
        // no wait after the last attempt
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_server_error_uses_fixed_delay() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let (fetcher, sleeper) = recording_fetcher();
        let result = fetcher.fetch(&format!("{}/page", server.uri()), 3).await;

        assert!(!result.is_content());
        assert_eq!(sleeper.waits(), vec![FIXED_RETRY_DELAY, FIXED_RETRY_DELAY]);
    }

    #[tokio::test]
    async fn test_zero_retries_means_one_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (fetcher, sleeper) = recording_fetcher();
        let result = fetcher.fetch(&format!("{}/page", server.uri()), 0).await;

        match result {
            FetchResult::Unavailable { attempts, .. } => assert_eq!(attempts, 1),
            FetchResult::Content(_) => panic!("expected unavailable"),
        }
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_unavailable() {
        // Nothing listens on port 9 of localhost
        let (fetcher, sleeper) = recording_fetcher();
        let result = fetcher.fetch("http://127.0.0.1:9/page", 2).await;

        assert!(matches!(result, FetchResult::Unavailable { attempts: 2, .. }));
        assert_eq!(sleeper.waits(), vec![FIXED_RETRY_DELAY]);
    }
}
