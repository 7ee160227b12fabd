use serde::Deserialize;

/// Main configuration structure for Talkscan
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub forum: ForumConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    pub output: OutputConfig,
}

/// Which forum section to scan and how its listing is paginated
#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
    /// Forum root, e.g. "https://bitcointalk.org"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Board identifier of the section to scan
    #[serde(rename = "section-id", default = "default_section_id")]
    pub section_id: u32,

    /// Number of listing pages to walk
    #[serde(default = "default_pages")]
    pub pages: u32,

    /// Topics per listing page (the listing offset step)
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Total fetch attempts per URL, first attempt included
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Minimum time between two processed topics across all workers (milliseconds)
    #[serde(rename = "pace-millis", default = "default_pace_millis")]
    pub pace_millis: u64,

    /// Number of topics processed concurrently
    #[serde(default = "default_workers")]
    pub workers: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout(),
            pace_millis: default_pace_millis(),
            workers: default_workers(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Classification service (Ollama) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Ollama API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model used for classification
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in the response
    #[serde(rename = "max-tokens", default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout (seconds); local models can be slow
    #[serde(rename = "timeout-secs", default = "default_classifier_timeout")]
    pub timeout_secs: u64,

    /// Characters of post body sent to the model; the tail is dropped
    #[serde(rename = "max-input-chars", default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_classifier_timeout(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the JSON report file
    #[serde(rename = "report-path")]
    pub report_path: String,
}

fn default_section_id() -> u32 {
    159
}
fn default_pages() -> u32 {
    2
}
fn default_page_size() -> u32 {
    40
}
fn default_max_retries() -> u32 {
    3
}
fn default_request_timeout() -> u64 {
    30
}
fn default_pace_millis() -> u64 {
    1000
}
fn default_workers() -> u32 {
    1
}
fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3.1".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_classifier_timeout() -> u64 {
    300
}
fn default_max_input_chars() -> usize {
    3000
}
