use serde::Deserialize;

/// Main configuration structure for Sumi-Seek
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Seed URLs the crawl starts from (may be empty for a pure resume)
    #[serde(default)]
    pub seeds: Vec<String>,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum number of extractions in flight across all hosts
    pub max_concurrent_extractions: u32,

    /// Maximum number of extractions in flight against a single host
    pub max_concurrent_per_host: u32,

    /// Lower bound of the random delay between requests to one host (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the random delay between requests to one host (milliseconds)
    pub max_delay_ms: u64,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// How many times a failed re-extraction of the terminal URL is retried
    pub idle_retries: u32,

    /// Initial backoff between idle retries (milliseconds), doubled each cycle
    pub idle_backoff_ms: u64,

    /// How long in-flight extractions may finish after a stop signal (seconds)
    pub shutdown_grace_secs: u64,

    /// Stop after this many pages have been recorded in one run
    pub max_pages: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_extractions: 4,
            max_concurrent_per_host: 2,
            min_delay_ms: 1000,
            max_delay_ms: 3000,
            request_timeout_secs: 10,
            idle_retries: 3,
            idle_backoff_ms: 5000,
            shutdown_grace_secs: 10,
            max_pages: None,
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

/// Crawl log location
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite crawl log
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Path to the stopword lexicon, one word per line
    #[serde(rename = "stopwords-path")]
    pub stopwords_path: String,
}
