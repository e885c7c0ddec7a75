use crate::ConfigError;
use serde::Deserialize;

/// Main configuration structure for Novel-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub covers: CoverConfig,
}

/// Where the listing lives and how far back to read it
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Site root every href is resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Listing path template, `{page}` is replaced by the page index
    #[serde(rename = "listing-path")]
    pub listing_path: String,

    /// Index of the newest listing page
    #[serde(rename = "first-page", default)]
    pub first_page: u32,

    /// Number of listing pages to walk
    #[serde(rename = "page-count", default = "default_page_count")]
    pub page_count: u32,

    /// Deadline applied to every request (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl SourceConfig {
    /// Renders the listing path for one page index
    pub fn listing_path_for(&self, page: u32) -> String {
        self.listing_path.replace("{page}", &page.to_string())
    }

    /// Index of the oldest listing page a run visits
    pub fn last_page(&self) -> Result<u32, ConfigError> {
        self.first_page
            .checked_add(self.page_count.saturating_sub(1))
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "first_page {} with page_count {} runs past the last page index {}",
                    self.first_page,
                    self.page_count,
                    u32::MAX
                ))
            })
    }
}

/// Crawler pacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Pause between successive chapter number writes (milliseconds)
    #[serde(rename = "persist-delay-ms", default = "default_persist_delay_ms")]
    pub persist_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            persist_delay_ms: default_persist_delay_ms(),
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

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// How cover images are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverMode {
    /// Bytes and content type live on the novel row
    #[default]
    Inline,
    /// Bytes go to an asset directory, the novel keeps the returned key
    Directory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverConfig {
    #[serde(default)]
    pub mode: CoverMode,

    /// Asset directory, required in directory mode
    pub directory: Option<String>,
}

fn default_page_count() -> u32 {
    10
}

fn default_request_timeout_ms() -> u64 {
    50_000
}

fn default_persist_delay_ms() -> u64 {
    100
}
