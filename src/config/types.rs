use serde::Deserialize;

/// Main configuration structure for Roster-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// The catalog site being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root URL of the catalog (e.g., "https://myanimelist.net")
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Fixed pre-request pacing
#[derive(Debug, Clone, Deserialize)]
pub struct PolitenessConfig {
    /// Duration of one politeness unit (milliseconds)
    #[serde(rename = "unit-ms")]
    pub unit_ms: u64,
}

/// HTTP fetch behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a transport error or 5xx response
    #[serde(rename = "max-retries", default)]
    pub max_retries: u32,

    /// Fixed delay between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_delay_ms() -> u64 {
    5000
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

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Roster ingestion behavior
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestConfig {
    #[serde(rename = "on-character-error", default)]
    pub on_character_error: CharacterErrorPolicy,
}

/// What happens when a single character's pages fail to fetch or parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CharacterErrorPolicy {
    /// Abort the whole run (already committed rows stay)
    #[default]
    Abort,
    /// Log the failure, record it in the report, and continue with the roster
    Skip,
}
