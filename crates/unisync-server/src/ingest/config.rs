//! Pipeline configuration
//!
//! Which sources run, in what order, and how each one is reached. Loaded from
//! `ETL_*` environment variables (see [`EtlConfig::from_env`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::error::{EtlError, EtlResult};

/// Default remote endpoint (top-N market snapshot)
pub const DEFAULT_API_SOURCE_URL: &str = "https://api.coingecko.com/api/v3/coins/markets";

/// Default request timeout for the remote fetch, in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

/// Default page size requested from the remote API.
pub const DEFAULT_API_PER_PAGE: u32 = 250;

pub const DEFAULT_API_VS_CURRENCY: &str = "usd";

pub const DEFAULT_CSV1_PATH: &str = "data/source1.csv";

pub const DEFAULT_CSV2_PATH: &str = "data/source2.csv";

/// Sources processed when `ETL_SOURCES` is unset, in order.
pub const DEFAULT_SOURCES: &str = "api,csv1,csv2";

/// The three kinds of upstream the pipeline knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Remote paginated JSON API returning a ranked snapshot
    Api,
    /// Delimited file keyed by `id` (name, value, timestamp)
    Csv1,
    /// Delimited file keyed by `record_id` (full_name, score, created_at)
    Csv2,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Api => "api",
            SourceKind::Csv1 => "csv1",
            SourceKind::Csv2 => "csv2",
        }
    }

    /// Tag written to `unified_records.source` for this kind
    pub fn default_tag(self) -> &'static str {
        match self {
            SourceKind::Api => "coingecko_api",
            SourceKind::Csv1 => "csv1",
            SourceKind::Csv2 => "csv2",
        }
    }

    /// Remote records are skipped individually; file rows abort the attempt.
    pub fn default_policy(self) -> MalformedPolicy {
        match self {
            SourceKind::Api => MalformedPolicy::Skip,
            SourceKind::Csv1 | SourceKind::Csv2 => MalformedPolicy::Abort,
        }
    }

    /// Append-only raw capture table
    pub fn raw_table(self) -> &'static str {
        match self {
            SourceKind::Api => "raw_api_records",
            SourceKind::Csv1 => "raw_csv_records",
            SourceKind::Csv2 => "raw_csv2_records",
        }
    }

    /// Payload field carrying the source-native identifier
    pub fn identifier_field(self) -> &'static str {
        match self {
            SourceKind::Api | SourceKind::Csv1 => "id",
            SourceKind::Csv2 => "record_id",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "api" | "remote_api" => Ok(SourceKind::Api),
            "csv1" | "file_a" => Ok(SourceKind::Csv1),
            "csv2" | "file_b" => Ok(SourceKind::Csv2),
            other => Err(EtlError::UnknownSource(other.to_string())),
        }
    }
}

/// What happens when a single record cannot be transformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Log and drop the record, keep going
    Skip,
    /// Fail the whole attempt
    Abort,
}

impl FromStr for MalformedPolicy {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(MalformedPolicy::Skip),
            "abort" | "fail" => Ok(MalformedPolicy::Abort),
            other => Err(EtlError::Config(format!("invalid malformed-record policy: {other}"))),
        }
    }
}

/// One configured source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Name used for checkpoints, leases and run history
    pub name: String,
    pub kind: SourceKind,
    /// Value stored in `unified_records.source`
    pub tag: String,
    pub on_malformed: MalformedPolicy,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into().trim().to_lowercase(),
            kind,
            tag: kind.default_tag().to_string(),
            on_malformed: kind.default_policy(),
        }
    }

    pub fn with_policy(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

/// Remote API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSourceConfig {
    pub url: String,
    /// Sent as `X-API-Key` when present and non-empty
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub per_page: u32,
    pub vs_currency: String,
}

impl Default for ApiSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_SOURCE_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            per_page: DEFAULT_API_PER_PAGE,
            vs_currency: DEFAULT_API_VS_CURRENCY.to_string(),
        }
    }
}

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Sources in processing order
    pub sources: Vec<SourceConfig>,
    pub api: ApiSourceConfig,
    pub csv1_path: PathBuf,
    pub csv2_path: PathBuf,
    /// When set, the server runs the batch on this interval
    pub schedule_interval_secs: Option<u64>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            api: ApiSourceConfig::default(),
            csv1_path: PathBuf::from(DEFAULT_CSV1_PATH),
            csv2_path: PathBuf::from(DEFAULT_CSV2_PATH),
            schedule_interval_secs: None,
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    [SourceKind::Api, SourceKind::Csv1, SourceKind::Csv2]
        .into_iter()
        .map(|kind| SourceConfig::new(kind.as_str(), kind))
        .collect()
}

impl EtlConfig {
    /// Load pipeline configuration from the process environment
    ///
    /// - `ETL_SOURCES`: comma-separated `name[:kind]` entries
    /// - `ETL_API_SOURCE_URL`, `ETL_API_KEY`, `ETL_API_TIMEOUT_SECS`,
    ///   `ETL_API_PER_PAGE`, `ETL_API_VS_CURRENCY`
    /// - `ETL_CSV1_PATH`, `ETL_CSV2_PATH`
    /// - `ETL_ON_MALFORMED_<NAME>`: `skip` or `abort`
    /// - `ETL_SCHEDULE_INTERVAL_SECS`
    pub fn from_env() -> EtlResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> EtlResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sources_spec = lookup("ETL_SOURCES").unwrap_or_else(|| DEFAULT_SOURCES.to_string());
        let mut sources = parse_sources(&sources_spec)?;

        for source in &mut sources {
            let key = format!("ETL_ON_MALFORMED_{}", source.name.to_uppercase());
            if let Some(policy) = lookup(&key) {
                source.on_malformed = policy.parse()?;
            }
        }

        let defaults = ApiSourceConfig::default();
        let api = ApiSourceConfig {
            url: lookup("ETL_API_SOURCE_URL").unwrap_or(defaults.url),
            api_key: lookup("ETL_API_KEY").filter(|key| !key.trim().is_empty()),
            timeout_secs: parse_or(&lookup, "ETL_API_TIMEOUT_SECS", defaults.timeout_secs)?,
            per_page: parse_or(&lookup, "ETL_API_PER_PAGE", defaults.per_page)?,
            vs_currency: lookup("ETL_API_VS_CURRENCY").unwrap_or(defaults.vs_currency),
        };

        let schedule_interval_secs = match lookup("ETL_SCHEDULE_INTERVAL_SECS") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| {
                EtlError::Config(format!("ETL_SCHEDULE_INTERVAL_SECS is not a number: {raw}"))
            })?),
            None => None,
        };

        let config = Self {
            sources,
            api,
            csv1_path: lookup("ETL_CSV1_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV1_PATH)),
            csv2_path: lookup("ETL_CSV2_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV2_PATH)),
            schedule_interval_secs,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> EtlResult<()> {
        if self.sources.is_empty() {
            return Err(EtlError::Config("no sources configured".to_string()));
        }

        // A kind owns one input file and one raw table
        let mut names = std::collections::HashSet::new();
        let mut kinds = std::collections::HashSet::new();
        let mut tags = std::collections::HashSet::new();
        for source in &self.sources {
            if source.name.is_empty() {
                return Err(EtlError::Config("source name cannot be empty".to_string()));
            }
            if !names.insert(source.name.as_str()) {
                return Err(EtlError::Config(format!("duplicate source: {}", source.name)));
            }
            if !kinds.insert(source.kind) {
                return Err(EtlError::Config(format!(
                    "source '{}' reuses kind '{}' already configured for another source",
                    source.name,
                    source.kind.as_str()
                )));
            }
            if !tags.insert(source.tag.to_lowercase()) {
                return Err(EtlError::Config(format!(
                    "source '{}' reuses unified tag '{}'",
                    source.name, source.tag
                )));
            }
        }

        if self.api.timeout_secs == 0 {
            return Err(EtlError::Config("ETL_API_TIMEOUT_SECS must be greater than 0".into()));
        }
        if self.api.per_page == 0 {
            return Err(EtlError::Config("ETL_API_PER_PAGE must be greater than 0".into()));
        }
        if self.schedule_interval_secs == Some(0) {
            return Err(EtlError::Config(
                "ETL_SCHEDULE_INTERVAL_SECS must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        let name = name.trim().to_lowercase();
        self.sources.iter().find(|s| s.name == name)
    }

    /// File path for a delimited source kind
    pub fn path_for(&self, kind: SourceKind) -> Option<&Path> {
        match kind {
            SourceKind::Api => None,
            SourceKind::Csv1 => Some(&self.csv1_path),
            SourceKind::Csv2 => Some(&self.csv2_path),
        }
    }
}

/// Parse `name[:kind]` entries; a bare name doubles as its kind
pub fn parse_sources(spec: &str) -> EtlResult<Vec<SourceConfig>> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, kind) = match entry.split_once(':') {
                Some((name, kind)) => (name, kind),
                None => (entry, entry),
            };
            Ok(SourceConfig::new(name, kind.parse()?))
        })
        .collect()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> EtlResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| EtlError::Config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}
