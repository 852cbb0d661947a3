use anyhow::{bail, Context, Result};
use readme_harness_core::{ResolverConfig, SymlinkPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub readme: ReadmeConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReadmeConfig {
    /// File names to try, in order. Replaces the built-in list when set.
    #[serde(default)]
    pub file_names: Option<Vec<String>>,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: HumanDuration,
    #[serde(default)]
    pub symlink: SymlinkPolicy,
    #[serde(default = "default_true")]
    pub strip_markdown_in_index: bool,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for ReadmeConfig {
    fn default() -> Self {
        Self {
            file_names: None,
            cache_ttl: default_cache_ttl(),
            symlink: SymlinkPolicy::default(),
            strip_markdown_in_index: true,
            search: SearchConfig::default(),
        }
    }
}

impl ReadmeConfig {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            file_names: self.file_names.clone(),
            symlink: self.symlink.clone(),
        }
    }
}

fn default_cache_ttl() -> HumanDuration {
    HumanDuration::Text("1h".to_string())
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_search_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            output: default_search_output(),
            schedule: ScheduleConfig::default(),
        }
    }
}

fn default_search_output() -> PathBuf {
    PathBuf::from("readme-index.jsonl")
}

/// When the search collator runs. Only fixed intervals are supported.
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_frequency")]
    pub frequency: HumanDuration,
    #[serde(default = "default_frequency")]
    pub timeout: HumanDuration,
    #[serde(default = "default_initial_delay")]
    pub initial_delay: HumanDuration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            timeout: default_frequency(),
            initial_delay: default_initial_delay(),
        }
    }
}

fn default_frequency() -> HumanDuration {
    HumanDuration::Text("1h".to_string())
}

fn default_initial_delay() -> HumanDuration {
    HumanDuration::Text("3s".to_string())
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7007".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_max_capacity() -> u64 {
    10_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReaderConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where entities come from: a static JSON file or a catalog HTTP API.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub entities_file: Option<PathBuf>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IntegrationsConfig {
    #[serde(default)]
    pub github: Vec<IntegrationConfig>,
    #[serde(default)]
    pub gitlab: Vec<IntegrationConfig>,
    /// Any other host that serves raw files at their browse URL.
    #[serde(default)]
    pub generic: Vec<IntegrationConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IntegrationConfig {
    pub host: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Overrides where raw file content is fetched from.
    #[serde(default)]
    pub raw_base_url: Option<String>,
}

/// A duration written as `"90s"`, `"1h30m"`, or a table such as
/// `{ hours = 2 }`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum HumanDuration {
    Text(String),
    Parts(DurationParts),
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DurationParts {
    #[serde(default)]
    pub days: u64,
    #[serde(default)]
    pub hours: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
    #[serde(default)]
    pub milliseconds: u64,
}

impl HumanDuration {
    pub fn to_duration(&self) -> Result<Duration> {
        match self {
            HumanDuration::Text(s) => parse_duration(s),
            HumanDuration::Parts(p) => {
                let secs = [
                    (p.days, 86_400u64),
                    (p.hours, 3_600),
                    (p.minutes, 60),
                    (p.seconds, 1),
                ]
                .into_iter()
                .try_fold(0u64, |acc, (value, unit)| {
                    value.checked_mul(unit).and_then(|s| acc.checked_add(s))
                });
                secs.and_then(|secs| {
                    Duration::from_secs(secs).checked_add(Duration::from_millis(p.milliseconds))
                })
                .with_context(|| format!("invalid duration {:?}: too large", p))
            }
        }
    }
}

fn scaled_secs(value: u64, unit: u64) -> Option<Duration> {
    value.checked_mul(unit).map(Duration::from_secs)
}

/// Parse a compact duration: one or more `<number><unit>` pairs with unit
/// `ms`, `s`, `m`, `h` or `d`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s.is_empty() {
        bail!("empty duration");
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            bail!("invalid duration '{}': expected a number", input);
        }
        let value: u64 = rest[..digits]
            .parse()
            .with_context(|| format!("invalid duration '{}'", input))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = rest[..unit_len].trim();
        rest = rest[unit_len..].trim_start();

        let part = match unit {
            "ms" => Some(Duration::from_millis(value)),
            "s" => scaled_secs(value, 1),
            "m" => scaled_secs(value, 60),
            "h" => scaled_secs(value, 3_600),
            "d" => scaled_secs(value, 86_400),
            "" => bail!("invalid duration '{}': missing unit", input),
            other => bail!("invalid duration '{}': unknown unit '{}'", input, other),
        };
        total = match part.and_then(|p| total.checked_add(p)) {
            Some(total) => total,
            None => bail!("invalid duration '{}': too large", input),
        };
    }

    Ok(total)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    let ttl = config
        .readme
        .cache_ttl
        .to_duration()
        .context("readme.cache_ttl")?;
    if ttl.is_zero() {
        bail!("readme.cache_ttl must be > 0");
    }

    if let Some(names) = &config.readme.file_names {
        if names.iter().any(|n| n.trim().is_empty()) {
            bail!("readme.file_names must not contain empty names");
        }
    }

    if config.readme.symlink.max_length == 0 {
        bail!("readme.symlink.max_length must be > 0");
    }

    let schedule = &config.readme.search.schedule;
    if schedule
        .frequency
        .to_duration()
        .context("readme.search.schedule.frequency")?
        .is_zero()
    {
        bail!("readme.search.schedule.frequency must be > 0");
    }
    if schedule
        .timeout
        .to_duration()
        .context("readme.search.schedule.timeout")?
        .is_zero()
    {
        bail!("readme.search.schedule.timeout must be > 0");
    }
    schedule
        .initial_delay
        .to_duration()
        .context("readme.search.schedule.initial_delay")?;

    if config.cache.max_capacity == 0 {
        bail!("cache.max_capacity must be > 0");
    }

    if config.reader.timeout_secs == 0 {
        bail!("reader.timeout_secs must be > 0");
    }

    for integration in config
        .integrations
        .github
        .iter()
        .chain(&config.integrations.gitlab)
        .chain(&config.integrations.generic)
    {
        if integration.host.trim().is_empty() || integration.host.contains('/') {
            bail!(
                "integration host must be a bare host name, got '{}'",
                integration.host
            );
        }
    }

    Ok(())
}
