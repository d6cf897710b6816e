use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const MEXC_CONTRACT_BASE_URL: &str = "https://contract.mexc.com";
pub const DEFAULT_STATE_FILE: &str = "tracked_tokens.json";

/// Seconds between two polling cycles.
pub const POLL_INTERVAL_SECS: u64 = 25;
/// A listing created within this many hours counts as new.
pub const DISCOVERY_WINDOW_HOURS: i64 = 1;
/// Hours after discovery before a token is evaluated.
pub const MATURITY_WINDOW_HOURS: i64 = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub notifier: NotifierConfig,
    pub tracker: TrackerConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    pub post_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    pub state_file: PathBuf,
    pub poll_interval_secs: u64,
    pub discovery_window_hours: i64,
    pub maturity_window_hours: i64,
    pub report_policy: ReportPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub health_port: Option<u16>,
    pub log_level: String,
}

/// What happens to a mature token once it has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPolicy {
    /// Keep the token and report it again every cycle.
    #[default]
    Continuous,
    /// Drop the token after its first report.
    Once,
}

impl FromStr for ReportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(ReportPolicy::Continuous),
            "once" => Ok(ReportPolicy::Once),
            other => Err(format!("unknown report policy '{}'", other)),
        }
    }
}

impl std::fmt::Display for ReportPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportPolicy::Continuous => write!(f, "continuous"),
            ReportPolicy::Once => write!(f, "once"),
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: MEXC_CONTRACT_BASE_URL.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            poll_interval_secs: POLL_INTERVAL_SECS,
            discovery_window_hours: DISCOVERY_WINDOW_HOURS,
            maturity_window_hours: MATURITY_WINDOW_HOURS,
            report_policy: ReportPolicy::Continuous,
        }
    }
}

impl TrackerConfig {
    pub fn discovery_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.discovery_window_hours)
    }

    pub fn maturity_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.maturity_window_hours)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Values that cannot be used fall
    /// back to their defaults and leave a note in `warnings`, since logging is
    /// not up yet when this runs.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut warnings = Vec::new();

        let report_policy = match get("REPORT_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warnings.push(format!("{}, falling back to continuous", e));
                ReportPolicy::Continuous
            }),
            None => ReportPolicy::Continuous,
        };

        let health_port = get("HEALTH_PORT").and_then(|raw| match raw.trim().parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                warnings.push(format!(
                    "HEALTH_PORT '{}' is not a port, health endpoint disabled",
                    raw
                ));
                None
            }
        });

        Config {
            exchange: ExchangeConfig::default(),
            notifier: NotifierConfig {
                post_url: get("POST_URL").filter(|url| !url.trim().is_empty()),
            },
            tracker: TrackerConfig {
                state_file: get("TRACKED_TOKENS_FILE")
                    .filter(|path| !path.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
                report_policy,
                ..TrackerConfig::default()
            },
            monitoring: MonitoringConfig {
                health_port,
                log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            },
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_report_policy() {
        assert_eq!("once".parse::<ReportPolicy>(), Ok(ReportPolicy::Once));
        assert_eq!(" Continuous ".parse::<ReportPolicy>(), Ok(ReportPolicy::Continuous));
        assert!("forever".parse::<ReportPolicy>().is_err());
    }

    #[test]
    fn tracker_defaults_match_fixed_windows() {
        let config = TrackerConfig::default();
        assert_eq!(config.poll_interval(), std::time::Duration::from_secs(25));
        assert_eq!(config.discovery_window(), chrono::Duration::hours(1));
        assert_eq!(config.maturity_window(), chrono::Duration::hours(8));
        assert_eq!(config.report_policy, ReportPolicy::Continuous);
        assert_eq!(config.state_file, PathBuf::from("tracked_tokens.json"));
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.notifier.post_url, None);
        assert_eq!(config.tracker.state_file, PathBuf::from(DEFAULT_STATE_FILE));
        assert_eq!(config.tracker.report_policy, ReportPolicy::Continuous);
        assert_eq!(config.monitoring.health_port, None);
        assert_eq!(config.monitoring.log_level, "info");
        assert_eq!(config.exchange.base_url, MEXC_CONTRACT_BASE_URL);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn unknown_report_policy_falls_back_with_warning() {
        let config = Config::from_lookup(lookup(&[("REPORT_POLICY", "forever")]));
        assert_eq!(config.tracker.report_policy, ReportPolicy::Continuous);
        assert_eq!(config.warnings.len(), 1);
        assert!(config.warnings[0].contains("forever"));
    }

    #[test]
    fn blank_post_url_counts_as_unset() {
        let config = Config::from_lookup(lookup(&[("POST_URL", "   ")]));
        assert_eq!(config.notifier.post_url, None);

        let config = Config::from_lookup(lookup(&[("POST_URL", "https://hooks.example/x")]));
        assert_eq!(
            config.notifier.post_url.as_deref(),
            Some("https://hooks.example/x")
        );
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("TRACKED_TOKENS_FILE", "/var/lib/tracker/state.json"),
            ("REPORT_POLICY", "once"),
            ("HEALTH_PORT", "8080"),
            ("LOG_LEVEL", "debug"),
        ]));
        assert_eq!(
            config.tracker.state_file,
            PathBuf::from("/var/lib/tracker/state.json")
        );
        assert_eq!(config.tracker.report_policy, ReportPolicy::Once);
        assert_eq!(config.monitoring.health_port, Some(8080));
        assert_eq!(config.monitoring.log_level, "debug");
        assert_eq!(config.tracker.poll_interval_secs, POLL_INTERVAL_SECS);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn bad_health_port_disables_endpoint_with_warning() {
        let config = Config::from_lookup(lookup(&[("HEALTH_PORT", "http")]));
        assert_eq!(config.monitoring.health_port, None);
        assert_eq!(config.warnings.len(), 1);
    }
}
