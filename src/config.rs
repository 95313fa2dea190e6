use crate::cache::CacheManifest;
use crate::errors::{Error, Result};
use crate::lifecycle::HostMode;
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    /// Always starts and ends with `/`.
    pub base_path: String,
    pub host_mode: HostMode,
    pub poll_interval: Duration,
    pub asset_dir: Option<PathBuf>,
    /// `None` disables the periodic update check.
    pub update_check_interval: Option<Duration>,
    pub settle_delay: Duration,
    pub cache_prefix: String,
    pub remote_resources: Vec<String>,
    pub notify_webhook: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let update_secs: u64 = parse(get("TIMER_UPDATE_CHECK_SECS"), "TIMER_UPDATE_CHECK_SECS", 60)?;
        let remote_resources = match lookup("TIMER_REMOTE_RESOURCES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(String::from)
                .collect(),
            None => CacheManifest::default().remote,
        };

        Ok(Self {
            port: parse(get("PORT"), "PORT", 8080)?,
            data_path: get("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/state.json")),
            base_path: normalize_base_path(get("TIMER_BASE_PATH").as_deref().unwrap_or("/pwa-timer/")),
            host_mode: parse(get("TIMER_HOST_MODE"), "TIMER_HOST_MODE", HostMode::Shared)?,
            poll_interval: Duration::from_millis(parse(
                get("TIMER_POLL_INTERVAL_MS"),
                "TIMER_POLL_INTERVAL_MS",
                16u64,
            )?),
            asset_dir: get("TIMER_ASSET_DIR").map(PathBuf::from),
            update_check_interval: (update_secs > 0).then(|| Duration::from_secs(update_secs)),
            settle_delay: Duration::from_millis(parse(
                get("TIMER_SETTLE_DELAY_MS"),
                "TIMER_SETTLE_DELAY_MS",
                500u64,
            )?),
            cache_prefix: get("TIMER_CACHE_PREFIX").unwrap_or_else(|| "pwa-timer".to_string()),
            remote_resources,
            notify_webhook: get("TIMER_NOTIFY_WEBHOOK"),
        })
    }

    pub fn manifest(&self) -> CacheManifest {
        CacheManifest {
            remote: self.remote_resources.clone(),
            ..CacheManifest::default()
        }
    }

    pub fn notification_icon(&self) -> String {
        format!("{}assets/icon.svg", self.base_path)
    }
}

fn parse<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err| Error::Config(format!("{key}: {err}"))),
        None => Ok(default),
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/state.json"));
        assert_eq!(config.base_path, "/pwa-timer/");
        assert_eq!(config.host_mode, HostMode::Shared);
        assert_eq!(config.poll_interval, Duration::from_millis(16));
        assert_eq!(config.update_check_interval, Some(Duration::from_secs(60)));
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.remote_resources.len(), 2);
        assert!(config.notify_webhook.is_none());
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("PORT", "9000"),
            ("TIMER_BASE_PATH", "timer"),
            ("TIMER_HOST_MODE", "per-observer"),
            ("TIMER_UPDATE_CHECK_SECS", "0"),
            ("TIMER_REMOTE_RESOURCES", ""),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.base_path, "/timer/");
        assert_eq!(config.host_mode, HostMode::PerObserver);
        assert_eq!(config.update_check_interval, None);
        assert!(config.remote_resources.is_empty());
        assert!(config.manifest().remote.is_empty());
        assert_eq!(config.notification_icon(), "/timer/assets/icon.svg");
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(config(&[("PORT", "eighty")]), Err(Error::Config(_))));
        assert!(matches!(
            config(&[("TIMER_HOST_MODE", "sometimes")]),
            Err(Error::Config(_))
        ));
    }
}
