// src/config.rs
//
// Client Configuration
//
// Defaults match the development backend. Every value can be overridden
// through MIRROR_PK_* environment variables; a value that fails to parse
// is logged and ignored.

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_ASSET_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;
pub const DEFAULT_UPLOAD_CHUNK_BYTES: usize = 16 * 1024;

/// Cosmetic match progress: `step` percent every `tick_interval`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationConfig {
    pub tick_interval: Duration,
    pub step: u8,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(300),
            step: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: String,

    /// Origin that relative image paths from the API are resolved against
    pub asset_base_url: String,

    pub request_timeout: Duration,

    /// Limit for user-selected files. Camera frames are exempt.
    pub max_upload_bytes: u64,

    /// Visibility flag sent with every score upload
    pub publish_scores: bool,

    /// Granularity of upload progress reports
    pub upload_chunk_bytes: usize,

    pub animation: AnimationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            publish_scores: true,
            upload_chunk_bytes: DEFAULT_UPLOAD_CHUNK_BYTES,
            animation: AnimationConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each key
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("MIRROR_PK_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("MIRROR_PK_ASSET_URL").filter(|v| !v.trim().is_empty()) {
            config.asset_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "MIRROR_PK_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = parse_var::<u64, _>(&lookup, "MIRROR_PK_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = bytes;
        }
        if let Some(public) = lookup("MIRROR_PK_PUBLIC") {
            match parse_bool(&public) {
                Some(flag) => config.publish_scores = flag,
                None => log::warn!("Ignoring MIRROR_PK_PUBLIC={:?}: expected a boolean", public),
            }
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "MIRROR_PK_TICK_MS") {
            if ms == 0 {
                log::warn!("Ignoring MIRROR_PK_TICK_MS=0: interval must be positive");
            } else {
                config.animation.tick_interval = Duration::from_millis(ms);
            }
        }
        if let Some(step) = parse_var::<u8, _>(&lookup, "MIRROR_PK_TICK_STEP") {
            if step == 0 || step > 100 {
                log::warn!("Ignoring MIRROR_PK_TICK_STEP={}: expected 1..=100", step);
            } else {
                config.animation.step = step;
            }
        }

        config
    }

    /// Turn a server image reference into an absolute URL.
    ///
    /// Relative paths such as `/uploads/a.jpg` are prefixed with the asset
    /// origin; absolute URLs pass through unchanged.
    pub fn resolve_image_url(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with("http://") || raw.starts_with("https://") {
            return raw.to_string();
        }
        if raw.starts_with('/') {
            format!("{}{}", self.asset_base_url, raw)
        } else {
            format!("{}/{}", self.asset_base_url, raw)
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
        assert!(config.publish_scores);
        assert_eq!(config.animation.step, 10);
        assert_eq!(config.animation.tick_interval, Duration::from_millis(300));
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("MIRROR_PK_API_URL", "https://api.example.test/v1/"),
            ("MIRROR_PK_TIMEOUT_SECS", "5"),
            ("MIRROR_PK_PUBLIC", "no"),
            ("MIRROR_PK_TICK_STEP", "25"),
        ]));

        assert_eq!(config.api_base_url, "https://api.example.test/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(!config.publish_scores);
        assert_eq!(config.animation.step, 25);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("MIRROR_PK_MAX_UPLOAD_BYTES", "lots"),
            ("MIRROR_PK_PUBLIC", "maybe"),
            ("MIRROR_PK_TICK_MS", "0"),
            ("MIRROR_PK_TICK_STEP", "150"),
        ]));

        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_resolve_image_url() {
        let config = ClientConfig::default();
        assert_eq!(
            config.resolve_image_url("/uploads/a.jpg"),
            "http://localhost:8000/uploads/a.jpg"
        );
        assert_eq!(
            config.resolve_image_url("uploads/a.jpg"),
            "http://localhost:8000/uploads/a.jpg"
        );
        assert_eq!(
            config.resolve_image_url("https://cdn.test/a.jpg"),
            "https://cdn.test/a.jpg"
        );
    }
}
