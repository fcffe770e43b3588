use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Total request timeout applied to every outbound provider call
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Freshness window for provider photos expected to churn
    pub freshness_short_secs: u64,
    /// Freshness window for static CDN-hosted assets
    pub freshness_long_secs: u64,
    /// How often the background sweep reclaims hard-expired entries
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per provider per window
    pub quota: u32,
    /// Fixed window length in seconds
    pub window_secs: u64,
    /// When true (the conservative default), cache hits consume quota too;
    /// when false only paths that would make an outbound call are counted
    pub count_cache_hits: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub google: ProviderConfig,
    pub unsplash: ProviderConfig,
    pub pexels: ProviderConfig,
    pub tripadvisor: ProviderConfig,
    pub flickr: ProviderConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// A provider is usable only when explicitly enabled AND credentialed
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            http: HttpConfig {
                request_timeout_secs: 15,
                user_agent: format!("photo-proxy/{}", env!("CARGO_PKG_VERSION")),
            },
            cache: CacheConfig {
                freshness_short_secs: 3600,
                freshness_long_secs: 86400,
                sweep_interval_secs: 300,
            },
            rate_limit: RateLimitConfig {
                quota: 60,
                window_secs: 60,
                count_cache_hits: true,
            },
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        let mut config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_file, contents)?;
            default_config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Credentials and enable flags may come from the environment instead of
    /// (or overriding) the config file
    fn apply_env_overrides(&mut self) {
        override_provider(&mut self.providers.google, "GOOGLE", "GOOGLE_MAPS_API_KEY");
        override_provider(
            &mut self.providers.unsplash,
            "UNSPLASH",
            "UNSPLASH_ACCESS_KEY",
        );
        override_provider(&mut self.providers.pexels, "PEXELS", "PEXELS_API_KEY");
        override_provider(
            &mut self.providers.tripadvisor,
            "TRIPADVISOR",
            "TRIPADVISOR_API_KEY",
        );
        override_provider(&mut self.providers.flickr, "FLICKR", "FLICKR_API_KEY");
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }

    pub fn freshness_short(&self) -> Duration {
        Duration::from_secs(self.cache.freshness_short_secs)
    }

    pub fn freshness_long(&self) -> Duration {
        Duration::from_secs(self.cache.freshness_long_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit.window_secs)
    }
}

fn override_provider(provider: &mut ProviderConfig, name: &str, key_var: &str) {
    if let Ok(key) = std::env::var(key_var) {
        if !key.is_empty() {
            provider.api_key = Some(key);
        }
    }
    if let Ok(flag) = std::env::var(format!("PHOTO_PROXY_{name}_ENABLED")) {
        provider.enabled = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_needs_flag_and_credentials() {
        let mut provider = ProviderConfig::default();
        assert!(!provider.is_usable());

        provider.enabled = true;
        assert!(!provider.is_usable());

        provider.api_key = Some(String::new());
        assert!(!provider.is_usable());

        provider.api_key = Some("key".to_string());
        assert!(provider.is_usable());
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.rate_limit.quota, config.rate_limit.quota);
        assert!(parsed.rate_limit.count_cache_hits);
    }
}
