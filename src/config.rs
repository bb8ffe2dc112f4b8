//! Environment-driven process settings.
//!
//! Every knob has a default good enough for local runs; production
//! deployments override through the environment. Queue and bucket names
//! derive from the environment name so parallel deployments never share
//! state.

use std::time::Duration;

use crate::tasks::flight::api::SearchApiConfig;
use crate::tasks::flight::fanout::FanoutLimits;

/// Process configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Deployment environment name (`local`, `stg`, `prod`).
    pub env_name: String,
    /// HTTP bind address.
    pub bind_addr: String,
    /// Prefix of every API route.
    pub api_prefix: String,
    /// Header carrying the API key.
    pub api_key_header: String,
    /// Expected API key value.
    pub api_key: String,
    /// Name of the jobs queue.
    pub jobs_queue_name: String,
    /// Name of the results bucket.
    pub jobs_bucket: String,
    /// Results time-to-live; also the presigned-URL expiry.
    pub results_expire: Duration,
    /// Result store backend: `memory` or `s3` (the latter needs the `aws`
    /// feature).
    pub store_backend: String,
    /// Run the executor inside the serving process (local mode).
    pub inline_executor: bool,
    /// Worker poll interval between empty queue receives.
    pub worker_poll_interval: Duration,

    /// Search API base URL.
    pub search_api_url: String,
    /// Search API OAuth client id.
    pub search_api_key: String,
    /// Search API OAuth client secret.
    pub search_api_secret: String,
    /// Per-request search timeout.
    pub search_timeout: Duration,
    /// Delay between token acquisition and the first dispatch.
    pub token_settle: Duration,
    /// Maximum search requests in flight simultaneously. The provider's
    /// published ceiling is 150; keep a comfortable buffer under it.
    pub max_requests_at_once: u32,
    /// Maximum search requests newly started per second.
    pub max_requests_per_second: u32,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

impl Settings {
    /// Loads settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let env_name = env_or("ENV_NAME", "local");
        Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8000"),
            api_prefix: env_or("API_PREFIX", "/api"),
            api_key_header: env_or("API_KEY_HEADER_NAME", "X-Hub-Auth"),
            api_key: env_or(
                "API_KEY_HEADER_VALUE",
                &uuid::Uuid::new_v4().simple().to_string(),
            ),
            jobs_queue_name: env_or("JOBS_QUEUE_NAME", &format!("task-hub-jobs-{env_name}")),
            jobs_bucket: env_or("JOBS_BUCKET", &format!("task-hub-results-{env_name}")),
            results_expire: Duration::from_secs(env_parse("JOBS_RESULTS_EXPIRE", 3600 * 24)),
            store_backend: env_or("STORE_BACKEND", "memory"),
            inline_executor: env_parse("INLINE_EXECUTOR", env_name == "local"),
            worker_poll_interval: Duration::from_millis(env_parse("WORKER_POLL_INTERVAL_MS", 1000)),
            search_api_url: env_or("SEARCH_API_URL", "https://travel.api.example.com"),
            search_api_key: env_or("SEARCH_API_KEY", ""),
            search_api_secret: env_or("SEARCH_API_SECRET", ""),
            search_timeout: Duration::from_secs(env_parse("SEARCH_TIMEOUT_SECS", 10)),
            token_settle: Duration::from_millis(env_parse("TOKEN_SETTLE_MS", 500)),
            max_requests_at_once: env_parse("MAX_REQUESTS_AT_ONCE", 70),
            max_requests_per_second: env_parse("MAX_REQUESTS_PER_SECOND", 70),
            env_name,
        }
    }

    /// Search API connection settings.
    pub fn search_api(&self) -> SearchApiConfig {
        SearchApiConfig {
            base_url: self.search_api_url.clone(),
            api_key: self.search_api_key.clone(),
            api_secret: self.search_api_secret.clone(),
            timeout: self.search_timeout,
        }
    }

    /// Fan-out limiter ceilings.
    pub fn fanout_limits(&self) -> FanoutLimits {
        FanoutLimits {
            max_in_flight: self.max_requests_at_once,
            max_per_second: self.max_requests_per_second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_names_from_env_name() {
        // Runs without the variables set in CI; only inspect defaults that
        // no test environment overrides.
        let settings = Settings::from_env();
        assert!(settings.jobs_queue_name.starts_with("task-hub-jobs-"));
        assert!(settings.jobs_bucket.starts_with("task-hub-results-"));
        assert_eq!(settings.fanout_limits().max_in_flight, 70);
        assert_eq!(settings.results_expire, Duration::from_secs(86_400));
    }
}
