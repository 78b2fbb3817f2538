//! Answer flooding protection
//!
//! Teams type answers on phones in the street; nobody legitimately sends
//! dozens per minute. A fixed-window limiter per team keeps scripted
//! brute-forcing of the accepted answers out.

use crate::config::{parse_or, secs_or, ConfigError};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

/// Rate limiter state
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Map of team id to (request count, window start)
    requests: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    /// Maximum requests per window
    max_requests: u32,
    /// Time window duration
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(30, Duration::from_secs(60)) // 30 answers per minute
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Check if a request should be allowed
    /// Returns true if allowed, false if rate limited
    pub async fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        match requests.get_mut(key) {
            Some((count, window_start)) => {
                if now.duration_since(*window_start) >= self.window {
                    *count = 1;
                    *window_start = now;
                    true
                } else if *count >= self.max_requests {
                    false
                } else {
                    *count += 1;
                    true
                }
            }
            None => {
                requests.insert(key.to_string(), (1, now));
                true
            }
        }
    }

    /// Clean up old entries (call periodically)
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        requests.retain(|_, (_, window_start)| now.duration_since(*window_start) < self.window * 2);
    }

    pub async fn tracked_keys(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// Anti-abuse configuration
#[derive(Debug, Clone, Default)]
pub struct AbuseConfig {
    /// Answer rate limiter (None = disabled)
    pub answer_limiter: Option<RateLimiter>,
}

impl AbuseConfig {
    /// Load config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            var(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let enabled = non_empty("HUNT_ANSWER_RATE_LIMIT")
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(true);

        let answer_limiter = if enabled {
            let max_requests = parse_or(&non_empty, "HUNT_ANSWER_RATE_MAX", 30u32)?;
            let window = secs_or(
                &non_empty,
                "HUNT_ANSWER_RATE_WINDOW_SECS",
                Duration::from_secs(60),
            )?;
            Some(RateLimiter::new(max_requests, window))
        } else {
            tracing::warn!("Answer rate limiting disabled");
            None
        };

        tracing::info!(rate_limit_enabled = enabled, "Anti-abuse config loaded");

        Ok(Self { answer_limiter })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_allows_normal_traffic() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));

        for _ in 0..5 {
            assert!(limiter.check("team").await);
        }
        assert!(!limiter.check("team").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_different_keys() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));

        assert!(limiter.check("team1").await);
        assert!(limiter.check("team1").await);
        assert!(!limiter.check("team1").await);

        // Another team is not affected
        assert!(limiter.check("team2").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_window_reset() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));

        assert!(limiter.check("team").await);
        assert!(limiter.check("team").await);
        assert!(!limiter.check("team").await);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(limiter.check("team").await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_stale_windows() {
        let limiter = RateLimiter::new(2, Duration::from_millis(10));
        limiter.check("team").await;
        assert_eq!(limiter.tracked_keys().await, 1);

        tokio::time::sleep(Duration::from_millis(30)).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked_keys().await, 0);
    }

    #[test]
    fn test_config_from_vars() {
        let config = AbuseConfig::from_vars(|_| None).unwrap();
        assert!(config.answer_limiter.is_some());

        let config = AbuseConfig::from_vars(|key| {
            (key == "HUNT_ANSWER_RATE_LIMIT").then(|| "false".to_string())
        })
        .unwrap();
        assert!(config.answer_limiter.is_none());

        let result = AbuseConfig::from_vars(|key| {
            (key == "HUNT_ANSWER_RATE_MAX").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
