use crate::errors::{AppError, messages};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use core_config::{ConfigError, FromEnv, env_parse_or};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Requests allowed per client address within `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    /// Key clients on the first `X-Forwarded-For` hop instead of the peer
    /// address. Only safe behind a proxy that overwrites the header.
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(3600),
            trust_proxy: false,
        }
    }
}

impl FromEnv for RateLimitConfig {
    /// - RATE_LIMIT_MAX: defaults to 100
    /// - RATE_LIMIT_WINDOW_SECS: defaults to 3600
    /// - RATE_LIMIT_TRUST_PROXY: defaults to false
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let max_requests = env_parse_or("RATE_LIMIT_MAX", defaults.max_requests)?;
        let window_secs = env_parse_or("RATE_LIMIT_WINDOW_SECS", defaults.window.as_secs())?;
        let trust_proxy = env_parse_or("RATE_LIMIT_TRUST_PROXY", defaults.trust_proxy)?;

        if max_requests == 0 || window_secs == 0 {
            return Err(ConfigError::ParseError {
                key: "RATE_LIMIT_MAX".to_string(),
                details: "limit and window must both be positive".to_string(),
            });
        }

        Ok(Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            trust_proxy,
        })
    }
}

/// Per-IP limiter shared by every request that passes through [`rate_limit`].
#[derive(Clone)]
pub struct ClientRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    trust_proxy: bool,
}

impl ClientRateLimiter {
    /// The full `max_requests` budget is available up front and refills evenly
    /// across the window.
    pub fn new(config: RateLimitConfig) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::ParseError {
            key: "RATE_LIMIT_MAX".to_string(),
            details: "limit and window must both be positive".to_string(),
        };

        let burst = NonZeroU32::new(config.max_requests).ok_or_else(invalid)?;
        let quota = Quota::with_period(config.window / config.max_requests)
            .ok_or_else(invalid)?
            .allow_burst(burst);

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            trust_proxy: config.trust_proxy,
        })
    }

    /// Returns how long the client must wait when over the limit.
    pub fn check(&self, client: &str) -> Result<(), Duration> {
        self.limiter
            .check_key(&client.to_string())
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    /// Number of client keys currently held.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    /// Forget clients whose quota has fully refilled.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Prune every `every` until the limiter is dropped. Needs a tokio runtime.
    pub fn spawn_pruning(&self, every: Duration) -> JoinHandle<()> {
        let limiter: Weak<DefaultKeyedRateLimiter<String>> = Arc::downgrade(&self.limiter);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                limiter.retain_recent();
                limiter.shrink_to_fit();
                tracing::debug!(clients = limiter.len(), "rate limiter pruned");
            }
        })
    }

    fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        client_key(headers, peer, self.trust_proxy)
    }
}

/// Resolves the client address. The first `X-Forwarded-For` hop is used only
/// when `trust_proxy` is set; otherwise the peer address decides.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = trust_proxy
        .then(|| headers.get("x-forwarded-for"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string);

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware answering 429 once a client exhausts its quota.
pub async fn rate_limit(
    State(limiter): State<ClientRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = limiter.client_key(request.headers(), peer);

    match limiter.check(&client) {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            tracing::warn!(%client, retry_after_secs = wait.as_secs(), "rate limit exceeded");
            let mut response =
                AppError::TooManyRequests(messages::TOO_MANY_REQUESTS.to_string()).into_response();
            if let Ok(value) = HeaderValue::from_str(&wait.as_secs().max(1).to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
    }
}
