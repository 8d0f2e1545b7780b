//! # Rate-Limit Middleware
//!
//! Fixed-window per-source-address limiter for the payment routes.
//! Mounted explicitly when configured; the webhook route is never limited
//! (that traffic is the vendor's, gated by signature verification instead).

use crate::handlers::error_response;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use payroute_core::PaymentError;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by source IP
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request from `ip`; `Err` carries seconds until the window
    /// resets when the cap is exceeded.
    pub async fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        // The source address is client-influenced (forwarded header), so
        // expired windows must be dropped or the map grows without bound.
        windows.retain(|_, w| now.duration_since(w.started) < self.window);

        let window = windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });

        if window.count >= self.max_requests {
            let elapsed = now.duration_since(window.started);
            let retry_after = self.window.saturating_sub(elapsed).as_secs().max(1);
            return Err(retry_after);
        }

        window.count += 1;
        Ok(())
    }

    #[cfg(test)]
    async fn tracked_sources(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Source address: the proxy-supplied forwarded header wins, otherwise the
/// peer address from the connection.
fn source_ip(request: &Request) -> IpAddr {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware enforcing the limiter on the routes it is layered onto
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = source_ip(&request);

    if let Err(retry_after_secs) = limiter.check(ip).await {
        warn!("Rate limit exceeded for {}", ip);
        return error_response(&PaymentError::RateLimited { retry_after_secs }).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_enforced_per_ip() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(a).await.is_ok());
        assert!(limiter.check(a).await.is_ok());
        assert!(limiter.check(a).await.is_err());

        // Separate address, separate window
        assert!(limiter.check(b).await.is_ok());
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        let ip: IpAddr = "10.0.0.3".parse().unwrap();

        assert!(limiter.check(ip).await.is_ok());
        assert!(limiter.check(ip).await.is_err());

        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(limiter.check(ip).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_windows_are_evicted() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));

        // Many distinct (spoofable) source addresses, one window each
        for i in 0..500u32 {
            let ip = IpAddr::V4(Ipv4Addr::new(10, 2, (i >> 8) as u8, (i & 0xff) as u8));
            assert!(limiter.check(ip).await.is_ok());
        }
        assert_eq!(limiter.tracked_sources().await, 500);

        tokio::time::sleep(Duration::from_millis(15)).await;

        // The next check sweeps every expired window; only the fresh
        // address remains tracked.
        let ip: IpAddr = "192.0.2.1".parse().unwrap();
        assert!(limiter.check(ip).await.is_ok());
        assert_eq!(limiter.tracked_sources().await, 1);
    }
}
