//! Per-client request limiting.
//!
//! Every request, static widget assets included, counts against the
//! caller's IP address. Over-limit requests get `429` with the usual
//! `{ "success": false, "error": ... }` body.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};

use crate::error::ApiError;

/// How often idle per-IP state is dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Keyed limiter allowing a fixed number of requests per IP per minute.
pub struct ClientRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl std::fmt::Debug for ClientRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRateLimiter")
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}

impl ClientRateLimiter {
    /// `None` when `per_minute` is 0, meaning no limit.
    pub fn per_minute(per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(per_minute)?;
        Some(Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
        })
    }

    /// Record one request from `client`. `false` when over the limit.
    pub fn check(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }

    /// Forget clients whose quota has fully replenished.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Prune idle clients in the background for the life of the process.
    pub fn spawn_pruner(self: &Arc<Self>) {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                limiter.prune();
                debug!(tracked_clients = limiter.limiter.len(), "Pruned rate limiter");
            }
        });
    }
}

/// Peer address of the connection. Requests without connection info
/// (in-process callers) share one bucket.
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware rejecting requests over the caller's quota.
pub async fn limit_by_ip(
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request);
    if !limiter.check(client) {
        warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        return ApiError::TooManyRequests.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware;
    use axum::Router;

    async fn limited_app(per_minute: u32) -> Router {
        let (_app, state, _db) = test_app().await;
        let limiter = Arc::new(ClientRateLimiter::per_minute(per_minute).unwrap());
        crate::routes::router()
            .layer(middleware::from_fn_with_state(limiter, limit_by_ip))
            .with_state(state)
    }

    fn health_from(ip: [u8; 4]) -> Request<Body> {
        let mut request = get("/api/health");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
        request
    }

    #[tokio::test]
    async fn test_rejects_after_limit() {
        let app = limited_app(100).await;

        for _ in 0..100 {
            let (status, _) = send(&app, health_from([10, 0, 0, 1])).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, health_from([10, 0, 0, 1])).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Too many requests");
    }

    #[tokio::test]
    async fn test_limit_is_per_client() {
        let app = limited_app(2).await;

        send(&app, health_from([10, 0, 0, 1])).await;
        send(&app, health_from([10, 0, 0, 1])).await;
        let (status, _) = send(&app, health_from([10, 0, 0, 1])).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, _) = send(&app, health_from([10, 0, 0, 2])).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_zero_disables_limit() {
        assert!(ClientRateLimiter::per_minute(0).is_none());
    }
}
