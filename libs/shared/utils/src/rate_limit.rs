use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use shared_models::error::AppError;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    capacity: f64,
    refill_per_sec: f64,
}

impl TokenBucket {
    fn new(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute.max(1) as f64;
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
            capacity,
            refill_per_sec: capacity / 60.0,
        }
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn seconds_until_next_token(&self) -> u64 {
        if self.tokens >= 1.0 {
            0
        } else {
            ((1.0 - self.tokens) / self.refill_per_sec).ceil() as u64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited { retry_after: u64 },
}

/// Per-IP token buckets: each IP may burst up to the per-minute limit and
/// regains capacity continuously.
#[derive(Clone)]
pub struct RateLimiter {
    requests_per_minute: u32,
    trust_proxy_headers: bool,
    buckets: Arc<RwLock<HashMap<IpAddr, TokenBucket>>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            trust_proxy_headers: false,
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Keys buckets on proxy headers instead of the socket peer.
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let mut buckets = self.buckets.write().await;

        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(self.requests_per_minute));

        if bucket.try_acquire() {
            RateLimitResult::Allowed
        } else {
            RateLimitResult::Limited {
                retry_after: bucket.seconds_until_next_token().max(1),
            }
        }
    }

    /// Drops buckets idle for longer than `idle`.
    pub async fn cleanup(&self, idle: Duration) {
        let mut buckets = self.buckets.write().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| now.duration_since(bucket.last_refill) < idle);
    }

    pub async fn tracked_ips(&self) -> usize {
        self.buckets.read().await.len()
    }
}

/// Sweeps every limiter on a fixed interval, dropping buckets idle for a
/// whole interval.
pub fn spawn_cleanup(limiters: Vec<RateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            for limiter in &limiters {
                limiter.cleanup(every).await;
            }
            debug!("Rate limiter sweep finished");
        }
    })
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&request, limiter.trust_proxy_headers);

    match limiter.check(ip).await {
        RateLimitResult::Allowed => Ok(next.run(request).await),
        RateLimitResult::Limited { retry_after } => {
            warn!(
                client_ip = %ip,
                path = %request.uri().path(),
                retry_after,
                "Rate limit exceeded"
            );
            Err(AppError::TooManyRequests { retry_after })
        }
    }
}

/// Proxy headers first when trusted, then the socket address, then loopback.
pub fn client_ip(request: &Request, trust_proxy_headers: bool) -> IpAddr {
    let header_ip = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    let forwarded = if trust_proxy_headers {
        header_ip("x-forwarded-for").or_else(|| header_ip("x-real-ip"))
    } else {
        None
    };

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
