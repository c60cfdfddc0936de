//! In-memory rate limiter: фиксированное окно на IP.

use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

struct Window {
    hits: u32,
    started: Instant,
}

/// Rate limiter для ограничения запросов по IP.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window_secs,
        }
    }

    /// Учесть запрос с ключа; false при превышении лимита окна.
    pub async fn check(&self, key: &str) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        // Таблица не должна расти безгранично: устаревшие окна выбрасываются
        if windows.len() > 1000 {
            let window_secs = self.window_secs;
            windows.retain(|_, w| now.duration_since(w.started).as_secs() < window_secs);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            hits: 0,
            started: now,
        });

        if now.duration_since(window.started).as_secs() >= self.window_secs {
            window.hits = 1;
            window.started = now;
            return true;
        }

        window.hits += 1;
        window.hits <= self.max_requests
    }
}

/// Middleware rate limiting: отклоняет запросы при превышении лимита.
pub async fn rate_limit_middleware(
    rate_limiter: RateLimiter,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let ip = extract_ip(&req);

    if !rate_limiter.check(&ip).await {
        tracing::warn!("Rate limit превышен для IP: {ip}");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(req).await)
}

/// Извлечь IP клиента (учитывает X-Forwarded-For).
pub fn extract_ip<B>(req: &Request<B>) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
