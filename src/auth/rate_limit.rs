use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::AppError;
use crate::AppState;

/// Which credential endpoint an attempt was made against. Sign-ups and
/// sign-ins are counted separately so a burst of failed logins does not
/// lock the same client out of registering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthRoute {
    Register,
    Login,
}

impl AuthRoute {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "/api/register" => Some(Self::Register),
            "/api/login" => Some(Self::Login),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
        }
    }
}

type AttemptKey = (IpAddr, AuthRoute);

struct AttemptWindow {
    attempts: u32,
    opened_at: Instant,
}

/// Fixed-window throttle on credential attempts, per client IP and route.
/// State is in memory, so limits hold per instance only.
#[derive(Clone)]
pub struct AuthThrottle {
    windows: Arc<Mutex<HashMap<AttemptKey, AttemptWindow>>>,
    max_attempts: u32,
    window: Duration,
}

impl AuthThrottle {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_attempts: max_attempts.max(1),
            window: window.max(Duration::from_millis(1)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.auth_max_attempts,
            Duration::from_secs(config.auth_window_secs),
        )
    }

    /// Counts one attempt. `Ok(remaining)` if allowed, `Err(retry_after)` if
    /// the window is exhausted; refused attempts are not counted.
    pub async fn attempt(&self, ip: IpAddr, route: AuthRoute) -> Result<u32, Duration> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let slot = windows.entry((ip, route)).or_insert(AttemptWindow {
            attempts: 0,
            opened_at: now,
        });

        let elapsed = now.duration_since(slot.opened_at);
        if elapsed >= self.window {
            slot.attempts = 0;
            slot.opened_at = now;
        } else if slot.attempts >= self.max_attempts {
            return Err(self.window - elapsed);
        }

        slot.attempts += 1;
        Ok(self.max_attempts - slot.attempts)
    }

    /// Drops windows that closed at least one full window ago.
    pub async fn prune(&self) {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        let keep_for = self.window * 2;

        windows.retain(|_, slot| now.duration_since(slot.opened_at) < keep_for);
    }

    pub fn spawn_pruning(&self) {
        let throttle = self.clone();
        let every = (self.window * 5).max(Duration::from_secs(60));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                throttle.prune().await;
            }
        });
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Middleware on register and login.
pub async fn throttle_auth(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(route) = AuthRoute::from_path(req.uri().path()) else {
        return Ok(next.run(req).await);
    };
    let ip = addr.ip();

    match state.auth_throttle.attempt(ip, route).await {
        Ok(remaining) => {
            tracing::debug!(%ip, route = route.as_str(), remaining, "Auth attempt allowed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                %ip,
                route = route.as_str(),
                retry_after_secs = retry_after.as_secs(),
                "Too many auth attempts"
            );
            Err(AppError::RateLimited)
        }
    }
}
