use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        let mut guard = self.manager.write().await;
        *guard = None;
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Fixed-window counter per scope. Without a live connection every call is allowed.
    pub(crate) async fn rate_limit(
        &self,
        scope: &RateScope<'_>,
        limit: u64,
        window_seconds: u64,
    ) -> Result<bool, RedisError> {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return Ok(true);
        };

        let script = redis::Script::new(
            r#"
            local current = redis.call("INCR", KEYS[1])
            if current == 1 then
                redis.call("EXPIRE", KEYS[1], ARGV[1])
            end
            return current
        "#,
        );

        let current: i64 = script
            .key(scope.key())
            .arg(window_seconds as i64)
            .invoke_async(&mut manager)
            .await?;

        Ok(current <= limit as i64)
    }

    /// Like `rate_limit`, but a Redis failure is logged and the call allowed.
    pub(crate) async fn allow(&self, scope: &RateScope<'_>, limit: u64, window_seconds: u64) -> bool {
        match self.rate_limit(scope, limit, window_seconds).await {
            Ok(allowed) => {
                if !allowed {
                    tracing::info!(scope = scope.label(), "Rate limit exceeded");
                }
                allowed
            }
            Err(err) => {
                tracing::warn!(scope = scope.label(), error = %err, "Rate limiter unavailable");
                true
            }
        }
    }
}

/// What a rate-limit counter is keyed on.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RateScope<'a> {
    Signup { email: &'a str },
    Login { email: &'a str },
    Classify { user_id: &'a str },
}

impl RateScope<'_> {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Signup { .. } => "signup",
            Self::Login { .. } => "login",
            Self::Classify { .. } => "classify",
        }
    }

    pub(crate) fn key(&self) -> String {
        let subject = match self {
            Self::Signup { email } | Self::Login { email } => email,
            Self::Classify { user_id } => user_id,
        };
        format!("rate-limit:{}:{subject}", self.label())
    }
}
