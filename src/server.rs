use std::{net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{Extension, Router, routing::get};
use tokio::sync::{
    Mutex,
    oneshot::{self, error::RecvError},
};

use crate::{
    api::{self, CallbackResult, CallbackState},
    config::Config,
    error::{AuthError, ConfigError},
};

/// How long a finished listener gets to drain before it is aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Receives the authorization redirect.
#[async_trait]
pub trait CallbackListener: Send + Sync {
    /// Blocks until a redirect carrying `expected_state` arrives or `timeout`
    /// elapses. The listener is closed before this returns.
    async fn wait_for_code(&self, expected_state: &str, timeout: Duration)
    -> Result<String, AuthError>;
}

/// HTTP listener on the loopback address of the registered redirect URI.
#[derive(Debug, Clone)]
pub struct LoopbackListener {
    addr: SocketAddr,
    path: String,
}

impl LoopbackListener {
    pub fn new(addr: SocketAddr, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self { addr, path }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(config.callback_addr()?, config.callback_path()))
    }
}

#[async_trait]
impl CallbackListener for LoopbackListener {
    async fn wait_for_code(
        &self,
        expected_state: &str,
        timeout: Duration,
    ) -> Result<String, AuthError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| AuthError::CallbackBind(format!("{}: {}", self.addr, e)))?;

        let (tx, rx) = oneshot::channel::<CallbackResult>();
        let state = CallbackState {
            expected_state: expected_state.to_string(),
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        let app = Router::new()
            .route(&self.path, get(api::callback))
            .layer(Extension(state));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });
        let abort = server.abort_handle();
        tracing::debug!(addr = %self.addr, path = %self.path, "callback listener started");

        let received = tokio::time::timeout(timeout, rx).await.ok();

        let _ = shutdown_tx.send(());
        let mut failure = None;
        match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
            Ok(Ok(Err(e))) => {
                tracing::warn!(error = %e, "callback listener failed");
                failure = Some(e.to_string());
            }
            Ok(_) => {}
            Err(_) => {
                tracing::warn!("callback listener did not drain in time, aborting it");
                abort.abort();
            }
        }
        tracing::debug!("callback listener stopped");

        settle(received, timeout, self.addr, failure)
    }
}

/// Turns what the wait produced into the caller's result.
///
/// `received` is `None` when the timeout elapsed. A closed channel means the
/// server went away before any redirect, which is a listener failure.
fn settle(
    received: Option<Result<CallbackResult, RecvError>>,
    timeout: Duration,
    addr: SocketAddr,
    failure: Option<String>,
) -> Result<String, AuthError> {
    match received {
        Some(Ok(CallbackResult::Code(code))) => Ok(code),
        Some(Ok(CallbackResult::Denied(reason))) => Err(AuthError::AuthorizationDenied(reason)),
        Some(Err(_)) => Err(AuthError::CallbackBind(format!(
            "{}: listener stopped before a redirect arrived{}",
            addr,
            failure.map(|e| format!(" ({e})")).unwrap_or_default()
        ))),
        None => Err(AuthError::CallbackTimeout(timeout.as_secs())),
    }
}
