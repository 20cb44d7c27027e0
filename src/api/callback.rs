use std::sync::Arc;

use axum::{Extension, extract::Query, http::StatusCode, response::Html};
use serde::Deserialize;
use tokio::sync::{Mutex, oneshot};

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// What the redirect delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    Code(String),
    Denied(String),
}

/// Shared with the handler; the sender is taken by the first valid request.
#[derive(Clone)]
pub struct CallbackState {
    pub expected_state: String,
    pub sender: Arc<Mutex<Option<oneshot::Sender<CallbackResult>>>>,
}

pub async fn callback(
    Query(params): Query<CallbackParams>,
    Extension(shared_state): Extension<CallbackState>,
) -> (StatusCode, Html<&'static str>) {
    if params.state.as_deref() != Some(shared_state.expected_state.as_str()) {
        tracing::warn!("ignoring callback with unexpected state");
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Unexpected state parameter.</h4><p>Start the login again from the terminal.</p>"),
        );
    }

    let result = match (params.code, params.error) {
        (Some(code), _) => CallbackResult::Code(code),
        (None, Some(error)) => CallbackResult::Denied(error),
        (None, None) => {
            return (
                StatusCode::BAD_REQUEST,
                Html("<h4>Missing authorization code.</h4>"),
            );
        }
    };

    let Some(sender) = shared_state.sender.lock().await.take() else {
        return (
            StatusCode::CONFLICT,
            Html("<h4>Authorization already handled.</h4><p>You can close this window.</p>"),
        );
    };

    let page = match result {
        CallbackResult::Code(_) => {
            Html("<h2>Authentication successful.</h2><p>You can close this window now.</p>")
        }
        CallbackResult::Denied(_) => {
            Html("<h2>Authentication failed.</h2><p>Return to the terminal for details.</p>")
        }
    };
    let _ = sender.send(result);

    (StatusCode::OK, page)
}
