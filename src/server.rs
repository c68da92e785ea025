//! HTTP surface: seating generation and health check.

use crate::data::{SeatingInput, SeatingOutput};
use crate::error::SeatingError;
use crate::solver;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::MutexGuard;

type SessionLocks = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// One lock per session id so regenerations of the same session never overlap.
#[derive(Clone, Default)]
pub struct AppState {
    sessions: SessionLocks,
}

impl AppState {
    fn session_slot(&self, session_id: &str) -> SessionSlot {
        let mut sessions = lock_sessions(&self.sessions);
        let lock = sessions.entry(session_id.to_string()).or_default().clone();
        SessionSlot {
            sessions: self.sessions.clone(),
            session_id: session_id.to_string(),
            lock,
        }
    }

    #[cfg(test)]
    fn active_sessions(&self) -> usize {
        lock_sessions(&self.sessions).len()
    }
}

fn lock_sessions(
    sessions: &SessionLocks,
) -> std::sync::MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
    sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A handle on one session's lock; the map entry goes away with the last handle.
struct SessionSlot {
    sessions: SessionLocks,
    session_id: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl SessionSlot {
    async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        let mut sessions = lock_sessions(&self.sessions);
        // the map and this slot hold the only references
        if sessions
            .get(&self.session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 2)
        {
            sessions.remove(&self.session_id);
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    error: String,
}

pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl From<SeatingError> for ApiError {
    fn from(err: SeatingError) -> Self {
        let status = match err {
            SeatingError::Config(_) => StatusCode::BAD_REQUEST,
            SeatingError::Infeasible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SeatingError::InternalInvariant(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            body: ErrorBody {
                kind: err.kind(),
                error: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(input): Json<SeatingInput>,
) -> Result<Json<SeatingOutput>, ApiError> {
    let slot = state.session_slot(&input.session_id);
    let _guard = slot.acquire().await;

    let session_id = input.session_id.clone();
    let result = tokio::task::spawn_blocking(move || solver::solve(&input))
        .await
        .map_err(|e| {
            error!("Seating task for session '{}' failed: {}", session_id, e);
            ApiError::from(SeatingError::InternalInvariant(format!(
                "seating task failed: {}",
                e
            )))
        })?;

    match result {
        Ok(output) => Ok(Json(output)),
        Err(e) => {
            info!("Seating for session '{}' rejected: {}", session_id, e);
            Err(e.into())
        }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router() -> Router {
    router_with(AppState::default())
}

pub fn router_with(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/seating/generate", post(generate_handler))
        .with_state(state)
}

pub async fn run_server(bind: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_session_shares_a_lock() {
        let state = AppState::default();
        let a = state.session_slot("exam-1");
        let b = state.session_slot("exam-1");
        let c = state.session_slot("exam-2");
        assert!(Arc::ptr_eq(&a.lock, &b.lock));
        assert!(!Arc::ptr_eq(&a.lock, &c.lock));
        assert_eq!(state.active_sessions(), 2);
    }

    #[test]
    fn last_slot_removes_the_session() {
        let state = AppState::default();
        let a = state.session_slot("exam-1");
        let b = state.session_slot("exam-1");
        drop(a);
        assert_eq!(state.active_sessions(), 1);
        drop(b);
        assert_eq!(state.active_sessions(), 0);
    }

    #[tokio::test]
    async fn finished_request_leaves_no_session_behind() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let state = AppState::default();
        let body = r#"{"sessionId":"exam-9","students":[],"relationships":[],"rooms":[{"id":1,"capacity":4,"columns":2,"rows":2}]}"#;
        let request = Request::post("/v1/seating/generate")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = router_with(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.active_sessions(), 0);
    }

    #[test]
    fn error_kinds_map_to_status_codes() {
        use crate::error::{ConfigError, InfeasibleError};

        let config = ApiError::from(SeatingError::from(ConfigError::NoRooms));
        assert_eq!(config.status, StatusCode::BAD_REQUEST);
        assert_eq!(config.body.kind, "configuration");

        let infeasible = ApiError::from(SeatingError::from(InfeasibleError::SearchExhausted));
        assert_eq!(infeasible.status, StatusCode::UNPROCESSABLE_ENTITY);

        let internal = ApiError::from(SeatingError::InternalInvariant("x".into()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
