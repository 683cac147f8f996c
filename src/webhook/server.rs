//! HTTP server receiving GitHub webhook deliveries

use crate::error::Result;
use crate::webhook::payload::parse_push_event;
use crate::webhook::signature::{SIGNATURE_HEADER, WebhookVerifier};
use crate::workflow::WorkflowRunner;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

/// Header naming the event type
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the unique delivery id
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Address to bind
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Path webhook deliveries are POSTed to
    pub webhook_path: String,
    /// Maximum workflow runs in flight at once
    pub max_in_flight: usize,
    /// Timeout for reading and answering one inbound request
    pub request_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            webhook_path: "/api/webhook".to_string(),
            max_in_flight: 16,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerSettings {
    /// Socket address to bind
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Longest a delivery waits for a free workflow slot, unless the request
/// timeout forces a shorter wait
const DEFAULT_PERMIT_WAIT: Duration = Duration::from_secs(5);

/// Shared state behind the webhook route
///
/// Cheap to clone; every clone shares the runner and the in-flight limit.
#[derive(Clone)]
pub struct WebhookState {
    runner: WorkflowRunner,
    verifier: Arc<WebhookVerifier>,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    permit_wait: Duration,
}

impl WebhookState {
    /// Create state allowing at most `max_in_flight` concurrent workflow runs
    pub fn new(runner: WorkflowRunner, verifier: WebhookVerifier, max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            runner,
            verifier: Arc::new(verifier),
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            permit_wait: DEFAULT_PERMIT_WAIT,
        }
    }

    /// Override how long a delivery may wait for a free slot before it is
    /// answered with 503
    #[must_use]
    pub fn with_permit_wait(mut self, wait: Duration) -> Self {
        self.permit_wait = wait;
        self
    }

    /// Wait until every dispatched workflow run has finished
    pub async fn drain(&self) {
        let permits = u32::try_from(self.max_in_flight).unwrap_or(u32::MAX);
        // Only fails if the semaphore is closed, and it never is
        if let Ok(all) = self.permits.acquire_many(permits).await {
            drop(all);
        }
    }
}

/// Create the application router
///
/// The slot wait is capped at half the request timeout so a busy server
/// answers 503 itself instead of having the delivery cut off by the timeout
/// layer.
pub fn create_router(mut state: WebhookState, settings: &ServerSettings) -> Router {
    state.permit_wait = state.permit_wait.min(settings.request_timeout / 2);

    Router::new()
        .route("/healthz", get(health_check))
        .route(&settings.webhook_path, post(receive_webhook))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            settings.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn reply(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": message }))).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn receive_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery_id = header_str(&headers, DELIVERY_HEADER).map(ToString::to_string);

    if let Err(e) = state
        .verifier
        .verify(&body, header_str(&headers, SIGNATURE_HEADER))
    {
        warn!(delivery = ?delivery_id, "Error processing request: {e}");
        return reply(StatusCode::UNAUTHORIZED, "invalid signature");
    }

    let Some(event_name) = header_str(&headers, EVENT_HEADER) else {
        warn!(delivery = ?delivery_id, "delivery has no event header");
        return reply(StatusCode::BAD_REQUEST, "missing event type");
    };

    if event_name != "push" {
        debug!(delivery = ?delivery_id, event = event_name, "ignoring event");
        return reply(StatusCode::OK, "ignored");
    }

    let event = match parse_push_event(&body, delivery_id) {
        Ok(event) => event,
        Err(e) => {
            warn!("Error processing request: {e}");
            return reply(StatusCode::BAD_REQUEST, "invalid payload");
        }
    };

    info!(
        delivery = ?event.delivery_id,
        repo = %event.target(),
        git_ref = %event.git_ref,
        "received push event"
    );

    // Waiting here is the backpressure: GitHub's request stays open until
    // a slot frees up or the wait runs out.
    let permit = match timeout(state.permit_wait, state.permits.clone().acquire_owned()).await {
        Ok(Ok(permit)) => permit,
        Ok(Err(_)) => {
            error!(delivery = ?event.delivery_id, "dispatcher closed, dropping delivery");
            return reply(StatusCode::SERVICE_UNAVAILABLE, "shutting down");
        }
        Err(_) => {
            warn!(
                delivery = ?event.delivery_id,
                repo = %event.target(),
                git_ref = %event.git_ref,
                in_flight = state.max_in_flight,
                "no free workflow slot within {:?}, rejecting delivery",
                state.permit_wait
            );
            return reply(StatusCode::SERVICE_UNAVAILABLE, "busy");
        }
    };

    let runner = state.runner.clone();
    tokio::spawn(async move {
        let _permit = permit;
        runner.handle(&event).await;
    });

    reply(StatusCode::ACCEPTED, "accepted")
}

/// Serve `router` on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
