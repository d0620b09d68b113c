//! Inbound HTTP API built on axum.
//!
//! - `GET /api/words` returns the secret words with a `createdAt` timestamp from the injected
//!   clock. Any failure becomes a 500 with a JSON error body; retries never reach the caller.
//! - `GET /health` answers `{"status":"ok"}`.

// crates.io
use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	clock::Clock,
	secret_words::{SecretWordsClient, SecretWordsDto},
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
	/// Client used by `/api/words`.
	pub client: SecretWordsClient,
	/// Clock stamping `createdAt`.
	pub clock: Arc<dyn Clock>,
}
impl Debug for AppState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppState").field("client", &self.client).finish_non_exhaustive()
	}
}

/// Error wrapper rendered as a JSON 500 response.
#[derive(Debug)]
pub struct ApiError(pub Error);
impl From<Error> for ApiError {
	fn from(e: Error) -> Self {
		Self(e)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = StatusCode::INTERNAL_SERVER_ERROR;

		tracing::error!(
			error = %self.0,
			upstream_status = ?self.0.http_status(),
			"Secret words request failed."
		);

		let body = Json(json!({
			"status": status.as_u16(),
			"error": "Internal Server Error",
			"message": self.0.to_string(),
		}));

		(status, body).into_response()
	}
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/api/words", get(get_words))
		.route("/health", get(health))
		.with_state(state)
}

/// Serves `router` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
	if let Ok(addr) = listener.local_addr() {
		tracing::info!(%addr, "Listening.");
	}

	axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await
}

async fn get_words(State(state): State<AppState>) -> Result<Json<SecretWordsDto>, ApiError> {
	let words = state.client.get_secret_words().await?;

	Ok(Json(SecretWordsDto::from(words, state.clock.now())))
}

async fn health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
	wait_for_shutdown(tokio::signal::ctrl_c()).await
}

async fn wait_for_shutdown<F>(signal: F)
where
	F: Future<Output = std::io::Result<()>>,
{
	match signal.await {
		Ok(()) => tracing::info!("Shutdown signal received."),
		Err(e) => {
			tracing::error!(error = %e, "Failed to listen for the shutdown signal.");

			std::future::pending::<()>().await;
		},
	}
}
