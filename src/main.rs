//! `secret-words-service`: serves `/api/words` through the client-credentials executor.

// std
use std::sync::Arc;
// crates.io
use clap::Parser;
use color_eyre::{Result, eyre::WrapErr};
use tokio::net::TcpListener;
// self
use oauth2_cc_broker::{
	acquire::ReqwestTokenAcquirer,
	api::{self, AppState},
	cli::Cli,
	clock::{Clock, SystemClock},
	config::AppConfig,
	error::ConfigError,
	executor::AuthorizedRequestExecutor,
	http::ReqwestHttpClient,
	obs,
	secret_words::SecretWordsClient,
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();

	obs::init_tracing(cli.json_logs)?;

	let config = AppConfig::load(&cli.config)?.with_bind(cli.bind);
	let registrations = config.registrations()?;
	let registration = config.secret_words_client.registration.clone();

	if registrations.get(&registration).is_none() {
		return Err(ConfigError::UnknownRegistration { registration: registration.to_string() }.into());
	}

	let http_client = ReqwestHttpClient::from_settings(config.http.timeout())?;
	let clock: Arc<dyn Clock> = Arc::new(SystemClock);
	let acquirer = ReqwestTokenAcquirer::new(http_client.clone()).with_clock(clock.clone());
	let executor = AuthorizedRequestExecutor::new(
		registrations,
		Arc::new(MemoryStore::new()),
		Arc::new(acquirer),
		Arc::new(http_client),
	)
	.with_clock(clock.clone());
	let client =
		SecretWordsClient::new(executor, registration, config.secret_words_client.url.clone());
	let bind = config.server.bind;
	let listener =
		TcpListener::bind(bind).await.wrap_err_with(|| format!("Failed to bind {bind}."))?;

	api::serve(listener, api::router(AppState { client, clock })).await?;

	Ok(())
}
