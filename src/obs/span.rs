// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
#[cfg(feature = "server")]
use tracing_subscriber::{
	EnvFilter, fmt,
	layer::SubscriberExt,
	util::{SubscriberInitExt, TryInitError},
};
// self
use crate::{_prelude::*, auth::RegistrationId};

/// Span wrapper used by the executor and acquirer.
#[derive(Clone, Debug)]
pub struct CallSpan {
	span: Span,
}
impl CallSpan {
	/// Creates a new span tagged with the registration id and stage.
	pub fn new(registration: &RegistrationId, stage: &'static str) -> Self {
		let span =
			tracing::info_span!("oauth2_cc_broker.call", registration = %registration, stage);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn in_span<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` and falls back to `info`. `json` switches the fmt layer to
/// structured JSON lines.
#[cfg(feature = "server")]
pub fn init_tracing(json: bool) -> Result<(), TryInitError> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let registry = tracing_subscriber::registry().with(filter);

	if json {
		registry.with(fmt::layer().json().with_current_span(true).with_target(true)).try_init()
	} else {
		registry.with(fmt::layer().with_target(false)).try_init()
	}
}
