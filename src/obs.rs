//! Observability helpers for token acquisition and authorized calls.
//!
//! - Every executor call runs inside a `tracing` span named `oauth2_cc_broker.call` carrying the
//!   `registration` id and the `stage` (call site). Token values never appear in fields.
//! - With the `metrics` feature, the `oauth2_cc_broker_operation_total` counter is incremented for
//!   every attempt, success, retry and failure, labeled by `operation` + `outcome`.
//! - With the `server` feature, [`init_tracing`] installs the process-wide subscriber.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Operations observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Client-credentials grant against the token endpoint.
	Acquire,
	/// Authorized call against a resource server.
	Execute,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Acquire => "acquire",
			Operation::Execute => "execute",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to the operation.
	Attempt,
	/// Successful completion.
	Success,
	/// The resource server answered 401 and the call is being retried.
	Retry,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Retry => "retry",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
