//! Observability hooks for token grants and directory requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `azure_directory.call` with the `call`
//!   (`token_grant` or `request`) and `stage` (call site) fields. [`TracingObserver`] also
//!   logs classified service errors through `tracing` events.
//! - Enable `metrics` to increment the `azure_directory_call_total` counter for every
//!   attempt/success/failure, labeled by `call` + `outcome`.

mod metrics;
mod observer;
mod tracing;

pub use metrics::*;
pub use observer::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outbound call kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Client-credential grant against the authority.
	TokenGrant,
	/// Authenticated directory request against the graph.
	Request,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::TokenGrant => "token_grant",
			CallKind::Request => "request",
		}
	}

	/// Endpoint family contacted by this call, used in transport errors.
	pub const fn endpoint(self) -> &'static str {
		match self {
			CallKind::TokenGrant => "authority",
			CallKind::Request => "graph",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a client helper.
	Attempt,
	/// Successful completion, including classified service errors.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
