//! Observability helpers for token flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `fitbit_oauth.flow` with the `flow` and
//!   `stage` fields, and to use [`TracingLogger`].
//! - Enable `metrics` to increment the `fitbit_oauth_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.
//!
//! The [`Logger`] capability is always available and defaults to [`NoopLogger`].

mod log;
mod metrics;
mod tracing;

pub use self::{log::*, metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Token flows observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization-code exchange.
	AuthorizationCode,
	/// Refresh-token exchange.
	Refresh,
	/// First token load from the store.
	Load,
	/// Authenticated API request.
	Request,
}
impl FlowKind {
	/// Every observed flow, in declaration order.
	pub const ALL: [FlowKind; 4] =
		[FlowKind::AuthorizationCode, FlowKind::Refresh, FlowKind::Load, FlowKind::Request];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::Refresh => "refresh",
			FlowKind::Load => "load",
			FlowKind::Request => "request",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Every recorded outcome, in the order a flow emits them.
	pub const ALL: [FlowOutcome; 3] =
		[FlowOutcome::Attempt, FlowOutcome::Success, FlowOutcome::Failure];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a flow span and records attempt plus success/failure around it.
pub(crate) async fn observe<T, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = FlowSpan::new(kind, stage).instrument(fut).await;

	match &result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => record_flow_outcome(kind, FlowOutcome::Failure),
	}

	result
}
