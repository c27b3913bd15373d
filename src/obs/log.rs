//! Pluggable logging capability used by the client.

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// Severity attached to a log record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
	/// Very verbose diagnostics.
	Trace,
	/// Developer diagnostics.
	Debug,
	/// Lifecycle events such as a completed refresh.
	Info,
	/// Recoverable anomalies.
	Warn,
	/// Failures surfaced to callers.
	Error,
}
impl LogLevel {
	/// Returns a lowercase label.
	pub const fn as_str(self) -> &'static str {
		match self {
			LogLevel::Trace => "trace",
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warn => "warn",
			LogLevel::Error => "error",
		}
	}
}
impl Display for LogLevel {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Receives client log records.
///
/// Implementations must never be handed secrets; the client only passes redacted token
/// summaries as `data`.
pub trait Logger
where
	Self: Send + Sync,
{
	/// Records one message with optional structured data.
	fn log(&self, level: LogLevel, message: &str, data: Option<&Value>);
}
impl<F> Logger for F
where
	F: Fn(LogLevel, &str, Option<&Value>) + Send + Sync,
{
	fn log(&self, level: LogLevel, message: &str, data: Option<&Value>) {
		self(level, message, data)
	}
}

/// Logger that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;
impl Logger for NoopLogger {
	fn log(&self, _: LogLevel, _: &str, _: Option<&Value>) {}
}

/// Forwards records to the `tracing` ecosystem under the `fitbit_oauth` target.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;
#[cfg(feature = "tracing")]
impl Logger for TracingLogger {
	fn log(&self, level: LogLevel, message: &str, data: Option<&Value>) {
		let data = data.map(ToString::to_string).unwrap_or_default();

		match level {
			LogLevel::Trace => ::tracing::trace!(target: "fitbit_oauth", %data, "{message}"),
			LogLevel::Debug => ::tracing::debug!(target: "fitbit_oauth", %data, "{message}"),
			LogLevel::Info => ::tracing::info!(target: "fitbit_oauth", %data, "{message}"),
			LogLevel::Warn => ::tracing::warn!(target: "fitbit_oauth", %data, "{message}"),
			LogLevel::Error => ::tracing::error!(target: "fitbit_oauth", %data, "{message}"),
		}
	}
}
