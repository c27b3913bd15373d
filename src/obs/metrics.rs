// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counter incremented once per recorded flow outcome.
pub const FLOW_COUNTER: &str = "fitbit_oauth_flow_total";

/// Records a flow outcome via the global metrics recorder (when enabled).
///
/// Labels: `flow` is [`FlowKind::as_str`], `outcome` is [`FlowOutcome::as_str`].
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(FLOW_COUNTER, "flow" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashSet;
	// self
	use super::*;

	#[test]
	fn every_flow_kind_records_without_a_recorder() {
		for kind in FlowKind::ALL {
			for outcome in FlowOutcome::ALL {
				record_flow_outcome(kind, outcome);
			}
		}
	}

	#[test]
	fn flow_labels_are_distinct() {
		let labels = FlowKind::ALL.iter().map(|kind| kind.as_str()).collect::<HashSet<_>>();

		assert_eq!(labels.len(), FlowKind::ALL.len());
		assert!(labels.contains("load"));
		assert!(labels.contains("request"));
		assert_eq!(
			FlowOutcome::ALL.map(FlowOutcome::as_str),
			["attempt", "success", "failure"]
		);
	}
}
