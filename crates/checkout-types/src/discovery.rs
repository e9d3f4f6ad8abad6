//! Discovery types for locating checkout targets on a host page.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the dynamic watcher reacts once the cart form has been found.
///
/// `Once` stops observing at the first successful discovery. `Persistent`
/// keeps re-running discovery on every mutation batch until the watcher's
/// lifetime ends, which re-binds elements that the theme replaces after the
/// first binding at the cost of one discovery pass per batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchPolicy {
	#[default]
	Once,
	Persistent,
}

/// Why a watcher stopped observing the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchOutcome {
	/// Discovery succeeded and the policy allowed the watcher to stop.
	Found,
	/// The lifetime elapsed.
	TimedOut,
	/// The owner asked the watcher to stop.
	Stopped,
	/// The page closed its mutation feed (teardown).
	Closed,
}

impl fmt::Display for WatchOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			WatchOutcome::Found => "found",
			WatchOutcome::TimedOut => "timed out",
			WatchOutcome::Stopped => "stopped",
			WatchOutcome::Closed => "closed",
		};
		f.write_str(label)
	}
}
