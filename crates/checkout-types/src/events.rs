//! Event types published while a page is intercepted.
//!
//! Events flow through the engine's event bus so that the host (and tests)
//! can observe bindings, watcher shutdown and the outcome of each attempt
//! without reaching into engine state.

use crate::{ElementId, RedirectTarget, WatchOutcome};
use serde::{Deserialize, Serialize};

/// Main event type for the checkout pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckoutEvent {
	/// A discovery pass attached capture listeners to new targets.
	TargetsBound {
		form: Option<ElementId>,
		control: Option<ElementId>,
	},
	/// The dynamic watcher stopped observing the page.
	WatcherFinished { outcome: WatchOutcome },
	/// A checkout activation was captured and an attempt began.
	AttemptStarted { control: ElementId },
	/// The handoff succeeded and the page is navigating away.
	Redirected { target: RedirectTarget },
	/// The attempt failed; the control has been restored.
	AttemptFailed { control: ElementId, message: String },
	/// An activation reached the handler but no attempt was started.
	ActivationIgnored { control: ElementId, reason: String },
}
