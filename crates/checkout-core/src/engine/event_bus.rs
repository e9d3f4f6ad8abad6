//! Event bus for observing the pipeline.
//!
//! Bindings, watcher shutdown and attempt outcomes are broadcast so that the
//! host page and tests can follow the pipeline without touching its state.

use checkout_types::CheckoutEvent;
use tokio::sync::broadcast;

/// Event bus broadcasting checkout events to any number of subscribers.
///
/// Publishing never blocks; a subscriber that falls behind by more than the
/// channel capacity loses the oldest events.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<CheckoutEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Creates a subscriber receiving events published from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<CheckoutEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns an error if there are no active subscribers, which callers
	/// inside the engine ignore.
	pub fn publish(
		&self,
		event: CheckoutEvent,
	) -> Result<(), broadcast::error::SendError<CheckoutEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(64)
	}
}
