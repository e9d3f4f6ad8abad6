//! Dynamic element watcher.
//!
//! Themes that hydrate the cart asynchronously insert the cart form after the
//! pipeline starts. The watcher observes structural mutations under the body
//! and re-runs discovery on each batch. Its lifetime is bounded: it ends at
//! its timeout whatever happens, and under [`WatchPolicy::Once`] as soon as
//! discovery succeeds. Once the task returns it holds no mutation receiver
//! and runs no further discovery.

use checkout_page::PageInterface;
use checkout_types::{WatchOutcome, WatchPolicy};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

/// Spawns bounded-lifetime watchers.
#[derive(Debug, Clone, Copy)]
pub struct DynamicWatcher {
	timeout: Duration,
	policy: WatchPolicy,
}

impl DynamicWatcher {
	pub fn new(timeout: Duration, policy: WatchPolicy) -> Self {
		Self { timeout, policy }
	}

	/// Starts observing `page`.
	///
	/// The mutation feed is subscribed before this returns, so no batch
	/// published afterwards is missed. `discover` runs once per batch and
	/// reports whether the target was found (and bound). `on_finish` runs on
	/// the watcher task with the outcome, after the feed has been dropped.
	pub fn spawn<D, F>(&self, page: &dyn PageInterface, mut discover: D, on_finish: F) -> WatcherHandle
	where
		D: FnMut() -> bool + Send + 'static,
		F: FnOnce(WatchOutcome) + Send + 'static,
	{
		let mut mutations = page.subscribe_mutations();
		let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
		let timeout = self.timeout;
		let policy = self.policy;

		let handle = tokio::spawn(async move {
			let deadline = tokio::time::sleep(timeout);
			tokio::pin!(deadline);
			let mut found_once = false;
			let mut stop_open = true;

			let outcome = loop {
				tokio::select! {
					biased;
					signal = &mut stop_rx, if stop_open => match signal {
						Ok(()) => break WatchOutcome::Stopped,
						// Handle dropped: keep running until the timeout
						Err(_) => stop_open = false,
					},
					_ = &mut deadline => {
						break if found_once { WatchOutcome::Found } else { WatchOutcome::TimedOut };
					},
					batch = mutations.recv() => match batch {
						Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
							if discover() {
								found_once = true;
								if policy == WatchPolicy::Once {
									break WatchOutcome::Found;
								}
							}
						},
						Err(broadcast::error::RecvError::Closed) => break WatchOutcome::Closed,
					},
				}
			};

			drop(mutations);
			drop(discover);
			tracing::info!(outcome = %outcome, ?policy, "Stopped watching for checkout targets");
			on_finish(outcome);
			outcome
		});

		WatcherHandle {
			stop_tx: Some(stop_tx),
			handle,
		}
	}
}

/// Handle to a running watcher.
///
/// Dropping the handle detaches the watcher; it still ends at its timeout.
#[derive(Debug)]
pub struct WatcherHandle {
	stop_tx: Option<oneshot::Sender<()>>,
	handle: JoinHandle<WatchOutcome>,
}

impl WatcherHandle {
	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}

	/// Waits for the watcher to end on its own.
	pub async fn join(self) -> WatchOutcome {
		self.handle.await.unwrap_or(WatchOutcome::Stopped)
	}

	/// Asks the watcher to stop and waits for it.
	///
	/// Returns the real outcome if the watcher had already ended.
	pub async fn stop(mut self) -> WatchOutcome {
		if let Some(stop_tx) = self.stop_tx.take() {
			let _ = stop_tx.send(());
		}
		self.handle.await.unwrap_or(WatchOutcome::Stopped)
	}
}
