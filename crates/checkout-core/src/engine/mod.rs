//! Checkout engine wiring the pipeline to a host page.
//!
//! The engine is built from an explicit configuration value and the page's
//! collaborators, and does nothing until [`CheckoutEngine::start`] is called.
//! Keep the engine alive for as long as the page should be intercepted:
//! listeners hold only weak references to it, so dropping the engine turns
//! every bound listener into a no-op and native checkout takes over again.

pub mod event_bus;

use self::event_bus::EventBus;
use crate::error::EngineError;
use crate::feedback::FeedbackController;
use crate::handlers::{AttemptHandler, InterceptionBinder};
use checkout_config::Config;
use checkout_delivery::{CartSource, HandoffInterface};
use checkout_discovery::{DynamicWatcher, ElementRegistry, TargetConventions, Targets, WatcherHandle};
use checkout_order::ContextProvider;
use checkout_page::PageInterface;
use checkout_types::{CheckoutEvent, WatchOutcome, WatchPolicy};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::instrument;

/// Result of starting the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
	/// Interception is switched off; nothing was bound.
	Disabled,
	/// The initial discovery pass ran.
	Started {
		/// Targets present when the pipeline started.
		targets: Targets,
		/// Whether a watcher was spawned for targets arriving later.
		watching: bool,
	},
}

/// Checkout interception pipeline for one page.
pub struct CheckoutEngine {
	config: Config,
	page: Arc<dyn PageInterface>,
	binder: Arc<InterceptionBinder>,
	event_bus: EventBus,
	watcher: Mutex<Option<WatcherHandle>>,
	started: AtomicBool,
}

impl CheckoutEngine {
	/// Builds the pipeline.
	///
	/// Must be called inside a tokio runtime; attempts and banner timers are
	/// spawned on it.
	pub fn new(
		config: Config,
		page: Arc<dyn PageInterface>,
		cart: Arc<dyn CartSource>,
		handoff: Arc<dyn HandoffInterface>,
		context: Arc<dyn ContextProvider>,
		event_bus: EventBus,
	) -> Result<Self, EngineError> {
		config.validate()?;
		let runtime = Handle::try_current().map_err(|e| EngineError::Runtime(e.to_string()))?;

		let feedback = FeedbackController::new(
			page.clone(),
			config.feedback.clone(),
			&config.page,
			runtime.clone(),
		);
		let attempt = Arc::new(AttemptHandler::new(
			page.clone(),
			cart,
			handoff,
			context,
			feedback,
			event_bus.clone(),
			runtime,
		));
		let conventions = TargetConventions::new(
			config.page.cart_form_id.clone(),
			config.page.checkout_control.clone(),
		);
		let binder = Arc::new(InterceptionBinder::new(
			page.clone(),
			conventions,
			attempt,
			event_bus.clone(),
		));

		Ok(Self {
			config,
			page,
			binder,
			event_bus,
			watcher: Mutex::new(None),
			started: AtomicBool::new(false),
		})
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn registry(&self) -> &ElementRegistry {
		self.binder.registry()
	}

	/// Starts intercepting. May be called once.
	///
	/// Waits out the startup delay, hides express-checkout widgets on cart
	/// pages, binds whatever targets are present and, when the cart form is
	/// missing, watches for it.
	#[instrument(skip_all)]
	pub async fn start(&self) -> Result<StartOutcome, EngineError> {
		if self.started.swap(true, Ordering::SeqCst) {
			return Err(EngineError::AlreadyStarted);
		}
		if !self.config.checkout.enabled {
			tracing::info!("Custom checkout disabled, native checkout unchanged");
			return Ok(StartOutcome::Disabled);
		}

		let delay = self.config.checkout.startup_delay();
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}

		let targets = self.binder.discover();
		if self.config.page.hide_accelerated_checkout && self.is_cart_page(&targets) {
			self.hide_accelerated_checkout();
		}

		let watching = match self.config.watcher.policy {
			WatchPolicy::Once => targets.form.is_none(),
			WatchPolicy::Persistent => true,
		};
		if watching {
			self.spawn_watcher();
		}

		tracing::info!(
			form = ?targets.form,
			control = ?targets.control,
			watching,
			"Checkout interception started"
		);
		Ok(StartOutcome::Started { targets, watching })
	}

	/// Returns true while a watcher is observing the page.
	pub fn is_watching(&self) -> bool {
		self.watcher
			.lock()
			.as_ref()
			.is_some_and(|handle| !handle.is_finished())
	}

	/// Stops the watcher, if one was spawned, and returns how it ended.
	pub async fn stop_watching(&self) -> Option<WatchOutcome> {
		let handle = self.watcher.lock().take()?;
		Some(handle.stop().await)
	}

	fn is_cart_page(&self, targets: &Targets) -> bool {
		targets.form.is_some() || self.page.location().path().contains("/cart")
	}

	fn hide_accelerated_checkout(&self) {
		let mut hidden = 0;
		for selector in &self.config.page.accelerated_checkout_selectors {
			for element in self.page.query_selector_all(selector) {
				match self.page.set_hidden(element, true) {
					Ok(()) => hidden += 1,
					Err(e) => tracing::debug!(%element, error = %e, "Could not hide widget"),
				}
			}
		}
		if hidden > 0 {
			tracing::debug!(hidden, "Hid accelerated checkout widgets");
		}
	}

	fn spawn_watcher(&self) {
		let binder = Arc::clone(&self.binder);
		let event_bus = self.event_bus.clone();
		let watcher = DynamicWatcher::new(self.config.watcher.timeout(), self.config.watcher.policy);

		let handle = watcher.spawn(
			self.page.as_ref(),
			move || binder.discover().form.is_some(),
			move |outcome| {
				event_bus
					.publish(CheckoutEvent::WatcherFinished { outcome })
					.ok();
			},
		);
		*self.watcher.lock() = Some(handle);
	}
}
