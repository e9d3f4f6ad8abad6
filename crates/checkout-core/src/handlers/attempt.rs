//! Attempt handler driving one checkout from activation to navigation.
//!
//! An attempt fetches a fresh cart, assembles the payload, sends it once and
//! either navigates to the returned target or restores the control and shows
//! a banner. The control stays disabled for the whole attempt, which is what
//! keeps a second attempt from starting on the same control.

use crate::engine::event_bus::EventBus;
use crate::error::{ActivationError, CheckoutError};
use crate::feedback::FeedbackController;
use checkout_delivery::{CartSource, HandoffInterface};
use checkout_order::{assemble, ContextProvider};
use checkout_page::PageInterface;
use checkout_types::{CheckoutEvent, ControlUiState, ElementId, RedirectTarget};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::instrument;

pub struct AttemptHandler {
	page: Arc<dyn PageInterface>,
	cart: Arc<dyn CartSource>,
	handoff: Arc<dyn HandoffInterface>,
	context: Arc<dyn ContextProvider>,
	feedback: FeedbackController,
	event_bus: EventBus,
	runtime: Handle,
}

impl AttemptHandler {
	pub fn new(
		page: Arc<dyn PageInterface>,
		cart: Arc<dyn CartSource>,
		handoff: Arc<dyn HandoffInterface>,
		context: Arc<dyn ContextProvider>,
		feedback: FeedbackController,
		event_bus: EventBus,
		runtime: Handle,
	) -> Self {
		Self {
			page,
			cart,
			handoff,
			context,
			feedback,
			event_bus,
			runtime,
		}
	}

	pub fn page(&self) -> &Arc<dyn PageInterface> {
		&self.page
	}

	/// Starts an attempt for `control` submitted on behalf of `form`.
	///
	/// The control is disabled and relabelled before this returns. Returns
	/// `None` when no attempt was started: the control is gone or already
	/// disabled by a running attempt.
	pub fn activate(self: &Arc<Self>, form: ElementId, control: ElementId) -> Option<JoinHandle<()>> {
		let Some(info) = self.page.element(control).filter(|info| info.connected) else {
			self.ignore(control, ActivationError::MissingTarget("checkout control is gone".into()));
			return None;
		};
		if info.disabled {
			self.ignore(control, ActivationError::InProgress);
			return None;
		}

		let state = match self.feedback.begin(control) {
			Ok(state) => state,
			Err(e) => {
				tracing::warn!(%control, error = %e, "Could not mark checkout control busy");
				self.ignore(control, ActivationError::MissingTarget(e.to_string()));
				return None;
			},
		};

		tracing::info!(%form, %control, "Checkout attempt started");
		self.event_bus
			.publish(CheckoutEvent::AttemptStarted { control })
			.ok();

		let handler = Arc::clone(self);
		Some(
			self.runtime
				.spawn(async move { handler.run(control, state).await }),
		)
	}

	/// Records an activation that started nothing. No banner is shown.
	pub fn ignore(&self, control: ElementId, reason: ActivationError) {
		tracing::debug!(%control, reason = %reason, "Checkout activation ignored");
		self.event_bus
			.publish(CheckoutEvent::ActivationIgnored {
				control,
				reason: reason.to_string(),
			})
			.ok();
	}

	#[instrument(skip_all, fields(control = %control))]
	async fn run(&self, control: ElementId, state: ControlUiState) {
		match self.execute().await {
			Ok(target) => {
				tracing::info!(redirect = %target, "Redirecting to order target");
				self.page.navigate(target.as_str());
				self.event_bus
					.publish(CheckoutEvent::Redirected { target })
					.ok();
			},
			Err(error) => {
				tracing::error!(error = %error, "Checkout attempt failed");
				let message = error.user_message();

				if let Err(e) = self.feedback.restore(control, &state) {
					tracing::warn!(error = %e, "Could not restore checkout control");
				}
				if let Err(e) = self.feedback.show_error(&message) {
					tracing::warn!(error = %e, "Could not show error banner");
				}
				self.event_bus
					.publish(CheckoutEvent::AttemptFailed { control, message })
					.ok();
			},
		}
	}

	async fn execute(&self) -> Result<RedirectTarget, CheckoutError> {
		let cart = self.cart.fetch_cart().await?;
		let context = self.context.current();
		let payload = assemble(&cart, &context)?;

		tracing::debug!(
			lines = payload.cart.items.len(),
			total = payload.cart.total_price,
			"Handing off order"
		);
		Ok(self.handoff.send(&payload).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::NETWORK_MESSAGE;
	use checkout_config::{FeedbackSettings, PageSettings};
	use checkout_delivery::{
		CartError, FixedCartSource, HandoffError, MockCartSource, MockHandoffInterface,
	};
	use checkout_order::PageContext;
	use checkout_page::MemoryPage;
	use checkout_types::CartSnapshot;

	fn cart() -> CartSnapshot {
		serde_json::from_value(serde_json::json!({
			"currency": "UAH",
			"total_price": 1200,
			"items": [{ "id": 9, "quantity": 1, "price": 1200, "product_title": "Mug" }]
		}))
		.unwrap()
	}

	struct Fixture {
		page: Arc<MemoryPage>,
		cart: Arc<FixedCartSource>,
		control: ElementId,
		form: ElementId,
		bus: EventBus,
	}

	impl Fixture {
		fn new() -> Self {
			let page = Arc::new(MemoryPage::new());
			let form = page.create("form", &[("id", "cart-form")]);
			let control = page.create("button", &[("name", "checkout"), ("type", "submit")]);
			page.append_child(form, control).unwrap();
			page.append_child(page.body(), form).unwrap();
			page.set_text(control, "Check out").unwrap();

			Self {
				page,
				cart: Arc::new(FixedCartSource::new(cart())),
				control,
				form,
				bus: EventBus::new(16),
			}
		}

		fn handler(&self, handoff: MockHandoffInterface) -> Arc<AttemptHandler> {
			self.handler_with_cart(self.cart.clone(), handoff)
		}

		fn handler_with_cart(
			&self,
			cart: Arc<dyn CartSource>,
			handoff: MockHandoffInterface,
		) -> Arc<AttemptHandler> {
			let page: Arc<dyn PageInterface> = self.page.clone();
			Arc::new(AttemptHandler::new(
				page.clone(),
				cart,
				Arc::new(handoff),
				Arc::new(PageContext::new(page.clone(), None)),
				FeedbackController::new(
					page,
					FeedbackSettings::default(),
					&PageSettings::default(),
					Handle::current(),
				),
				self.bus.clone(),
				Handle::current(),
			))
		}
	}

	#[tokio::test]
	async fn test_success_navigates_to_target() {
		let fixture = Fixture::new();
		let mut handoff = MockHandoffInterface::new();
		handoff
			.expect_send()
			.times(1)
			.returning(|_| {
				Box::pin(async { Ok(RedirectTarget::new("https://pay.example/s/1").unwrap()) })
			});
		let handler = fixture.handler(handoff);

		let attempt = handler.activate(fixture.form, fixture.control).unwrap();
		assert!(fixture.page.element(fixture.control).unwrap().disabled);
		attempt.await.unwrap();

		assert_eq!(fixture.page.navigations(), vec!["https://pay.example/s/1"]);
		// Success leaves the control busy; the page is navigating away
		assert_eq!(
			fixture.page.element(fixture.control).unwrap().text,
			"Processing..."
		);
	}

	#[tokio::test]
	async fn test_failure_restores_control() {
		let fixture = Fixture::new();
		let mut events = fixture.bus.subscribe();
		let mut handoff = MockHandoffInterface::new();
		handoff.expect_send().times(1).returning(|_| {
			Box::pin(async {
				Err(HandoffError::Api {
					message: "out of stock".to_string(),
				})
			})
		});
		let handler = fixture.handler(handoff);

		handler
			.activate(fixture.form, fixture.control)
			.unwrap()
			.await
			.unwrap();

		let control = fixture.page.element(fixture.control).unwrap();
		assert!(!control.disabled);
		assert_eq!(control.text, "Check out");
		assert!(fixture.page.navigations().is_empty());

		assert_eq!(
			events.recv().await.unwrap(),
			CheckoutEvent::AttemptStarted {
				control: fixture.control
			}
		);
		assert_eq!(
			events.recv().await.unwrap(),
			CheckoutEvent::AttemptFailed {
				control: fixture.control,
				message: "out of stock".to_string()
			}
		);
	}

	#[tokio::test]
	async fn test_busy_control_starts_nothing() {
		let fixture = Fixture::new();
		let mut handoff = MockHandoffInterface::new();
		handoff
			.expect_send()
			.times(1)
			.returning(|_| Box::pin(async { Ok(RedirectTarget::new("/thanks").unwrap()) }));
		let handler = fixture.handler(handoff);

		let first = handler.activate(fixture.form, fixture.control);
		let second = handler.activate(fixture.form, fixture.control);
		assert!(first.is_some());
		assert!(second.is_none());

		first.unwrap().await.unwrap();
		assert_eq!(fixture.cart.fetch_count(), 1);
	}

	#[tokio::test]
	async fn test_removed_control_fails_open_without_banner() {
		let fixture = Fixture::new();
		let mut events = fixture.bus.subscribe();
		let mut handoff = MockHandoffInterface::new();
		handoff.expect_send().never();
		let handler = fixture.handler(handoff);
		fixture.page.remove(fixture.control).unwrap();

		assert!(handler.activate(fixture.form, fixture.control).is_none());
		assert_eq!(
			events.recv().await.unwrap(),
			CheckoutEvent::ActivationIgnored {
				control: fixture.control,
				reason: "Missing target: checkout control is gone".to_string(),
			}
		);
		assert!(fixture
			.page
			.query_selector(&checkout_types::Selector::class("custom-checkout-error"))
			.is_none());
		assert_eq!(fixture.cart.fetch_count(), 0);
	}

	#[tokio::test]
	async fn test_empty_cart_skips_handoff() {
		let fixture = Fixture::new();
		fixture.cart.set(CartSnapshot::default());
		let mut handoff = MockHandoffInterface::new();
		handoff.expect_send().never();
		let handler = fixture.handler(handoff);

		handler
			.activate(fixture.form, fixture.control)
			.unwrap()
			.await
			.unwrap();

		let banner = fixture
			.page
			.query_selector(&checkout_types::Selector::class("custom-checkout-error"))
			.unwrap();
		assert_eq!(fixture.page.element(banner).unwrap().text, "Cart is empty");
	}

	#[tokio::test]
	async fn test_cart_network_failure_shows_connectivity_message() {
		let fixture = Fixture::new();
		let mut cart = MockCartSource::new();
		cart.expect_fetch_cart()
			.times(1)
			.returning(|| Box::pin(async { Err(CartError::Network("connection reset".into())) }));
		let mut handoff = MockHandoffInterface::new();
		handoff.expect_send().never();
		let handler = fixture.handler_with_cart(Arc::new(cart), handoff);

		handler
			.activate(fixture.form, fixture.control)
			.unwrap()
			.await
			.unwrap();

		let banner = fixture
			.page
			.query_selector(&checkout_types::Selector::class("custom-checkout-error"))
			.unwrap();
		assert_eq!(fixture.page.element(banner).unwrap().text, NETWORK_MESSAGE);
		assert!(!fixture.page.element(fixture.control).unwrap().disabled);
	}
}
