#![allow(dead_code)]

use async_trait::async_trait;
use checkout_config::Config;
use checkout_core::{CheckoutEngine, EventBus};
use checkout_delivery::{CartSource, HandoffError, HandoffInterface};
use checkout_order::PageContext;
use checkout_page::{MemoryPage, PageInterface};
use checkout_types::{CartSnapshot, CheckoutEvent, ElementId, OrderPayload, RedirectTarget};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

pub struct CartPage {
	pub page: Arc<MemoryPage>,
	pub form: ElementId,
	pub control: ElementId,
	pub summary: ElementId,
}

/// `body > form#cart-form > button#checkout` plus a summary container.
pub fn cart_page() -> CartPage {
	let page = Arc::new(MemoryPage::new());
	let form = page.create("form", &[("id", "cart-form"), ("action", "/cart")]);
	let control = page.create(
		"button",
		&[("id", "checkout"), ("name", "checkout"), ("type", "submit")],
	);
	let summary = page.create("div", &[("class", "cart__summary-totals")]);
	let total = page.create("p", &[]);

	page.append_child(form, control).unwrap();
	page.append_child(page.body(), form).unwrap();
	page.append_child(summary, total).unwrap();
	page.append_child(page.body(), summary).unwrap();
	page.set_text(control, "Check out").unwrap();

	CartPage {
		page,
		form,
		control,
		summary,
	}
}

pub fn cart() -> CartSnapshot {
	serde_json::from_value(serde_json::json!({
		"currency": "UAH",
		"total_price": 4500,
		"item_count": 2,
		"items": [{
			"id": 4411,
			"variant_id": 4411,
			"product_id": 77,
			"product_title": "Linen Shirt",
			"quantity": 2,
			"price": 2250,
			"line_price": 4500
		}]
	}))
	.unwrap()
}

pub fn build_engine(
	config: Config,
	page: &Arc<MemoryPage>,
	cart: Arc<dyn CartSource>,
	handoff: Arc<dyn HandoffInterface>,
) -> (CheckoutEngine, broadcast::Receiver<CheckoutEvent>) {
	let page: Arc<dyn PageInterface> = page.clone();
	let context = Arc::new(PageContext::new(page.clone(), config.page.shop_domain.clone()));
	let bus = EventBus::new(64);
	let events = bus.subscribe();
	let engine = CheckoutEngine::new(config, page, cart, handoff, context, bus).unwrap();
	(engine, events)
}

/// Waits for the first event matching `predicate`.
pub async fn next_event<P>(events: &mut broadcast::Receiver<CheckoutEvent>, predicate: P) -> CheckoutEvent
where
	P: Fn(&CheckoutEvent) -> bool,
{
	tokio::time::timeout(Duration::from_secs(30), async {
		loop {
			let event = events.recv().await.unwrap();
			if predicate(&event) {
				return event;
			}
		}
	})
	.await
	.expect("event not published")
}

pub fn is_settled(event: &CheckoutEvent) -> bool {
	matches!(
		event,
		CheckoutEvent::Redirected { .. } | CheckoutEvent::AttemptFailed { .. }
	)
}

/// Handoff that answers only once released.
#[derive(Default)]
pub struct GatedHandoff {
	calls: AtomicUsize,
	gate: Notify,
}

impl GatedHandoff {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn release(&self) {
		self.gate.notify_one();
	}
}

#[async_trait]
impl HandoffInterface for GatedHandoff {
	async fn send(&self, _payload: &OrderPayload) -> Result<RedirectTarget, HandoffError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.gate.notified().await;
		RedirectTarget::new("/thanks")
			.ok_or_else(|| HandoffError::Protocol("missing redirect target".into()))
	}
}

/// Handoff that always succeeds and counts its calls.
#[derive(Default)]
pub struct CountingHandoff {
	calls: AtomicUsize,
}

impl CountingHandoff {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl HandoffInterface for CountingHandoff {
	async fn send(&self, _payload: &OrderPayload) -> Result<RedirectTarget, HandoffError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		RedirectTarget::new("https://pay.example/session/1")
			.ok_or_else(|| HandoffError::Protocol("missing redirect target".into()))
	}
}
