//! End-to-end run of the pipeline against an in-memory storefront.
//!
//! The page mirrors the cart template the pipeline was built for: a cart
//! form holding the checkout button, a summary block and the express
//! checkout widgets. The simulation starts the engine, clicks the checkout
//! button once and reports what the shopper would see.

use crate::factory::{build_engine_with, ServiceError};
use checkout_config::Config;
use checkout_core::{EventBus, StartOutcome};
use checkout_delivery::{CartSource, HandoffInterface};
use checkout_page::{ClickOutcome, MemoryPage, PageInterface};
use checkout_types::{CheckoutEvent, Customer, ElementId, Selector};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Handles to the interesting parts of a simulated storefront.
#[derive(Debug, Clone, Copy)]
pub struct Storefront {
	pub form: ElementId,
	pub control: ElementId,
	pub summary: ElementId,
}

/// Builds a cart page at `location` following the theme conventions in
/// `config`.
pub fn storefront_page(config: &Config, location: Url) -> (Arc<MemoryPage>, Storefront) {
	let page = Arc::new(MemoryPage::new().with_location(location));
	let body = page.body();

	let form = page.create(
		"form",
		&[("id", config.page.cart_form_id.as_str()), ("action", "/cart")],
	);
	let items = page.create("div", &[("class", "cart__items")]);
	let control = page.create(
		"button",
		&[
			("id", config.page.checkout_control.as_str()),
			("name", config.page.checkout_control.as_str()),
			("type", "submit"),
		],
	);
	let summary = page.create("div", &[("class", "cart__summary-totals")]);
	let express = page.create("shopify-accelerated-checkout-cart", &[]);
	let additional = page.create("div", &[("class", "additional-checkout-buttons")]);

	let tree = [
		(form, items),
		(form, control),
		(body, form),
		(body, summary),
		(body, express),
		(body, additional),
	];
	for (parent, child) in tree {
		// Every handle was just created on this page
		let _ = page.append_child(parent, child);
	}
	let _ = page.set_text(control, "Check out");

	(
		page,
		Storefront {
			form,
			control,
			summary,
		},
	)
}

/// What the shopper ends up with after one click on checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
	/// Whether the pipeline took over the click.
	pub intercepted: bool,
	/// Page the browser was sent to, if any.
	pub navigated_to: Option<String>,
	/// Text of the visible error banner, if any.
	pub banner: Option<String>,
	/// Label of the checkout button after the attempt.
	pub control_label: String,
	/// Forms submitted through the native flow.
	pub native_submissions: usize,
}

impl fmt::Display for SimulationReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if !self.intercepted {
			return write!(
				f,
				"native checkout ({} form submission(s))",
				self.native_submissions
			);
		}
		match (&self.navigated_to, &self.banner) {
			(Some(target), _) => write!(f, "redirected to {target}"),
			(None, Some(banner)) => write!(
				f,
				"error shown: {banner} (button restored to \"{}\")",
				self.control_label
			),
			(None, None) => write!(f, "intercepted, no outcome"),
		}
	}
}

/// Runs one checkout click through the pipeline.
pub async fn simulate(
	config: Config,
	location: Url,
	cart: Arc<dyn CartSource>,
	handoff: Arc<dyn HandoffInterface>,
	customer: Option<Customer>,
) -> Result<SimulationReport, ServiceError> {
	let (page, storefront) = storefront_page(&config, location);
	let banner_selector = Selector::class(config.page.error_class.clone());
	// Cart fetch and handoff each get the full HTTP timeout
	let settle_within = config.http.timeout() * 2 + Duration::from_secs(1);

	let event_bus = EventBus::default();
	let mut events = event_bus.subscribe();
	let engine = build_engine_with(config, page.clone(), cart, handoff, customer, event_bus)?;

	let intercepted = match engine.start().await? {
		StartOutcome::Disabled => {
			page.click(storefront.control);
			false
		},
		StartOutcome::Started { .. } => matches!(
			page.click(storefront.control),
			ClickOutcome::Prevented | ClickOutcome::SubmitPrevented { .. }
		),
	};

	if intercepted {
		tokio::time::timeout(settle_within, async {
			while let Ok(event) = events.recv().await {
				if matches!(
					event,
					CheckoutEvent::Redirected { .. } | CheckoutEvent::AttemptFailed { .. }
				) {
					break;
				}
			}
		})
		.await
		.map_err(|_| ServiceError::Unsettled(settle_within))?;
	}

	let banner = page
		.query_selector(&banner_selector)
		.and_then(|id| page.element(id))
		.filter(|info| !info.hidden)
		.map(|info| info.text);
	let control_label = page
		.element(storefront.control)
		.map(|info| info.text)
		.unwrap_or_default();

	Ok(SimulationReport {
		intercepted,
		navigated_to: page.navigations().last().cloned(),
		banner,
		control_label,
		native_submissions: page.native_submissions().len(),
	})
}
