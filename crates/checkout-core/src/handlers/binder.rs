//! Interception binder.
//!
//! Attaches capture-phase listeners to the cart form and its checkout
//! control. A listener only takes over when it can tell the activation is a
//! cart checkout; anything ambiguous is left to the native flow. Every
//! element is bound at most once, however often discovery runs.

use crate::engine::event_bus::EventBus;
use crate::error::ActivationError;
use crate::handlers::attempt::AttemptHandler;
use checkout_discovery::{locate_targets, ElementRegistry, TargetConventions, Targets};
use checkout_page::{DomEvent, EventKind, ListenerOptions, PageInterface};
use checkout_types::{CheckoutEvent, ElementId};
use std::sync::{Arc, Weak};

/// Elements newly bound by one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindReport {
	pub form: Option<ElementId>,
	pub control: Option<ElementId>,
}

impl BindReport {
	pub fn is_empty(&self) -> bool {
		self.form.is_none() && self.control.is_none()
	}
}

pub struct InterceptionBinder {
	page: Arc<dyn PageInterface>,
	conventions: TargetConventions,
	registry: ElementRegistry,
	attempt: Arc<AttemptHandler>,
	event_bus: EventBus,
}

impl InterceptionBinder {
	pub fn new(
		page: Arc<dyn PageInterface>,
		conventions: TargetConventions,
		attempt: Arc<AttemptHandler>,
		event_bus: EventBus,
	) -> Self {
		Self {
			page,
			conventions,
			registry: ElementRegistry::new(),
			attempt,
			event_bus,
		}
	}

	pub fn registry(&self) -> &ElementRegistry {
		&self.registry
	}

	/// Locates the targets currently in the document and binds new ones.
	pub fn discover(&self) -> Targets {
		let targets = locate_targets(self.page.as_ref(), &self.conventions);
		self.bind(&targets);
		targets
	}

	/// Binds whichever of `targets` is not bound yet.
	pub fn bind(&self, targets: &Targets) -> BindReport {
		let report = BindReport {
			form: targets.form.filter(|form| self.bind_form(*form)),
			control: targets.control.filter(|control| self.bind_control(*control)),
		};

		if !report.is_empty() {
			tracing::info!(
				form = ?report.form,
				control = ?report.control,
				"Intercepting cart checkout"
			);
			self.event_bus
				.publish(CheckoutEvent::TargetsBound {
					form: report.form,
					control: report.control,
				})
				.ok();
		}
		report
	}

	fn bind_form(&self, form: ElementId) -> bool {
		if !self.registry.mark_bound(form) {
			return false;
		}

		let attempt = Arc::downgrade(&self.attempt);
		let conventions = self.conventions.clone();
		self.attach(form, EventKind::Submit, move |event| {
			on_submit(&attempt, &conventions, form, event)
		})
	}

	fn bind_control(&self, control: ElementId) -> bool {
		// Look-alike controls in other forms are never bound
		if cart_form_of(self.page.as_ref(), &self.conventions, control).is_none() {
			tracing::debug!(%control, "Checkout control outside the cart form, not binding");
			return false;
		}
		if !self.registry.mark_bound(control) {
			return false;
		}

		let attempt = Arc::downgrade(&self.attempt);
		let conventions = self.conventions.clone();
		self.attach(control, EventKind::Click, move |event| {
			on_click(&attempt, &conventions, control, event)
		})
	}

	fn attach<F>(&self, target: ElementId, kind: EventKind, listener: F) -> bool
	where
		F: Fn(&mut DomEvent) + Send + Sync + 'static,
	{
		match self.page.add_event_listener(
			target,
			kind,
			ListenerOptions::capture(),
			Arc::new(listener),
		) {
			Ok(()) => true,
			Err(e) => {
				tracing::warn!(%target, %kind, error = %e, "Could not attach listener");
				false
			},
		}
	}
}

/// Resolves the form `control` belongs to, if that form is the cart form.
fn cart_form_of(
	page: &dyn PageInterface,
	conventions: &TargetConventions,
	control: ElementId,
) -> Option<ElementId> {
	page.owning_form(control).filter(|form| {
		page.element(*form)
			.is_some_and(|info| conventions.is_cart_form(&info))
	})
}

fn on_submit(
	attempt: &Weak<AttemptHandler>,
	conventions: &TargetConventions,
	form: ElementId,
	event: &mut DomEvent,
) {
	let Some(attempt) = attempt.upgrade() else {
		return;
	};
	// Implicit submission (no submitter) and other buttons stay native
	let Some(submitter) = event.submitter() else {
		return;
	};
	let is_checkout = attempt
		.page()
		.element(submitter)
		.is_some_and(|info| conventions.is_checkout_control(&info));
	if !is_checkout {
		return;
	}

	event.prevent_default();
	event.stop_immediate_propagation();
	attempt.activate(form, submitter);
}

fn on_click(
	attempt: &Weak<AttemptHandler>,
	conventions: &TargetConventions,
	control: ElementId,
	event: &mut DomEvent,
) {
	let Some(attempt) = attempt.upgrade() else {
		return;
	};
	let Some(form) = cart_form_of(attempt.page().as_ref(), conventions, control) else {
		tracing::warn!(%control, "Checkout control no longer in the cart form, using native checkout");
		attempt.ignore(
			control,
			ActivationError::MissingTarget("control is not associated with the cart form".into()),
		);
		return;
	};

	event.prevent_default();
	event.stop_immediate_propagation();
	attempt.activate(form, control);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::feedback::FeedbackController;
	use checkout_config::{FeedbackSettings, PageSettings};
	use checkout_delivery::{FixedCartSource, MockHandoffInterface};
	use checkout_order::PageContext;
	use checkout_page::{ClickOutcome, MemoryPage};
	use tokio::runtime::Handle;

	fn binder(page: &Arc<MemoryPage>) -> InterceptionBinder {
		let dyn_page: Arc<dyn PageInterface> = page.clone();
		let bus = EventBus::new(16);
		let attempt = Arc::new(AttemptHandler::new(
			dyn_page.clone(),
			Arc::new(FixedCartSource::default()),
			Arc::new(MockHandoffInterface::new()),
			Arc::new(PageContext::new(dyn_page.clone(), None)),
			FeedbackController::new(
				dyn_page.clone(),
				FeedbackSettings::default(),
				&PageSettings::default(),
				Handle::current(),
			),
			bus.clone(),
			Handle::current(),
		));
		InterceptionBinder::new(dyn_page, TargetConventions::default(), attempt, bus)
	}

	fn cart_page() -> (Arc<MemoryPage>, ElementId, ElementId) {
		let page = Arc::new(MemoryPage::new());
		let form = page.create("form", &[("id", "cart-form")]);
		let control = page.create("button", &[("id", "checkout"), ("type", "submit")]);
		page.append_child(form, control).unwrap();
		page.append_child(page.body(), form).unwrap();
		(page, form, control)
	}

	#[tokio::test]
	async fn test_repeated_discovery_binds_once() {
		let (page, form, control) = cart_page();
		let binder = binder(&page);

		let first = binder.discover();
		binder.discover();
		binder.discover();

		assert_eq!(first.form, Some(form));
		assert_eq!(page.listener_count(form, EventKind::Submit), 1);
		assert_eq!(page.listener_count(control, EventKind::Click), 1);
		assert_eq!(binder.registry().len(), 2);
	}

	#[tokio::test]
	async fn test_bind_reports_only_new_targets() {
		let (page, form, control) = cart_page();
		let binder = binder(&page);
		let targets = Targets {
			form: Some(form),
			control: Some(control),
		};

		assert_eq!(
			binder.bind(&targets),
			BindReport {
				form: Some(form),
				control: Some(control)
			}
		);
		assert!(binder.bind(&targets).is_empty());
	}

	#[tokio::test]
	async fn test_control_in_other_form_is_not_bound() {
		let page = Arc::new(MemoryPage::new());
		let newsletter = page.create("form", &[("id", "newsletter")]);
		let control = page.create("button", &[("id", "checkout"), ("type", "submit")]);
		page.append_child(newsletter, control).unwrap();
		page.append_child(page.body(), newsletter).unwrap();

		let report = binder(&page).bind(&Targets {
			form: None,
			control: Some(control),
		});

		assert!(report.is_empty());
		assert_eq!(page.listener_count(control, EventKind::Click), 0);
		assert_eq!(page.click(control), ClickOutcome::NativeSubmit { form: newsletter });
	}

	#[tokio::test]
	async fn test_other_submitters_stay_native() {
		let (page, form, _control) = cart_page();
		let update = page.create("button", &[("name", "update"), ("type", "submit")]);
		page.append_child(form, update).unwrap();
		let binder = binder(&page);
		binder.discover();

		assert_eq!(page.click(update), ClickOutcome::NativeSubmit { form });
		assert_eq!(page.submit(form, None), ClickOutcome::NativeSubmit { form });
	}

	#[tokio::test]
	async fn test_listeners_inert_after_pipeline_dropped() {
		let (page, form, control) = cart_page();
		let binder = binder(&page);
		binder.discover();
		drop(binder);

		assert_eq!(page.click(control), ClickOutcome::NativeSubmit { form });
	}
}
