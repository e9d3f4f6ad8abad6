//! Discovery of checkout targets on a host page.
//!
//! This crate locates the cart form and checkout control by the theme's
//! id/name conventions, remembers which elements already carry capture
//! listeners, and watches the document for a cart form that appears after
//! the pipeline started.

pub mod registry;
pub mod watcher;

pub use registry::ElementRegistry;
pub use watcher::{DynamicWatcher, WatcherHandle};

use checkout_page::{ElementInfo, PageInterface};
use checkout_types::{ElementId, Selector};

/// Naming conventions identifying the cart surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConventions {
	/// Id of the cart form.
	pub cart_form_id: String,
	/// Id or `name` of the checkout control.
	pub checkout_control: String,
}

impl TargetConventions {
	pub fn new(cart_form_id: impl Into<String>, checkout_control: impl Into<String>) -> Self {
		Self {
			cart_form_id: cart_form_id.into(),
			checkout_control: checkout_control.into(),
		}
	}

	pub fn is_cart_form(&self, element: &ElementInfo) -> bool {
		element.is_form() && element.dom_id() == Some(self.cart_form_id.as_str())
	}

	pub fn is_checkout_control(&self, element: &ElementInfo) -> bool {
		element.name() == Some(self.checkout_control.as_str())
			|| element.dom_id() == Some(self.checkout_control.as_str())
	}
}

impl Default for TargetConventions {
	fn default() -> Self {
		Self::new("cart-form", "checkout")
	}
}

/// Result of one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Targets {
	pub form: Option<ElementId>,
	pub control: Option<ElementId>,
}

/// Looks up the cart form and checkout control currently in the document.
///
/// The control is looked up by id first, then by name. Whether the control
/// actually belongs to the cart form is left to the binder.
pub fn locate_targets(page: &dyn PageInterface, conventions: &TargetConventions) -> Targets {
	let form = page
		.element_by_id(&conventions.cart_form_id)
		.filter(|id| page.element(*id).is_some_and(|info| info.is_form()));

	let control = page
		.element_by_id(&conventions.checkout_control)
		.or_else(|| page.query_selector(&Selector::name(conventions.checkout_control.clone())));

	Targets { form, control }
}
