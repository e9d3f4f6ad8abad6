//! Checkout control state and the inline error banner.
//!
//! The controller owns every visible side effect of an attempt except the
//! final navigation: it disables the control while an attempt runs, puts the
//! captured state back when the attempt fails and renders the banner.

use checkout_config::{FeedbackSettings, PageSettings};
use checkout_page::{EventKind, ListenerOptions, PageError, PageInterface};
use checkout_types::{ControlUiState, ElementId, Selector};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct FeedbackController {
	page: Arc<dyn PageInterface>,
	settings: FeedbackSettings,
	banner_selector: Selector,
	error_class: String,
	summary_selectors: Vec<Selector>,
	runtime: Handle,
	/// Bumped on every message; a pending hide only fires if it is still
	/// the latest.
	generation: Arc<AtomicU64>,
}

impl FeedbackController {
	pub fn new(
		page: Arc<dyn PageInterface>,
		settings: FeedbackSettings,
		page_settings: &PageSettings,
		runtime: Handle,
	) -> Self {
		Self {
			page,
			settings,
			banner_selector: Selector::class(page_settings.error_class.clone()),
			error_class: page_settings.error_class.clone(),
			summary_selectors: page_settings.summary_selectors.clone(),
			runtime,
			generation: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Captures the control state, then disables the control and shows the
	/// busy label.
	pub fn begin(&self, control: ElementId) -> Result<ControlUiState, PageError> {
		let info = self
			.page
			.element(control)
			.ok_or(PageError::UnknownElement(control))?;
		let state = ControlUiState {
			label: info.text,
			disabled: info.disabled,
		};

		self.page.set_disabled(control, true)?;
		self.page.set_text(control, &self.settings.busy_label)?;
		Ok(state)
	}

	/// Puts the control back the way [`begin`](Self::begin) found it.
	pub fn restore(&self, control: ElementId, state: &ControlUiState) -> Result<(), PageError> {
		let label = if state.label.trim().is_empty() {
			self.settings.fallback_label.as_str()
		} else {
			state.label.as_str()
		};
		self.page.set_text(control, label)?;
		self.page.set_disabled(control, state.disabled)
	}

	/// Shows `message` in the error banner and schedules it to hide.
	///
	/// An existing banner is reused; only the first message creates one.
	pub fn show_error(&self, message: &str) -> Result<ElementId, PageError> {
		let banner = match self.page.query_selector(&self.banner_selector) {
			Some(banner) => banner,
			None => self.create_banner()?,
		};

		self.page.set_text(banner, message)?;
		self.page.set_hidden(banner, false)?;
		self.schedule_hide(banner);
		Ok(banner)
	}

	fn create_banner(&self) -> Result<ElementId, PageError> {
		let banner = self.page.create_element("div");
		self.page.set_attribute(banner, "class", &self.error_class)?;
		self.page.set_attribute(banner, "role", "alert")?;

		let container = self
			.summary_selectors
			.iter()
			.find_map(|selector| self.page.query_selector(selector))
			.unwrap_or_else(|| self.page.body());
		self.page.insert_first_child(container, banner)?;

		// Clicking the banner dismisses it
		let page = Arc::downgrade(&self.page);
		self.page.add_event_listener(
			banner,
			EventKind::Click,
			ListenerOptions::default(),
			Arc::new(move |_event| {
				if let Some(page) = page.upgrade() {
					let _ = page.set_hidden(banner, true);
				}
			}),
		)?;

		tracing::debug!(%banner, %container, "Created error banner");
		Ok(banner)
	}

	fn schedule_hide(&self, banner: ElementId) {
		let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		let latest = Arc::clone(&self.generation);
		let page = Arc::clone(&self.page);
		let delay = self.settings.error_display();

		self.runtime.spawn(async move {
			tokio::time::sleep(delay).await;
			if latest.load(Ordering::SeqCst) == generation {
				if let Err(e) = page.set_hidden(banner, true) {
					tracing::debug!(error = %e, "Error banner is gone");
				}
			}
		});
	}
}
