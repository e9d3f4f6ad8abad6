//! Host page contract for the checkout pipeline.
//!
//! This module defines the narrow slice of a document object model that the
//! pipeline depends on: element lookup, form association, capture-phase event
//! listeners, checkout control state, error banner plumbing, navigation and a
//! feed of structural mutations. Browser bindings and the in-memory page used
//! by tests and the simulator both implement [`PageInterface`].

use checkout_types::selector::Matchable;
use checkout_types::{ElementId, Selector};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use url::Url;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

pub use implementations::memory::{ClickOutcome, MemoryPage, NativeSubmission};

/// Errors that can occur during page operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
	/// The handle does not belong to this page.
	#[error("Unknown element: {0}")]
	UnknownElement(ElementId),
	/// The operation would produce an invalid tree.
	#[error("Hierarchy error: {0}")]
	Hierarchy(String),
}

/// Events the pipeline listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
	Click,
	Submit,
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EventKind::Click => f.write_str("click"),
			EventKind::Submit => f.write_str("submit"),
		}
	}
}

/// Phase of dispatch in which a listener is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
	None,
	Capturing,
	AtTarget,
	Bubbling,
}

/// Options accepted when registering a listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
	/// Run during the capture phase, before bubbling listeners and before
	/// the default action.
	pub capture: bool,
}

impl ListenerOptions {
	pub fn capture() -> Self {
		Self { capture: true }
	}
}

/// Event listener callback.
pub type Listener = Arc<dyn Fn(&mut DomEvent) + Send + Sync>;

/// An event travelling through the page.
#[derive(Debug, Clone)]
pub struct DomEvent {
	kind: EventKind,
	target: ElementId,
	submitter: Option<ElementId>,
	current_target: Option<ElementId>,
	phase: EventPhase,
	default_prevented: bool,
	propagation_stopped: bool,
	immediate_propagation_stopped: bool,
}

impl DomEvent {
	pub fn new(kind: EventKind, target: ElementId) -> Self {
		Self {
			kind,
			target,
			submitter: None,
			current_target: None,
			phase: EventPhase::None,
			default_prevented: false,
			propagation_stopped: false,
			immediate_propagation_stopped: false,
		}
	}

	/// Sets the control that triggered a submit event.
	pub fn with_submitter(mut self, submitter: Option<ElementId>) -> Self {
		self.submitter = submitter;
		self
	}

	pub fn kind(&self) -> EventKind {
		self.kind
	}

	pub fn target(&self) -> ElementId {
		self.target
	}

	/// For submit events, the control that submitted the form.
	pub fn submitter(&self) -> Option<ElementId> {
		self.submitter
	}

	pub fn current_target(&self) -> Option<ElementId> {
		self.current_target
	}

	pub fn phase(&self) -> EventPhase {
		self.phase
	}

	/// Moves the event to the next node on its path. Called by dispatchers.
	pub fn enter(&mut self, node: ElementId, phase: EventPhase) {
		self.current_target = Some(node);
		self.phase = phase;
	}

	pub fn prevent_default(&mut self) {
		self.default_prevented = true;
	}

	pub fn default_prevented(&self) -> bool {
		self.default_prevented
	}

	/// Stops the event after the listeners of the current node.
	pub fn stop_propagation(&mut self) {
		self.propagation_stopped = true;
	}

	/// Stops the event immediately, skipping remaining listeners on the
	/// current node as well.
	pub fn stop_immediate_propagation(&mut self) {
		self.propagation_stopped = true;
		self.immediate_propagation_stopped = true;
	}

	pub fn is_propagation_stopped(&self) -> bool {
		self.propagation_stopped
	}

	pub fn is_immediate_propagation_stopped(&self) -> bool {
		self.immediate_propagation_stopped
	}
}

/// Snapshot of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
	pub id: ElementId,
	/// Lower-case tag name.
	pub tag: String,
	pub attributes: BTreeMap<String, String>,
	pub disabled: bool,
	pub hidden: bool,
	pub text: String,
	/// Whether the element is attached to the document.
	pub connected: bool,
}

impl ElementInfo {
	/// Value of the `id` attribute.
	pub fn dom_id(&self) -> Option<&str> {
		self.attribute("id")
	}

	/// Value of the `name` attribute.
	pub fn name(&self) -> Option<&str> {
		self.attribute("name")
	}

	pub fn is_form(&self) -> bool {
		self.tag == "form"
	}

	/// Whether activating this element submits its form.
	pub fn is_submit_control(&self) -> bool {
		let kind = self.attribute("type").map(str::to_ascii_lowercase);
		match self.tag.as_str() {
			"button" => matches!(kind.as_deref(), None | Some("submit")),
			"input" => matches!(kind.as_deref(), Some("submit") | Some("image")),
			_ => false,
		}
	}
}

impl Matchable for ElementInfo {
	fn tag(&self) -> &str {
		&self.tag
	}

	fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.get(name).map(String::as_str)
	}
}

/// One batch of structural changes under the document body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
	pub added: Vec<ElementId>,
	pub removed: Vec<ElementId>,
}

/// Trait defining the host page operations the pipeline relies on.
///
/// Lookups only see elements attached to the document. Operations on a
/// detached element succeed, matching how documents treat removed nodes;
/// only handles that never belonged to the page are rejected.
pub trait PageInterface: Send + Sync {
	/// The document body.
	fn body(&self) -> ElementId;

	/// Current page URL.
	fn location(&self) -> Url;

	/// URL of the page that linked here, empty when unknown.
	fn referrer(&self) -> String;

	fn user_agent(&self) -> String;

	/// First attached element, in document order, with the given `id`.
	fn element_by_id(&self, id: &str) -> Option<ElementId>;

	/// First attached element matching the selector.
	fn query_selector(&self, selector: &Selector) -> Option<ElementId>;

	/// All attached elements matching the selector, in document order.
	fn query_selector_all(&self, selector: &Selector) -> Vec<ElementId>;

	/// Snapshot of an element.
	fn element(&self, id: ElementId) -> Option<ElementInfo>;

	/// The form an element submits: the form named by its `form` attribute
	/// when present, otherwise its nearest ancestor form.
	fn owning_form(&self, id: ElementId) -> Option<ElementId>;

	/// Registers a listener on an element.
	fn add_event_listener(
		&self,
		target: ElementId,
		kind: EventKind,
		options: ListenerOptions,
		listener: Listener,
	) -> Result<(), PageError>;

	fn set_disabled(&self, id: ElementId, disabled: bool) -> Result<(), PageError>;

	/// Replaces the text content of an element.
	fn set_text(&self, id: ElementId, text: &str) -> Result<(), PageError>;

	/// Shows or hides an element without removing it.
	fn set_hidden(&self, id: ElementId, hidden: bool) -> Result<(), PageError>;

	/// Creates a detached element.
	fn create_element(&self, tag: &str) -> ElementId;

	fn set_attribute(&self, id: ElementId, name: &str, value: &str) -> Result<(), PageError>;

	/// Inserts `child` before the first child of `parent`.
	fn insert_first_child(&self, parent: ElementId, child: ElementId) -> Result<(), PageError>;

	/// Navigates the page away.
	fn navigate(&self, url: &str);

	/// Starts observing structural changes under the body.
	///
	/// Dropping the receiver disconnects the observer.
	fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch>;
}
