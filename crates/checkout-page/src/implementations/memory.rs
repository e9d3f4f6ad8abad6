//! In-memory page implementation.
//!
//! This module provides a small document tree implementing
//! [`PageInterface`], used by the test suites and the checkout simulator.
//! Dispatch follows document semantics closely enough to exercise the
//! interception pipeline: capture listeners run from the root down to the
//! target, bubbling listeners from the target back up, a disabled control
//! swallows clicks, and an unprevented click on a submit control submits its
//! form.
//!
//! Listeners are invoked without holding the page lock, so they may call
//! back into the page.

use crate::{
	DomEvent, ElementInfo, EventKind, EventPhase, Listener, ListenerOptions, MutationBatch,
	PageError, PageInterface,
};
use checkout_types::selector::Matchable;
use checkout_types::{ElementId, Selector};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::broadcast;
use url::Url;

/// Capacity of the mutation feed.
const MUTATION_CHANNEL_CAPACITY: usize = 64;

/// What a simulated click ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
	/// The control is disabled; no event was dispatched.
	Suppressed,
	/// A listener prevented the click's default action.
	Prevented,
	/// The click submitted the form but a listener prevented the submission.
	SubmitPrevented { form: ElementId },
	/// The form was submitted natively.
	NativeSubmit { form: ElementId },
	/// The click had no default action.
	NoDefaultAction,
}

/// A form submission that reached the platform's native handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSubmission {
	pub form: ElementId,
	pub submitter: Option<ElementId>,
}

struct RegisteredListener {
	kind: EventKind,
	capture: bool,
	listener: Listener,
}

struct Node {
	tag: String,
	attributes: BTreeMap<String, String>,
	parent: Option<ElementId>,
	children: Vec<ElementId>,
	disabled: bool,
	hidden: bool,
	text: String,
	listeners: Vec<RegisteredListener>,
}

impl Node {
	fn new(tag: &str) -> Self {
		Self {
			tag: tag.to_ascii_lowercase(),
			attributes: BTreeMap::new(),
			parent: None,
			children: Vec::new(),
			disabled: false,
			hidden: false,
			text: String::new(),
			listeners: Vec::new(),
		}
	}
}

impl Matchable for Node {
	fn tag(&self) -> &str {
		&self.tag
	}

	fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.get(name).map(String::as_str)
	}
}

struct PageState {
	nodes: HashMap<ElementId, Node>,
	root: ElementId,
	body: ElementId,
	next_id: u64,
	navigations: Vec<String>,
	native_submissions: Vec<NativeSubmission>,
	query_count: usize,
	mutations: Option<broadcast::Sender<MutationBatch>>,
}

impl PageState {
	fn node(&self, id: ElementId) -> Result<&Node, PageError> {
		self.nodes.get(&id).ok_or(PageError::UnknownElement(id))
	}

	fn node_mut(&mut self, id: ElementId) -> Result<&mut Node, PageError> {
		self.nodes.get_mut(&id).ok_or(PageError::UnknownElement(id))
	}

	fn allocate(&mut self, tag: &str) -> ElementId {
		let id = ElementId(self.next_id);
		self.next_id += 1;
		self.nodes.insert(id, Node::new(tag));
		id
	}

	fn is_connected(&self, id: ElementId) -> bool {
		let mut current = Some(id);
		while let Some(node_id) = current {
			if node_id == self.root {
				return true;
			}
			current = self.nodes.get(&node_id).and_then(|n| n.parent);
		}
		false
	}

	fn is_ancestor(&self, ancestor: ElementId, of: ElementId) -> bool {
		let mut current = Some(of);
		while let Some(node_id) = current {
			if node_id == ancestor {
				return true;
			}
			current = self.nodes.get(&node_id).and_then(|n| n.parent);
		}
		false
	}

	/// Descendants of `root` in document order, excluding `root` itself.
	fn descendants(&self, root: ElementId) -> Vec<ElementId> {
		let mut out = Vec::new();
		let mut stack: Vec<ElementId> = self
			.nodes
			.get(&root)
			.map(|n| n.children.iter().rev().copied().collect())
			.unwrap_or_default();
		while let Some(id) = stack.pop() {
			out.push(id);
			if let Some(node) = self.nodes.get(&id) {
				stack.extend(node.children.iter().rev().copied());
			}
		}
		out
	}

	fn find(&self, root: ElementId, selector: &Selector) -> Vec<ElementId> {
		self.descendants(root)
			.into_iter()
			.filter(|id| self.nodes.get(id).is_some_and(|n| selector.matches(n)))
			.collect()
	}

	fn owning_form(&self, id: ElementId) -> Option<ElementId> {
		let node = self.nodes.get(&id)?;
		if let Some(form_ref) = node.attributes.get("form") {
			// An explicit reference that does not name a form leaves the
			// control without an owner; there is no ancestor fallback.
			let selector = Selector::id(form_ref.clone());
			return self
				.find(self.root, &selector)
				.into_iter()
				.find(|candidate| self.nodes.get(candidate).is_some_and(|n| n.tag == "form"));
		}
		let mut current = node.parent;
		while let Some(parent_id) = current {
			let parent = self.nodes.get(&parent_id)?;
			if parent.tag == "form" {
				return Some(parent_id);
			}
			current = parent.parent;
		}
		None
	}

	fn info(&self, id: ElementId) -> Option<ElementInfo> {
		let node = self.nodes.get(&id)?;
		Some(ElementInfo {
			id,
			tag: node.tag.clone(),
			attributes: node.attributes.clone(),
			disabled: node.disabled,
			hidden: node.hidden,
			text: node.text.clone(),
			connected: self.is_connected(id),
		})
	}

	/// Path from the root (or the top of a detached tree) down to `target`.
	fn path_to(&self, target: ElementId) -> Vec<ElementId> {
		let mut path = vec![target];
		let mut current = self.nodes.get(&target).and_then(|n| n.parent);
		while let Some(id) = current {
			path.push(id);
			current = self.nodes.get(&id).and_then(|n| n.parent);
		}
		path.reverse();
		path
	}

	fn detach(&mut self, child: ElementId) -> Result<(), PageError> {
		if let Some(parent) = self.node(child)?.parent {
			self.node_mut(parent)?.children.retain(|c| *c != child);
			self.node_mut(child)?.parent = None;
		}
		Ok(())
	}

	fn publish(&self, batch: MutationBatch) {
		if let Some(sender) = &self.mutations {
			// No receivers simply means nobody is observing
			let _ = sender.send(batch);
		}
	}
}

/// In-memory page.
pub struct MemoryPage {
	state: Mutex<PageState>,
	location: Url,
	referrer: String,
	user_agent: String,
}

impl MemoryPage {
	/// Creates an empty document (`html` > `body`) at `https://shop.example/cart`.
	pub fn new() -> Self {
		let (sender, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
		let mut state = PageState {
			nodes: HashMap::new(),
			root: ElementId(0),
			body: ElementId(0),
			next_id: 0,
			navigations: Vec::new(),
			native_submissions: Vec::new(),
			query_count: 0,
			mutations: Some(sender),
		};
		let root = state.allocate("html");
		let body = state.allocate("body");
		state.root = root;
		state.body = body;
		if let Some(node) = state.nodes.get_mut(&root) {
			node.children.push(body);
		}
		if let Some(node) = state.nodes.get_mut(&body) {
			node.parent = Some(root);
		}

		Self {
			state: Mutex::new(state),
			location: Url::parse("https://shop.example/cart").expect("static URL is valid"),
			referrer: String::new(),
			user_agent: "Mozilla/5.0 (checkout-simulator)".to_string(),
		}
	}

	pub fn with_location(mut self, location: Url) -> Self {
		self.location = location;
		self
	}

	pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
		self.referrer = referrer.into();
		self
	}

	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();
		self
	}

	/// Creates a detached element with attributes. A `disabled` attribute
	/// disables the element.
	pub fn create(&self, tag: &str, attributes: &[(&str, &str)]) -> ElementId {
		let mut state = self.state.lock();
		let id = state.allocate(tag);
		if let Some(node) = state.nodes.get_mut(&id) {
			for (name, value) in attributes {
				if *name == "disabled" {
					node.disabled = true;
				} else {
					node.attributes.insert(name.to_string(), value.to_string());
				}
			}
		}
		id
	}

	/// Appends `child` (and its subtree) under `parent`.
	pub fn append_child(&self, parent: ElementId, child: ElementId) -> Result<(), PageError> {
		let mut state = self.state.lock();
		state.node(parent)?;
		state.node(child)?;
		if state.is_ancestor(child, parent) {
			return Err(PageError::Hierarchy(format!(
				"{child} cannot be appended inside itself"
			)));
		}
		state.detach(child)?;
		state.node_mut(parent)?.children.push(child);
		state.node_mut(child)?.parent = Some(parent);
		if state.is_connected(child) {
			state.publish(MutationBatch {
				added: vec![child],
				removed: Vec::new(),
			});
		}
		Ok(())
	}

	/// Removes an element (and its subtree) from the document.
	pub fn remove(&self, id: ElementId) -> Result<(), PageError> {
		let mut state = self.state.lock();
		if id == state.root || id == state.body {
			return Err(PageError::Hierarchy("cannot remove the document body".into()));
		}
		let was_connected = state.is_connected(id);
		state.detach(id)?;
		if was_connected {
			state.publish(MutationBatch {
				added: Vec::new(),
				removed: vec![id],
			});
		}
		Ok(())
	}

	/// Dispatches an event and returns it after dispatch.
	pub fn dispatch(&self, mut event: DomEvent) -> DomEvent {
		let target = event.target();
		let path = self.state.lock().path_to(target);

		for node in &path {
			let phase = if *node == target {
				EventPhase::AtTarget
			} else {
				EventPhase::Capturing
			};
			self.invoke(*node, &mut event, phase, true);
			if event.is_propagation_stopped() {
				return event;
			}
		}
		for node in path.iter().rev() {
			let phase = if *node == target {
				EventPhase::AtTarget
			} else {
				EventPhase::Bubbling
			};
			self.invoke(*node, &mut event, phase, false);
			if event.is_propagation_stopped() {
				return event;
			}
		}
		event
	}

	fn invoke(&self, node: ElementId, event: &mut DomEvent, phase: EventPhase, capture: bool) {
		let listeners: Vec<Listener> = {
			let state = self.state.lock();
			match state.nodes.get(&node) {
				Some(n) => n
					.listeners
					.iter()
					.filter(|l| l.kind == event.kind() && l.capture == capture)
					.map(|l| l.listener.clone())
					.collect(),
				None => return,
			}
		};
		event.enter(node, phase);
		for listener in listeners {
			listener(event);
			if event.is_immediate_propagation_stopped() {
				break;
			}
		}
	}

	/// Simulates a user activating an element.
	pub fn click(&self, id: ElementId) -> ClickOutcome {
		let Some(info) = self.state.lock().info(id) else {
			return ClickOutcome::Suppressed;
		};
		if info.disabled {
			return ClickOutcome::Suppressed;
		}

		let event = self.dispatch(DomEvent::new(EventKind::Click, id));
		if event.default_prevented() {
			return ClickOutcome::Prevented;
		}

		if info.is_submit_control() {
			let form = self.state.lock().owning_form(id);
			if let Some(form) = form {
				return self.submit(form, Some(id));
			}
		}
		ClickOutcome::NoDefaultAction
	}

	/// Submits a form the way `requestSubmit` does: a cancellable submit
	/// event first, native submission only if nobody prevented it.
	pub fn submit(&self, form: ElementId, submitter: Option<ElementId>) -> ClickOutcome {
		let event = self.dispatch(DomEvent::new(EventKind::Submit, form).with_submitter(submitter));
		if event.default_prevented() {
			return ClickOutcome::SubmitPrevented { form };
		}
		self.state
			.lock()
			.native_submissions
			.push(NativeSubmission { form, submitter });
		ClickOutcome::NativeSubmit { form }
	}

	/// Closes the mutation feed, as page teardown does.
	pub fn close(&self) {
		self.state.lock().mutations = None;
	}

	/// URLs the page was navigated to, oldest first.
	pub fn navigations(&self) -> Vec<String> {
		self.state.lock().navigations.clone()
	}

	pub fn native_submissions(&self) -> Vec<NativeSubmission> {
		self.state.lock().native_submissions.clone()
	}

	/// Number of lookups (`element_by_id`, `query_*`) served so far.
	pub fn query_count(&self) -> usize {
		self.state.lock().query_count
	}

	/// Listeners registered on an element for one event kind.
	pub fn listener_count(&self, id: ElementId, kind: EventKind) -> usize {
		self.state
			.lock()
			.nodes
			.get(&id)
			.map(|n| n.listeners.iter().filter(|l| l.kind == kind).count())
			.unwrap_or(0)
	}

	/// Direct children of an element.
	pub fn children(&self, id: ElementId) -> Vec<ElementId> {
		self.state
			.lock()
			.nodes
			.get(&id)
			.map(|n| n.children.clone())
			.unwrap_or_default()
	}
}

impl Default for MemoryPage {
	fn default() -> Self {
		Self::new()
	}
}

impl PageInterface for MemoryPage {
	fn body(&self) -> ElementId {
		self.state.lock().body
	}

	fn location(&self) -> Url {
		self.location.clone()
	}

	fn referrer(&self) -> String {
		self.referrer.clone()
	}

	fn user_agent(&self) -> String {
		self.user_agent.clone()
	}

	fn element_by_id(&self, id: &str) -> Option<ElementId> {
		let mut state = self.state.lock();
		state.query_count += 1;
		let root = state.root;
		state.find(root, &Selector::id(id)).into_iter().next()
	}

	fn query_selector(&self, selector: &Selector) -> Option<ElementId> {
		let mut state = self.state.lock();
		state.query_count += 1;
		let root = state.root;
		state.find(root, selector).into_iter().next()
	}

	fn query_selector_all(&self, selector: &Selector) -> Vec<ElementId> {
		let mut state = self.state.lock();
		state.query_count += 1;
		let root = state.root;
		state.find(root, selector)
	}

	fn element(&self, id: ElementId) -> Option<ElementInfo> {
		self.state.lock().info(id)
	}

	fn owning_form(&self, id: ElementId) -> Option<ElementId> {
		self.state.lock().owning_form(id)
	}

	fn add_event_listener(
		&self,
		target: ElementId,
		kind: EventKind,
		options: ListenerOptions,
		listener: Listener,
	) -> Result<(), PageError> {
		self.state
			.lock()
			.node_mut(target)?
			.listeners
			.push(RegisteredListener {
				kind,
				capture: options.capture,
				listener,
			});
		Ok(())
	}

	fn set_disabled(&self, id: ElementId, disabled: bool) -> Result<(), PageError> {
		self.state.lock().node_mut(id)?.disabled = disabled;
		Ok(())
	}

	fn set_text(&self, id: ElementId, text: &str) -> Result<(), PageError> {
		self.state.lock().node_mut(id)?.text = text.to_string();
		Ok(())
	}

	fn set_hidden(&self, id: ElementId, hidden: bool) -> Result<(), PageError> {
		self.state.lock().node_mut(id)?.hidden = hidden;
		Ok(())
	}

	fn create_element(&self, tag: &str) -> ElementId {
		self.state.lock().allocate(tag)
	}

	fn set_attribute(&self, id: ElementId, name: &str, value: &str) -> Result<(), PageError> {
		self.state
			.lock()
			.node_mut(id)?
			.attributes
			.insert(name.to_string(), value.to_string());
		Ok(())
	}

	fn insert_first_child(&self, parent: ElementId, child: ElementId) -> Result<(), PageError> {
		let mut state = self.state.lock();
		state.node(parent)?;
		state.node(child)?;
		if state.is_ancestor(child, parent) {
			return Err(PageError::Hierarchy(format!(
				"{child} cannot be inserted inside itself"
			)));
		}
		state.detach(child)?;
		state.node_mut(parent)?.children.insert(0, child);
		state.node_mut(child)?.parent = Some(parent);
		if state.is_connected(child) {
			state.publish(MutationBatch {
				added: vec![child],
				removed: Vec::new(),
			});
		}
		Ok(())
	}

	fn navigate(&self, url: &str) {
		tracing::debug!(url, "Page navigation");
		self.state.lock().navigations.push(url.to_string());
	}

	fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch> {
		match &self.state.lock().mutations {
			Some(sender) => sender.subscribe(),
			None => {
				// Torn down: hand out a feed that is already closed
				let (_, receiver) = broadcast::channel(1);
				receiver
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	fn recorder(log: Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Listener {
		Arc::new(move |_event: &mut DomEvent| log.lock().push(label))
	}

	fn cart_page() -> (MemoryPage, ElementId, ElementId) {
		let page = MemoryPage::new();
		let form = page.create("form", &[("id", "cart-form"), ("action", "/cart")]);
		let button = page.create("button", &[("id", "checkout"), ("name", "checkout")]);
		page.append_child(form, button).unwrap();
		page.append_child(page.body(), form).unwrap();
		(page, form, button)
	}

	#[test]
	fn test_capture_runs_before_bubble() {
		let (page, form, button) = cart_page();
		let log = Arc::new(Mutex::new(Vec::new()));
		page.add_event_listener(
			page.body(),
			EventKind::Click,
			ListenerOptions::default(),
			recorder(log.clone(), "body-bubble"),
		)
		.unwrap();
		page.add_event_listener(
			form,
			EventKind::Click,
			ListenerOptions::capture(),
			recorder(log.clone(), "form-capture"),
		)
		.unwrap();
		page.add_event_listener(
			button,
			EventKind::Click,
			ListenerOptions::default(),
			recorder(log.clone(), "button"),
		)
		.unwrap();

		page.dispatch(DomEvent::new(EventKind::Click, button));
		assert_eq!(*log.lock(), vec!["form-capture", "button", "body-bubble"]);
	}

	#[test]
	fn test_stop_immediate_skips_same_node_listeners() {
		let (page, form, _) = cart_page();
		let later = Arc::new(AtomicUsize::new(0));
		page.add_event_listener(
			form,
			EventKind::Submit,
			ListenerOptions::capture(),
			Arc::new(|event: &mut DomEvent| {
				event.prevent_default();
				event.stop_immediate_propagation();
			}),
		)
		.unwrap();
		let counter = later.clone();
		page.add_event_listener(
			form,
			EventKind::Submit,
			ListenerOptions::capture(),
			Arc::new(move |_: &mut DomEvent| {
				counter.fetch_add(1, Ordering::SeqCst);
			}),
		)
		.unwrap();

		assert_eq!(page.submit(form, None), ClickOutcome::SubmitPrevented { form });
		assert_eq!(later.load(Ordering::SeqCst), 0);
		assert!(page.native_submissions().is_empty());
	}

	#[test]
	fn test_click_submits_owning_form() {
		let (page, form, button) = cart_page();
		assert_eq!(page.click(button), ClickOutcome::NativeSubmit { form });
		assert_eq!(
			page.native_submissions(),
			vec![NativeSubmission {
				form,
				submitter: Some(button)
			}]
		);
	}

	#[test]
	fn test_disabled_control_swallows_click() {
		let (page, _, button) = cart_page();
		page.set_disabled(button, true).unwrap();
		assert_eq!(page.click(button), ClickOutcome::Suppressed);
		assert!(page.native_submissions().is_empty());
	}

	#[test]
	fn test_form_attribute_association() {
		let (page, form, _) = cart_page();
		let outside = page.create("button", &[("name", "checkout"), ("form", "cart-form")]);
		page.append_child(page.body(), outside).unwrap();
		assert_eq!(page.owning_form(outside), Some(form));

		// A form attribute naming nothing leaves the control ownerless even
		// inside another form
		let other = page.create("form", &[("id", "newsletter")]);
		let stray = page.create("button", &[("form", "missing")]);
		page.append_child(other, stray).unwrap();
		page.append_child(page.body(), other).unwrap();
		assert_eq!(page.owning_form(stray), None);
	}

	#[test]
	fn test_lookups_skip_detached_elements() {
		let (page, form, _) = cart_page();
		assert_eq!(page.element_by_id("cart-form"), Some(form));
		page.remove(form).unwrap();
		assert_eq!(page.element_by_id("cart-form"), None);
		assert!(!page.element(form).unwrap().connected);
		assert_eq!(page.query_count(), 2);
	}

	#[test]
	fn test_rejects_cycles_and_unknown_handles() {
		let (page, form, button) = cart_page();
		assert!(matches!(
			page.append_child(button, form),
			Err(PageError::Hierarchy(_))
		));
		assert_eq!(
			page.set_text(ElementId(999), "x"),
			Err(PageError::UnknownElement(ElementId(999)))
		);
	}

	#[tokio::test]
	async fn test_mutations_published_for_attached_changes() {
		let page = MemoryPage::new();
		let mut rx = page.subscribe_mutations();

		let form = page.create("form", &[("id", "cart-form")]);
		let button = page.create("button", &[("name", "checkout")]);
		// Building a detached subtree is invisible to observers
		page.append_child(form, button).unwrap();
		page.append_child(page.body(), form).unwrap();

		let batch = rx.recv().await.unwrap();
		assert_eq!(batch.added, vec![form]);

		page.remove(form).unwrap();
		let batch = rx.recv().await.unwrap();
		assert_eq!(batch.removed, vec![form]);
	}

	#[tokio::test]
	async fn test_close_ends_mutation_feed() {
		let page = MemoryPage::new();
		let mut rx = page.subscribe_mutations();
		page.close();
		assert!(matches!(
			rx.recv().await,
			Err(broadcast::error::RecvError::Closed)
		));
		let mut late = page.subscribe_mutations();
		assert!(matches!(
			late.recv().await,
			Err(broadcast::error::RecvError::Closed)
		));
	}
}
