//! Registry of elements that already carry capture listeners.

use checkout_types::ElementId;
use parking_lot::Mutex;
use std::collections::HashSet;

/// Tracks which targets are bound, by element identity.
///
/// Every discovery trigger (initial scan, watcher callback, repeated scans)
/// goes through [`ElementRegistry::mark_bound`] before attaching a listener,
/// so a target is bound at most once however many triggers find it. Entries
/// are never evicted during the page lifetime; a removed element simply stays
/// recorded.
#[derive(Debug, Default)]
pub struct ElementRegistry {
	bound: Mutex<HashSet<ElementId>>,
}

impl ElementRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `id` as bound. Returns `true` only for the first caller, who
	/// is then responsible for attaching the listener.
	pub fn mark_bound(&self, id: ElementId) -> bool {
		self.bound.lock().insert(id)
	}

	pub fn is_bound(&self, id: ElementId) -> bool {
		self.bound.lock().contains(&id)
	}

	pub fn len(&self) -> usize {
		self.bound.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.bound.lock().is_empty()
	}
}
