//! Element identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle identifying one element of a host page.
///
/// Handles compare by identity: two elements with identical attributes have
/// different handles, and a handle stays valid (if disconnected) after its
/// element is removed from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "el#{}", self.0)
	}
}
