//! Checkout control state.

use serde::{Deserialize, Serialize};

/// Label and enabled flag of the checkout control captured before an attempt.
///
/// Restored verbatim when the attempt fails and dropped when it succeeds,
/// since a successful attempt navigates away from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlUiState {
	pub label: String,
	pub disabled: bool,
}
