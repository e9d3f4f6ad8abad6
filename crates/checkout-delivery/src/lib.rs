//! Network collaborators of the checkout handoff.
//!
//! Two seams live here: the cart-state source, read once per attempt, and
//! the handoff client that posts the assembled order and returns where the
//! shopper should go next. Each failure is classified so the engine can pick
//! a message the shopper can act on.

use async_trait::async_trait;
use checkout_types::{CartSnapshot, OrderPayload, RedirectTarget};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod fixed;
	pub mod http;
}

pub use implementations::fixed::FixedCartSource;
pub use implementations::http::{HttpCartSource, HttpHandoffClient};

/// Errors that can occur while reading the cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
	/// The cart endpoint could not be reached.
	#[error("Network error: {0}")]
	Network(String),
	/// The cart endpoint answered with a non-success status, or the cart
	/// could not be read at all.
	#[error("{0}")]
	Unavailable(String),
	/// The cart body is not a cart.
	#[error("Invalid cart data: {0}")]
	Decode(String),
}

/// Errors that can occur during the handoff exchange.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandoffError {
	/// No response was received (DNS, connection refused, timeout).
	#[error("Network error: {0}")]
	Network(String),
	/// The endpoint answered but rejected the order or sent a body that is
	/// not JSON.
	#[error("{message}")]
	Api { message: String },
	/// Success status, but the body breaks the contract.
	#[error("Protocol error: {0}")]
	Protocol(String),
}

/// Source of the shopper's current cart.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait CartSource: Send + Sync {
	/// Fetches a fresh snapshot. Implementations must not cache.
	async fn fetch_cart(&self) -> Result<CartSnapshot, CartError>;
}

/// Client of the order-processing endpoint.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait HandoffInterface: Send + Sync {
	/// Sends the payload once and returns the redirect target.
	///
	/// There is no retry; a failed attempt is retried only by the shopper.
	async fn send(&self, payload: &OrderPayload) -> Result<RedirectTarget, HandoffError>;
}
