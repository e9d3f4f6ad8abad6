//! Error types of the checkout engine.

use checkout_config::ConfigError;
use checkout_delivery::{CartError, HandoffError};
use checkout_order::AssembleError;
use thiserror::Error;

/// Shown when neither collaborator could be reached.
pub const NETWORK_MESSAGE: &str =
	"Could not connect to the payment server. Please check your internet connection.";
/// Shown when the failure has no shopper-facing description.
pub const GENERIC_MESSAGE: &str = "An error occurred. Please try again.";
/// Shown when the endpoint accepted the order without saying where to go.
pub const MISSING_REDIRECT_MESSAGE: &str = "No redirect URL received from API";

/// Errors that end a checkout attempt.
///
/// All of them are caught at the attempt boundary and turned into a banner;
/// none propagates to the host page.
#[derive(Debug, Error)]
pub enum CheckoutError {
	#[error("Cart is empty")]
	EmptyCart,
	#[error("Cart error: {0}")]
	Cart(#[from] CartError),
	#[error("Handoff error: {0}")]
	Handoff(#[from] HandoffError),
}

/// Reasons an activation is left to the native checkout flow.
///
/// Unlike [`CheckoutError`] these never reach the shopper: no attempt starts,
/// nothing is shown, and the page keeps its own behavior.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
	/// The cart form or checkout control could not be resolved.
	#[error("Missing target: {0}")]
	MissingTarget(String),
	#[error("Attempt already in progress")]
	InProgress,
}

impl From<AssembleError> for CheckoutError {
	fn from(err: AssembleError) -> Self {
		match err {
			AssembleError::EmptyCart => CheckoutError::EmptyCart,
		}
	}
}

impl CheckoutError {
	/// Message shown to the shopper.
	///
	/// Transport failures share one connectivity message, while endpoint
	/// rejections show the endpoint's own reason.
	pub fn user_message(&self) -> String {
		match self {
			CheckoutError::EmptyCart => "Cart is empty".to_string(),
			CheckoutError::Cart(CartError::Network(_))
			| CheckoutError::Handoff(HandoffError::Network(_)) => NETWORK_MESSAGE.to_string(),
			CheckoutError::Cart(CartError::Unavailable(message)) => message.clone(),
			CheckoutError::Cart(CartError::Decode(_)) => GENERIC_MESSAGE.to_string(),
			CheckoutError::Handoff(HandoffError::Api { message }) => message.clone(),
			CheckoutError::Handoff(HandoffError::Protocol(_)) => {
				MISSING_REDIRECT_MESSAGE.to_string()
			},
		}
	}
}

/// Errors that can occur while constructing or starting the engine.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),
	#[error("Runtime error: {0}")]
	Runtime(String),
	#[error("Engine already started")]
	AlreadyStarted,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_network_and_api_messages_differ() {
		let network = CheckoutError::from(HandoffError::Network("connection refused".into()));
		let cart_network = CheckoutError::from(CartError::Network("dns".into()));
		let api = CheckoutError::from(HandoffError::Api {
			message: "out of stock".into(),
		});

		assert_eq!(network.user_message(), NETWORK_MESSAGE);
		assert_eq!(cart_network.user_message(), NETWORK_MESSAGE);
		assert_eq!(api.user_message(), "out of stock");
		assert_ne!(network.user_message(), api.user_message());
	}

	#[test]
	fn test_messages_hide_technical_detail() {
		let protocol = CheckoutError::from(HandoffError::Protocol("missing redirect target".into()));
		let decode = CheckoutError::from(CartError::Decode("expected value at line 1".into()));
		let unavailable =
			CheckoutError::from(CartError::Unavailable("Failed to fetch cart: Not Found".into()));

		assert_eq!(protocol.user_message(), MISSING_REDIRECT_MESSAGE);
		assert_eq!(decode.user_message(), GENERIC_MESSAGE);
		assert_eq!(unavailable.user_message(), "Failed to fetch cart: Not Found");
		assert_eq!(
			CheckoutError::from(AssembleError::EmptyCart).user_message(),
			"Cart is empty"
		);
	}
}
