//! Handoff wire types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// URL returned by the order-processing endpoint.
///
/// Kept verbatim as received so that navigation goes to exactly the location
/// the endpoint chose, relative or absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectTarget(String);

impl RedirectTarget {
	/// Wraps a redirect location. Blank locations are not targets.
	pub fn new(location: impl Into<String>) -> Option<Self> {
		let location = location.into();
		if location.trim().is_empty() {
			None
		} else {
			Some(Self(location))
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for RedirectTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Success body of the order-processing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandoffResponse {
	#[serde(rename = "redirectUrl")]
	pub redirect_url: Option<String>,
}

/// Error body of the order-processing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandoffErrorBody {
	/// Human-readable reason, shown to the shopper as is.
	pub message: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_blank_redirect_is_not_a_target() {
		assert!(RedirectTarget::new("").is_none());
		assert!(RedirectTarget::new("   ").is_none());
		assert_eq!(
			RedirectTarget::new("https://shop.example/thank-you")
				.unwrap()
				.as_str(),
			"https://shop.example/thank-you"
		);
	}

	#[test]
	fn test_response_reads_camel_case_field() {
		let body: HandoffResponse =
			serde_json::from_str(r#"{"redirectUrl":"/pay/42","orderId":"42"}"#).unwrap();
		assert_eq!(body.redirect_url.as_deref(), Some("/pay/42"));

		let body: HandoffResponse = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
		assert!(body.redirect_url.is_none());
	}
}
