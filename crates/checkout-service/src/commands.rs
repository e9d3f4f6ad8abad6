//! One-shot pipeline runs outside a page, used by the `preview` and
//! `handoff` commands.

use crate::factory::ServiceError;
use checkout_core::CheckoutError;
use checkout_delivery::{CartSource, HandoffInterface};
use checkout_order::{assemble, ContextProvider};
use checkout_types::RedirectTarget;

/// Renders the payload the current cart assembles to as pretty JSON.
///
/// A cart that cannot be assembled yields the shopper-facing message
/// instead; only a failed cart fetch is an error.
pub async fn preview(
	cart: &dyn CartSource,
	context: &dyn ContextProvider,
) -> Result<String, ServiceError> {
	let snapshot = cart.fetch_cart().await?;
	match assemble(&snapshot, &context.current()) {
		Ok(payload) => Ok(serde_json::to_string_pretty(&payload)?),
		Err(e) => Ok(CheckoutError::from(e).user_message()),
	}
}

/// One attempt without a page: fetch, assemble, send.
pub async fn run_handoff(
	cart: &dyn CartSource,
	handoff: &dyn HandoffInterface,
	context: &dyn ContextProvider,
) -> Result<RedirectTarget, CheckoutError> {
	let snapshot = cart.fetch_cart().await?;
	let payload = assemble(&snapshot, &context.current())?;
	tracing::debug!(lines = payload.cart.items.len(), "Handing off order");
	Ok(handoff.send(&payload).await?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::factory::build_http_collaborators;
	use checkout_config::ConfigBuilder;
	use checkout_core::error::NETWORK_MESSAGE;
	use checkout_delivery::FixedCartSource;
	use checkout_order::PageContext;
	use checkout_page::{MemoryPage, PageInterface};
	use checkout_types::CartSnapshot;
	use serde_json::json;
	use std::sync::Arc;
	use url::Url;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn cart_json() -> serde_json::Value {
		json!({
			"currency": "EUR",
			"total_price": 900,
			"items": [{ "id": 1, "quantity": 1, "price": 900, "product_title": "Tea" }]
		})
	}

	fn context(location: &Url) -> PageContext {
		let page: Arc<dyn PageInterface> = Arc::new(MemoryPage::new().with_location(location.clone()));
		PageContext::new(page, Some("tea.example".into()))
	}

	#[tokio::test]
	async fn test_preview_renders_payload() {
		let location: Url = "https://tea.example/cart".parse().unwrap();
		let cart = FixedCartSource::new(serde_json::from_value(cart_json()).unwrap());

		let output = preview(&cart, &context(&location)).await.unwrap();
		let payload: serde_json::Value = serde_json::from_str(&output).unwrap();

		assert_eq!(payload["cart"]["items"][0]["title"], "Tea");
		assert_eq!(payload["shop"]["domain"], "tea.example");
		assert!(output.contains('\n'));
	}

	#[tokio::test]
	async fn test_preview_of_empty_cart_prints_message() {
		let location: Url = "https://tea.example/cart".parse().unwrap();
		let cart = FixedCartSource::new(CartSnapshot::default());

		let output = preview(&cart, &context(&location)).await.unwrap();
		assert_eq!(output, "Cart is empty");
	}

	#[tokio::test]
	async fn test_handoff_against_store_endpoints() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/cart.js"))
			.respond_with(ResponseTemplate::new(200).set_body_json(cart_json()))
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/api/checkout"))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({ "redirectUrl": "/pay/42" })),
			)
			.expect(1)
			.mount(&server)
			.await;

		let location: Url = format!("{}/cart", server.uri()).parse().unwrap();
		let config = ConfigBuilder::new()
			.api_url(format!("{}/api/checkout", server.uri()))
			.build();
		let (cart, handoff) = build_http_collaborators(&config, &location).unwrap();

		let target = run_handoff(cart.as_ref(), handoff.as_ref(), &context(&location))
			.await
			.unwrap();
		assert_eq!(target.as_str(), "/pay/42");
	}

	#[tokio::test]
	async fn test_handoff_rejection_carries_server_message() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/cart.js"))
			.respond_with(ResponseTemplate::new(200).set_body_json(cart_json()))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/api/checkout"))
			.respond_with(
				ResponseTemplate::new(422).set_body_json(json!({ "message": "Tea is sold out" })),
			)
			.expect(1)
			.mount(&server)
			.await;

		let location: Url = format!("{}/cart", server.uri()).parse().unwrap();
		let config = ConfigBuilder::new()
			.api_url(format!("{}/api/checkout", server.uri()))
			.build();
		let (cart, handoff) = build_http_collaborators(&config, &location).unwrap();

		let err = run_handoff(cart.as_ref(), handoff.as_ref(), &context(&location))
			.await
			.unwrap_err();
		assert_eq!(err.user_message(), "Tea is sold out");
	}

	#[tokio::test]
	async fn test_handoff_with_unreachable_store() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let addr = listener.local_addr().unwrap();
		drop(listener);

		let location: Url = format!("http://{addr}/cart").parse().unwrap();
		let config = ConfigBuilder::new()
			.api_url(format!("http://{addr}/api/checkout"))
			.build();
		let (cart, handoff) = build_http_collaborators(&config, &location).unwrap();

		let err = run_handoff(cart.as_ref(), handoff.as_ref(), &context(&location))
			.await
			.unwrap_err();
		assert_eq!(err.user_message(), NETWORK_MESSAGE);
	}
}
