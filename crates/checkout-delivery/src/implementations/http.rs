//! HTTP implementations of the cart source and the handoff client.

use crate::{CartError, CartSource, HandoffError, HandoffInterface};
use async_trait::async_trait;
use checkout_types::{
	CartSnapshot, HandoffErrorBody, HandoffResponse, OrderPayload, RedirectTarget,
};
use reqwest::{
	header::{HeaderMap, HeaderValue, ACCEPT},
	Client, ClientBuilder, StatusCode,
};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Header that lets requests through the ngrok interstitial page.
const NGROK_SKIP_WARNING: &str = "ngrok-skip-browser-warning";

/// Reason phrase for a status, as a browser would report it.
fn status_text(status: StatusCode) -> String {
	status
		.canonical_reason()
		.map(str::to_string)
		.unwrap_or_else(|| status.as_str().to_string())
}

/// Returns true when the endpoint is served through an ngrok tunnel.
pub fn is_ngrok_endpoint(endpoint: &Url) -> bool {
	endpoint
		.host_str()
		.is_some_and(|host| host.contains("ngrok"))
}

/// Reads the cart from the storefront's cart endpoint.
#[derive(Debug, Clone)]
pub struct HttpCartSource {
	client: Client,
	cart_url: Url,
}

impl HttpCartSource {
	pub fn new(cart_url: Url, timeout: Duration) -> Result<Self, CartError> {
		let mut headers = HeaderMap::new();
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		let client = Client::builder()
			.default_headers(headers)
			.timeout(timeout)
			.build()
			.map_err(|e| CartError::Network(format!("Failed to create HTTP client: {e}")))?;

		Ok(Self { client, cart_url })
	}

	pub fn cart_url(&self) -> &Url {
		&self.cart_url
	}
}

#[async_trait]
impl CartSource for HttpCartSource {
	async fn fetch_cart(&self) -> Result<CartSnapshot, CartError> {
		debug!(url = %self.cart_url, "Fetching cart");

		let response = self
			.client
			.get(self.cart_url.clone())
			.send()
			.await
			.map_err(|e| CartError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(CartError::Unavailable(format!(
				"Failed to fetch cart: {}",
				status_text(status)
			)));
		}

		let body = response
			.bytes()
			.await
			.map_err(|e| CartError::Network(e.to_string()))?;

		serde_json::from_slice(&body).map_err(|e| CartError::Decode(e.to_string()))
	}
}

/// Posts orders to the order-processing endpoint.
#[derive(Debug, Clone)]
pub struct HttpHandoffClient {
	client: Client,
	endpoint: Url,
}

impl HttpHandoffClient {
	pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, HandoffError> {
		let client = Self::client_builder(&endpoint, timeout)
			.build()
			.map_err(|e| HandoffError::Network(format!("Failed to create HTTP client: {e}")))?;

		Ok(Self { client, endpoint })
	}

	fn client_builder(endpoint: &Url, timeout: Duration) -> ClientBuilder {
		let mut headers = HeaderMap::new();
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
		if is_ngrok_endpoint(endpoint) {
			headers.insert(NGROK_SKIP_WARNING, HeaderValue::from_static("true"));
		}

		Client::builder().default_headers(headers).timeout(timeout)
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}

#[async_trait]
impl HandoffInterface for HttpHandoffClient {
	async fn send(&self, payload: &OrderPayload) -> Result<RedirectTarget, HandoffError> {
		debug!(
			endpoint = %self.endpoint,
			lines = payload.cart.items.len(),
			"Sending order to processing endpoint"
		);

		let response = self
			.client
			.post(self.endpoint.clone())
			.json(payload)
			.send()
			.await
			.map_err(|e| HandoffError::Network(e.to_string()))?;

		let status = response.status();
		let body = response
			.bytes()
			.await
			.map_err(|e| HandoffError::Network(e.to_string()))?;

		if !status.is_success() {
			let message = serde_json::from_slice::<HandoffErrorBody>(&body)
				.ok()
				.and_then(|error| error.message)
				.filter(|message| !message.trim().is_empty())
				.unwrap_or_else(|| format!("API error: {}", status_text(status)));
			warn!(status = status.as_u16(), %message, "Order endpoint rejected the order");
			return Err(HandoffError::Api { message });
		}

		let decoded: HandoffResponse =
			serde_json::from_slice(&body).map_err(|e| HandoffError::Api {
				message: format!("Invalid response from API: {e}"),
			})?;

		decoded
			.redirect_url
			.and_then(RedirectTarget::new)
			.ok_or_else(|| HandoffError::Protocol("missing redirect target".to_string()))
	}
}
