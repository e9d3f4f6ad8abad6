//! Factory wiring configuration to the HTTP collaborators and the engine.

use checkout_config::{Config, ConfigError};
use checkout_core::{CheckoutEngine, EngineError, EventBus};
use checkout_delivery::{
	CartError, CartSource, HandoffError, HandoffInterface, HttpCartSource, HttpHandoffClient,
};
use checkout_order::PageContext;
use checkout_page::PageInterface;
use checkout_types::Customer;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Errors that can occur while assembling the service.
#[derive(Debug, Error)]
pub enum ServiceError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Engine(#[from] EngineError),
	#[error(transparent)]
	Cart(#[from] CartError),
	#[error(transparent)]
	Handoff(#[from] HandoffError),
	#[error("Could not encode payload: {0}")]
	Encode(#[from] serde_json::Error),
	#[error("Invalid URL: {0}")]
	Url(String),
	#[error("Checkout attempt did not settle within {0:?}")]
	Unsettled(std::time::Duration),
}

/// Resolves the configured cart endpoint against the page location.
pub fn resolve_cart_url(config: &Config, location: &Url) -> Result<Url, ServiceError> {
	location
		.join(&config.checkout.cart_url)
		.map_err(|e| ServiceError::Url(format!("{}: {e}", config.checkout.cart_url)))
}

/// Creates the HTTP cart source and handoff client described by `config`.
pub fn build_http_collaborators(
	config: &Config,
	location: &Url,
) -> Result<(Arc<HttpCartSource>, Arc<HttpHandoffClient>), ServiceError> {
	let timeout = config.http.timeout();
	let cart = HttpCartSource::new(resolve_cart_url(config, location)?, timeout)?;
	let handoff = HttpHandoffClient::new(config.api_url()?, timeout)?;
	Ok((Arc::new(cart), Arc::new(handoff)))
}

/// Builds an engine for `page` talking to the endpoints in `config`.
pub fn build_engine_from_config(
	config: Config,
	page: Arc<dyn PageInterface>,
	customer: Option<Customer>,
	event_bus: EventBus,
) -> Result<CheckoutEngine, ServiceError> {
	config.validate()?;
	let (cart, handoff) = build_http_collaborators(&config, &page.location())?;
	build_engine_with(config, page, cart, handoff, customer, event_bus)
}

/// Builds an engine from explicit collaborators.
pub fn build_engine_with(
	config: Config,
	page: Arc<dyn PageInterface>,
	cart: Arc<dyn CartSource>,
	handoff: Arc<dyn HandoffInterface>,
	customer: Option<Customer>,
	event_bus: EventBus,
) -> Result<CheckoutEngine, ServiceError> {
	let mut context = PageContext::new(page.clone(), config.page.shop_domain.clone());
	if let Some(customer) = customer {
		context = context.with_customer(customer);
	}

	tracing::info!(
		api_url = %config.checkout.api_url,
		enabled = config.checkout.enabled,
		"Building checkout engine"
	);
	Ok(CheckoutEngine::new(
		config,
		page,
		cart,
		handoff,
		Arc::new(context),
		event_bus,
	)?)
}
