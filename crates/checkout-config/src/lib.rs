//! Configuration for the checkout handoff pipeline.
//!
//! The pipeline is configured by one explicit value handed to the engine
//! factory. Every section and field is optional: omitted values fall back to
//! the defaults the storefront theme ships with. Configuration can be read
//! from a TOML file or from the JSON object a host page exposes
//! (`{ "apiUrl": ..., "enabled": ... }`).

pub mod builders;

pub use builders::config::ConfigBuilder;

use checkout_types::{Selector, WatchPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Order-processing endpoint used when the host supplies none.
pub const DEFAULT_API_URL: &str = "https://abstainedly-presageful-julissa.ngrok-free.dev/api/checkout";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML or JSON configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

impl From<serde_json::Error> for ConfigError {
	fn from(err: serde_json::Error) -> Self {
		ConfigError::Parse(err.to_string())
	}
}

/// Main configuration structure for the checkout pipeline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
	/// Endpoints and the global on/off switch.
	pub checkout: CheckoutSettings,
	/// Host page conventions.
	pub page: PageSettings,
	/// Dynamic element watcher.
	pub watcher: WatcherSettings,
	/// Checkout control feedback.
	pub feedback: FeedbackSettings,
	/// HTTP client settings.
	pub http: HttpSettings,
}

/// Endpoints and the global on/off switch.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckoutSettings {
	/// Order-processing endpoint receiving the payload.
	pub api_url: String,
	/// When false nothing is intercepted and native checkout runs unmodified.
	pub enabled: bool,
	/// Cart-state endpoint, resolved against the page location when relative.
	pub cart_url: String,
	/// Grace period before interception starts, so platform scripts that
	/// attach their own checkout handlers run first.
	pub startup_delay_ms: u64,
}

impl Default for CheckoutSettings {
	fn default() -> Self {
		Self {
			api_url: DEFAULT_API_URL.to_string(),
			enabled: true,
			cart_url: "/cart.js".to_string(),
			startup_delay_ms: 100,
		}
	}
}

impl CheckoutSettings {
	pub fn startup_delay(&self) -> Duration {
		Duration::from_millis(self.startup_delay_ms)
	}
}

/// Host page conventions used to find the cart surfaces.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PageSettings {
	/// Id of the cart form.
	pub cart_form_id: String,
	/// Id or name of the checkout control.
	pub checkout_control: String,
	/// Containers that host the error banner, most specific first.
	pub summary_selectors: Vec<Selector>,
	/// Class marking the error banner.
	pub error_class: String,
	/// Hide express-checkout widgets on cart pages.
	pub hide_accelerated_checkout: bool,
	/// Express-checkout widgets that would bypass the handoff.
	pub accelerated_checkout_selectors: Vec<Selector>,
	/// Shop domain override; the page hostname is used when unset.
	pub shop_domain: Option<String>,
}

impl Default for PageSettings {
	fn default() -> Self {
		Self {
			cart_form_id: "cart-form".to_string(),
			checkout_control: "checkout".to_string(),
			summary_selectors: vec![
				Selector::class("cart__summary-totals"),
				Selector::class("cart-page__summary"),
				Selector::id("cart-form"),
			],
			error_class: "custom-checkout-error".to_string(),
			hide_accelerated_checkout: true,
			accelerated_checkout_selectors: vec![
				Selector::Tag("shopify-accelerated-checkout-cart".to_string()),
				Selector::class("additional-checkout-buttons"),
			],
			shop_domain: None,
		}
	}
}

/// Dynamic element watcher settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatcherSettings {
	/// Lifetime of the watcher in milliseconds.
	pub timeout_ms: u64,
	/// Whether the watcher stops at the first discovery.
	pub policy: WatchPolicy,
}

impl Default for WatcherSettings {
	fn default() -> Self {
		Self {
			timeout_ms: 10_000,
			policy: WatchPolicy::Once,
		}
	}
}

impl WatcherSettings {
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}
}

/// Checkout control feedback settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedbackSettings {
	/// Label shown on the control while an attempt is in flight.
	pub busy_label: String,
	/// Label restored when the control had none before the attempt.
	pub fallback_label: String,
	/// How long an error banner stays visible.
	pub error_display_ms: u64,
}

impl Default for FeedbackSettings {
	fn default() -> Self {
		Self {
			busy_label: "Processing...".to_string(),
			fallback_label: "Checkout".to_string(),
			error_display_ms: 5_000,
		}
	}
}

impl FeedbackSettings {
	pub fn error_display(&self) -> Duration {
		Duration::from_millis(self.error_display_ms)
	}
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpSettings {
	/// Request timeout in seconds.
	pub timeout_seconds: u64,
}

impl Default for HttpSettings {
	fn default() -> Self {
		Self {
			timeout_seconds: 30,
		}
	}
}

impl HttpSettings {
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_seconds)
	}
}

/// The object a host page exposes to configure the pipeline.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostConfig {
	api_url: Option<String>,
	enabled: Option<bool>,
}

impl Config {
	/// Loads and validates configuration from a TOML file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Builds configuration from the host page object form.
	///
	/// Fields the host omits keep their defaults. A blank `apiUrl` counts as
	/// omitted.
	pub fn from_host_json(json: &str) -> Result<Self, ConfigError> {
		let host: HostConfig = serde_json::from_str(json)?;
		let mut config = Config::default();
		if let Some(api_url) = host.api_url.filter(|url| !url.trim().is_empty()) {
			config.checkout.api_url = api_url;
		}
		if let Some(enabled) = host.enabled {
			config.checkout.enabled = enabled;
		}
		config.validate()?;
		Ok(config)
	}

	/// Parsed order-processing endpoint.
	pub fn api_url(&self) -> Result<Url, ConfigError> {
		Url::parse(&self.checkout.api_url)
			.map_err(|e| ConfigError::Validation(format!("api_url is not a valid URL: {e}")))
	}

	/// Validates the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let api_url = self.api_url()?;
		if !matches!(api_url.scheme(), "http" | "https") {
			return Err(ConfigError::Validation(format!(
				"api_url must use http or https, got '{}'",
				api_url.scheme()
			)));
		}
		if self.checkout.cart_url.trim().is_empty() {
			return Err(ConfigError::Validation("cart_url cannot be empty".into()));
		}
		if self.page.cart_form_id.trim().is_empty() {
			return Err(ConfigError::Validation("cart_form_id cannot be empty".into()));
		}
		if self.page.checkout_control.trim().is_empty() {
			return Err(ConfigError::Validation(
				"checkout_control cannot be empty".into(),
			));
		}
		if self.page.summary_selectors.is_empty() {
			return Err(ConfigError::Validation(
				"summary_selectors cannot be empty".into(),
			));
		}
		if self.page.accelerated_checkout_selectors.is_empty() {
			return Err(ConfigError::Validation(
				"accelerated_checkout_selectors cannot be empty".into(),
			));
		}
		if self.page.error_class.trim().is_empty() {
			return Err(ConfigError::Validation("error_class cannot be empty".into()));
		}
		if self.watcher.timeout_ms == 0 {
			return Err(ConfigError::Validation(
				"watcher.timeout_ms must be greater than 0".into(),
			));
		}
		if self.feedback.error_display_ms == 0 {
			return Err(ConfigError::Validation(
				"feedback.error_display_ms must be greater than 0".into(),
			));
		}
		if self.http.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"http.timeout_seconds must be greater than 0".into(),
			));
		}
		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let config: Config = toml::from_str(s)?;
		config.validate()?;
		Ok(config)
	}
}
