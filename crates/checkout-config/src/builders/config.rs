//! Configuration builder for tests and embedding hosts.
//!
//! Starts from the shipped defaults and lets callers override the handful of
//! values that usually differ between environments.

use crate::{Config, ConfigError};
use checkout_types::{Selector, WatchPolicy};

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
	config: Config,
}

impl ConfigBuilder {
	/// Creates a builder holding the default configuration.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn api_url(mut self, url: impl Into<String>) -> Self {
		self.config.checkout.api_url = url.into();
		self
	}

	pub fn enabled(mut self, enabled: bool) -> Self {
		self.config.checkout.enabled = enabled;
		self
	}

	pub fn cart_url(mut self, url: impl Into<String>) -> Self {
		self.config.checkout.cart_url = url.into();
		self
	}

	pub fn startup_delay_ms(mut self, delay_ms: u64) -> Self {
		self.config.checkout.startup_delay_ms = delay_ms;
		self
	}

	pub fn cart_form_id(mut self, id: impl Into<String>) -> Self {
		self.config.page.cart_form_id = id.into();
		self
	}

	pub fn checkout_control(mut self, id_or_name: impl Into<String>) -> Self {
		self.config.page.checkout_control = id_or_name.into();
		self
	}

	pub fn summary_selectors(mut self, selectors: Vec<Selector>) -> Self {
		self.config.page.summary_selectors = selectors;
		self
	}

	pub fn hide_accelerated_checkout(mut self, hide: bool) -> Self {
		self.config.page.hide_accelerated_checkout = hide;
		self
	}

	pub fn shop_domain(mut self, domain: impl Into<String>) -> Self {
		self.config.page.shop_domain = Some(domain.into());
		self
	}

	pub fn watcher_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.config.watcher.timeout_ms = timeout_ms;
		self
	}

	pub fn watch_policy(mut self, policy: WatchPolicy) -> Self {
		self.config.watcher.policy = policy;
		self
	}

	pub fn busy_label(mut self, label: impl Into<String>) -> Self {
		self.config.feedback.busy_label = label.into();
		self
	}

	pub fn error_display_ms(mut self, display_ms: u64) -> Self {
		self.config.feedback.error_display_ms = display_ms;
		self
	}

	pub fn http_timeout_seconds(mut self, seconds: u64) -> Self {
		self.config.http.timeout_seconds = seconds;
		self
	}

	/// Builds the configuration without validating it.
	pub fn build(self) -> Config {
		self.config
	}

	/// Builds and validates the configuration.
	pub fn try_build(self) -> Result<Config, ConfigError> {
		self.config.validate()?;
		Ok(self.config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_overrides() {
		let config = ConfigBuilder::new()
			.api_url("http://127.0.0.1:9000/api/checkout")
			.startup_delay_ms(0)
			.watch_policy(WatchPolicy::Persistent)
			.try_build()
			.unwrap();

		assert_eq!(config.checkout.api_url, "http://127.0.0.1:9000/api/checkout");
		assert_eq!(config.checkout.startup_delay_ms, 0);
		assert_eq!(config.watcher.policy, WatchPolicy::Persistent);
		assert_eq!(config.page.cart_form_id, "cart-form");
	}

	#[test]
	fn test_try_build_validates() {
		assert!(ConfigBuilder::new().watcher_timeout_ms(0).try_build().is_err());
		assert_eq!(ConfigBuilder::new().watcher_timeout_ms(0).build().watcher.timeout_ms, 0);
	}
}
