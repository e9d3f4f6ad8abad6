//! Context read from the live host page.

use crate::ContextProvider;
use checkout_page::PageInterface;
use checkout_types::{CheckoutContext, Customer};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Reads the attempt context from a page.
///
/// The shop domain comes from the configured override when present, else
/// from the page hostname. The customer is whatever session value the host
/// injected last; it can change between attempts (sign-in in another tab).
pub struct PageContext {
	page: Arc<dyn PageInterface>,
	shop_domain: Option<String>,
	session: RwLock<Option<Customer>>,
	clock: Clock,
}

impl PageContext {
	pub fn new(page: Arc<dyn PageInterface>, shop_domain: Option<String>) -> Self {
		Self {
			page,
			shop_domain: shop_domain.filter(|domain| !domain.trim().is_empty()),
			session: RwLock::new(None),
			clock: Arc::new(Utc::now),
		}
	}

	pub fn with_customer(self, customer: Customer) -> Self {
		*self.session.write() = Some(customer);
		self
	}

	/// Replaces the clock; used to pin timestamps.
	pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
		self.clock = Arc::new(clock);
		self
	}

	/// Sets or clears the session customer.
	pub fn set_customer(&self, customer: Option<Customer>) {
		*self.session.write() = customer;
	}
}

impl ContextProvider for PageContext {
	fn current(&self) -> CheckoutContext {
		let location = self.page.location();
		let shop_domain = self
			.shop_domain
			.clone()
			.or_else(|| location.host_str().map(str::to_string))
			.unwrap_or_default();

		CheckoutContext {
			customer: self.session.read().clone(),
			shop_domain,
			timestamp: (self.clock)(),
			user_agent: self.page.user_agent(),
			referrer: self.page.referrer(),
			return_url: location.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use checkout_page::MemoryPage;
	use chrono::TimeZone;

	fn page() -> Arc<dyn PageInterface> {
		Arc::new(
			MemoryPage::new()
				.with_location("https://linen-house.com/cart?step=1".parse().unwrap())
				.with_referrer("https://linen-house.com/")
				.with_user_agent("TestAgent/1.0"),
		)
	}

	#[test]
	fn test_reads_page_values() {
		let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
		let context = PageContext::new(page(), None).with_clock(move || at).current();

		assert_eq!(context.shop_domain, "linen-house.com");
		assert_eq!(context.return_url, "https://linen-house.com/cart?step=1");
		assert_eq!(context.referrer, "https://linen-house.com/");
		assert_eq!(context.user_agent, "TestAgent/1.0");
		assert_eq!(context.timestamp, at);
		assert_eq!(context.customer, None);
	}

	#[test]
	fn test_shop_domain_override() {
		let context = PageContext::new(page(), Some("linen-house.myshopify.com".into())).current();
		assert_eq!(context.shop_domain, "linen-house.myshopify.com");

		let blank = PageContext::new(page(), Some("  ".into())).current();
		assert_eq!(blank.shop_domain, "linen-house.com");
	}

	#[test]
	fn test_customer_read_per_call() {
		let provider = PageContext::new(page(), None);
		assert_eq!(provider.current().customer, None);

		provider.set_customer(Some(Customer {
			email: Some("olena@example.com".into()),
			id: Some(7),
		}));
		assert_eq!(provider.current().customer.and_then(|c| c.id), Some(7));
	}
}
