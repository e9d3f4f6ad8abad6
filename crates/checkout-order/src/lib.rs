//! Order assembly for the checkout handoff.
//!
//! Turns a freshly fetched cart snapshot plus the context of the current
//! attempt into the payload expected by the order-processing endpoint.
//! Assembly itself is pure; everything ambient is read through a
//! [`ContextProvider`] before [`assemble`] is called.

use checkout_types::{
	format_timestamp, CartSnapshot, CheckoutContext, LineItem, OrderCart, OrderLine, OrderMetadata,
	OrderPayload, ShopInfo,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod page;
}

pub use implementations::page::PageContext;

/// Errors that can occur while assembling an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
	/// The cart has no line items; nothing is sent to the network.
	#[error("Cart is empty")]
	EmptyCart,
}

/// Source of the ambient values captured when an attempt starts.
///
/// Implementations are consulted once per attempt and must not cache, so
/// the payload reflects the moment of the checkout.
pub trait ContextProvider: Send + Sync {
	/// Reads the current context.
	fn current(&self) -> CheckoutContext;
}

/// Builds the order payload from a cart snapshot and attempt context.
///
/// Absent line-item fields are replaced by explicit defaults: empty strings
/// for text, empty maps for properties and zero for numbers. The same inputs
/// always produce the same payload.
pub fn assemble(cart: &CartSnapshot, context: &CheckoutContext) -> Result<OrderPayload, AssembleError> {
	if cart.is_empty() {
		return Err(AssembleError::EmptyCart);
	}

	let currency = cart.currency.clone().unwrap_or_default();
	let items: Vec<OrderLine> = cart.items.iter().map(order_line).collect();

	tracing::debug!(
		lines = items.len(),
		currency = %currency,
		"Assembled order payload"
	);

	Ok(OrderPayload {
		cart: OrderCart {
			items,
			total_price: cart.total_price.unwrap_or_default(),
			total_discount: cart.total_discount.unwrap_or_default(),
			original_total_price: cart.original_total_price.unwrap_or_default(),
			item_count: cart.item_count.unwrap_or_default(),
			note: cart.note.clone().unwrap_or_default(),
			currency: currency.clone(),
			attributes: cart.attributes.clone(),
		},
		customer: context.customer.clone().unwrap_or_default(),
		shop: ShopInfo {
			domain: context.shop_domain.clone(),
			currency,
		},
		metadata: OrderMetadata {
			timestamp: format_timestamp(&context.timestamp),
			user_agent: context.user_agent.clone(),
			referrer: context.referrer.clone(),
			return_url: context.return_url.clone(),
		},
	})
}

fn order_line(item: &LineItem) -> OrderLine {
	OrderLine {
		id: item.id.unwrap_or_default(),
		variant_id: item.variant_id.unwrap_or_default(),
		product_id: item.product_id.unwrap_or_default(),
		title: item.product_title.clone().unwrap_or_default(),
		variant_title: item.variant_title.clone().unwrap_or_default(),
		quantity: item.quantity.unwrap_or_default(),
		price: item.price.unwrap_or_default(),
		line_price: item.line_price.unwrap_or_default(),
		properties: item.properties.clone(),
		sku: item.sku.clone().unwrap_or_default(),
		vendor: item.vendor.clone().unwrap_or_default(),
		image: item.image.clone().unwrap_or_default(),
		url: item.url.clone().unwrap_or_default(),
	}
}
