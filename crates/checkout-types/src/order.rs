//! Normalized order payload.
//!
//! This is the contract of the order-processing endpoint. Unlike the cart
//! snapshot, every field here is required: absent source values have already
//! been replaced with explicit defaults by the assembler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Payload posted to the order-processing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
	pub cart: OrderCart,
	pub customer: Customer,
	pub shop: ShopInfo,
	pub metadata: OrderMetadata,
}

/// Cart section of the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCart {
	pub items: Vec<OrderLine>,
	pub total_price: i64,
	pub total_discount: i64,
	pub original_total_price: i64,
	pub item_count: u32,
	pub note: String,
	pub currency: String,
	pub attributes: BTreeMap<String, Value>,
}

/// One normalized line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
	pub id: u64,
	pub variant_id: u64,
	pub product_id: u64,
	pub title: String,
	pub variant_title: String,
	pub quantity: u32,
	pub price: i64,
	pub line_price: i64,
	pub properties: BTreeMap<String, Value>,
	pub sku: String,
	pub vendor: String,
	pub image: String,
	pub url: String,
}

/// Logged-in customer, if the storefront knows one.
///
/// Unknown fields serialize as explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
	pub email: Option<String>,
	pub id: Option<u64>,
}

/// Shop section of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopInfo {
	pub domain: String,
	pub currency: String,
}

/// Request metadata captured at the moment of the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMetadata {
	/// RFC 3339 UTC timestamp with millisecond precision.
	pub timestamp: String,
	pub user_agent: String,
	pub referrer: String,
	/// Page the shopper should come back to.
	pub return_url: String,
}

/// Ambient values read when an attempt starts.
///
/// Passed into the assembler explicitly so that assembly stays a pure
/// function of its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutContext {
	pub customer: Option<Customer>,
	pub shop_domain: String,
	pub timestamp: DateTime<Utc>,
	pub user_agent: String,
	pub referrer: String,
	pub return_url: String,
}
