//! Cart snapshot types.
//!
//! The snapshot mirrors the JSON document returned by the storefront's cart
//! endpoint. Every field is optional on the wire; the order assembler decides
//! which defaults to substitute, so nothing here invents values.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The shopper's cart at the moment it was fetched.
///
/// A new snapshot is fetched for every checkout attempt; snapshots are never
/// cached or mutated after decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
	/// Line items in cart order. A `null` or missing list decodes as empty.
	#[serde(default, deserialize_with = "null_as_default")]
	pub items: Vec<LineItem>,
	/// Cart total in minor currency units.
	pub total_price: Option<i64>,
	/// Total discount applied, in minor currency units.
	pub total_discount: Option<i64>,
	/// Total before discounts, in minor currency units.
	pub original_total_price: Option<i64>,
	/// Number of units across all line items.
	pub item_count: Option<u32>,
	/// Free-form note attached to the cart.
	pub note: Option<String>,
	/// ISO 4217 currency code.
	pub currency: Option<String>,
	/// Custom cart attributes.
	#[serde(default, deserialize_with = "null_as_default")]
	pub attributes: BTreeMap<String, Value>,
}

impl CartSnapshot {
	/// Returns true when the cart has no line items.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

/// One line of the cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
	/// Line identifier.
	pub id: Option<u64>,
	/// Variant identifier.
	pub variant_id: Option<u64>,
	/// Product identifier.
	pub product_id: Option<u64>,
	/// Product title.
	pub product_title: Option<String>,
	/// Variant title, absent for single-variant products.
	pub variant_title: Option<String>,
	/// Units of this variant in the cart.
	pub quantity: Option<u32>,
	/// Unit price in minor currency units.
	pub price: Option<i64>,
	/// Line total in minor currency units.
	pub line_price: Option<i64>,
	/// Line item properties (engraving text, gift notes and so on).
	#[serde(default, deserialize_with = "null_as_default")]
	pub properties: BTreeMap<String, Value>,
	/// Stock keeping unit.
	pub sku: Option<String>,
	/// Product vendor.
	pub vendor: Option<String>,
	/// Image URL.
	pub image: Option<String>,
	/// Product page URL.
	pub url: Option<String>,
}

/// Decodes `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
