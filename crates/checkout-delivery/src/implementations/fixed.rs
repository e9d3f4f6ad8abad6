//! Cart source backed by a fixed snapshot.
//!
//! Used by the command line tools and by tests that need to change the cart
//! between attempts.

use crate::{CartError, CartSource};
use async_trait::async_trait;
use checkout_types::CartSnapshot;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves a snapshot held in memory.
#[derive(Debug, Default)]
pub struct FixedCartSource {
	snapshot: RwLock<CartSnapshot>,
	fetches: AtomicUsize,
}

impl FixedCartSource {
	pub fn new(snapshot: CartSnapshot) -> Self {
		Self {
			snapshot: RwLock::new(snapshot),
			fetches: AtomicUsize::new(0),
		}
	}

	/// Loads the snapshot from a cart JSON document on disk.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CartError> {
		let path = path.as_ref();
		let content = tokio::fs::read(path).await.map_err(|e| {
			CartError::Unavailable(format!("Failed to read cart file {}: {e}", path.display()))
		})?;
		let snapshot =
			serde_json::from_slice(&content).map_err(|e| CartError::Decode(e.to_string()))?;
		Ok(Self::new(snapshot))
	}

	/// Replaces the served snapshot.
	pub fn set(&self, snapshot: CartSnapshot) {
		*self.snapshot.write() = snapshot;
	}

	/// Number of times the cart has been fetched.
	pub fn fetch_count(&self) -> usize {
		self.fetches.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl CartSource for FixedCartSource {
	async fn fetch_cart(&self) -> Result<CartSnapshot, CartError> {
		self.fetches.fetch_add(1, Ordering::SeqCst);
		Ok(self.snapshot.read().clone())
	}
}
