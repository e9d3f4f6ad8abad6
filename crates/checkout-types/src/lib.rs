//! Common types for the checkout handoff pipeline.
//!
//! This crate holds the data shared by every pipeline component: the cart
//! snapshot reported by the storefront, the normalized order payload sent to
//! the order-processing endpoint, element handles, selectors and the events
//! published while a page is being intercepted.

/// Cart snapshot types as reported by the cart-state endpoint.
pub mod cart;
/// Discovery types shared by the watcher and the engine.
pub mod discovery;
/// Element identity for host page nodes.
pub mod element;
/// Event types published on the engine's event bus.
pub mod events;
/// Redirect targets and handoff wire bodies.
pub mod handoff;
/// Normalized order payload and the context it is assembled from.
pub mod order;
/// Element selectors understood by host pages.
pub mod selector;
/// Checkout control state captured around an attempt.
pub mod ui;
/// Small helpers shared across crates.
pub mod utils;

pub use cart::*;
pub use discovery::*;
pub use element::ElementId;
pub use events::*;
pub use handoff::*;
pub use order::*;
pub use selector::{Selector, SelectorError};
pub use ui::ControlUiState;
pub use utils::format_timestamp;
