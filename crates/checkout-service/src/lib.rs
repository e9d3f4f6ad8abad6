//! Checkout service library.
//!
//! Builds a checkout engine from configuration, runs one-shot previews and
//! handoffs, and runs the pipeline against an in-memory storefront page for
//! end-to-end checks.

pub mod commands;
pub mod factory;
pub mod simulate;

pub use commands::{preview, run_handoff};
pub use factory::{
	build_engine_from_config, build_engine_with, build_http_collaborators, resolve_cart_url,
	ServiceError,
};
pub use simulate::{simulate, storefront_page, SimulationReport};
