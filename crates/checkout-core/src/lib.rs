//! Checkout interception engine.
//!
//! Binds capture listeners to a storefront's cart form and checkout
//! control, hands the cart to an external order-processing endpoint when the
//! shopper checks out, and reconciles the page with the outcome: navigation
//! on success, a restored control and an inline message on failure.

pub mod engine;
pub mod error;
pub mod feedback;
pub mod handlers;

pub use engine::event_bus::EventBus;
pub use engine::{CheckoutEngine, StartOutcome};
pub use error::{ActivationError, CheckoutError, EngineError};
pub use feedback::FeedbackController;
pub use handlers::{AttemptHandler, BindReport, InterceptionBinder};
