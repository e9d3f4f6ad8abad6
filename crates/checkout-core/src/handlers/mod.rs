//! Handlers reacting to checkout activations.

pub mod attempt;
pub mod binder;

pub use attempt::AttemptHandler;
pub use binder::{BindReport, InterceptionBinder};
