//! # Core event handlers
//!
//! Each handler takes a typed event and the stores it touches. Stores of
//! disabled features are passed as `None` and the handler skips them.
//!
//! - [`connection`] - join notice and disconnect cleanup
//! - [`death`] - death location capture for `/back`

pub mod connection;
pub mod death;

pub use connection::*;
pub use death::*;
