//! HTTP surface for the reseed cross-seeding engine.
//!
//! Exposed as a library so integration tests can build the router
//! in-process; the binary in `main.rs` is a thin wrapper.

pub mod api;
pub mod metrics;
pub mod state;

pub use api::create_router;
pub use state::AppState;
