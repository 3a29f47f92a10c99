//! Order placement.

mod pending;
mod service;
mod state;

pub use service::{DEFAULT_MAX_ATTEMPTS, OrderService};
pub use state::PlacementState;
