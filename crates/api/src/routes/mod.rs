//! HTTP handlers, one module per resource.

pub mod health;
pub mod menu;
pub mod metrics;
pub mod orders;
pub mod reports;
pub mod stock;
