//! Stock lots, unit conversion and availability.

pub mod availability;
pub mod ledger;
pub mod service;
pub mod units;

pub use availability::{Availability, IngredientAvailability, Portions, compute_availability};
pub use ledger::{MAX_STOCK_AMOUNT, NewStockLot};
pub use service::InventoryService;
pub use units::{convert, units_per_liter};
