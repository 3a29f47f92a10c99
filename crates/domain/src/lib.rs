//! Domain layer for the kitchen backend.
//!
//! This crate provides:
//! - Unit conversion and the FIFO stock ledger
//! - Menu availability computed from stock
//! - Atomic order placement with bounded retry on conflicts
//! - Read-only stock and order reports

pub mod error;
pub mod inventory;
pub mod menu;
pub mod order;
pub mod reports;

pub use error::{DomainError, Entity};
pub use inventory::{
    Availability, IngredientAvailability, InventoryService, MAX_STOCK_AMOUNT, NewStockLot,
    Portions, compute_availability, convert, units_per_liter,
};
pub use menu::{MenuItemDetail, MenuService, RecipeIngredient};
pub use order::{DEFAULT_MAX_ATTEMPTS, OrderService, PlacementState};
pub use reports::{OrderReport, OrderReportRow, ReportService, StockReport, StockReportRow};
