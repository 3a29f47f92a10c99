//! Identifiers and units shared by every crate in the workspace.

pub mod types;
pub mod units;

pub use types::{IngredientId, MenuItemId, OrderId, StockLotId};
pub use units::{UnitOfMeasure, UnknownUnit};
