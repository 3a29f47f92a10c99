//! Persistence for the kitchen inventory system.
//!
//! Every write goes through a [`UnitOfWork`]: a transaction scope that is
//! either committed as a whole or rolled back. Reads that do not need to be
//! consistent with a subsequent write go through a [`KitchenReader`].

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod repository;

pub use common::{IngredientId, MenuItemId, OrderId, StockLotId, UnitOfMeasure};
pub use error::{Result, StoreError};
pub use memory::{InMemoryKitchenStore, InMemoryReader, InMemoryUnitOfWork};
pub use model::{Ingredient, MenuItem, Order, RecipeLine, StockLot};
pub use postgres::{PostgresKitchenStore, PostgresReader, PostgresUnitOfWork};
pub use repository::{KitchenReader, KitchenStore, UnitOfWork};
