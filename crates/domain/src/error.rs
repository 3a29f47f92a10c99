//! Domain error types.

use common::UnknownUnit;
use store::StoreError;
use thiserror::Error;

/// The kind of record a [`DomainError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    MenuItem,
    Ingredient,
    StockLot,
    Order,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::MenuItem => "Menu item",
            Entity::Ingredient => "Ingredient",
            Entity::StockLot => "Stock lot",
            Entity::Order => "Order",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },

    /// There is not enough stock to satisfy the request.
    #[error("Insufficient stock for {subject}: {detail}")]
    InsufficientStock { subject: String, detail: String },

    /// The request was malformed (negative quantity, wrong sign, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A unit name could not be parsed.
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    /// A concurrent transaction got in the way. Safe to retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true if the operation may succeed when attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Conflict(_))
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NotFound { .. } => "not_found",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::Validation(_) => "validation",
            DomainError::InvalidUnit(_) => "invalid_unit",
            DomainError::Conflict(_) => "conflict",
            DomainError::Store(_) => "store",
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => DomainError::Conflict(msg),
            other => DomainError::Store(other),
        }
    }
}

impl From<UnknownUnit> for DomainError {
    fn from(e: UnknownUnit) -> Self {
        DomainError::InvalidUnit(e.0)
    }
}
