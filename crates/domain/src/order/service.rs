//! Order service: atomic placement plus order lookups.

use std::time::Instant;

use common::{MenuItemId, OrderId};
use store::{KitchenReader, KitchenStore, Order, UnitOfWork};

use super::pending::{Committed, PendingOrder};
use super::state::PlacementState;
use crate::error::{DomainError, Entity};
use crate::inventory::service::rollback;
use crate::inventory::{compute_availability, ledger};

/// Placement attempts before a conflict is reported to the caller.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Tracks one placement attempt through its states.
struct Placement {
    menu_item_id: MenuItemId,
    attempt: u32,
    state: PlacementState,
}

impl Placement {
    fn new(menu_item_id: MenuItemId, attempt: u32) -> Self {
        Self {
            menu_item_id,
            attempt,
            state: PlacementState::default(),
        }
    }

    fn advance(&mut self, next: PlacementState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid placement transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(
            menu_item_id = %self.menu_item_id,
            attempt = self.attempt,
            from = %self.state,
            to = %next,
            "placement state changed"
        );
        self.state = next;
    }
}

/// Service for placing and reading orders.
///
/// A placement runs in one unit of work: availability check, order insert
/// and stock deduction either all commit or all roll back.
pub struct OrderService<S: KitchenStore> {
    store: S,
    max_attempts: u32,
}

impl<S: KitchenStore> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets how many times a conflicting placement is attempted. At least one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Places one order for a menu item, consuming one portion of stock.
    #[tracing::instrument(skip(self))]
    pub async fn place_order(&self, menu_item_id: MenuItemId) -> Result<Order, DomainError> {
        let started = Instant::now();
        let mut attempt = 1;
        let result = loop {
            match self.attempt_placement(menu_item_id, attempt).await {
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(attempt, error = %err, "placement conflicted, retrying");
                    attempt += 1;
                }
                other => break other,
            }
        };

        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(order_id = %order.id, attempt, "order placed");
            }
            Err(err) => {
                metrics::counter!("orders_rejected_total", "reason" => err.kind()).increment(1);
                tracing::info!(error = %err, attempt, "order rejected");
            }
        }
        result
    }

    async fn attempt_placement(
        &self,
        menu_item_id: MenuItemId,
        attempt: u32,
    ) -> Result<Order, DomainError> {
        let mut placement = Placement::new(menu_item_id, attempt);
        let mut uow = self.store.begin().await?;

        let pending = match stage(&mut uow, &mut placement).await {
            Ok(pending) => pending,
            Err(err) => {
                placement.advance(PlacementState::Aborted);
                rollback(uow).await;
                return Err(err);
            }
        };

        if let Err(err) = uow.commit().await {
            placement.advance(PlacementState::Aborted);
            return Err(err.into());
        }
        placement.advance(PlacementState::Committed);
        Ok(pending.confirm(Committed::acknowledge()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        let mut reader = self.store.reader().await?;
        reader
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Order, id))
    }

    /// Lists all orders, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        let mut reader = self.store.reader().await?;
        Ok(reader.list_orders().await?)
    }
}

/// Runs the checks and writes of a placement without committing.
async fn stage<U: UnitOfWork>(
    uow: &mut U,
    placement: &mut Placement,
) -> Result<PendingOrder, DomainError> {
    let menu_item_id = placement.menu_item_id;
    let availability = compute_availability(&mut *uow, menu_item_id).await?;
    if !availability.available_portions.covers(1) {
        return Err(DomainError::InsufficientStock {
            subject: format!("menu item {menu_item_id}"),
            detail: availability.shortage_summary(),
        });
    }
    placement.advance(PlacementState::AvailabilityChecked);

    let pending = PendingOrder::new(menu_item_id);
    uow.insert_order(pending.record()).await?;
    for line in &availability.ingredients {
        if line.required_quantity.is_zero() {
            continue;
        }
        ledger::deduct(
            &mut *uow,
            line.ingredient_id,
            line.unit,
            -line.required_quantity,
        )
        .await?;
    }
    placement.advance(PlacementState::StockDeducted);

    Ok(pending)
}
