//! Orders staged inside a unit of work.

use chrono::Utc;
use common::{MenuItemId, OrderId};
use store::Order;

/// Proof that the unit of work holding a [`PendingOrder`] has committed.
///
/// Only the placement code can make one, and only after `commit` returns.
#[derive(Debug)]
pub(crate) struct Committed(());

impl Committed {
    pub(crate) fn acknowledge() -> Self {
        Committed(())
    }
}

/// An order whose id and timestamp are assigned but which is not yet durable.
///
/// It becomes an [`Order`] through [`PendingOrder::confirm`], which needs a
/// [`Committed`] token.
#[derive(Debug)]
pub(crate) struct PendingOrder {
    record: Order,
}

impl PendingOrder {
    pub(crate) fn new(menu_id: MenuItemId) -> Self {
        Self {
            record: Order {
                id: OrderId::new(),
                menu_id,
                created_on: Utc::now(),
            },
        }
    }

    /// The row to stage in the unit of work.
    pub(crate) fn record(&self) -> &Order {
        &self.record
    }

    pub(crate) fn confirm(self, _committed: Committed) -> Order {
        self.record
    }
}
