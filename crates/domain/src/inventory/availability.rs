//! How many portions of a menu item the current stock can produce.

use common::{IngredientId, MenuItemId, UnitOfMeasure};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use store::{KitchenReader, MenuItem, RecipeLine};

use super::ledger::sum_in_unit;
use crate::error::{DomainError, Entity};

/// A portion count that may have no upper bound.
///
/// Serialized as an integer, or `null` when unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "Option<u64>")]
pub enum Portions {
    Unbounded,
    Limited(u64),
}

impl Portions {
    pub fn min(self, other: Portions) -> Portions {
        match (self, other) {
            (Portions::Unbounded, p) | (p, Portions::Unbounded) => p,
            (Portions::Limited(a), Portions::Limited(b)) => Portions::Limited(a.min(b)),
        }
    }

    /// Returns true if at least `n` portions can be made.
    pub fn covers(&self, n: u64) -> bool {
        match self {
            Portions::Unbounded => true,
            Portions::Limited(available) => *available >= n,
        }
    }

    /// Whole portions of `required` that fit in `available`.
    ///
    /// A ratio too large for [`Decimal`] or `u64` saturates at `u64::MAX`.
    pub fn from_quantities(available: Decimal, required: Decimal) -> Portions {
        if required <= Decimal::ZERO {
            return Portions::Unbounded;
        }
        if available <= Decimal::ZERO {
            return Portions::Limited(0);
        }
        let whole = available
            .checked_div(required)
            .and_then(|ratio| ratio.floor().to_u64())
            .unwrap_or(u64::MAX);
        Portions::Limited(whole)
    }
}

impl From<Portions> for Option<u64> {
    fn from(p: Portions) -> Self {
        match p {
            Portions::Unbounded => None,
            Portions::Limited(n) => Some(n),
        }
    }
}

/// One recipe line's share of an availability check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientAvailability {
    pub ingredient_id: IngredientId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub required_quantity: Decimal,
    pub available_quantity: Decimal,
    pub unit: UnitOfMeasure,
    pub portions: Portions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Availability of a menu item, with the numbers behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    #[serde(flatten)]
    pub menu_item: MenuItem,
    pub available_portions: Portions,
    pub ingredients: Vec<IngredientAvailability>,
}

impl Availability {
    /// Describes why the item is short, for error messages.
    pub fn shortage_summary(&self) -> String {
        let mut reasons: Vec<String> = self
            .ingredients
            .iter()
            .filter(|line| !line.portions.covers(1))
            .map(|line| match &line.diagnostic {
                Some(diagnostic) => diagnostic.clone(),
                None => format!(
                    "ingredient {} needs {} {}, has {} {}",
                    line.ingredient_id,
                    line.required_quantity,
                    line.unit,
                    line.available_quantity,
                    line.unit
                ),
            })
            .collect();
        if reasons.is_empty() {
            reasons.push("no portions available".to_string());
        }
        reasons.join("; ")
    }
}

async fn line_availability<R: KitchenReader>(
    repo: &mut R,
    line: &RecipeLine,
) -> Result<IngredientAvailability, DomainError> {
    let Some(ingredient) = repo.get_ingredient(line.ingredient_id).await? else {
        return Ok(IngredientAvailability {
            ingredient_id: line.ingredient_id,
            name: None,
            description: None,
            required_quantity: line.quantity,
            available_quantity: Decimal::ZERO,
            unit: line.unit,
            portions: Portions::Limited(0),
            diagnostic: Some(format!("ingredient {} not found", line.ingredient_id)),
        });
    };

    let lots = repo.stock_lots_for_ingredient(line.ingredient_id).await?;
    let available = sum_in_unit(&lots, line.unit)?;
    Ok(IngredientAvailability {
        ingredient_id: ingredient.id,
        name: Some(ingredient.name),
        description: ingredient.description,
        required_quantity: line.quantity,
        available_quantity: available,
        unit: line.unit,
        portions: Portions::from_quantities(available, line.quantity),
        diagnostic: None,
    })
}

/// Computes how many portions of a menu item can be made right now.
///
/// Lines are visited in ingredient id order. Inside a unit of work this
/// locks each ingredient's lots in that order. A line whose ingredient is
/// missing counts as zero stock and carries a diagnostic. Store failures
/// and totals outside the range of [`Decimal`] are returned as errors.
pub async fn compute_availability<R: KitchenReader>(
    repo: &mut R,
    menu_item_id: MenuItemId,
) -> Result<Availability, DomainError> {
    let menu_item = repo
        .get_menu_item(menu_item_id)
        .await?
        .ok_or_else(|| DomainError::not_found(Entity::MenuItem, menu_item_id))?;

    let lines = repo.recipe_lines(menu_item_id).await?;
    let mut available_portions = Portions::Unbounded;
    let mut ingredients = Vec::with_capacity(lines.len());
    for line in &lines {
        let entry = line_availability(&mut *repo, line).await?;
        if let Some(diagnostic) = &entry.diagnostic {
            tracing::warn!(%menu_item_id, %diagnostic, "availability line failed");
        }
        available_portions = available_portions.min(entry.portions);
        ingredients.push(entry);
    }

    Ok(Availability {
        menu_item,
        available_portions,
        ingredients,
    })
}
