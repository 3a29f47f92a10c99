//! Conversion between volume units.
//!
//! Every ratio is a power of ten relative to one liter, so conversions are
//! exact in [`Decimal`] arithmetic.

use common::UnitOfMeasure;
use rust_decimal::Decimal;

use crate::error::DomainError;

/// How many of `unit` make up one liter.
pub fn units_per_liter(unit: UnitOfMeasure) -> Decimal {
    match unit {
        UnitOfMeasure::Liter => Decimal::ONE,
        UnitOfMeasure::Deciliter => Decimal::TEN,
        UnitOfMeasure::Centiliter => Decimal::ONE_HUNDRED,
        UnitOfMeasure::Milliliter => Decimal::ONE_THOUSAND,
    }
}

/// Converts `quantity` from one unit to another.
///
/// Fails with `Validation` when the result does not fit in a [`Decimal`].
pub fn convert(
    quantity: Decimal,
    from: UnitOfMeasure,
    to: UnitOfMeasure,
) -> Result<Decimal, DomainError> {
    if from == to {
        return Ok(quantity);
    }
    quantity
        .checked_div(units_per_liter(from))
        .and_then(|in_liters| in_liters.checked_mul(units_per_liter(to)))
        .map(|converted| converted.normalize())
        .ok_or_else(|| {
            DomainError::Validation(format!("{quantity} {from} cannot be expressed in {to}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_between_neighbouring_units() {
        let cases = [
            (dec!(1), UnitOfMeasure::Liter, UnitOfMeasure::Milliliter, dec!(1000)),
            (dec!(250), UnitOfMeasure::Milliliter, UnitOfMeasure::Liter, dec!(0.25)),
            (dec!(3), UnitOfMeasure::Deciliter, UnitOfMeasure::Centiliter, dec!(30)),
            (dec!(7), UnitOfMeasure::Centiliter, UnitOfMeasure::Deciliter, dec!(0.7)),
        ];
        for (quantity, from, to, expected) in cases {
            assert_eq!(convert(quantity, from, to).unwrap(), expected);
        }
    }

    #[test]
    fn identity_returns_input_unchanged() {
        let q = dec!(12.340);
        for unit in UnitOfMeasure::ALL {
            let converted = convert(q, unit, unit).unwrap();
            assert_eq!(converted, q);
            assert_eq!(converted.scale(), q.scale());
        }
    }

    #[test]
    fn round_trip_is_exact_for_every_pair() {
        let samples = [dec!(0), dec!(1), dec!(0.3), dec!(123.456), dec!(99999)];
        for from in UnitOfMeasure::ALL {
            for to in UnitOfMeasure::ALL {
                for q in samples {
                    let back = convert(convert(q, from, to).unwrap(), to, from).unwrap();
                    assert_eq!(back, q, "{q} {from} -> {to} -> {from}");
                }
            }
        }
    }

    #[test]
    fn zero_stays_zero() {
        let zero = convert(Decimal::ZERO, UnitOfMeasure::Liter, UnitOfMeasure::Milliliter);
        assert!(zero.unwrap().is_zero());
    }

    #[test]
    fn overflowing_conversion_is_an_error() {
        let err = convert(Decimal::MAX, UnitOfMeasure::Liter, UnitOfMeasure::Milliliter)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let shrunk = convert(Decimal::MAX, UnitOfMeasure::Milliliter, UnitOfMeasure::Liter);
        assert!(shrunk.is_ok());
    }
}
