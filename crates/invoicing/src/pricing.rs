//! Derived-value engine: pure arithmetic over an invoice's base fields.
//!
//! All functions are exact (fixed-precision decimal) and permissive: zero and
//! negative inputs are computed as given. The only rejection is a total
//! outside the decimal range.

use salesbook_core::{DomainError, DomainResult, Money};

/// `price * quantity`.
pub fn line_revenue(price: Money, quantity: u32) -> Money {
    price.times(quantity)
}

/// `price * quantity + shipping_cost`.
pub fn total(price: Money, quantity: u32, shipping_cost: Money) -> DomainResult<Money> {
    price
        .checked_times(quantity)
        .and_then(|revenue| revenue.checked_add(shipping_cost))
        .ok_or_else(|| DomainError::validation("invoice total is too large"))
}

/// `price - purchase_price`; an unset purchase price counts as zero cost.
pub fn unit_profit(price: Money, purchase_price: Option<Money>) -> Money {
    price - purchase_price.unwrap_or(Money::ZERO)
}

/// `unit_profit * quantity`.
pub fn line_profit(price: Money, quantity: u32, purchase_price: Option<Money>) -> Money {
    unit_profit(price, purchase_price).times(quantity)
}

/// `purchase_price * quantity`, zero when the purchase price is unset.
pub fn line_cost(quantity: u32, purchase_price: Option<Money>) -> Money {
    purchase_price.unwrap_or(Money::ZERO).times(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn m(units: i64) -> Money {
        Money::from_units(units)
    }

    #[test]
    fn total_includes_shipping() {
        assert_eq!(total(m(100), 2, m(20)), Ok(m(220)));
    }

    #[test]
    fn zero_inputs_are_exact() {
        assert_eq!(total(Money::ZERO, 0, Money::ZERO), Ok(Money::ZERO));
        assert_eq!(total(m(5), 0, m(3)), Ok(m(3)));
        assert_eq!(total(Money::ZERO, 4, Money::ZERO), Ok(Money::ZERO));
    }

    #[test]
    fn unset_purchase_price_is_zero_cost() {
        assert_eq!(unit_profit(m(50), None), m(50));
        assert_eq!(line_profit(m(50), 3, None), m(150));
        assert_eq!(line_cost(3, None), Money::ZERO);
    }

    #[test]
    fn profit_can_be_negative() {
        assert_eq!(line_profit(m(40), 2, Some(m(60))), m(-40));
    }

    #[test]
    fn fractional_amounts_do_not_drift() {
        let price = Money::from_minor(1999);
        assert_eq!(total(price, 3, Money::from_minor(1)), Ok(Money::from_minor(5998)));
    }

    #[test]
    fn out_of_range_total_is_a_validation_error() {
        let huge: Money = "50000000000000000000000000000".parse().unwrap();
        assert!(matches!(total(huge, 2, Money::ZERO), Err(DomainError::Validation(_))));
        assert!(matches!(total(huge, 1, huge), Err(DomainError::Validation(_))));
        assert_eq!(total(huge, 1, Money::ZERO), Ok(huge));
    }

    proptest! {
        #[test]
        fn total_matches_formula(
            price in 0i64..10_000_000,
            quantity in 0u32..10_000,
            shipping in 0i64..1_000_000,
        ) {
            let price = Money::from_minor(price);
            let shipping = Money::from_minor(shipping);
            let expected = Money::new(price.amount() * Money::from(quantity).amount() + shipping.amount());
            prop_assert_eq!(total(price, quantity, shipping), Ok(expected));
        }

        #[test]
        fn line_profit_is_revenue_minus_cost(
            price in 0i64..10_000_000,
            purchase in proptest::option::of(0i64..10_000_000),
            quantity in 1u32..1_000,
        ) {
            let price = Money::from_minor(price);
            let purchase = purchase.map(Money::from_minor);
            prop_assert_eq!(
                line_profit(price, quantity, purchase),
                line_revenue(price, quantity) - line_cost(quantity, purchase)
            );
        }
    }
}
