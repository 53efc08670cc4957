//! WAD fixed-point arithmetic.
//!
//! Products are formed in 256 bits so no `u128 × u128` can overflow; results
//! are narrowed back with a checked cast. Every helper takes an explicit
//! rounding direction so call sites state who the rounding favours.

use primitive_types::U256;

use crate::{
    constants::WAD,
    error::{require, PoolError, Result},
};

/// Direction of the integer division remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// `a * b / d`, rounded per `rounding`.
pub fn mul_div(a: u128, b: u128, d: u128, rounding: Rounding) -> Result<u128> {
    require!(d != 0, PoolError::DivisionByZero);
    // (2^128 − 1)^2 < 2^256: the product itself never overflows
    let product = U256::from(a) * U256::from(b);
    let (quotient, remainder) = product.div_mod(U256::from(d));
    let quotient = if rounding == Rounding::Up && !remainder.is_zero() {
        quotient + U256::one()
    } else {
        quotient
    };
    narrow(quotient)
}

/// Checked narrowing to the 128-bit reserve width.
pub fn narrow(value: U256) -> Result<u128> {
    require!(value <= U256::from(u128::MAX), PoolError::Overflow);
    Ok(value.low_u128())
}

/// `a * b <= c * d`, compared without loss.
pub fn cross_le(a: u128, b: u128, c: u128, d: u128) -> bool {
    U256::from(a) * U256::from(b) <= U256::from(c) * U256::from(d)
}

/// ⌊a · b / WAD⌋
pub fn mul_down(a: u128, b: u128) -> Result<u128> {
    mul_div(a, b, WAD, Rounding::Down)
}

/// ⌈a · b / WAD⌉
pub fn mul_up(a: u128, b: u128) -> Result<u128> {
    mul_div(a, b, WAD, Rounding::Up)
}

/// ⌊a · WAD / b⌋
pub fn div_down(a: u128, b: u128) -> Result<u128> {
    mul_div(a, WAD, b, Rounding::Down)
}

/// ⌈a · WAD / b⌉
pub fn div_up(a: u128, b: u128) -> Result<u128> {
    mul_div(a, WAD, b, Rounding::Up)
}

pub fn add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(PoolError::Overflow)
}

pub fn sub(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(PoolError::Underflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_directions() {
        assert_eq!(mul_div(7, 3, 2, Rounding::Down).unwrap(), 10);
        assert_eq!(mul_div(7, 3, 2, Rounding::Up).unwrap(), 11);
        // exact division never rounds up
        assert_eq!(mul_div(8, 3, 2, Rounding::Up).unwrap(), 12);
    }

    #[test]
    fn wad_helpers() {
        let half = WAD / 2;
        assert_eq!(mul_down(3, half).unwrap(), 1);
        assert_eq!(mul_up(3, half).unwrap(), 2);
        assert_eq!(div_down(1, 3).unwrap(), WAD / 3);
        assert_eq!(div_up(1, 3).unwrap(), WAD / 3 + 1);
        assert_eq!(mul_down(5 * WAD, 2 * WAD).unwrap(), 10 * WAD);
    }

    #[test]
    fn wide_intermediate_does_not_overflow() {
        // u128::MAX * WAD / WAD fits even though the product does not
        assert_eq!(mul_down(u128::MAX, WAD).unwrap(), u128::MAX);
    }

    #[test]
    fn narrowing_is_checked() {
        assert_eq!(mul_down(u128::MAX, 2 * WAD), Err(PoolError::Overflow));
        assert_eq!(mul_up(u128::MAX, u128::MAX), Err(PoolError::Overflow));
    }

    #[test]
    fn division_by_zero_is_reported() {
        assert_eq!(mul_div(1, 1, 0, Rounding::Down), Err(PoolError::DivisionByZero));
        assert_eq!(div_up(1, 0), Err(PoolError::DivisionByZero));
    }

    #[test]
    fn cross_products_compare_without_overflow() {
        assert!(cross_le(u128::MAX, 2, u128::MAX, 3));
        assert!(!cross_le(u128::MAX, 3, u128::MAX, 2));
        assert!(cross_le(4, 5, 2, 10));
    }

    #[test]
    fn checked_add_sub() {
        assert_eq!(add(u128::MAX, 1), Err(PoolError::Overflow));
        assert_eq!(sub(0, 1), Err(PoolError::Underflow));
        assert_eq!(sub(5, 3).unwrap(), 2);
    }
}
