//! Pure swap arithmetic shared by the swap handlers, their quotes and the SDK.
//!
//! Rates are WAD-scaled amounts of asset B per unit of asset A. The fee is
//! carved out of the output leg after the rate is applied and stays in the
//! reserve.

use crate::{
    constants::WAD,
    error::{require, PoolError, Result},
    math::{self, mul_div, Rounding},
    state::SwapReceipt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapAmounts {
    pub amount_in: u128,
    /// Output before the fee
    pub gross_out: u128,
    pub fee: u128,
    pub amount_out: u128,
}

impl From<SwapAmounts> for SwapReceipt {
    fn from(s: SwapAmounts) -> Self {
        SwapReceipt {
            amount_in: s.amount_in,
            gross_out: s.gross_out,
            fee: s.fee,
            amount_out: s.amount_out,
        }
    }
}

/// `WAD² / price`: B per A when one B is worth `price / WAD` of A.
pub fn fixed_rate(reference_price: u128, rounding: Rounding) -> Result<u128> {
    mul_div(WAD, WAD, reference_price, rounding)
}

/// Exact input: `amount_in` of A buys `gross_out` of B, less the fee.
///
/// `reserve_out` is the B reserve the gross output is drawn from.
pub fn compute_swap_in(
    amount_in: u128,
    rate: u128,
    fee_rate_wad: u128,
    reserve_out: u128,
    min_amount_out: u128,
) -> Result<SwapAmounts> {
    let gross_out = math::mul_down(amount_in, rate)?;
    let fee = math::mul_up(gross_out, fee_rate_wad)?;
    let amount_out = math::sub(gross_out, fee)?;

    require!(gross_out <= reserve_out, PoolError::InsufficientLiquidity);
    require!(
        amount_out >= min_amount_out,
        PoolError::SlippageExceeded { actual: amount_out, limit: min_amount_out }
    );
    require!(amount_out > 0, PoolError::ZeroAmount);

    Ok(SwapAmounts { amount_in, gross_out, fee, amount_out })
}

/// Exact output: `amount_out` of A net of the fee, paid for in B.
///
/// The gross output is grossed up so that the fee taken from it leaves at
/// least `amount_out`; the input is rounded up against the caller.
pub fn compute_swap_out(
    amount_out: u128,
    rate: u128,
    fee_rate_wad: u128,
    reserve_out: u128,
    max_amount_in: u128,
) -> Result<SwapAmounts> {
    require!(amount_out > 0, PoolError::ZeroAmount);
    let gross_out = mul_div(amount_out, WAD, math::sub(WAD, fee_rate_wad)?, Rounding::Up)?;
    let amount_in = math::mul_up(gross_out, rate)?;

    require!(gross_out <= reserve_out, PoolError::InsufficientLiquidity);
    require!(
        amount_in <= max_amount_in,
        PoolError::SlippageExceeded { actual: amount_in, limit: max_amount_in }
    );

    Ok(SwapAmounts {
        amount_in,
        gross_out,
        fee: gross_out - amount_out,
        amount_out,
    })
}
