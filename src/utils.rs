//! Fee and payout arithmetic for the settlement engine
//!
//! Pure functions only: deterministic integer math, no ledger access. All
//! intermediate products are widened to u128 before division.

use crate::error::{MarketError, Result};
use crate::state::{Market, Outcome, Position, PROB_PRECISION};

/// Basis-point denominator for fee rates
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Safe addition for u64
pub fn checked_add_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(MarketError::ArithmeticOverflow)
}

/// Safe subtraction for u64
pub fn checked_sub_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(MarketError::ArithmeticOverflow)
}

/// Calculate fee amount from gross amount and basis points (floor)
pub fn fee_amount(amount: u64, fee_rate_bps: u16) -> u64 {
    ((amount as u128) * (fee_rate_bps as u128) / (BPS_DENOMINATOR as u128)) as u64
}

/// Calculate net amount after fee deduction
pub fn net_amount(amount: u64, fee_rate_bps: u16) -> u64 {
    amount.saturating_sub(fee_amount(amount, fee_rate_bps))
}

/// Implied probability of the given side in parts-per-thousand.
///
/// An empty market reads as even odds (500).
pub fn implied_probability(yes_total: u64, no_total: u64, side: Outcome) -> u64 {
    let total = (yes_total as u128) + (no_total as u128);
    if total == 0 {
        return PROB_PRECISION / 2;
    }
    let side_total = match side {
        Outcome::Yes => yes_total,
        Outcome::No => no_total,
    };
    ((side_total as u128) * (PROB_PRECISION as u128) / total) as u64
}

/// Pool balance measure in parts-per-thousand: 1000 means perfectly
/// balanced, 0 means one side is empty.
pub fn liquidity_ratio(yes_total: u64, no_total: u64) -> u64 {
    if yes_total == 0 || no_total == 0 {
        return 0;
    }
    let min = yes_total.min(no_total) as u128;
    let max = yes_total.max(no_total) as u128;
    (min * (PROB_PRECISION as u128) / max) as u64
}

/// Pari-mutuel payout: the winner's own stake plus a proportional share of
/// the losing pool (floor).
///
/// When nobody backed the winning side the payout is zero for everyone and
/// the losing pool stays in escrow as platform residual.
pub fn payout_winnings(user_winning: u64, winning_pool: u64, losing_pool: u64) -> Result<u64> {
    if winning_pool == 0 {
        return Ok(0);
    }
    let share = (user_winning as u128) * (losing_pool as u128) / (winning_pool as u128);
    let total = (user_winning as u128) + share;
    u64::try_from(total).map_err(|_| MarketError::ArithmeticOverflow)
}

/// Payout for a position on a resolved market with the given winning side.
pub fn position_winnings(position: &Position, market: &Market, winning: Outcome) -> Result<u64> {
    payout_winnings(
        position.amount_on(winning),
        market.pool(winning),
        market.pool(winning.opposite()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AccountId;

    #[test]
    fn test_fee_amount() {
        // 5% of 2_000_000 = 100_000
        assert_eq!(fee_amount(2_000_000, 500), 100_000);
        // 5% of 1_000_000 = 50_000
        assert_eq!(fee_amount(1_000_000, 500), 50_000);
        // Truncation, not rounding
        assert_eq!(fee_amount(19, 500), 0);
        assert_eq!(fee_amount(0, 500), 0);
        // Widening keeps large amounts exact
        assert_eq!(fee_amount(u64::MAX, 10_000), u64::MAX);
    }

    #[test]
    fn test_net_amount() {
        assert_eq!(net_amount(2_000_000, 500), 1_900_000);
        assert_eq!(net_amount(1_000_000, 500), 950_000);
        assert_eq!(net_amount(19, 500), 19);
    }

    #[test]
    fn test_implied_probability() {
        // Empty market reads even
        assert_eq!(implied_probability(0, 0, Outcome::Yes), 500);
        assert_eq!(implied_probability(0, 0, Outcome::No), 500);

        assert_eq!(implied_probability(3000, 1000, Outcome::Yes), 750);
        assert_eq!(implied_probability(3000, 1000, Outcome::No), 250);

        // One-sided market
        assert_eq!(implied_probability(500, 0, Outcome::Yes), 1000);
        assert_eq!(implied_probability(500, 0, Outcome::No), 0);

        // Truncated, both sides may lose a part-per-thousand
        assert_eq!(implied_probability(1, 2, Outcome::Yes), 333);
        assert_eq!(implied_probability(1, 2, Outcome::No), 666);
    }

    #[test]
    fn test_liquidity_ratio() {
        assert_eq!(liquidity_ratio(0, 0), 0);
        assert_eq!(liquidity_ratio(100, 0), 0);
        assert_eq!(liquidity_ratio(0, 100), 0);
        assert_eq!(liquidity_ratio(100, 100), 1000);
        assert_eq!(liquidity_ratio(100, 200), 500);
        assert_eq!(liquidity_ratio(200, 100), 500);
        assert_eq!(liquidity_ratio(1, 3), 333);
    }

    #[test]
    fn test_payout_winnings() {
        // Winner takes own stake plus proportional share of losers
        assert_eq!(payout_winnings(1_900_000, 1_900_000, 950_000).unwrap(), 2_850_000);
        // Half the winning pool earns half the losing pool
        assert_eq!(payout_winnings(500, 1000, 300).unwrap(), 650);
        // Nobody on the winning side: everyone gets zero
        assert_eq!(payout_winnings(0, 0, 1_000_000).unwrap(), 0);
        // No losers: winners just get their stake back
        assert_eq!(payout_winnings(500, 1000, 0).unwrap(), 500);
        // Stake on the losing side only
        assert_eq!(payout_winnings(0, 1000, 300).unwrap(), 0);
    }

    #[test]
    fn test_payout_truncation_bounded() {
        // Three winners over an indivisible losing pool: total paid never
        // exceeds the combined pool, rounding loss is below winner count
        let pool = 10u64;
        let losing = 7u64;
        let stakes = [3u64, 3, 4];
        let paid: u64 = stakes
            .iter()
            .map(|s| payout_winnings(*s, pool, losing).unwrap())
            .sum();
        assert!(paid <= pool + losing);
        assert!(pool + losing - paid < stakes.len() as u64);
    }

    #[test]
    fn test_payout_overflow() {
        assert_eq!(
            payout_winnings(u64::MAX, u64::MAX, u64::MAX),
            Err(MarketError::ArithmeticOverflow)
        );
    }

    #[test]
    fn test_position_winnings() {
        let mut market = Market::new(
            1,
            AccountId::from_seed(1),
            "t".to_string(),
            "d".to_string(),
            0,
            100,
        );
        market.total_yes = 1_900_000;
        market.total_no = 950_000;

        let mut position = Position::new(1, AccountId::from_seed(2));
        position.yes_amount = 1_900_000;

        assert_eq!(
            position_winnings(&position, &market, Outcome::Yes).unwrap(),
            2_850_000
        );
        // Same position on a NO resolution wins nothing
        assert_eq!(
            position_winnings(&position, &market, Outcome::No).unwrap(),
            0
        );
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(checked_add_u64(100, 50).unwrap(), 150);
        assert!(checked_add_u64(u64::MAX, 1).is_err());
        assert_eq!(checked_sub_u64(100, 50).unwrap(), 50);
        assert!(checked_sub_u64(50, 100).is_err());
    }
}
