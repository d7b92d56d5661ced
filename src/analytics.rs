//! Read-only analytics over the ledger
//!
//! Derived metrics only; nothing here mutates state, and every query is
//! safe to call speculatively: unknown market ids yield a zeroed, inactive
//! record instead of failing.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::bank::Bank;
use crate::error::{MarketError, Result};
use crate::ledger::LedgerStore;
use crate::processor::Engine;
use crate::state::{AccountId, Market, Outcome, Position, MAX_BATCH_MARKETS};
use crate::utils;

/// Snapshot of one market's derived metrics at a given block.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MarketAnalytics {
    pub market_id: u64,

    /// Whether the id refers to a stored market
    pub exists: bool,

    /// Combined net volume across both sides
    pub volume: u64,

    /// Implied YES probability, parts-per-thousand
    pub yes_probability: u64,

    /// Implied NO probability, parts-per-thousand
    pub no_probability: u64,

    /// Pool balance measure, parts-per-thousand
    pub liquidity: u64,

    /// Whether the market still accepts stakes
    pub is_active: bool,

    pub is_resolved: bool,

    /// Blocks left in the staking window, zero once expired
    pub blocks_until_expiry: u64,
}

impl MarketAnalytics {
    /// Zeroed, inactive record for an unknown market id.
    pub fn absent(market_id: u64) -> Self {
        Self {
            market_id,
            exists: false,
            volume: 0,
            yes_probability: 0,
            no_probability: 0,
            liquidity: 0,
            is_active: false,
            is_resolved: false,
            blocks_until_expiry: 0,
        }
    }

    pub fn from_market(market: &Market, now: u64) -> Self {
        Self {
            market_id: market.id,
            exists: true,
            volume: market.volume(),
            yes_probability: utils::implied_probability(
                market.total_yes,
                market.total_no,
                Outcome::Yes,
            ),
            no_probability: utils::implied_probability(
                market.total_yes,
                market.total_no,
                Outcome::No,
            ),
            liquidity: utils::liquidity_ratio(market.total_yes, market.total_no),
            is_active: market.is_open(now),
            is_resolved: market.is_resolved(),
            blocks_until_expiry: market.expiry_block.saturating_sub(now),
        }
    }
}

/// One market of a batch query: analytics plus the queried participant's
/// position on it.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub analytics: MarketAnalytics,
    pub position: Option<Position>,

    /// The participant's combined net stake on this market
    pub exposure: u64,
}

/// Result of a batch analytics query over a bounded id list.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct BatchAnalytics {
    /// Per-market entries, in input order; duplicate ids appear once each
    pub entries: Vec<BatchEntry>,

    /// Participant exposure summed across all listed markets
    pub total_exposure: u64,

    /// How many listed markets still accept stakes
    pub active_markets: u64,

    /// How many listed markets are resolved
    pub resolved_markets: u64,
}

impl<L: LedgerStore, B: Bank> Engine<L, B> {
    /// Derived metrics for one market at the given block.
    pub fn market_analytics(&self, market_id: u64, now: u64) -> Result<MarketAnalytics> {
        Ok(match self.ledger.market(market_id)? {
            Some(market) => MarketAnalytics::from_market(&market, now),
            None => MarketAnalytics::absent(market_id),
        })
    }

    /// The participant's combined net stake on one market, zero without a
    /// position.
    pub fn user_exposure(&self, market_id: u64, account: &AccountId) -> Result<u64> {
        Ok(self
            .ledger
            .position(market_id, account)?
            .map(|position| position.exposure())
            .unwrap_or(0))
    }

    /// Analytics and the participant's positions for up to
    /// [`MAX_BATCH_MARKETS`] markets in one call.
    ///
    /// Output order matches input order and duplicate ids are processed
    /// independently.
    pub fn market_analytics_batch(
        &self,
        market_ids: &[u64],
        account: &AccountId,
        now: u64,
    ) -> Result<BatchAnalytics> {
        if market_ids.len() > MAX_BATCH_MARKETS {
            return Err(MarketError::BatchTooLarge);
        }

        let mut entries = Vec::with_capacity(market_ids.len());
        let mut total_exposure = 0u64;
        let mut active_markets = 0u64;
        let mut resolved_markets = 0u64;

        for &market_id in market_ids {
            let analytics = self.market_analytics(market_id, now)?;
            let position = self.ledger.position(market_id, account)?;
            let exposure = position.as_ref().map(Position::exposure).unwrap_or(0);

            total_exposure = total_exposure.saturating_add(exposure);
            if analytics.is_active {
                active_markets += 1;
            }
            if analytics.is_resolved {
                resolved_markets += 1;
            }
            entries.push(BatchEntry {
                analytics,
                position,
                exposure,
            });
        }

        Ok(BatchAnalytics {
            entries,
            total_exposure,
            active_markets,
            resolved_markets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::MemoryBank;
    use crate::instruction::{CreateMarketArgs, InitializeArgs, PlaceStakeArgs, ResolveMarketArgs};
    use crate::ledger::MemoryLedger;
    use crate::processor::CallContext;

    const OWNER: u8 = 1;
    const ESCROW: u8 = 0xEE;
    const ALICE: u8 = 10;
    const BOB: u8 = 11;

    fn engine() -> Engine<MemoryLedger, MemoryBank> {
        let mut bank = MemoryBank::new();
        for seed in [OWNER, ALICE, BOB] {
            bank.mint(&AccountId::from_seed(seed), 1_000_000_000);
        }
        let mut engine = Engine::new(MemoryLedger::new(), bank);
        engine
            .initialize(
                &CallContext::new(AccountId::from_seed(OWNER), 0),
                InitializeArgs::with_defaults(AccountId::from_seed(ESCROW)),
            )
            .unwrap();
        engine
    }

    fn create(engine: &mut Engine<MemoryLedger, MemoryBank>, creator: u8, duration: u64) -> u64 {
        engine
            .create_market(
                &CallContext::new(AccountId::from_seed(creator), 0),
                CreateMarketArgs {
                    title: "market".to_string(),
                    description: String::new(),
                    duration_blocks: duration,
                },
            )
            .unwrap()
    }

    fn stake(
        engine: &mut Engine<MemoryLedger, MemoryBank>,
        who: u8,
        market_id: u64,
        outcome: Outcome,
        amount: u64,
        now: u64,
    ) {
        engine
            .place_stake(
                &CallContext::new(AccountId::from_seed(who), now),
                PlaceStakeArgs {
                    market_id,
                    outcome,
                    amount,
                },
            )
            .unwrap();
    }

    #[test]
    fn test_unknown_market_is_zeroed() {
        let engine = engine();
        let analytics = engine.market_analytics(42, 10).unwrap();
        assert_eq!(analytics, MarketAnalytics::absent(42));
        assert!(!analytics.exists);
        assert!(!analytics.is_active);
        assert_eq!(analytics.volume, 0);
    }

    #[test]
    fn test_empty_market_reads_even() {
        let mut engine = engine();
        let id = create(&mut engine, ALICE, 100);
        let analytics = engine.market_analytics(id, 10).unwrap();
        assert!(analytics.exists);
        assert!(analytics.is_active);
        assert_eq!(analytics.yes_probability, 500);
        assert_eq!(analytics.no_probability, 500);
        assert_eq!(analytics.liquidity, 0);
        assert_eq!(analytics.blocks_until_expiry, 90);
    }

    #[test]
    fn test_probabilities_follow_pools() {
        let mut engine = engine();
        let id = create(&mut engine, ALICE, 100);
        // 5% fee: nets are 2_850_000 and 950_000
        stake(&mut engine, ALICE, id, Outcome::Yes, 3_000_000, 10);
        stake(&mut engine, BOB, id, Outcome::No, 1_000_000, 10);

        let analytics = engine.market_analytics(id, 20).unwrap();
        assert_eq!(analytics.volume, 3_800_000);
        assert_eq!(analytics.yes_probability, 750);
        assert_eq!(analytics.no_probability, 250);
        assert_eq!(analytics.liquidity, 333);
    }

    #[test]
    fn test_expiry_deactivates() {
        let mut engine = engine();
        let id = create(&mut engine, ALICE, 100);
        let analytics = engine.market_analytics(id, 100).unwrap();
        assert!(!analytics.is_active);
        assert_eq!(analytics.blocks_until_expiry, 0);
    }

    #[test]
    fn test_user_exposure() {
        let mut engine = engine();
        let id = create(&mut engine, ALICE, 100);
        stake(&mut engine, ALICE, id, Outcome::Yes, 2_000_000, 10);
        stake(&mut engine, ALICE, id, Outcome::No, 1_000_000, 10);

        // 1_900_000 + 950_000 net
        assert_eq!(
            engine.user_exposure(id, &AccountId::from_seed(ALICE)).unwrap(),
            2_850_000
        );
        assert_eq!(
            engine.user_exposure(id, &AccountId::from_seed(BOB)).unwrap(),
            0
        );
        assert_eq!(
            engine.user_exposure(999, &AccountId::from_seed(ALICE)).unwrap(),
            0
        );
    }

    #[test]
    fn test_batch_order_duplicates_and_counts() {
        let mut engine = engine();
        let first = create(&mut engine, ALICE, 100);
        let second = create(&mut engine, ALICE, 200);
        stake(&mut engine, BOB, first, Outcome::Yes, 2_000_000, 10);
        stake(&mut engine, BOB, second, Outcome::No, 2_000_000, 10);
        engine
            .resolve_market(
                &CallContext::new(AccountId::from_seed(ALICE), 100),
                ResolveMarketArgs {
                    market_id: first,
                    outcome: Outcome::Yes,
                },
            )
            .unwrap();

        let ids = [second, first, second, 999];
        let batch = engine
            .market_analytics_batch(&ids, &AccountId::from_seed(BOB), 100)
            .unwrap();

        assert_eq!(batch.entries.len(), 4);
        let returned: Vec<u64> = batch.entries.iter().map(|e| e.analytics.market_id).collect();
        assert_eq!(returned, vec![second, first, second, 999]);

        // The duplicate id counts twice, everywhere
        assert_eq!(batch.total_exposure, 1_900_000 * 3);
        assert_eq!(batch.active_markets, 2);
        assert_eq!(batch.resolved_markets, 1);
        assert!(batch.entries[3].position.is_none());
        assert_eq!(batch.entries[3].exposure, 0);
    }

    #[test]
    fn test_batch_limit() {
        let engine = engine();
        let ids = vec![1u64; MAX_BATCH_MARKETS + 1];
        assert_eq!(
            engine
                .market_analytics_batch(&ids, &AccountId::from_seed(ALICE), 0)
                .unwrap_err(),
            MarketError::BatchTooLarge
        );
    }
}
