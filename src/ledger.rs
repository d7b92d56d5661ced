//! Ledger store for the settlement engine
//!
//! Durable state is exactly three things: the market table (keyed by id),
//! the position table (keyed by market id and account) and the singleton
//! engine configuration carrying the scalar counters. Backends persist
//! borsh-encoded records; no key ordering is relied upon.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::{MarketError, Result};
use crate::state::{AccountId, EngineConfig, Market, Position};

/// Keyed access to the engine's durable records. Pure data access, no
/// policy: every precondition lives in the processor.
pub trait LedgerStore {
    fn config(&self) -> Result<Option<EngineConfig>>;
    fn put_config(&mut self, config: &EngineConfig) -> Result<()>;

    fn market(&self, id: u64) -> Result<Option<Market>>;
    fn put_market(&mut self, market: &Market) -> Result<()>;

    fn position(&self, market_id: u64, account: &AccountId) -> Result<Option<Position>>;
    fn put_position(&mut self, position: &Position) -> Result<()>;

    fn contains_market(&self, id: u64) -> Result<bool> {
        Ok(self.market(id)?.is_some())
    }
}

fn encode<T: BorshSerialize>(value: &T) -> Result<Vec<u8>> {
    value.try_to_vec().map_err(|_| MarketError::InvalidRecord)
}

fn decode<T: BorshDeserialize>(bytes: &[u8]) -> Result<T> {
    T::try_from_slice(bytes).map_err(|_| MarketError::InvalidRecord)
}

/// In-memory ledger backend holding borsh-encoded records, the reference
/// implementation of the persisted layout.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    config: Option<Vec<u8>>,
    markets: BTreeMap<u64, Vec<u8>>,
    positions: BTreeMap<(u64, AccountId), Vec<u8>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored markets, for host diagnostics.
    pub fn market_count(&self) -> usize {
        self.markets.len()
    }
}

impl LedgerStore for MemoryLedger {
    fn config(&self) -> Result<Option<EngineConfig>> {
        self.config.as_deref().map(decode).transpose()
    }

    fn put_config(&mut self, config: &EngineConfig) -> Result<()> {
        self.config = Some(encode(config)?);
        Ok(())
    }

    fn market(&self, id: u64) -> Result<Option<Market>> {
        self.markets.get(&id).map(|b| decode(b)).transpose()
    }

    fn put_market(&mut self, market: &Market) -> Result<()> {
        self.markets.insert(market.id, encode(market)?);
        Ok(())
    }

    fn position(&self, market_id: u64, account: &AccountId) -> Result<Option<Position>> {
        self.positions
            .get(&(market_id, *account))
            .map(|b| decode(b))
            .transpose()
    }

    fn put_position(&mut self, position: &Position) -> Result<()> {
        self.positions
            .insert((position.market_id, position.account), encode(position)?);
        Ok(())
    }
}

/// Write-staging overlay over a base store.
///
/// Reads see staged records first, then fall through to the base. Writes
/// stay in the overlay until [`StagedLedger::commit`]; dropping the overlay
/// discards them. Mutating operations stage every record update, invoke the
/// external transfer, and commit only once it has succeeded, which is what
/// makes record mutation and value movement a single all-or-nothing unit.
pub struct StagedLedger<'a, L: LedgerStore> {
    base: &'a mut L,
    config: Option<EngineConfig>,
    markets: BTreeMap<u64, Market>,
    positions: BTreeMap<(u64, AccountId), Position>,
}

impl<'a, L: LedgerStore> StagedLedger<'a, L> {
    pub fn new(base: &'a mut L) -> Self {
        Self {
            base,
            config: None,
            markets: BTreeMap::new(),
            positions: BTreeMap::new(),
        }
    }

    /// Write all staged records to the base store.
    pub fn commit(self) -> Result<()> {
        if let Some(config) = &self.config {
            self.base.put_config(config)?;
        }
        for market in self.markets.values() {
            self.base.put_market(market)?;
        }
        for position in self.positions.values() {
            self.base.put_position(position)?;
        }
        Ok(())
    }
}

impl<L: LedgerStore> LedgerStore for StagedLedger<'_, L> {
    fn config(&self) -> Result<Option<EngineConfig>> {
        match &self.config {
            Some(config) => Ok(Some(config.clone())),
            None => self.base.config(),
        }
    }

    fn put_config(&mut self, config: &EngineConfig) -> Result<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn market(&self, id: u64) -> Result<Option<Market>> {
        match self.markets.get(&id) {
            Some(market) => Ok(Some(market.clone())),
            None => self.base.market(id),
        }
    }

    fn put_market(&mut self, market: &Market) -> Result<()> {
        self.markets.insert(market.id, market.clone());
        Ok(())
    }

    fn position(&self, market_id: u64, account: &AccountId) -> Result<Option<Position>> {
        match self.positions.get(&(market_id, *account)) {
            Some(position) => Ok(Some(position.clone())),
            None => self.base.position(market_id, account),
        }
    }

    fn put_position(&mut self, position: &Position) -> Result<()> {
        self.positions
            .insert((position.market_id, position.account), position.clone());
        Ok(())
    }
}
