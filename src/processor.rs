//! Operation processor for the settlement engine
//!
//! Owns the market lifecycle state machine (Open -> Expired -> Resolved)
//! and the one-time claim settlement. Every operation validates its
//! preconditions first, stages its record writes, invokes the external
//! transfer where one is required, and commits only on success; the first
//! failed check aborts with no partial mutation.

use tracing::{debug, info};

use crate::bank::Bank;
use crate::error::{MarketError, Result};
use crate::instruction::{
    ClaimWinningsArgs, CreateMarketArgs, EngineInstruction, InitializeArgs, PlaceStakeArgs,
    ResolveMarketArgs,
};
use crate::ledger::{LedgerStore, StagedLedger};
use crate::state::{
    AccountId, ContractStats, EngineConfig, Market, MarketState, Outcome, Position,
    MAX_DESCRIPTION_LEN, MAX_TITLE_LEN,
};
use crate::utils::{self, BPS_DENOMINATOR};

/// Caller identity and logical clock for one call, supplied by the host on
/// every operation.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    /// Authenticated caller principal
    pub caller: AccountId,

    /// Current logical clock value (block height)
    pub now: u64,
}

impl CallContext {
    pub fn new(caller: AccountId, now: u64) -> Self {
        Self { caller, now }
    }
}

/// Typed result of a dispatched instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutput {
    Initialized,
    MarketCreated { market_id: u64 },
    StakePlaced,
    MarketResolved,
    WinningsClaimed { amount: u64 },
}

/// The settlement engine: lifecycle and claim operations over a ledger
/// store, with value movement delegated to the host bank.
///
/// Operations are synchronous and non-suspending; the host serializes
/// calls, so `&mut self` is the only locking the engine needs.
pub struct Engine<L: LedgerStore, B: Bank> {
    pub(crate) ledger: L,
    pub(crate) bank: B,
}

impl<L: LedgerStore, B: Bank> Engine<L, B> {
    pub fn new(ledger: L, bank: B) -> Self {
        Self { ledger, bank }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    fn require_config(&self) -> Result<EngineConfig> {
        self.ledger.config()?.ok_or(MarketError::NotInitialized)
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    /// Write the engine configuration exactly once; the caller becomes the
    /// platform owner.
    pub fn initialize(&mut self, ctx: &CallContext, args: InitializeArgs) -> Result<()> {
        if self.ledger.config()?.is_some() {
            return Err(MarketError::AlreadyInitialized);
        }
        if u64::from(args.fee_rate_bps) > BPS_DENOMINATOR {
            return Err(MarketError::InvalidFeeRate);
        }

        let config = EngineConfig::new(
            ctx.caller,
            args.escrow,
            args.minimum_stake,
            args.fee_rate_bps,
            args.creation_fee,
        );
        self.ledger.put_config(&config)?;

        info!(owner = %ctx.caller, escrow = %config.escrow, "engine initialized");
        Ok(())
    }

    // ========================================================================
    // Market Lifecycle
    // ========================================================================

    /// Open a new market and return its id.
    ///
    /// Charges the flat creation fee from the caller to the platform owner;
    /// a failed fee transfer leaves no market behind.
    pub fn create_market(&mut self, ctx: &CallContext, args: CreateMarketArgs) -> Result<u64> {
        let mut config = self.require_config()?;

        if args.title.is_empty() || args.title.len() > MAX_TITLE_LEN {
            return Err(MarketError::InvalidTitle);
        }
        if args.description.len() > MAX_DESCRIPTION_LEN {
            return Err(MarketError::InvalidDescription);
        }
        if args.duration_blocks == 0 {
            return Err(MarketError::InvalidDuration);
        }

        let expiry_block = utils::checked_add_u64(ctx.now, args.duration_blocks)?;
        let market_id = config.next_market_id;
        let market = Market::new(
            market_id,
            ctx.caller,
            args.title,
            args.description,
            ctx.now,
            expiry_block,
        );

        config.next_market_id = utils::checked_add_u64(config.next_market_id, 1)?;
        config.total_markets = utils::checked_add_u64(config.total_markets, 1)?;

        let mut staged = StagedLedger::new(&mut self.ledger);
        staged.put_market(&market)?;
        staged.put_config(&config)?;
        self.bank
            .transfer(config.creation_fee, &ctx.caller, &config.owner)?;
        staged.commit()?;

        info!(market_id, creator = %ctx.caller, expiry_block, "market created");
        Ok(market_id)
    }

    /// Stake on one side of an open market.
    ///
    /// The gross amount moves from the caller into escrow; the net amount
    /// after the platform fee backs the chosen side.
    pub fn place_stake(&mut self, ctx: &CallContext, args: PlaceStakeArgs) -> Result<()> {
        let config = self.require_config()?;
        let mut market = self
            .ledger
            .market(args.market_id)?
            .ok_or(MarketError::MarketNotFound)?;

        // Resolved is terminal and wins over expiry
        match market.state(ctx.now) {
            MarketState::Resolved => return Err(MarketError::MarketResolved),
            MarketState::Expired => return Err(MarketError::MarketExpired),
            MarketState::Open => {}
        }
        if args.amount < config.minimum_stake {
            return Err(MarketError::InsufficientFunds);
        }

        let fee = utils::fee_amount(args.amount, config.fee_rate_bps);
        let net = utils::checked_sub_u64(args.amount, fee)?;

        let mut position = self
            .ledger
            .position(args.market_id, &ctx.caller)?
            .unwrap_or_else(|| Position::new(args.market_id, ctx.caller));

        match args.outcome {
            Outcome::Yes => {
                position.yes_amount = utils::checked_add_u64(position.yes_amount, net)?;
                market.total_yes = utils::checked_add_u64(market.total_yes, net)?;
            }
            Outcome::No => {
                position.no_amount = utils::checked_add_u64(position.no_amount, net)?;
                market.total_no = utils::checked_add_u64(market.total_no, net)?;
            }
        }
        market.fee_collected = utils::checked_add_u64(market.fee_collected, fee)?;

        let mut staged = StagedLedger::new(&mut self.ledger);
        staged.put_market(&market)?;
        staged.put_position(&position)?;
        self.bank
            .transfer(args.amount, &ctx.caller, &config.escrow)?;
        staged.commit()?;

        debug!(
            market_id = args.market_id,
            account = %ctx.caller,
            outcome = ?args.outcome,
            gross = args.amount,
            net,
            fee,
            "stake placed"
        );
        Ok(())
    }

    /// Resolve an expired market. Only the creator may resolve, only after
    /// expiry, and only once; resolution is irreversible.
    pub fn resolve_market(&mut self, ctx: &CallContext, args: ResolveMarketArgs) -> Result<()> {
        self.require_config()?;
        let mut market = self
            .ledger
            .market(args.market_id)?
            .ok_or(MarketError::MarketNotFound)?;

        if market.creator != ctx.caller {
            return Err(MarketError::NotAuthorized);
        }
        if ctx.now < market.expiry_block {
            return Err(MarketError::MarketNotExpired);
        }
        if market.resolved {
            return Err(MarketError::MarketResolved);
        }

        market.outcome = Some(args.outcome);
        market.resolved = true;
        market.resolution_block = Some(ctx.now);
        self.ledger.put_market(&market)?;

        info!(
            market_id = args.market_id,
            outcome = ?args.outcome,
            resolution_block = ctx.now,
            "market resolved"
        );
        Ok(())
    }

    // ========================================================================
    // Claim Settlement
    // ========================================================================

    /// Settle the caller's winnings on a resolved market and return the
    /// amount paid.
    ///
    /// The claim flag is staged before the escrow transfer is issued and
    /// both commit as one unit, so a re-entrant call can never pay twice
    /// and a failed transfer leaves the flag clear.
    pub fn claim_winnings(&mut self, ctx: &CallContext, args: ClaimWinningsArgs) -> Result<u64> {
        let config = self.require_config()?;
        let market = self
            .ledger
            .market(args.market_id)?
            .ok_or(MarketError::MarketNotFound)?;

        if !market.resolved {
            return Err(MarketError::MarketNotResolved);
        }
        let winning = market.outcome.ok_or(MarketError::MarketNotResolved)?;

        let mut position = self
            .ledger
            .position(args.market_id, &ctx.caller)?
            .ok_or(MarketError::NoPosition)?;
        if position.has_claimed {
            return Err(MarketError::AlreadyClaimed);
        }

        let amount = utils::position_winnings(&position, &market, winning)?;
        if amount == 0 {
            // Nothing to claim: lost stake, or an empty winning pool
            return Err(MarketError::NoPosition);
        }

        position.has_claimed = true;
        let mut staged = StagedLedger::new(&mut self.ledger);
        staged.put_position(&position)?;
        self.bank.transfer(amount, &config.escrow, &ctx.caller)?;
        staged.commit()?;

        info!(
            market_id = args.market_id,
            account = %ctx.caller,
            amount,
            "winnings claimed"
        );
        Ok(amount)
    }

    // ========================================================================
    // Read Accessors
    // ========================================================================

    pub fn get_market(&self, market_id: u64) -> Result<Option<Market>> {
        self.ledger.market(market_id)
    }

    pub fn get_position(&self, market_id: u64, account: &AccountId) -> Result<Option<Position>> {
        self.ledger.position(market_id, account)
    }

    pub fn total_markets(&self) -> Result<u64> {
        Ok(self.require_config()?.total_markets)
    }

    pub fn next_market_id(&self) -> Result<u64> {
        Ok(self.require_config()?.next_market_id)
    }

    pub fn contract_stats(&self) -> Result<ContractStats> {
        let config = self.require_config()?;
        Ok(ContractStats {
            total_markets: config.total_markets,
            next_market_id: config.next_market_id,
            owner: config.owner,
            minimum_stake: config.minimum_stake,
            fee_rate_bps: config.fee_rate_bps,
        })
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Execute one serialized instruction against the engine.
    pub fn dispatch(
        &mut self,
        ctx: &CallContext,
        instruction: EngineInstruction,
    ) -> Result<OperationOutput> {
        match instruction {
            EngineInstruction::Initialize(args) => {
                debug!("instruction: Initialize");
                self.initialize(ctx, args)?;
                Ok(OperationOutput::Initialized)
            }
            EngineInstruction::CreateMarket(args) => {
                debug!("instruction: CreateMarket");
                let market_id = self.create_market(ctx, args)?;
                Ok(OperationOutput::MarketCreated { market_id })
            }
            EngineInstruction::PlaceStake(args) => {
                debug!("instruction: PlaceStake");
                self.place_stake(ctx, args)?;
                Ok(OperationOutput::StakePlaced)
            }
            EngineInstruction::ResolveMarket(args) => {
                debug!("instruction: ResolveMarket");
                self.resolve_market(ctx, args)?;
                Ok(OperationOutput::MarketResolved)
            }
            EngineInstruction::ClaimWinnings(args) => {
                debug!("instruction: ClaimWinnings");
                let amount = self.claim_winnings(ctx, args)?;
                Ok(OperationOutput::WinningsClaimed { amount })
            }
        }
    }
}
