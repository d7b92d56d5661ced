//! Instruction definitions for the settlement engine
//!
//! The mutating operation surface as a serializable enum, for hosts that
//! deliver operations as encoded transactions. Read-only queries are served
//! directly off the engine and have no instruction form.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::state::{
    AccountId, Outcome, DEFAULT_CREATION_FEE, DEFAULT_FEE_RATE_BPS, DEFAULT_MINIMUM_STAKE,
};

/// All mutating operations supported by the settlement engine.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum EngineInstruction {
    /// Write the engine configuration exactly once.
    ///
    /// The caller becomes the platform owner. Fails with
    /// `AlreadyInitialized` on any later call.
    Initialize(InitializeArgs),

    /// Open a new market.
    ///
    /// Charges the flat creation fee from the caller to the owner and
    /// assigns the next sequential market id.
    CreateMarket(CreateMarketArgs),

    /// Stake on one side of an open market.
    ///
    /// Transfers the gross amount from the caller into escrow; the net
    /// amount (after the platform fee) backs the chosen side.
    PlaceStake(PlaceStakeArgs),

    /// Resolve an expired market. Creator only, once.
    ResolveMarket(ResolveMarketArgs),

    /// Settle the caller's winnings on a resolved market, once.
    ClaimWinnings(ClaimWinningsArgs),
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct InitializeArgs {
    /// Account that holds staked value until claim
    pub escrow: AccountId,

    /// Minimum gross stake per call
    pub minimum_stake: u64,

    /// Platform fee in basis points
    pub fee_rate_bps: u16,

    /// Flat market creation fee
    pub creation_fee: u64,
}

impl InitializeArgs {
    /// Production defaults with the given escrow account.
    pub fn with_defaults(escrow: AccountId) -> Self {
        Self {
            escrow,
            minimum_stake: DEFAULT_MINIMUM_STAKE,
            fee_rate_bps: DEFAULT_FEE_RATE_BPS,
            creation_fee: DEFAULT_CREATION_FEE,
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateMarketArgs {
    /// Market question, at most `MAX_TITLE_LEN` bytes
    pub title: String,

    /// Resolution criteria, at most `MAX_DESCRIPTION_LEN` bytes
    pub description: String,

    /// Staking window length in blocks; must be at least 1
    pub duration_blocks: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlaceStakeArgs {
    pub market_id: u64,

    /// Side to back
    pub outcome: Outcome,

    /// Gross stake, at least the configured minimum
    pub amount: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolveMarketArgs {
    pub market_id: u64,

    /// Winning side
    pub outcome: Outcome,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClaimWinningsArgs {
    pub market_id: u64,
}
