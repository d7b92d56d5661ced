//! State definitions for the settlement engine
//!
//! All records persisted through the ledger store, plus the derived
//! lifecycle state.

use borsh::{BorshDeserialize, BorshSerialize};
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length of a market title (bytes)
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum length of a market description (bytes)
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum number of market ids in one batch analytics query
pub const MAX_BATCH_MARKETS: usize = 10;

/// Probability and liquidity-ratio scale (parts-per-thousand)
pub const PROB_PRECISION: u64 = 1000;

/// Default minimum stake per call (base units)
pub const DEFAULT_MINIMUM_STAKE: u64 = 1_000_000;

/// Default platform fee (basis points, 500 = 5%)
pub const DEFAULT_FEE_RATE_BPS: u16 = 500;

/// Default flat market creation fee (base units)
pub const DEFAULT_CREATION_FEE: u64 = 1_000_000;

// ============================================================================
// Identity
// ============================================================================

/// Opaque caller principal supplied by the host environment.
#[derive(
    BorshSerialize, BorshDeserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Deterministic account for tests and examples.
    pub fn from_seed(seed: u8) -> Self {
        Self([seed; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short hex form, enough to tell principals apart in logs
        write!(f, "{}", &hex::encode(self.0)[..16])
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Side of a binary market.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Yes = 0,
    No = 1,
}

impl Outcome {
    /// The other side of the book.
    pub fn opposite(self) -> Self {
        match self {
            Outcome::Yes => Outcome::No,
            Outcome::No => Outcome::Yes,
        }
    }
}

impl From<bool> for Outcome {
    fn from(yes: bool) -> Self {
        if yes {
            Outcome::Yes
        } else {
            Outcome::No
        }
    }
}

impl From<Outcome> for bool {
    fn from(outcome: Outcome) -> bool {
        outcome == Outcome::Yes
    }
}

/// Derived market lifecycle state: Open -> Expired -> Resolved.
///
/// Not persisted; computed from a [`Market`] and the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketState {
    /// Accepting stakes
    Open,
    /// Past expiry, awaiting resolution
    Expired,
    /// Terminal
    Resolved,
}

// ============================================================================
// Records
// ============================================================================

/// Global engine configuration, written exactly once at initialization.
///
/// Holds the two scalar counters alongside the platform parameters; this
/// record plus the market and position tables is the entirety of durable
/// state.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Platform administrator; receives creation fees
    pub owner: AccountId,

    /// Account holding all staked value until claim
    pub escrow: AccountId,

    /// Next market id to assign
    pub next_market_id: u64,

    /// Total markets created
    pub total_markets: u64,

    /// Minimum gross stake per call (base units)
    pub minimum_stake: u64,

    /// Platform fee on every stake (basis points)
    pub fee_rate_bps: u16,

    /// Flat fee charged on market creation (base units)
    pub creation_fee: u64,
}

impl EngineConfig {
    pub fn new(
        owner: AccountId,
        escrow: AccountId,
        minimum_stake: u64,
        fee_rate_bps: u16,
        creation_fee: u64,
    ) -> Self {
        Self {
            owner,
            escrow,
            next_market_id: 1,
            total_markets: 0,
            minimum_stake,
            fee_rate_bps,
            creation_fee,
        }
    }
}

/// Read-only snapshot of the engine configuration and counters.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContractStats {
    pub total_markets: u64,
    pub next_market_id: u64,
    pub owner: AccountId,
    pub minimum_stake: u64,
    pub fee_rate_bps: u16,
}

/// A single binary-outcome market.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Market {
    /// Unique market id, assigned sequentially
    pub id: u64,

    /// Market creator; the only principal allowed to resolve
    pub creator: AccountId,

    /// Market question, bounded by [`MAX_TITLE_LEN`]
    pub title: String,

    /// Resolution criteria, bounded by [`MAX_DESCRIPTION_LEN`]
    pub description: String,

    /// Block at creation time
    pub created_block: u64,

    /// Staking closes and resolution opens at this block
    pub expiry_block: u64,

    /// Block at which the market was resolved
    pub resolution_block: Option<u64>,

    /// Winning side; absent until resolution
    pub outcome: Option<Outcome>,

    /// Net (post-fee) stakes backing YES
    pub total_yes: u64,

    /// Net (post-fee) stakes backing NO
    pub total_no: u64,

    /// One-way resolution flag
    pub resolved: bool,

    /// Fees deducted from every stake on this market
    pub fee_collected: u64,
}

impl Market {
    pub fn new(
        id: u64,
        creator: AccountId,
        title: String,
        description: String,
        created_block: u64,
        expiry_block: u64,
    ) -> Self {
        Self {
            id,
            creator,
            title,
            description,
            created_block,
            expiry_block,
            resolution_block: None,
            outcome: None,
            total_yes: 0,
            total_no: 0,
            resolved: false,
            fee_collected: 0,
        }
    }

    /// Lifecycle state at the given block. Resolved is terminal.
    pub fn state(&self, now: u64) -> MarketState {
        if self.resolved {
            MarketState::Resolved
        } else if now >= self.expiry_block {
            MarketState::Expired
        } else {
            MarketState::Open
        }
    }

    /// Whether stakes are still accepted at the given block.
    pub fn is_open(&self, now: u64) -> bool {
        self.state(now) == MarketState::Open
    }

    /// Whether the market may be resolved at the given block.
    pub fn can_resolve(&self, now: u64) -> bool {
        !self.resolved && now >= self.expiry_block
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Net pool backing the given side.
    pub fn pool(&self, side: Outcome) -> u64 {
        match side {
            Outcome::Yes => self.total_yes,
            Outcome::No => self.total_no,
        }
    }

    /// Combined net volume across both sides.
    pub fn volume(&self) -> u64 {
        self.total_yes.saturating_add(self.total_no)
    }
}

/// One participant's accumulated net stake on one market.
///
/// Created lazily on first stake; never deleted.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Market this position belongs to
    pub market_id: u64,

    /// Position owner
    pub account: AccountId,

    /// Cumulative net stake on YES
    pub yes_amount: u64,

    /// Cumulative net stake on NO
    pub no_amount: u64,

    /// One-way claim flag, settable only after resolution
    pub has_claimed: bool,
}

impl Position {
    /// Create a new empty position.
    pub fn new(market_id: u64, account: AccountId) -> Self {
        Self {
            market_id,
            account,
            yes_amount: 0,
            no_amount: 0,
            has_claimed: false,
        }
    }

    /// Net stake on the given side.
    pub fn amount_on(&self, side: Outcome) -> u64 {
        match side {
            Outcome::Yes => self.yes_amount,
            Outcome::No => self.no_amount,
        }
    }

    /// Combined net stake across both sides.
    pub fn exposure(&self) -> u64 {
        self.yes_amount.saturating_add(self.no_amount)
    }

    pub fn is_empty(&self) -> bool {
        self.yes_amount == 0 && self.no_amount == 0
    }
}

// ============================================================================
// Tests
// ============================================================================
