//! Error types for the settlement engine

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use thiserror::Error;

/// Errors that may be returned by the settlement engine.
///
/// Every failure aborts the whole operation with no partial mutation. The
/// numeric discriminants are stable and grouped by range so hosts can carry
/// them as wire codes.
#[derive(Clone, Copy, Debug, Eq, Error, FromPrimitive, PartialEq)]
pub enum MarketError {
    // === General Errors (0-99) ===

    /// A stored record failed to decode
    #[error("Invalid ledger record")]
    InvalidRecord = 1,

    #[error("Engine not initialized")]
    NotInitialized = 2,

    #[error("Engine already initialized")]
    AlreadyInitialized = 3,

    #[error("Not authorized")]
    NotAuthorized = 6,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 7,

    #[error("Insufficient funds")]
    InsufficientFunds = 8,

    #[error("Invalid market duration")]
    InvalidDuration = 11,

    #[error("Invalid market title")]
    InvalidTitle = 12,

    #[error("Invalid market description")]
    InvalidDescription = 13,

    #[error("Too many markets in batch query")]
    BatchTooLarge = 14,

    #[error("Fee rate exceeds 100%")]
    InvalidFeeRate = 15,

    // === Market Errors (100-199) ===

    #[error("Market not found")]
    MarketNotFound = 100,

    #[error("Market expired")]
    MarketExpired = 101,

    #[error("Market not expired")]
    MarketNotExpired = 102,

    #[error("Market already resolved")]
    MarketResolved = 103,

    #[error("Market not resolved")]
    MarketNotResolved = 104,

    /// Reserved for multi-outcome validation
    #[error("Invalid outcome")]
    InvalidOutcome = 105,

    // === Position Errors (300-399) ===

    #[error("No position to claim")]
    NoPosition = 300,

    #[error("Winnings already claimed")]
    AlreadyClaimed = 301,
}

impl MarketError {
    /// Stable numeric code reported to hosts.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Reverse of [`MarketError::code`].
    pub fn from_code(code: u32) -> Option<Self> {
        Self::from_u32(code)
    }
}

pub type Result<T> = core::result::Result<T, MarketError>;
