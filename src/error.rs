use thiserror::Error;

use crate::math::common::MathError;
use crate::math::curve::CurveError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    /// Two amounts or prices disagree on the token they are denominated in.
    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },
    /// A reserve on the relevant side is empty, or the request exceeds what the pool holds.
    #[error("insufficient reserves")]
    InsufficientReserves,
    /// The amount is too small to move the pool.
    #[error("insufficient input amount")]
    InsufficientInputAmount,
    /// The StableSwap invariant did not converge.
    #[error("invariant calculation did not converge within {iterations} iterations")]
    Calculation { iterations: usize },
    /// max_hops == 0
    #[error("max hops must be greater than zero")]
    InvalidHops,
    /// max_num_results == 0
    #[error("max number of results must be greater than zero")]
    InvalidResultLimit,
    /// Consecutive hops do not chain, or the route is empty.
    #[error("invalid route: {0}")]
    InvalidRoute(&'static str),
    #[error("slippage tolerance must not be negative")]
    SlippageToleranceInvalid,
    /// Stable legs can only be quoted forwards.
    #[error("exact output is not supported through a stable swap leg")]
    UnsupportedTradeDirection,
    #[error("token {0} is not part of the pool")]
    UnknownToken(String),
    #[error("tokens share the identity {0}")]
    IdenticalTokens(String),
    #[error("invalid pool: {0}")]
    InvalidPool(&'static str),
    #[error("no pools supplied")]
    NoPools,
    #[error("no pool trades the two tokens directly")]
    NoDirectPool,
    #[error("trades are not comparable")]
    IncomparableTrades,
    #[error("invalid address {0}")]
    InvalidAddress(String),
    #[error("{places} decimal places exceed the {decimals} decimals of the token")]
    Decimals { places: usize, decimals: u8 },
    #[error(transparent)]
    Math(#[from] MathError),
}

impl SwapError {
    /// Whether the router may skip the offending pool and keep searching.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SwapError::InsufficientReserves | SwapError::InsufficientInputAmount
        )
    }

    pub(crate) fn currency_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        SwapError::CurrencyMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<CurveError> for SwapError {
    fn from(error: CurveError) -> Self {
        match error {
            CurveError::Math(error) => SwapError::Math(error),
            CurveError::NotConverged { iterations } => SwapError::Calculation { iterations },
        }
    }
}
