//! # Errors
//!
//! Fatal conditions of an optimization run. Recoverable substitutions are not
//! errors; they are recorded as [`crate::quant::portfolio::Diagnostic`]s.

use thiserror::Error;

/// Reasons an optimization run aborts without producing a portfolio.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
  /// No assets were supplied.
  #[error("asset universe is empty")]
  EmptyUniverse,

  /// Two inputs disagree about the asset universe or its order.
  #[error("asset mismatch: {0}")]
  AssetMismatch(String),

  /// Every target return of the sweep was infeasible or unsolved.
  #[error("no feasible point on the efficient frontier ({attempted} target returns tried)")]
  NoFeasiblePoint {
    /// Number of target returns that were attempted.
    attempted: usize,
  },

  /// A matrix that must be inverted is singular.
  #[error("singular matrix while computing {0}")]
  SingularMatrix(&'static str),

  /// A view statement was rejected while strict parsing was requested.
  #[error("invalid view on line {line} ({text:?}): {reason}")]
  InvalidView {
    /// 1-based line number in the view source.
    line: usize,
    /// The offending statement.
    text: String,
    /// Why the statement was rejected.
    reason: String,
  },

  /// Not enough observations for the requested estimate.
  #[error("insufficient data: {0}")]
  InsufficientData(String),

  /// Malformed numeric input (non-finite values, bad shapes, negative weights).
  #[error("invalid input: {0}")]
  InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
