//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{r}\ \frac{r}{\mathbf{w}_r^\top \Sigma \mathbf{w}_r}
//! $$
//!
//! Shared result containers and the diagnostic log of non-fatal substitutions.

use std::fmt;

use nalgebra::DVector;
use tracing::warn;

/// A non-fatal substitution or skipped input, recorded instead of aborting.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
  /// Unknown risk estimator name; sample covariance was used.
  UnknownRiskMethod { requested: String },
  /// Unknown return estimator name; historic returns were used.
  UnknownReturnMethod { requested: String },
  /// Unknown penalty name; no penalty was applied.
  UnknownPenalty { requested: String },
  /// A supplied parameter has no effect for the selected configuration.
  UnusedParameter { name: &'static str, value: String },
  /// A view statement was rejected and left out of the view set.
  SkippedView {
    line: usize,
    text: String,
    reason: String,
  },
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Diagnostic::UnknownRiskMethod { requested } => write!(
        f,
        "invalid risk estimator {requested:?}, defaulting to variance risk"
      ),
      Diagnostic::UnknownReturnMethod { requested } => write!(
        f,
        "invalid return estimator {requested:?}, defaulting to historic returns"
      ),
      Diagnostic::UnknownPenalty { requested } => {
        write!(f, "invalid penalty {requested:?}, defaulting to no penalty")
      }
      Diagnostic::UnusedParameter { name, value } => {
        write!(f, "unused parameter: {name}={value}")
      }
      Diagnostic::SkippedView { line, text, reason } => {
        write!(f, "invalid view statement on line {line} ({text:?}): {reason}")
      }
    }
  }
}

/// Ordered log of [`Diagnostic`]s. Every recorded entry is also emitted as a
/// `tracing` warning so substitutions are never silent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
  entries: Vec<Diagnostic>,
}

impl Diagnostics {
  pub fn record(&mut self, diagnostic: Diagnostic) {
    warn!("{diagnostic}");
    self.entries.push(diagnostic);
  }

  /// Append already-reported entries without logging them again.
  pub fn extend(&mut self, other: Diagnostics) {
    self.entries.extend(other.entries);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
    self.entries.iter()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// One asset's share of the selected portfolio.
#[derive(Clone, Debug, PartialEq)]
pub struct Allocation {
  /// Asset identifier.
  pub asset: String,
  /// Fraction of the portfolio value (negative for a short position).
  pub weight: f64,
  /// Currency amount, `weight * total_value`.
  pub amount: f64,
}

/// Asset-to-amount allocation produced by the frontier sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct Portfolio {
  allocations: Vec<Allocation>,
  total_value: f64,
}

impl Portfolio {
  pub fn from_weights(assets: &[String], weights: &DVector<f64>, total_value: f64) -> Self {
    let allocations = assets
      .iter()
      .zip(weights.iter())
      .map(|(asset, &weight)| Allocation {
        asset: asset.clone(),
        weight,
        amount: weight * total_value,
      })
      .collect();

    Self {
      allocations,
      total_value,
    }
  }

  pub fn allocations(&self) -> &[Allocation] {
    &self.allocations
  }

  pub fn total_value(&self) -> f64 {
    self.total_value
  }

  pub fn len(&self) -> usize {
    self.allocations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.allocations.is_empty()
  }

  /// Currency amount allocated to `asset`.
  pub fn amount(&self, asset: &str) -> Option<f64> {
    self.find(asset).map(|a| a.amount)
  }

  /// Portfolio weight of `asset`.
  pub fn weight(&self, asset: &str) -> Option<f64> {
    self.find(asset).map(|a| a.weight)
  }

  fn find(&self, asset: &str) -> Option<&Allocation> {
    self.allocations.iter().find(|a| a.asset == asset)
  }
}

/// A solved point of the target-return sweep.
#[derive(Clone, Debug)]
pub struct FrontierPoint {
  /// Target return the QP was solved for.
  pub target_return: f64,
  /// Realized variance `wᵀΣw` of the solution.
  pub risk: f64,
  /// Optimal weights at this target.
  pub weights: DVector<f64>,
}

impl FrontierPoint {
  /// Return-to-risk ratio used to pick the optimum.
  ///
  /// The denominator is the variance, not the volatility, so this is not the
  /// textbook Sharpe ratio. Rankings along one frontier are what matter here.
  pub fn ratio(&self) -> f64 {
    self.target_return / self.risk.max(f64::MIN_POSITIVE)
  }
}

/// Output of [`super::FrontierOptimizer::solve`].
#[derive(Clone, Debug)]
pub struct FrontierSolution {
  /// Selected allocation scaled by the portfolio value.
  pub portfolio: Portfolio,
  /// Weights of the selected point.
  pub weights: DVector<f64>,
  /// Maximum return-to-variance ratio over the feasible sweep.
  pub max_sharpe: f64,
  /// Target return of the selected point.
  pub target_return: f64,
  /// `μᵀw` of the selected weights (at least the target when the target is a floor).
  pub achieved_return: f64,
  /// Variance `wᵀΣw` of the selected weights.
  pub risk: f64,
  /// `(risk, target_return)` for every feasible point, in sweep order.
  pub curve: Vec<(f64, f64)>,
  /// Number of target returns attempted.
  pub attempted_points: usize,
  /// Non-fatal substitutions applied while solving.
  pub diagnostics: Diagnostics,
}

impl FrontierSolution {
  pub fn feasible_points(&self) -> usize {
    self.curve.len()
  }
}
