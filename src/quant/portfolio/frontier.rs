//! # Efficient Frontier
//!
//! $$
//! \min_{\mathbf w}\ \mathbf w^\top \Sigma \mathbf w + \lambda\,\phi(\mathbf w)
//! \quad\text{s.t.}\quad \mu^\top \mathbf w \ \{=,\ge\}\ r,\ \ \mathbf 1^\top \mathbf w = 1
//! $$
//!
//! Sweeps target returns across the achievable range, solves one QP per target
//! and keeps the point with the highest return-to-variance ratio.

use std::fmt::Display;
use std::str::FromStr;

use nalgebra::DMatrix;
use nalgebra::DVector;
use rayon::prelude::*;
use tracing::debug;
use tracing::info;

use super::qp::ClarabelSolver;
use super::qp::QpSolver;
use super::qp::QpStatus;
use super::qp::QuadraticProgram;
use super::returns::ExpectedReturns;
use super::risk::RiskMatrix;
use super::types::Diagnostic;
use super::types::Diagnostics;
use super::types::FrontierPoint;
use super::types::FrontierSolution;
use super::types::Portfolio;
use crate::error::PortfolioError;
use crate::error::Result;

/// Weight penalty added to the variance objective.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Penalty {
  #[default]
  None,
  /// `λ ‖w‖₁`
  L1,
  /// `λ ‖w‖₂²`
  L2,
}

impl Penalty {
  /// Resolve a penalty name, falling back to [`Penalty::None`] with a
  /// diagnostic when the name is unknown.
  pub fn parse(name: &str, diagnostics: &mut Diagnostics) -> Self {
    name.parse().unwrap_or_else(|_| {
      diagnostics.record(Diagnostic::UnknownPenalty {
        requested: name.to_string(),
      });
      Self::None
    })
  }
}

impl FromStr for Penalty {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "none" | "" => Ok(Self::None),
      "l1" => Ok(Self::L1),
      "l2" => Ok(Self::L2),
      other => Err(format!("unknown penalty {other:?}")),
    }
  }
}

impl Display for Penalty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Penalty::None => "none",
      Penalty::L1 => "l1",
      Penalty::L2 => "l2",
    };
    write!(f, "{name}")
  }
}

/// How the target return constrains `μᵀw`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetConstraint {
  /// `μᵀw = r`
  Exact,
  /// `μᵀw ≥ r`
  #[default]
  AtLeast,
}

/// Preset sweep parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SweepVariant {
  /// Equality target, `ε = 1e-3`, no floor on the lowest target.
  Classic,
  /// Floor target, `ε = 1e-5`, lowest target clamped at zero.
  #[default]
  Relaxed,
}

impl FromStr for SweepVariant {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "classic" => Ok(Self::Classic),
      "relaxed" => Ok(Self::Relaxed),
      other => Err(format!("unknown sweep variant {other:?}")),
    }
  }
}

/// Configuration of [`FrontierOptimizer`].
#[derive(Clone, Debug)]
pub struct FrontierConfig {
  /// Number of target returns in the sweep.
  pub points: usize,
  /// Margin kept from the smallest and largest expected return.
  pub epsilon: f64,
  pub target: TargetConstraint,
  /// Clamp the lowest target at zero.
  pub floor_targets_at_zero: bool,
  pub allow_short: bool,
  pub penalty: Penalty,
  pub penalty_weight: f64,
  /// Currency value the selected weights are scaled by.
  pub portfolio_value: f64,
  /// Solve sweep points on the rayon thread pool.
  pub parallel: bool,
}

impl FrontierConfig {
  pub fn for_variant(variant: SweepVariant) -> Self {
    let (epsilon, target, floor) = match variant {
      SweepVariant::Classic => (1e-3, TargetConstraint::Exact, false),
      SweepVariant::Relaxed => (1e-5, TargetConstraint::AtLeast, true),
    };

    Self {
      points: 500,
      epsilon,
      target,
      floor_targets_at_zero: floor,
      allow_short: false,
      penalty: Penalty::None,
      penalty_weight: 0.0,
      portfolio_value: 1.0,
      parallel: true,
    }
  }
}

impl Default for FrontierConfig {
  fn default() -> Self {
    Self::for_variant(SweepVariant::default())
  }
}

/// Target-return sweep over a pluggable QP solver.
#[derive(Clone, Debug)]
pub struct FrontierOptimizer<S = ClarabelSolver> {
  config: FrontierConfig,
  solver: S,
}

impl FrontierOptimizer<ClarabelSolver> {
  pub fn new(config: FrontierConfig) -> Self {
    Self::with_solver(config, ClarabelSolver::default())
  }
}

impl<S: QpSolver> FrontierOptimizer<S> {
  pub fn with_solver(config: FrontierConfig, solver: S) -> Self {
    Self { config, solver }
  }

  pub fn config(&self) -> &FrontierConfig {
    &self.config
  }

  /// Evenly spaced targets over `[min μ + ε, max μ − ε]`. Empty when the
  /// interval is, e.g. a spread under `2ε` or a zero floor above `max μ`.
  pub fn target_grid(&self, mu: &DVector<f64>) -> Vec<f64> {
    let mut lo = mu.min() + self.config.epsilon;
    let hi = mu.max() - self.config.epsilon;
    if self.config.floor_targets_at_zero {
      lo = lo.max(0.0);
    }
    if lo > hi {
      return Vec::new();
    }

    match self.config.points {
      0 => Vec::new(),
      1 => vec![lo],
      k => {
        let step = (hi - lo) / (k - 1) as f64;
        (0..k).map(|i| lo + step * i as f64).collect()
      }
    }
  }

  /// Solve a single sweep point. `Ok(None)` when the solver reports anything
  /// other than an optimal solution.
  pub fn solve_point(
    &self,
    risk: &RiskMatrix,
    expected: &ExpectedReturns,
    target_return: f64,
  ) -> Result<Option<FrontierPoint>> {
    self.validate(risk, expected)?;
    let lambda = self.penalty_weight()?;
    self.point(risk.matrix(), expected.vector(), target_return, lambda)
  }

  /// Run the sweep and select the maximum ratio point.
  pub fn solve(&self, risk: &RiskMatrix, expected: &ExpectedReturns) -> Result<FrontierSolution> {
    self.validate(risk, expected)?;

    let mut diagnostics = Diagnostics::default();
    let lambda = self.penalty_weight()?;
    if self.config.penalty == Penalty::None && self.config.penalty_weight != 0.0 {
      diagnostics.record(Diagnostic::UnusedParameter {
        name: "penalty_weight",
        value: self.config.penalty_weight.to_string(),
      });
    }

    let sigma = risk.matrix();
    let mu = expected.vector();
    let targets = self.target_grid(mu);
    info!(
      points = targets.len(),
      penalty = %self.config.penalty,
      allow_short = self.config.allow_short,
      parallel = self.config.parallel,
      "sweeping efficient frontier"
    );

    let solve_at = |r: &f64| self.point(sigma, mu, *r, lambda);
    let outcomes = if self.config.parallel {
      targets.par_iter().map(solve_at).collect::<Vec<_>>()
    } else {
      targets.iter().map(solve_at).collect::<Vec<_>>()
    };

    let mut points = Vec::with_capacity(targets.len());
    for outcome in outcomes {
      if let Some(point) = outcome? {
        points.push(point);
      }
    }

    let best = points
      .iter()
      .enumerate()
      .filter(|(_, p)| p.ratio().is_finite())
      .fold(None, |best: Option<(usize, f64)>, (i, p)| {
        let ratio = p.ratio();
        match best {
          Some((_, top)) if ratio <= top => best,
          _ => Some((i, ratio)),
        }
      });

    let Some((idx, max_sharpe)) = best else {
      return Err(PortfolioError::NoFeasiblePoint {
        attempted: targets.len(),
      });
    };

    let chosen = &points[idx];
    let achieved_return = mu.dot(&chosen.weights);
    info!(
      feasible = points.len(),
      attempted = targets.len(),
      target = chosen.target_return,
      risk = chosen.risk,
      ratio = max_sharpe,
      "selected frontier point"
    );

    Ok(FrontierSolution {
      portfolio: Portfolio::from_weights(
        expected.assets(),
        &chosen.weights,
        self.config.portfolio_value,
      ),
      weights: chosen.weights.clone(),
      max_sharpe,
      target_return: chosen.target_return,
      achieved_return,
      risk: chosen.risk,
      curve: points.iter().map(|p| (p.risk, p.target_return)).collect(),
      attempted_points: targets.len(),
      diagnostics,
    })
  }

  fn validate(&self, risk: &RiskMatrix, expected: &ExpectedReturns) -> Result<()> {
    if risk.n_assets() == 0 || expected.n_assets() == 0 {
      return Err(PortfolioError::EmptyUniverse);
    }
    if risk.assets() != expected.assets() {
      return Err(PortfolioError::AssetMismatch(format!(
        "risk matrix assets {:?} differ from expected return assets {:?}",
        risk.assets(),
        expected.assets()
      )));
    }
    if risk.matrix().iter().chain(expected.vector().iter()).any(|v| !v.is_finite()) {
      return Err(PortfolioError::InvalidInput(
        "risk or expected returns contain non-finite values".into(),
      ));
    }
    if !self.config.portfolio_value.is_finite() || !self.config.epsilon.is_finite() {
      return Err(PortfolioError::InvalidInput(
        "portfolio value and epsilon must be finite".into(),
      ));
    }
    Ok(())
  }

  /// Penalty weight in effect, zero when no penalty is selected.
  fn penalty_weight(&self) -> Result<f64> {
    let weight = self.config.penalty_weight;
    if !weight.is_finite() || weight < 0.0 {
      return Err(PortfolioError::InvalidInput(format!(
        "penalty weight must be a non-negative number, got {weight}"
      )));
    }
    Ok(match self.config.penalty {
      Penalty::None => 0.0,
      Penalty::L1 | Penalty::L2 => weight,
    })
  }

  fn point(
    &self,
    sigma: &DMatrix<f64>,
    mu: &DVector<f64>,
    target_return: f64,
    lambda: f64,
  ) -> Result<Option<FrontierPoint>> {
    let n = mu.len();
    let split = self.config.penalty == Penalty::L1 && self.config.allow_short && lambda > 0.0;
    let qp = if split {
      self.split_program(sigma, mu, target_return, lambda)?
    } else {
      self.program(sigma, mu, target_return, lambda)?
    };

    let sol = self.solver.solve(&qp);
    debug!(
      target = target_return,
      status = ?sol.status,
      iterations = sol.iterations,
      "frontier point"
    );
    if sol.status != QpStatus::Solved {
      return Ok(None);
    }

    let weights = if split {
      sol.x.rows(0, n) - sol.x.rows(n, n)
    } else {
      sol.x
    };
    let risk = weights.dot(&(sigma * &weights));

    Ok(Some(FrontierPoint {
      target_return,
      risk,
      weights,
    }))
  }

  /// Budget and target rows as `(equality, inequality)` blocks, where
  /// `mu_row · x = μᵀw` and `ones_row · x = 1ᵀw`. The first `bounds`
  /// variables are kept non-negative.
  fn linear_rows(
    &self,
    mu_row: &DVector<f64>,
    ones_row: &DVector<f64>,
    target_return: f64,
    bounds: usize,
  ) -> ((DMatrix<f64>, DVector<f64>), (DMatrix<f64>, DVector<f64>)) {
    let dim = mu_row.len();
    let exact = self.config.target == TargetConstraint::Exact;

    let m_eq = if exact { 2 } else { 1 };
    let mut a_eq = DMatrix::zeros(m_eq, dim);
    let mut b_eq = DVector::zeros(m_eq);
    a_eq.set_row(0, &ones_row.transpose());
    b_eq[0] = 1.0;

    let m_in = bounds + usize::from(!exact);
    let mut a_in = DMatrix::zeros(m_in, dim);
    let mut b_in = DVector::zeros(m_in);
    for j in 0..bounds {
      a_in[(j, j)] = -1.0;
    }

    if exact {
      a_eq.set_row(1, &mu_row.transpose());
      b_eq[1] = target_return;
    } else {
      // μᵀw ≥ r as −μᵀw ≤ −r
      a_in.set_row(bounds, &(-mu_row).transpose());
      b_in[bounds] = -target_return;
    }

    ((a_eq, b_eq), (a_in, b_in))
  }

  /// Direct formulation over `w`.
  fn program(
    &self,
    sigma: &DMatrix<f64>,
    mu: &DVector<f64>,
    target_return: f64,
    lambda: f64,
  ) -> Result<QuadraticProgram> {
    let n = mu.len();
    let mut p = sigma * 2.0;
    if self.config.penalty == Penalty::L2 {
      for i in 0..n {
        p[(i, i)] += 2.0 * lambda;
      }
    }
    let q = match self.config.penalty {
      Penalty::L1 => DVector::from_element(n, lambda),
      _ => DVector::zeros(n),
    };

    let bounds = if self.config.allow_short { 0 } else { n };
    let (eq, ineq) = self.linear_rows(mu, &DVector::from_element(n, 1.0), target_return, bounds);

    QuadraticProgram::new(p, q, eq, ineq)
  }

  /// `w = u − v` with `u, v ≥ 0`, so `‖w‖₁` becomes the linear term `λ 1ᵀ(u + v)`.
  fn split_program(
    &self,
    sigma: &DMatrix<f64>,
    mu: &DVector<f64>,
    target_return: f64,
    lambda: f64,
  ) -> Result<QuadraticProgram> {
    let n = mu.len();
    let mut p = DMatrix::zeros(2 * n, 2 * n);
    p.view_mut((0, 0), (n, n)).copy_from(&(sigma * 2.0));
    p.view_mut((n, n), (n, n)).copy_from(&(sigma * 2.0));
    p.view_mut((0, n), (n, n)).copy_from(&(sigma * -2.0));
    p.view_mut((n, 0), (n, n)).copy_from(&(sigma * -2.0));
    let q = DVector::from_element(2 * n, lambda);

    let mu_row = DVector::from_fn(2 * n, |j, _| if j < n { mu[j] } else { -mu[j - n] });
    let ones_row = DVector::from_fn(2 * n, |j, _| if j < n { 1.0 } else { -1.0 });
    let (eq, ineq) = self.linear_rows(&mu_row, &ones_row, target_return, 2 * n);

    QuadraticProgram::new(p, q, eq, ineq)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use rand::rngs::StdRng;
  use rand::Rng;
  use rand::SeedableRng;
  use tracing_test::traced_test;

  use super::*;
  use crate::quant::portfolio::data::ReturnSeries;
  use crate::quant::portfolio::risk::RiskMethod;
  use crate::quant::portfolio::risk::estimate_risk;

  fn names(n: usize) -> Vec<String> {
    ["AAA", "BBB", "CCC", "DDD", "EEE"][..n]
      .iter()
      .map(|s| s.to_string())
      .collect()
  }

  /// Uncorrelated three-asset market with a closed-form frontier.
  fn diagonal_market() -> (RiskMatrix, ExpectedReturns) {
    let sigma = DMatrix::from_diagonal(&DVector::from_vec(vec![0.01, 0.02, 0.03]));
    let mu = DVector::from_vec(vec![0.01, 0.02, 0.015]);
    (
      RiskMatrix::new(names(3), sigma).unwrap(),
      ExpectedReturns::new(names(3), mu).unwrap(),
    )
  }

  fn correlated_market() -> (RiskMatrix, ExpectedReturns) {
    let sigma = DMatrix::from_row_slice(
      3,
      3,
      &[0.04, 0.006, 0.002, 0.006, 0.09, 0.009, 0.002, 0.009, 0.16],
    );
    let mu = DVector::from_vec(vec![0.08, 0.12, 0.15]);
    (
      RiskMatrix::new(names(3), sigma).unwrap(),
      ExpectedReturns::new(names(3), mu).unwrap(),
    )
  }

  fn config(points: usize) -> FrontierConfig {
    FrontierConfig {
      points,
      ..FrontierConfig::default()
    }
  }

  #[test]
  fn three_asset_sweep_finds_tangency_point() {
    let (risk, expected) = diagonal_market();
    let solution = FrontierOptimizer::new(FrontierConfig::default())
      .solve(&risk, &expected)
      .unwrap();

    // Unconstrained optimum of r / σ²(r) sits at r = sqrt(C / A) = 0.014302.
    assert!((solution.target_return - 0.014302).abs() < 1e-4);
    assert_abs_diff_eq!(solution.risk, 0.005584, epsilon = 1e-4);
    assert_abs_diff_eq!(solution.weights[0], 0.4745, epsilon = 5e-3);
    assert_abs_diff_eq!(solution.weights[1], 0.3349, epsilon = 5e-3);
    assert_abs_diff_eq!(solution.weights[2], 0.1907, epsilon = 5e-3);
    assert_abs_diff_eq!(solution.weights.sum(), 1.0, epsilon = 1e-6);
    assert_eq!(solution.attempted_points, 500);
    assert!(solution.diagnostics.is_empty());
  }

  #[test]
  fn classic_variant_agrees_on_the_optimum() {
    let (risk, expected) = diagonal_market();
    let config = FrontierConfig {
      points: 200,
      ..FrontierConfig::for_variant(SweepVariant::Classic)
    };
    let solution = FrontierOptimizer::new(config).solve(&risk, &expected).unwrap();

    assert!((solution.target_return - 0.014302).abs() < 1e-4);
    assert_abs_diff_eq!(solution.achieved_return, solution.target_return, epsilon = 1e-6);
  }

  #[test]
  fn max_sharpe_divides_by_variance() {
    let (risk, expected) = diagonal_market();
    let solution = FrontierOptimizer::new(config(50)).solve(&risk, &expected).unwrap();

    assert_abs_diff_eq!(
      solution.max_sharpe,
      solution.target_return / solution.risk,
      epsilon = 1e-9
    );
    assert!(solution.max_sharpe > solution.target_return / solution.risk.sqrt());
  }

  #[test]
  fn selected_target_stays_inside_the_return_range() {
    let (risk, expected) = correlated_market();
    let optimizer = FrontierOptimizer::new(config(80));
    let grid = optimizer.target_grid(expected.vector());
    let solution = optimizer.solve(&risk, &expected).unwrap();

    assert_abs_diff_eq!(grid[0], 0.08 + 1e-5, epsilon = 1e-12);
    assert_abs_diff_eq!(grid[79], 0.15 - 1e-5, epsilon = 1e-12);
    assert!(solution.target_return >= 0.08 && solution.target_return <= 0.15);
    assert_eq!(solution.curve.len(), solution.feasible_points());
  }

  #[test]
  fn random_markets_give_fully_invested_long_only_weights() {
    let mut rng = StdRng::seed_from_u64(7);
    let returns = DMatrix::from_fn(60, 4, |_, _| rng.gen_range(-0.05..0.05));
    let series = ReturnSeries::new(names(4), returns).unwrap();
    let risk = estimate_risk(RiskMethod::Variance, &series).unwrap();
    let expected =
      ExpectedReturns::new(names(4), DVector::from_vec(vec![0.004, 0.012, 0.008, 0.02])).unwrap();

    let solution = FrontierOptimizer::new(config(60)).solve(&risk, &expected).unwrap();

    assert_abs_diff_eq!(solution.weights.sum(), 1.0, epsilon = 1e-6);
    assert!(solution.weights.iter().all(|&w| w >= -1e-6));
    assert_abs_diff_eq!(solution.portfolio.total_value(), 1.0, epsilon = 1e-12);
  }

  #[test]
  fn short_sales_reach_targets_beyond_the_best_asset() {
    let (risk, expected) = correlated_market();
    let exact = FrontierConfig {
      target: TargetConstraint::Exact,
      ..FrontierConfig::default()
    };

    let long_only = FrontierOptimizer::new(exact.clone());
    assert!(long_only.solve_point(&risk, &expected, 0.2).unwrap().is_none());

    let shorting = FrontierOptimizer::new(FrontierConfig {
      allow_short: true,
      ..exact
    });
    let point = shorting.solve_point(&risk, &expected, 0.2).unwrap().unwrap();
    assert_abs_diff_eq!(point.weights.sum(), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(expected.vector().dot(&point.weights), 0.2, epsilon = 1e-6);
    assert!(point.weights.min() < 0.0);
  }

  #[test]
  fn l2_penalty_shrinks_the_largest_weight() {
    let (risk, expected) = diagonal_market();
    let largest = |lambda: f64| {
      let optimizer = FrontierOptimizer::new(FrontierConfig {
        target: TargetConstraint::Exact,
        penalty: Penalty::L2,
        penalty_weight: lambda,
        ..FrontierConfig::default()
      });
      let point = optimizer.solve_point(&risk, &expected, 0.018).unwrap().unwrap();
      point.weights.amax()
    };

    let free = largest(0.0);
    let mild = largest(0.01);
    let strong = largest(1.0);
    assert_abs_diff_eq!(free, 0.68, epsilon = 1e-4);
    assert!(mild < free - 1e-4);
    assert!(strong < mild - 1e-4);
  }

  #[test]
  fn l1_penalty_with_shorts_does_not_grow_gross_exposure() {
    let (risk, expected) = correlated_market();
    let gross = |lambda: f64| {
      let optimizer = FrontierOptimizer::new(FrontierConfig {
        target: TargetConstraint::Exact,
        allow_short: true,
        penalty: Penalty::L1,
        penalty_weight: lambda,
        ..FrontierConfig::default()
      });
      let point = optimizer.solve_point(&risk, &expected, 0.2).unwrap().unwrap();
      assert_abs_diff_eq!(point.weights.sum(), 1.0, epsilon = 1e-6);
      point.weights.lp_norm(1)
    };

    assert!(gross(0.1) <= gross(0.0) + 1e-6);
  }

  #[test]
  fn sequential_and_parallel_sweeps_agree() {
    let (risk, expected) = correlated_market();
    let parallel = FrontierOptimizer::new(config(40)).solve(&risk, &expected).unwrap();
    let sequential = FrontierOptimizer::new(FrontierConfig {
      parallel: false,
      ..config(40)
    })
    .solve(&risk, &expected)
    .unwrap();

    assert_eq!(parallel.target_return, sequential.target_return);
    assert_eq!(parallel.curve, sequential.curve);
  }

  #[test]
  fn identical_returns_have_no_feasible_point() {
    let (risk, _) = diagonal_market();
    let flat = ExpectedReturns::new(names(3), DVector::from_element(3, 0.01)).unwrap();

    let optimizer = FrontierOptimizer::new(config(20));
    assert!(optimizer.target_grid(flat.vector()).is_empty());

    let err = optimizer.solve(&risk, &flat).unwrap_err();
    assert_eq!(err, PortfolioError::NoFeasiblePoint { attempted: 0 });
  }

  #[test]
  fn spread_narrower_than_two_epsilon_selects_nothing() {
    let (risk, _) = diagonal_market();
    let narrow = ExpectedReturns::new(
      names(3),
      DVector::from_vec(vec![0.01, 0.010005, 0.010015]),
    )
    .unwrap();

    for variant in [SweepVariant::Relaxed, SweepVariant::Classic] {
      let optimizer = FrontierOptimizer::new(FrontierConfig {
        points: 20,
        ..FrontierConfig::for_variant(variant)
      });
      assert!(optimizer.target_grid(narrow.vector()).is_empty());
      assert!(matches!(
        optimizer.solve(&risk, &narrow),
        Err(PortfolioError::NoFeasiblePoint { .. })
      ));
    }
  }

  #[test]
  fn zero_floor_above_negative_returns_selects_nothing() {
    let (risk, _) = diagonal_market();
    let losing =
      ExpectedReturns::new(names(3), DVector::from_vec(vec![-0.02, -0.01, -0.015])).unwrap();

    let floored = FrontierOptimizer::new(config(30));
    assert!(floored.config().floor_targets_at_zero);
    assert!(floored.target_grid(losing.vector()).is_empty());
    assert!(matches!(
      floored.solve(&risk, &losing),
      Err(PortfolioError::NoFeasiblePoint { attempted: 0 })
    ));

    let unfloored = FrontierOptimizer::new(FrontierConfig {
      floor_targets_at_zero: false,
      ..config(30)
    });
    let grid = unfloored.target_grid(losing.vector());
    assert_eq!(grid.len(), 30);
    assert!(grid.iter().all(|r| (-0.02..=-0.01).contains(r)));
  }

  #[test]
  fn mismatched_assets_are_rejected() {
    let (risk, _) = diagonal_market();
    let shuffled = ExpectedReturns::new(
      vec!["AAA".into(), "CCC".into(), "BBB".into()],
      DVector::from_vec(vec![0.01, 0.015, 0.02]),
    )
    .unwrap();

    assert!(matches!(
      FrontierOptimizer::new(config(10)).solve(&risk, &shuffled),
      Err(PortfolioError::AssetMismatch(_))
    ));
  }

  #[test]
  fn negative_penalty_weight_is_invalid() {
    let (risk, expected) = diagonal_market();
    let optimizer = FrontierOptimizer::new(FrontierConfig {
      penalty: Penalty::L2,
      penalty_weight: -0.5,
      ..config(10)
    });

    assert!(matches!(
      optimizer.solve(&risk, &expected),
      Err(PortfolioError::InvalidInput(_))
    ));
  }

  #[test]
  #[traced_test]
  fn penalty_weight_without_penalty_is_reported() {
    let (risk, expected) = diagonal_market();
    let mut diagnostics = Diagnostics::default();
    let penalty = Penalty::parse("elastic", &mut diagnostics);
    assert_eq!(penalty, Penalty::None);

    let solution = FrontierOptimizer::new(FrontierConfig {
      penalty,
      penalty_weight: 0.3,
      ..config(20)
    })
    .solve(&risk, &expected)
    .unwrap();

    assert_eq!(solution.diagnostics.len(), 1);
    assert!(logs_contain("invalid penalty"));
    assert!(logs_contain("unused parameter: penalty_weight=0.3"));
    assert!(logs_contain("selected frontier point"));
  }

  #[test]
  fn portfolio_amounts_scale_with_value() {
    let (risk, expected) = diagonal_market();
    let solution = FrontierOptimizer::new(FrontierConfig {
      portfolio_value: 10_000.0,
      ..config(50)
    })
    .solve(&risk, &expected)
    .unwrap();

    let total = solution
      .portfolio
      .allocations()
      .iter()
      .map(|a| a.amount)
      .sum::<f64>();
    assert_abs_diff_eq!(total, 10_000.0, epsilon = 5e-2);
    assert_abs_diff_eq!(
      solution.portfolio.amount("AAA").unwrap(),
      solution.weights[0] * 10_000.0,
      epsilon = 1e-9
    );
  }
}
