//! # Portfolio Engine
//!
//! $$
//! \mathbf{w}^\* = \operatorname{Frontier}\big(\hat\mu(R, \Sigma, P, Q),\ \Sigma(R)\big)
//! $$
//!
//! High-level pipeline from a price table to the selected portfolio.

use tracing::info;

use super::data::PriceTable;
use super::data::ReturnSeries;
use super::frontier::FrontierConfig;
use super::frontier::FrontierOptimizer;
use super::frontier::Penalty;
use super::returns::DEFAULT_TAU;
use super::returns::ExpectedReturns;
use super::returns::MarketWeights;
use super::returns::ReturnInputs;
use super::returns::ReturnMethod;
use super::returns::estimate_returns;
use super::risk::RiskMatrix;
use super::risk::RiskMethod;
use super::risk::estimate_risk;
use super::types::Diagnostics;
use super::types::FrontierSolution;
use super::views::ParsedViews;
use super::views::ViewParser;
use super::views::ViewPolicy;
use crate::error::Result;

/// Runtime configuration for [`PortfolioEngine`].
#[derive(Clone, Debug)]
pub struct PortfolioEngineConfig {
  /// Expected-return estimator.
  pub returns: ReturnMethod,
  /// Risk estimator.
  pub risk: RiskMethod,
  /// Risk-free rate used by CAPM.
  pub risk_free: f64,
  /// Black-Litterman prior uncertainty scale.
  pub tau: f64,
  /// Handling of malformed view lines.
  pub view_policy: ViewPolicy,
  /// Reject views without a confidence tag.
  pub require_confidence: bool,
  /// Sweep configuration.
  pub frontier: FrontierConfig,
}

impl Default for PortfolioEngineConfig {
  fn default() -> Self {
    Self {
      returns: ReturnMethod::Historic,
      risk: RiskMethod::Variance,
      risk_free: 0.0,
      tau: DEFAULT_TAU,
      view_policy: ViewPolicy::Lenient,
      require_confidence: false,
      frontier: FrontierConfig::default(),
    }
  }
}

/// Market side inputs that only some estimators consume.
#[derive(Clone, Debug, Default)]
pub struct MarketInputs {
  /// Raw view statements, one per line.
  pub view_lines: Vec<String>,
  pub market_caps: Option<MarketWeights>,
}

/// Everything produced by [`PortfolioEngine::run`].
#[derive(Clone, Debug)]
pub struct PortfolioRun {
  pub method: ReturnMethod,
  pub risk_method: RiskMethod,
  pub penalty: Penalty,
  /// Penalty weight as configured; ignored when `penalty` is `None`.
  pub penalty_weight: f64,
  pub returns: ReturnSeries,
  pub risk: RiskMatrix,
  pub expected: ExpectedReturns,
  pub solution: FrontierSolution,
  /// Non-fatal diagnostics from every stage, in order.
  pub diagnostics: Diagnostics,
}

/// Single entry point for the estimation and optimization pipeline.
#[derive(Clone, Debug, Default)]
pub struct PortfolioEngine {
  config: PortfolioEngineConfig,
}

impl PortfolioEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: PortfolioEngineConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &PortfolioEngineConfig {
    &self.config
  }

  /// Parse view statements against `assets` with the configured policy.
  pub fn parse_views(&self, assets: &[String], lines: &[String]) -> Result<ParsedViews> {
    ViewParser::new(assets)
      .with_policy(self.config.view_policy)
      .require_confidence(self.config.require_confidence)
      .parse(lines)
  }

  /// Prices → returns → risk → expected returns → frontier.
  pub fn run(&self, prices: &PriceTable, inputs: &MarketInputs) -> Result<PortfolioRun> {
    let cfg = &self.config;
    let mut diagnostics = Diagnostics::default();

    let returns = ReturnSeries::from_prices(prices)?;
    info!(
      assets = returns.n_assets(),
      periods = returns.n_periods(),
      dropped = prices.len().saturating_sub(returns.n_periods() + 1),
      "built return series"
    );

    let risk = estimate_risk(cfg.risk, &returns)?;

    let views = if inputs.view_lines.is_empty() {
      None
    } else {
      let parsed = self.parse_views(returns.assets(), &inputs.view_lines)?;
      info!(accepted = parsed.len(), rejected = parsed.diagnostics.len(), "parsed views");
      diagnostics.extend(parsed.diagnostics.clone());
      Some(parsed)
    };

    let mut return_inputs = ReturnInputs::new(&returns, &risk)
      .risk_free(cfg.risk_free)
      .tau(cfg.tau);
    if let Some(views) = views.as_ref() {
      return_inputs = return_inputs.views(views);
    }
    if let Some(caps) = inputs.market_caps.as_ref() {
      return_inputs = return_inputs.market_weights(caps);
    }
    let expected = estimate_returns(cfg.returns, &return_inputs, &mut diagnostics)?;

    let solution = FrontierOptimizer::new(cfg.frontier.clone()).solve(&risk, &expected)?;
    diagnostics.extend(solution.diagnostics.clone());

    Ok(PortfolioRun {
      method: cfg.returns,
      risk_method: cfg.risk,
      penalty: cfg.frontier.penalty,
      penalty_weight: cfg.frontier.penalty_weight,
      returns,
      risk,
      expected,
      solution,
      diagnostics,
    })
  }
}
