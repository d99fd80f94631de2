//! # Run Configuration
//!
//! $$
//! \text{TOML} \to (\text{PortfolioEngineConfig},\ \text{OptionContract})
//! $$
//!
//! The run file read by the `frontier` binary. Every section and key is
//! optional.
//!
//! ```toml
//! [data]
//! prices = "data/prices.csv"
//! market_caps = "data/caps.csv"
//! views = "data/views.txt"
//! portfolio_value = 10000.0
//!
//! [model]
//! returns = "black-litterman"
//! penalty = "l2"
//! penalty_weight = 0.1
//!
//! [output]
//! export_file = "out/portfolio.txt"
//! plot_file = "out/frontier.html"
//! ```

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use anyhow::bail;
use serde::Deserialize;

use crate::quant::OptionStyle;
use crate::quant::portfolio::Diagnostics;
use crate::quant::portfolio::FrontierConfig;
use crate::quant::portfolio::Penalty;
use crate::quant::portfolio::PortfolioEngineConfig;
use crate::quant::portfolio::ReturnMethod;
use crate::quant::portfolio::RiskMethod;
use crate::quant::portfolio::SweepVariant;
use crate::quant::portfolio::ViewPolicy;
use crate::quant::portfolio::returns::DEFAULT_TAU;
use crate::quant::pricing::BinomialPricer;
use crate::quant::pricing::BlackScholesPricer;
use crate::quant::pricing::OptionContract;
use crate::quant::pricing::OptionPricer;
use crate::quant::pricing::grid::linspace;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
  pub data: DataConfig,
  pub model: ModelConfig,
  pub output: OutputConfig,
  pub options: OptionsConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
  pub prices: Option<PathBuf>,
  pub market_caps: Option<PathBuf>,
  pub views: Option<PathBuf>,
  pub portfolio_value: f64,
  pub risk_free: f64,
}

impl Default for DataConfig {
  fn default() -> Self {
    Self {
      prices: None,
      market_caps: None,
      views: None,
      portfolio_value: 1.0,
      risk_free: 0.0,
    }
  }
}

/// Unknown estimator and penalty names resolve in [`RunConfig::engine_config`],
/// falling back to the defaults with a diagnostic.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
  pub returns: String,
  pub risk: String,
  pub short: bool,
  pub penalty: String,
  pub penalty_weight: f64,
  pub sweep: String,
  /// Overrides the sweep preset.
  pub points: Option<usize>,
  /// Overrides the sweep preset.
  pub epsilon: Option<f64>,
  pub tau: f64,
  pub view_policy: String,
  pub require_confidence: bool,
  pub parallel: bool,
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      returns: ReturnMethod::Historic.to_string(),
      risk: RiskMethod::Variance.to_string(),
      short: false,
      penalty: Penalty::None.to_string(),
      penalty_weight: 0.0,
      sweep: "relaxed".into(),
      points: None,
      epsilon: None,
      tau: DEFAULT_TAU,
      view_policy: "lenient".into(),
      require_confidence: false,
      parallel: true,
    }
  }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
  /// `ASSET: amount` export of the selected portfolio.
  pub export_file: Option<PathBuf>,
  /// HTML chart of the efficient frontier.
  pub plot_file: Option<PathBuf>,
  /// HTML heatmaps of the option value grid.
  pub grid_plot_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricerKind {
  #[default]
  Binomial,
  BlackScholes,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsConfig {
  pub pricer: PricerKind,
  pub style: OptionStyle,
  pub strike: f64,
  pub tau: f64,
  pub rate: f64,
  pub spot_range: [f64; 2],
  pub vol_range: [f64; 2],
  pub spot_points: usize,
  pub vol_points: usize,
  /// Binomial tree depth.
  pub steps: usize,
}

impl Default for OptionsConfig {
  fn default() -> Self {
    Self {
      pricer: PricerKind::Binomial,
      style: OptionStyle::European,
      strike: 100.0,
      tau: 1.0,
      rate: 0.05,
      spot_range: [50.0, 150.0],
      vol_range: [0.05, 0.6],
      spot_points: 41,
      vol_points: 23,
      steps: 100,
    }
  }
}

impl OptionsConfig {
  pub fn pricer(&self) -> Box<dyn OptionPricer> {
    match self.pricer {
      PricerKind::Binomial => Box::new(BinomialPricer::new(self.steps)),
      PricerKind::BlackScholes => Box::new(BlackScholesPricer),
    }
  }

  /// Contract whose spot and volatility are replaced at every grid node.
  pub fn template(&self) -> OptionContract {
    OptionContract::with_tau(
      self.style,
      self.strike,
      self.strike,
      self.vol_range[0],
      self.rate,
      self.tau,
    )
  }

  pub fn spots(&self) -> Vec<f64> {
    linspace(self.spot_range[0], self.spot_range[1], self.spot_points)
  }

  pub fn vols(&self) -> Vec<f64> {
    linspace(self.vol_range[0], self.vol_range[1], self.vol_points)
  }

  fn validate(&self) -> Result<()> {
    for (name, [lo, hi]) in [("spot_range", self.spot_range), ("vol_range", self.vol_range)] {
      if !(lo.is_finite() && hi.is_finite() && 0.0 < lo && lo <= hi) {
        bail!("options.{name} must be an increasing pair of positive numbers, got [{lo}, {hi}]");
      }
    }
    if self.spot_points == 0 || self.vol_points == 0 {
      bail!("options grid needs at least one spot and one volatility");
    }
    Ok(())
  }
}

impl RunConfig {
  /// Read and validate a TOML run file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    Self::from_toml_str(&content)
      .with_context(|| format!("Invalid config file: {}", path.display()))
  }

  pub fn from_toml_str(content: &str) -> Result<Self> {
    let config: RunConfig = toml::from_str(content).context("Failed to parse TOML")?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if !(self.data.portfolio_value.is_finite() && self.data.portfolio_value > 0.0) {
      bail!(
        "data.portfolio_value must be positive, got {}",
        self.data.portfolio_value
      );
    }
    if !(self.model.tau.is_finite() && self.model.tau > 0.0) {
      bail!("model.tau must be positive, got {}", self.model.tau);
    }
    self.options.validate()
  }

  /// Engine settings. Unknown estimator or penalty names fall back to the
  /// defaults and are reported in the returned diagnostics.
  pub fn engine_config(&self) -> Result<(PortfolioEngineConfig, Diagnostics)> {
    let model = &self.model;
    let mut diagnostics = Diagnostics::default();

    let returns = ReturnMethod::parse(&model.returns, &mut diagnostics);
    let risk = RiskMethod::parse(&model.risk, &mut diagnostics);
    let penalty = Penalty::parse(&model.penalty, &mut diagnostics);
    let sweep = model
      .sweep
      .parse::<SweepVariant>()
      .map_err(|e| anyhow!("model.sweep: {e}"))?;
    let view_policy = model
      .view_policy
      .parse::<ViewPolicy>()
      .map_err(|e| anyhow!("model.view_policy: {e}"))?;

    let mut frontier = FrontierConfig::for_variant(sweep);
    frontier.allow_short = model.short;
    frontier.penalty = penalty;
    frontier.penalty_weight = model.penalty_weight;
    frontier.portfolio_value = self.data.portfolio_value;
    frontier.parallel = model.parallel;
    if let Some(points) = model.points {
      frontier.points = points;
    }
    if let Some(epsilon) = model.epsilon {
      frontier.epsilon = epsilon;
    }

    let config = PortfolioEngineConfig {
      returns,
      risk,
      risk_free: self.data.risk_free,
      tau: model.tau,
      view_policy,
      require_confidence: model.require_confidence,
      frontier,
    };
    Ok((config, diagnostics))
  }
}

#[cfg(test)]
mod tests {
  use tempfile::tempdir;
  use tracing_test::traced_test;

  use super::*;
  use crate::quant::portfolio::Diagnostic;
  use crate::quant::portfolio::TargetConstraint;

  #[test]
  fn empty_file_uses_defaults() {
    let config = RunConfig::from_toml_str("").unwrap();
    let (engine, diagnostics) = config.engine_config().unwrap();

    assert!(diagnostics.is_empty());
    assert_eq!(engine.returns, ReturnMethod::Historic);
    assert_eq!(engine.frontier.points, 500);
    assert_eq!(engine.frontier.target, TargetConstraint::AtLeast);
    assert_eq!(engine.frontier.portfolio_value, 1.0);
    assert!(engine.frontier.parallel);
  }

  #[test]
  fn full_file_maps_onto_engine_config() {
    let config = RunConfig::from_toml_str(
      r#"
        [data]
        prices = "prices.csv"
        market_caps = "caps.csv"
        portfolio_value = 2500.0
        risk_free = 0.001

        [model]
        returns = "black-litterman"
        short = true
        penalty = "l1"
        penalty_weight = 0.2
        sweep = "classic"
        points = 50
        view_policy = "strict"
        parallel = false

        [output]
        export_file = "out/portfolio.txt"
      "#,
    )
    .unwrap();
    let (engine, diagnostics) = config.engine_config().unwrap();

    assert!(diagnostics.is_empty());
    assert_eq!(config.data.prices, Some(PathBuf::from("prices.csv")));
    assert_eq!(engine.returns, ReturnMethod::BlackLitterman);
    assert_eq!(engine.view_policy, ViewPolicy::Strict);
    assert_eq!(engine.risk_free, 0.001);
    assert_eq!(engine.frontier.penalty, Penalty::L1);
    assert_eq!(engine.frontier.penalty_weight, 0.2);
    assert_eq!(engine.frontier.target, TargetConstraint::Exact);
    assert_eq!(engine.frontier.epsilon, 1e-3);
    assert_eq!(engine.frontier.points, 50);
    assert_eq!(engine.frontier.portfolio_value, 2500.0);
    assert!(engine.frontier.allow_short);
    assert!(!engine.frontier.parallel);
  }

  #[test]
  #[traced_test]
  fn unknown_estimators_fall_back_with_diagnostics() {
    let config = RunConfig::from_toml_str(
      r#"
        [model]
        returns = "momentum"
        risk = "cvar"
        penalty = "elastic"
      "#,
    )
    .unwrap();
    let (engine, diagnostics) = config.engine_config().unwrap();

    assert_eq!(engine.returns, ReturnMethod::Historic);
    assert_eq!(engine.risk, RiskMethod::Variance);
    assert_eq!(engine.frontier.penalty, Penalty::None);
    assert_eq!(diagnostics.len(), 3);
    assert!(matches!(
      diagnostics.iter().next(),
      Some(Diagnostic::UnknownReturnMethod { requested }) if requested == "momentum"
    ));
    assert!(logs_contain("defaulting to historic returns"));
  }

  #[test]
  fn structural_mistakes_are_errors() {
    assert!(RunConfig::from_toml_str("[model]\nretruns = \"capm\"\n").is_err());
    assert!(RunConfig::from_toml_str("[data]\nportfolio_value = -5.0\n").is_err());
    assert!(RunConfig::from_toml_str("[options]\nvol_range = [0.5, 0.1]\n").is_err());

    let config = RunConfig::from_toml_str("[model]\nsweep = \"fast\"\n").unwrap();
    assert!(config.engine_config().is_err());
  }

  #[test]
  fn options_section_builds_pricer_and_grid() {
    let config = RunConfig::from_toml_str(
      r#"
        [options]
        pricer = "black-scholes"
        style = "american"
        strike = 90.0
        spot_range = [80.0, 100.0]
        spot_points = 3
        vol_points = 2
      "#,
    )
    .unwrap();
    let options = &config.options;

    assert_eq!(options.pricer().title(), "Black-Scholes");
    assert_eq!(options.spots(), vec![80.0, 90.0, 100.0]);
    assert_eq!(options.vols().len(), 2);
    let template = options.template();
    assert_eq!(template.style, OptionStyle::American);
    assert_eq!(template.strike, 90.0);
  }

  #[test]
  fn load_reports_the_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.toml");
    fs::write(&path, "[data\n").unwrap();

    let err = format!("{:#}", RunConfig::load(&path).unwrap_err());
    assert!(err.contains("run.toml"), "{err}");
    assert!(RunConfig::load(dir.path().join("missing.toml")).is_err());
  }
}
