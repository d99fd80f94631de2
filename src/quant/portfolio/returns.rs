//! # Return Estimation
//!
//! $$
//! \mu_{BL} = \left[(\tau\Sigma)^{-1} + P^\top \Omega^{-1} P\right]^{-1}
//! \left[(\tau\Sigma)^{-1}\Pi + P^\top \Omega^{-1} Q\right]
//! $$
//!
//! Historic, CAPM and Black-Litterman expected returns.

use std::fmt::Display;
use std::str::FromStr;

use nalgebra::DMatrix;
use nalgebra::DVector;
use statrs::statistics::Statistics;
use tracing::debug;
use tracing::info;

use super::data::ReturnSeries;
use super::risk::RiskMatrix;
use super::types::Diagnostic;
use super::types::Diagnostics;
use super::views::ParsedViews;
use crate::error::PortfolioError;
use crate::error::Result;

/// Number of trailing periods averaged by the historic estimator.
pub const HISTORIC_WINDOW: usize = 12;

/// Default Black-Litterman prior uncertainty scale.
pub const DEFAULT_TAU: f64 = 0.05;

/// Expected-return estimator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnMethod {
  #[default]
  Historic,
  Capm,
  BlackLitterman,
}

impl ReturnMethod {
  /// Resolve a method name, falling back to [`ReturnMethod::Historic`] with a
  /// diagnostic when the name is unknown.
  pub fn parse(name: &str, diagnostics: &mut Diagnostics) -> Self {
    name.parse().unwrap_or_else(|_| {
      diagnostics.record(Diagnostic::UnknownReturnMethod {
        requested: name.to_string(),
      });
      Self::Historic
    })
  }
}

impl FromStr for ReturnMethod {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_lowercase().replace('_', "-").as_str() {
      "historic" | "historical" => Ok(Self::Historic),
      "capm" => Ok(Self::Capm),
      "black-litterman" | "bl" => Ok(Self::BlackLitterman),
      other => Err(format!("unknown return estimator {other:?}")),
    }
  }
}

impl Display for ReturnMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      ReturnMethod::Historic => "historic",
      ReturnMethod::Capm => "capm",
      ReturnMethod::BlackLitterman => "black-litterman",
    };
    write!(f, "{name}")
  }
}

/// Expected return per asset, in canonical asset order.
#[derive(Clone, Debug)]
pub struct ExpectedReturns {
  assets: Vec<String>,
  mu: DVector<f64>,
}

impl ExpectedReturns {
  pub fn new(assets: Vec<String>, mu: DVector<f64>) -> Result<Self> {
    if assets.is_empty() {
      return Err(PortfolioError::EmptyUniverse);
    }
    if mu.len() != assets.len() {
      return Err(PortfolioError::AssetMismatch(format!(
        "{} expected returns for {} assets",
        mu.len(),
        assets.len()
      )));
    }
    if mu.iter().any(|m| !m.is_finite()) {
      return Err(PortfolioError::InvalidInput(
        "expected returns contain non-finite values".into(),
      ));
    }
    Ok(Self { assets, mu })
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn vector(&self) -> &DVector<f64> {
    &self.mu
  }

  pub fn n_assets(&self) -> usize {
    self.mu.len()
  }

  pub fn get(&self, asset: &str) -> Option<f64> {
    self.assets.iter().position(|a| a == asset).map(|i| self.mu[i])
  }
}

/// Market capitalisation per asset.
#[derive(Clone, Debug, Default)]
pub struct MarketWeights {
  caps: Vec<(String, f64)>,
}

impl MarketWeights {
  pub fn from_caps<I, S>(caps: I) -> Self
  where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
  {
    Self {
      caps: caps.into_iter().map(|(a, c)| (a.into(), c)).collect(),
    }
  }

  /// Capitalisations reordered to `assets` and normalised to sum to one.
  pub fn normalized(&self, assets: &[String]) -> Result<DVector<f64>> {
    let mut w = DVector::zeros(assets.len());
    for (i, asset) in assets.iter().enumerate() {
      let cap = self
        .caps
        .iter()
        .find(|(a, _)| a == asset)
        .map(|(_, c)| *c)
        .ok_or_else(|| PortfolioError::AssetMismatch(format!("no market cap for {asset}")))?;
      if !cap.is_finite() || cap < 0.0 {
        return Err(PortfolioError::InvalidInput(format!(
          "market cap of {asset} must be a non-negative number, got {cap}"
        )));
      }
      w[i] = cap;
    }

    let total = w.sum();
    if total <= 0.0 {
      return Err(PortfolioError::InvalidInput(
        "market caps sum to zero".into(),
      ));
    }
    Ok(w / total)
  }
}

/// Everything a return estimator may consume.
#[derive(Clone, Copy, Debug)]
pub struct ReturnInputs<'a> {
  pub series: &'a ReturnSeries,
  pub risk: &'a RiskMatrix,
  pub risk_free: f64,
  pub views: Option<&'a ParsedViews>,
  pub market_weights: Option<&'a MarketWeights>,
  pub tau: f64,
}

impl<'a> ReturnInputs<'a> {
  pub fn new(series: &'a ReturnSeries, risk: &'a RiskMatrix) -> Self {
    Self {
      series,
      risk,
      risk_free: 0.0,
      views: None,
      market_weights: None,
      tau: DEFAULT_TAU,
    }
  }

  pub fn risk_free(mut self, rate: f64) -> Self {
    self.risk_free = rate;
    self
  }

  pub fn views(mut self, views: &'a ParsedViews) -> Self {
    self.views = Some(views);
    self
  }

  pub fn market_weights(mut self, weights: &'a MarketWeights) -> Self {
    self.market_weights = Some(weights);
    self
  }

  pub fn tau(mut self, tau: f64) -> Self {
    self.tau = tau;
    self
  }
}

/// Mean of the last [`HISTORIC_WINDOW`] return periods.
pub fn historic(series: &ReturnSeries) -> DVector<f64> {
  series.tail_mean(HISTORIC_WINDOW)
}

/// CAPM returns with `r_m` the cross-sectional mean of the historic estimate.
///
/// `β_i = mean_j Σ_ij / ΣΣ`, the average covariance of asset `i` over the sum
/// of all covariance entries.
pub fn capm(series: &ReturnSeries, risk: &RiskMatrix, risk_free: f64) -> Result<DVector<f64>> {
  let sigma = risk.matrix();
  let total = sigma.sum();
  if total <= 0.0 {
    return Err(PortfolioError::InvalidInput(
      "covariance entries sum to a non-positive value".into(),
    ));
  }

  let r_m = historic(series).mean();
  let beta = sigma.column_mean() / total;
  debug!(r_m, total, "capm market proxy");

  Ok(beta.map(|b| risk_free + b * (r_m - risk_free)))
}

/// Black-Litterman posterior mean. Zero views return the equilibrium `Π`.
pub fn black_litterman(
  series: &ReturnSeries,
  risk: &RiskMatrix,
  market_weights: &MarketWeights,
  views: Option<&ParsedViews>,
  tau: f64,
) -> Result<DVector<f64>> {
  if !(tau > 0.0 && tau.is_finite()) {
    return Err(PortfolioError::InvalidInput(format!(
      "tau must be positive, got {tau}"
    )));
  }
  if series.n_periods() < 2 {
    return Err(PortfolioError::InsufficientData(
      "black-litterman needs at least 2 return periods".into(),
    ));
  }

  let sigma = risk.matrix();
  let w_mkt = market_weights.normalized(risk.assets())?;

  let r_m = series.portfolio_returns(&w_mkt);
  let var_m = r_m.iter().variance();
  if !(var_m > 0.0) {
    return Err(PortfolioError::InvalidInput(
      "market portfolio returns have zero variance".into(),
    ));
  }
  let delta = r_m.iter().mean() / var_m;
  let pi = sigma * &w_mkt * delta;
  debug!(delta, "black-litterman risk aversion");

  let views = match views {
    Some(v) if !v.is_empty() => v,
    _ => return Ok(pi),
  };
  if views.p.ncols() != sigma.ncols() {
    return Err(PortfolioError::AssetMismatch(format!(
      "pick matrix has {} columns for {} assets",
      views.p.ncols(),
      sigma.ncols()
    )));
  }

  let tau_sigma_inv = (sigma * tau)
    .try_inverse()
    .ok_or(PortfolioError::SingularMatrix("scaled prior covariance"))?;

  let p = &views.p;
  let omega = (p * sigma * p.transpose()) * tau;
  let omega_inv = DMatrix::from_diagonal(&omega.diagonal().map(|o| 1.0 / o));
  if omega_inv.iter().any(|v| !v.is_finite()) {
    return Err(PortfolioError::SingularMatrix("view uncertainty"));
  }

  let precision = &tau_sigma_inv + p.transpose() * &omega_inv * p;
  let rhs = &tau_sigma_inv * &pi + p.transpose() * &omega_inv * &views.q;
  let posterior = precision
    .try_inverse()
    .ok_or(PortfolioError::SingularMatrix("posterior precision"))?;

  Ok(posterior * rhs)
}

/// Estimate expected returns with `method`. Inputs the method ignores are
/// reported as unused.
pub fn estimate_returns(
  method: ReturnMethod,
  inputs: &ReturnInputs<'_>,
  diagnostics: &mut Diagnostics,
) -> Result<ExpectedReturns> {
  if inputs.series.assets() != inputs.risk.assets() {
    return Err(PortfolioError::AssetMismatch(
      "return series and risk matrix list different assets".into(),
    ));
  }
  info!(method = %method, assets = inputs.risk.n_assets(), "estimating returns");

  if method != ReturnMethod::BlackLitterman {
    if let Some(views) = inputs.views {
      diagnostics.record(Diagnostic::UnusedParameter {
        name: "views",
        value: format!("{} statements", views.len()),
      });
    }
    if inputs.market_weights.is_some() {
      diagnostics.record(Diagnostic::UnusedParameter {
        name: "market_weights",
        value: "supplied".into(),
      });
    }
  }

  let mu = match method {
    ReturnMethod::Historic => historic(inputs.series),
    ReturnMethod::Capm => capm(inputs.series, inputs.risk, inputs.risk_free)?,
    ReturnMethod::BlackLitterman => {
      let weights = inputs.market_weights.ok_or_else(|| {
        PortfolioError::InvalidInput("black-litterman requires market weights".into())
      })?;
      black_litterman(inputs.series, inputs.risk, weights, inputs.views, inputs.tau)?
    }
  };

  ExpectedReturns::new(inputs.risk.assets().to_vec(), mu)
}
