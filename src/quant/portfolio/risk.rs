//! # Risk Estimation
//!
//! $$
//! \Sigma = \frac{1}{T-1}\,(R - \bar R)^\top (R - \bar R)
//! $$
//!
//! Sample covariance of period returns.

use std::fmt::Display;
use std::str::FromStr;

use nalgebra::DMatrix;
use tracing::info;

use super::data::ReturnSeries;
use super::types::Diagnostic;
use super::types::Diagnostics;
use crate::error::PortfolioError;
use crate::error::Result;

/// Risk estimator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RiskMethod {
  /// Sample covariance over the full window.
  #[default]
  Variance,
}

impl RiskMethod {
  /// Resolve a method name, falling back to [`RiskMethod::Variance`] with a
  /// diagnostic when the name is unknown.
  pub fn parse(name: &str, diagnostics: &mut Diagnostics) -> Self {
    name.parse().unwrap_or_else(|_| {
      diagnostics.record(Diagnostic::UnknownRiskMethod {
        requested: name.to_string(),
      });
      Self::Variance
    })
  }
}

impl FromStr for RiskMethod {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "variance" | "covariance" => Ok(Self::Variance),
      other => Err(format!("unknown risk estimator {other:?}")),
    }
  }
}

impl Display for RiskMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      RiskMethod::Variance => write!(f, "variance"),
    }
  }
}

/// Symmetric positive semi-definite covariance with its asset order.
#[derive(Clone, Debug)]
pub struct RiskMatrix {
  assets: Vec<String>,
  cov: DMatrix<f64>,
}

impl RiskMatrix {
  /// Validate and symmetrize a covariance matrix.
  pub fn new(assets: Vec<String>, cov: DMatrix<f64>) -> Result<Self> {
    if assets.is_empty() {
      return Err(PortfolioError::EmptyUniverse);
    }
    if !cov.is_square() || cov.nrows() != assets.len() {
      return Err(PortfolioError::AssetMismatch(format!(
        "{}x{} covariance for {} assets",
        cov.nrows(),
        cov.ncols(),
        assets.len()
      )));
    }
    if cov.iter().any(|v| !v.is_finite()) {
      return Err(PortfolioError::InvalidInput(
        "covariance contains non-finite values".into(),
      ));
    }
    if let Some(i) = (0..cov.nrows()).find(|&i| cov[(i, i)] < 0.0) {
      return Err(PortfolioError::InvalidInput(format!(
        "negative variance {} for {}",
        cov[(i, i)],
        assets[i]
      )));
    }

    let cov = (&cov + cov.transpose()) * 0.5;
    Ok(Self { assets, cov })
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn matrix(&self) -> &DMatrix<f64> {
    &self.cov
  }

  pub fn n_assets(&self) -> usize {
    self.assets.len()
  }
}

/// Sample covariance with the `T - 1` denominator.
fn sample_covariance(series: &ReturnSeries) -> Result<DMatrix<f64>> {
  let t = series.n_periods();
  if t < 2 {
    return Err(PortfolioError::InsufficientData(format!(
      "covariance needs at least 2 return periods, got {t}"
    )));
  }

  let r = series.matrix();
  let means = r.row_mean();
  let mut centered = r.clone();
  for mut row in centered.row_iter_mut() {
    row -= &means;
  }

  Ok(centered.transpose() * &centered / (t as f64 - 1.0))
}

/// Estimate the risk matrix of a return series.
pub fn estimate_risk(method: RiskMethod, series: &ReturnSeries) -> Result<RiskMatrix> {
  info!(
    method = %method,
    assets = series.n_assets(),
    periods = series.n_periods(),
    "estimating risk"
  );

  let cov = match method {
    RiskMethod::Variance => sample_covariance(series)?,
  };
  RiskMatrix::new(series.assets().to_vec(), cov)
}
