//! # Option Value Grid
//!
//! $$
//! C_{ij} = C(S_j, \sigma_i),\qquad P_{ij} = P(S_j, \sigma_i)
//! $$
//!
//! Call and put values over a spot × volatility grid.

use ndarray::Array1;
use ndarray::Array2;
use tracing::info;
use tracing::warn;

use super::OptionContract;
use super::OptionPricer;
use crate::error::Result;
use crate::quant::OptionStyle;

/// Values on a grid with rows indexed by volatility and columns by spot.
#[derive(Clone, Debug)]
pub struct OptionGrid {
  pub spots: Array1<f64>,
  pub vols: Array1<f64>,
  pub calls: Array2<f64>,
  pub puts: Array2<f64>,
}

/// Price `template` at every `(vol, spot)` pair.
pub fn value_grid<P: OptionPricer + ?Sized>(
  pricer: &P,
  spots: &[f64],
  vols: &[f64],
  template: &OptionContract,
) -> Result<OptionGrid> {
  if template.style == OptionStyle::American && !pricer.supports_early_exercise() {
    warn!(
      pricer = pricer.title(),
      "pricer ignores early exercise, american contracts are valued as european"
    );
  }
  info!(
    pricer = pricer.title(),
    spots = spots.len(),
    vols = vols.len(),
    "pricing option grid"
  );

  let mut calls = Array2::zeros((vols.len(), spots.len()));
  let mut puts = Array2::zeros((vols.len(), spots.len()));
  for (i, &sigma) in vols.iter().enumerate() {
    for (j, &spot) in spots.iter().enumerate() {
      let contract = OptionContract {
        spot,
        sigma,
        ..*template
      };
      let (call, put) = pricer.calculate_call_put(&contract)?;
      calls[[i, j]] = call;
      puts[[i, j]] = put;
    }
  }

  Ok(OptionGrid {
    spots: Array1::from(spots.to_vec()),
    vols: Array1::from(vols.to_vec()),
    calls,
    puts,
  })
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
  Array1::linspace(start, end, n).to_vec()
}
