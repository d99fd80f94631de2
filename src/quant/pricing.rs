//! # Pricing
//!
//! $$
//! V_0=\mathbb E^{\mathbb Q}\!\left[e^{-rT}\,\Pi(S_T)\right]
//! $$
//!
//! Vanilla option valuation on a binomial tree or in closed form, and
//! spot × volatility value grids.

pub mod binomial;
pub mod black_scholes;
pub mod grid;

pub use binomial::BinomialPricer;
pub use black_scholes::BlackScholesPricer;
pub use grid::OptionGrid;
pub use grid::value_grid;

use chrono::NaiveDate;
use impl_new_derive::ImplNew;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::quant::OptionStyle;
use crate::quant::OptionType;

/// Vanilla option terms. Maturity is `tau` in years, or the day count between
/// `eval` and `expiration` over 365 when `tau` is unset.
#[derive(ImplNew, Clone, Copy, Debug, PartialEq)]
pub struct OptionContract {
  /// Exercise style
  pub style: OptionStyle,
  /// Underlying price
  pub spot: f64,
  /// Strike price
  pub strike: f64,
  /// Volatility
  pub sigma: f64,
  /// Risk-free rate
  pub rate: f64,
  /// Time to maturity in years
  pub tau: Option<f64>,
  /// Evaluation date
  pub eval: Option<NaiveDate>,
  /// Expiration date
  pub expiration: Option<NaiveDate>,
}

impl OptionContract {
  /// Contract with maturity given directly in years.
  pub fn with_tau(style: OptionStyle, spot: f64, strike: f64, sigma: f64, rate: f64, tau: f64) -> Self {
    Self::new(style, spot, strike, sigma, rate, Some(tau), None, None)
  }

  pub fn tau_or_from_dates(&self) -> Result<f64> {
    if let Some(tau) = self.tau {
      return Ok(tau);
    }
    match (self.eval, self.expiration) {
      (Some(e), Some(x)) => Ok(x.signed_duration_since(e).num_days() as f64 / 365.0),
      _ => Err(PortfolioError::InvalidInput(
        "either tau or both eval and expiration must be set".into(),
      )),
    }
  }

  /// Check the terms and return the maturity in years.
  pub fn validate(&self) -> Result<f64> {
    let tau = self.tau_or_from_dates()?;
    let checks = [
      (self.spot, "spot"),
      (self.strike, "strike"),
      (self.sigma, "sigma"),
      (tau, "tau"),
    ];
    if let Some((value, name)) = checks.iter().find(|(v, _)| !(v.is_finite() && *v > 0.0)) {
      return Err(PortfolioError::InvalidInput(format!(
        "{name} must be finite and positive, got {value}"
      )));
    }
    if !self.rate.is_finite() {
      return Err(PortfolioError::InvalidInput(format!(
        "rate must be finite, got {}",
        self.rate
      )));
    }
    Ok(tau)
  }
}

pub trait OptionPricer: Sync {
  fn title(&self) -> &'static str;

  fn calculate_call_put(&self, contract: &OptionContract) -> Result<(f64, f64)>;

  fn calculate_price(&self, contract: &OptionContract, option_type: OptionType) -> Result<f64> {
    let (call, put) = self.calculate_call_put(contract)?;
    Ok(match option_type {
      OptionType::Call => call,
      OptionType::Put => put,
    })
  }

  /// Whether American contracts are valued with early exercise.
  fn supports_early_exercise(&self) -> bool {
    false
  }
}

pub(crate) fn payoff(option_type: OptionType, s: f64, k: f64) -> f64 {
  match option_type {
    OptionType::Call => (s - k).max(0.0),
    OptionType::Put => (k - s).max(0.0),
  }
}
