//! # Black-Scholes
//!
//! $$
//! C = S\,N(d_1) - K e^{-r\tau} N(d_2),\qquad
//! P = K e^{-r\tau} N(-d_2) - S\,N(-d_1)
//! $$
//! $$
//! d_{1,2} = \frac{\ln(S/K) + (r \pm \tfrac12\sigma^2)\tau}{\sigma\sqrt\tau}
//! $$
//!
//! European closed form; the exercise style of the contract is not used.

use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use super::OptionContract;
use super::OptionPricer;
use crate::error::PortfolioError;
use crate::error::Result;

#[derive(Clone, Copy, Debug, Default)]
pub struct BlackScholesPricer;

impl BlackScholesPricer {
  fn d1_d2(contract: &OptionContract, tau: f64) -> (f64, f64) {
    let vol = contract.sigma * tau.sqrt();
    let d1 = ((contract.spot / contract.strike).ln()
      + (contract.rate + 0.5 * contract.sigma.powi(2)) * tau)
      / vol;
    (d1, d1 - vol)
  }
}

impl OptionPricer for BlackScholesPricer {
  fn title(&self) -> &'static str {
    "Black-Scholes"
  }

  fn calculate_call_put(&self, contract: &OptionContract) -> Result<(f64, f64)> {
    let tau = contract.validate()?;
    let (d1, d2) = Self::d1_d2(contract, tau);
    let n = Normal::new(0.0, 1.0)
      .map_err(|e| PortfolioError::InvalidInput(format!("standard normal: {e}")))?;
    let discounted_strike = contract.strike * (-contract.rate * tau).exp();

    let call = contract.spot * n.cdf(d1) - discounted_strike * n.cdf(d2);
    let put = discounted_strike * n.cdf(-d2) - contract.spot * n.cdf(-d1);

    Ok((call, put))
  }
}
