//! # Binomial Tree
//!
//! Backward induction on a drifted binomial tree:
//! $$
//! u,d = e^{r\Delta t \pm \sigma\sqrt{\Delta t}},\qquad
//! p = \frac{e^{r\Delta t}-d}{u-d},
//! $$
//! $$
//! V_i = \max\left(g(S_i)\,\mathbf 1_{\text{American}},\ e^{-r\Delta t}\left[pV_{i+1}^{u}+(1-p)V_{i+1}^{d}\right]\right).
//! $$

use impl_new_derive::ImplNew;

use super::OptionContract;
use super::OptionPricer;
use super::payoff;
use crate::error::PortfolioError;
use crate::error::Result;
use crate::quant::OptionStyle;
use crate::quant::OptionType;

#[derive(ImplNew, Clone, Copy, Debug)]
pub struct BinomialPricer {
  /// Number of time steps.
  pub steps: usize,
}

impl Default for BinomialPricer {
  fn default() -> Self {
    Self { steps: 100 }
  }
}

impl BinomialPricer {
  fn price(&self, contract: &OptionContract, tau: f64, option_type: OptionType) -> f64 {
    let n = self.steps;
    let dt = tau / n as f64;
    let growth = (contract.rate * dt).exp();
    let u = (contract.rate * dt + contract.sigma * dt.sqrt()).exp();
    let d = (contract.rate * dt - contract.sigma * dt.sqrt()).exp();
    let p = (growth - d) / (u - d);
    let disc = 1.0 / growth;
    let american = contract.style == OptionStyle::American;

    let ud_ratio = u / d;
    let mut s_node = contract.spot * d.powi(n as i32);
    let mut values = Vec::with_capacity(n + 1);
    for _ in 0..=n {
      values.push(payoff(option_type, s_node, contract.strike));
      s_node *= ud_ratio;
    }

    for i in (0..n).rev() {
      let mut s_i = contract.spot * d.powi(i as i32);
      for j in 0..=i {
        let continuation = disc * (p * values[j + 1] + (1.0 - p) * values[j]);
        values[j] = if american {
          continuation.max(payoff(option_type, s_i, contract.strike))
        } else {
          continuation
        };
        s_i *= ud_ratio;
      }
    }

    values[0]
  }
}

impl OptionPricer for BinomialPricer {
  fn title(&self) -> &'static str {
    "Binomial"
  }

  fn calculate_call_put(&self, contract: &OptionContract) -> Result<(f64, f64)> {
    if self.steps == 0 {
      return Err(PortfolioError::InvalidInput(
        "binomial tree needs at least one step".into(),
      ));
    }
    let tau = contract.validate()?;

    Ok((
      self.price(contract, tau, OptionType::Call),
      self.price(contract, tau, OptionType::Put),
    ))
  }

  fn supports_early_exercise(&self) -> bool {
    true
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;
  use crate::quant::pricing::BlackScholesPricer;

  fn contract(style: OptionStyle) -> OptionContract {
    OptionContract::with_tau(style, 100.0, 100.0, 0.2, 0.05, 1.0)
  }

  #[test]
  fn european_tree_converges_to_black_scholes() {
    let (call, put) = BinomialPricer::new(2000)
      .calculate_call_put(&contract(OptionStyle::European))
      .unwrap();
    let (bs_call, bs_put) = BlackScholesPricer
      .calculate_call_put(&contract(OptionStyle::European))
      .unwrap();

    assert_abs_diff_eq!(call, bs_call, epsilon = 2e-2);
    assert_abs_diff_eq!(put, bs_put, epsilon = 2e-2);
  }

  #[test]
  fn early_exercise_lifts_puts_only() {
    let pricer = BinomialPricer::new(500);
    let (eu_call, eu_put) = pricer
      .calculate_call_put(&contract(OptionStyle::European))
      .unwrap();
    let (am_call, am_put) = pricer
      .calculate_call_put(&contract(OptionStyle::American))
      .unwrap();

    assert_abs_diff_eq!(am_call, eu_call, epsilon = 1e-9);
    assert!(am_put > eu_put + 1e-3);
  }

  #[test]
  fn single_step_tree_by_hand() {
    let c = OptionContract::with_tau(OptionStyle::European, 100.0, 100.0, 0.2, 0.0, 1.0);
    let (call, put) = BinomialPricer::new(1).calculate_call_put(&c).unwrap();

    let u = 0.2_f64.exp();
    let d = (-0.2_f64).exp();
    let p = (1.0 - d) / (u - d);
    assert_abs_diff_eq!(call, p * (100.0 * u - 100.0), epsilon = 1e-12);
    assert_abs_diff_eq!(put, (1.0 - p) * (100.0 - 100.0 * d), epsilon = 1e-12);
  }

  #[test]
  fn zero_steps_are_rejected() {
    assert!(BinomialPricer::new(0)
      .calculate_call_put(&contract(OptionStyle::European))
      .is_err());
  }
}
