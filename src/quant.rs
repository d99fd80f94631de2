//! # Quant
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}} \frac{\mathbb E[R_p]}{\operatorname{Var}[R_p]}
//! $$
//!
//! Portfolio construction and the option types shared by the pricers.

pub mod portfolio;
pub mod pricing;

use serde::Deserialize;

/// Option type.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum OptionType {
  #[default]
  Call,
  Put,
}

/// Option style.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionStyle {
  American,
  #[default]
  European,
}
