//! # Portfolio Report
//!
//! $$
//! \text{amount}_i = w_i \cdot V
//! $$
//!
//! Console table and plain-text export of a selected portfolio.

use std::fmt;

use prettytable::Table;
use prettytable::format;
use prettytable::row;

use super::engine::PortfolioRun;
use super::frontier::Penalty;
use super::returns::ReturnMethod;
use super::risk::RiskMethod;
use super::types::FrontierSolution;

/// Human-readable view over a [`FrontierSolution`].
#[derive(Clone, Copy, Debug)]
pub struct PortfolioReport<'a> {
  method: ReturnMethod,
  risk_method: RiskMethod,
  penalty: Penalty,
  penalty_weight: f64,
  solution: &'a FrontierSolution,
}

impl<'a> PortfolioReport<'a> {
  pub fn new(method: ReturnMethod, solution: &'a FrontierSolution) -> Self {
    Self {
      method,
      risk_method: RiskMethod::default(),
      penalty: Penalty::None,
      penalty_weight: 0.0,
      solution,
    }
  }

  pub fn from_run(run: &'a PortfolioRun) -> Self {
    Self::new(run.method, &run.solution)
      .risk_method(run.risk_method)
      .penalty(run.penalty, run.penalty_weight)
  }

  pub fn risk_method(mut self, risk_method: RiskMethod) -> Self {
    self.risk_method = risk_method;
    self
  }

  pub fn penalty(mut self, penalty: Penalty, weight: f64) -> Self {
    self.penalty = penalty;
    self.penalty_weight = weight;
    self
  }

  pub fn title(&self) -> String {
    let model = match self.method {
      ReturnMethod::Historic => "Markowitz",
      ReturnMethod::Capm => "Capital Asset Pricing",
      ReturnMethod::BlackLitterman => "Black-Litterman",
    };
    format!("{model} Model")
  }

  /// Estimator line, plus the penalty line when a penalty is active.
  pub fn estimators(&self) -> String {
    let mut out = format!(
      "Returns: {}; Risk: {}",
      capitalize(&self.method.to_string()),
      capitalize(&self.risk_method.to_string())
    );
    if self.penalty != Penalty::None {
      out.push_str(&format!(
        "\nPenalty: {}; Penalty Weight: {}",
        self.penalty, self.penalty_weight
      ));
    }
    out
  }

  pub fn summary(&self) -> String {
    format!(
      "Maximum Sharpe Ratio: {:.4}; Expected Return: {:.4}; Expected Risk: {:.4}",
      self.solution.max_sharpe, self.solution.target_return, self.solution.risk
    )
  }

  pub fn table(&self) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["Asset", r->"Weight", r->"Amount"]);
    for a in self.solution.portfolio.allocations() {
      table.add_row(row![
        a.asset,
        r->format!("{:.4}", a.weight),
        r->format!("{:.2}", a.amount)
      ]);
    }
    table
  }

  /// One `ASSET: amount` line per allocation, amounts rounded to cents.
  pub fn export_text(&self) -> String {
    self
      .solution
      .portfolio
      .allocations()
      .iter()
      .map(|a| format!("{}: {:.2}\n", a.asset, a.amount))
      .collect()
  }
}

impl fmt::Display for PortfolioReport<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, " -=-=-=- {} -=-=-=- ", self.title())?;
    writeln!(f, "{}", self.estimators())?;
    writeln!(f, "{}", self.summary())?;
    write!(f, "{}", self.table())
  }
}

fn capitalize(name: &str) -> String {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}
