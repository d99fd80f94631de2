//! # Portfolio Data
//!
//! $$
//! R_{t,i} = \frac{p_{t,i}}{p_{t-1,i}} - 1
//! $$
//!
//! Price tables and the fractional return series derived from them.

use chrono::NaiveDate;
use nalgebra::DMatrix;
use nalgebra::DVector;

use crate::error::PortfolioError;
use crate::error::Result;

/// Time-ordered asset prices. Column order is the canonical asset order.
#[derive(Clone, Debug)]
pub struct PriceTable {
  assets: Vec<String>,
  dates: Option<Vec<NaiveDate>>,
  rows: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
  /// Build a table from rows of per-asset prices; `None` marks a missing quote.
  pub fn new(assets: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Result<Self> {
    if assets.is_empty() {
      return Err(PortfolioError::EmptyUniverse);
    }

    for (i, asset) in assets.iter().enumerate() {
      if assets[..i].contains(asset) {
        return Err(PortfolioError::AssetMismatch(format!(
          "duplicate asset {asset:?} in price table"
        )));
      }
    }

    if let Some((t, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != assets.len()) {
      return Err(PortfolioError::InvalidInput(format!(
        "price row {t} has {} values, expected {}",
        row.len(),
        assets.len()
      )));
    }

    Ok(Self {
      assets,
      dates: None,
      rows,
    })
  }

  /// Build a dated table; rows are sorted by date.
  pub fn with_dates(
    assets: Vec<String>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<Option<f64>>>,
  ) -> Result<Self> {
    if dates.len() != rows.len() {
      return Err(PortfolioError::InvalidInput(format!(
        "{} dates for {} price rows",
        dates.len(),
        rows.len()
      )));
    }

    let mut dated = dates.into_iter().zip(rows).collect::<Vec<_>>();
    dated.sort_by_key(|(date, _)| *date);
    let (dates, rows): (Vec<_>, Vec<_>) = dated.into_iter().unzip();

    let mut table = Self::new(assets, rows)?;
    table.dates = Some(dates);
    Ok(table)
  }

  /// Convenience constructor for gap-free series given per asset.
  pub fn from_columns(assets: Vec<String>, columns: &[Vec<f64>]) -> Result<Self> {
    if columns.len() != assets.len() {
      return Err(PortfolioError::AssetMismatch(format!(
        "{} price columns for {} assets",
        columns.len(),
        assets.len()
      )));
    }

    let len = columns.first().map_or(0, Vec::len);
    if columns.iter().any(|c| c.len() != len) {
      return Err(PortfolioError::InvalidInput(
        "price columns have different lengths".into(),
      ));
    }

    let rows = (0..len)
      .map(|t| columns.iter().map(|c| Some(c[t])).collect())
      .collect();
    Self::new(assets, rows)
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn dates(&self) -> Option<&[NaiveDate]> {
    self.dates.as_deref()
  }

  pub fn rows(&self) -> &[Vec<Option<f64>>] {
    &self.rows
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }
}

/// `T × N` matrix of fractional period returns without missing values.
#[derive(Clone, Debug)]
pub struct ReturnSeries {
  assets: Vec<String>,
  returns: DMatrix<f64>,
}

impl ReturnSeries {
  /// Wrap an existing return matrix (rows = periods, columns = assets).
  pub fn new(assets: Vec<String>, returns: DMatrix<f64>) -> Result<Self> {
    if assets.is_empty() {
      return Err(PortfolioError::EmptyUniverse);
    }
    if returns.ncols() != assets.len() {
      return Err(PortfolioError::AssetMismatch(format!(
        "{} return columns for {} assets",
        returns.ncols(),
        assets.len()
      )));
    }
    if returns.iter().any(|r| !r.is_finite()) {
      return Err(PortfolioError::InvalidInput(
        "return series contains non-finite values".into(),
      ));
    }

    Ok(Self { assets, returns })
  }

  /// Period-over-period returns. A period is kept only when every asset has a
  /// positive price at both ends of it.
  pub fn from_prices(prices: &PriceTable) -> Result<Self> {
    let n = prices.assets.len();
    let mut data = Vec::new();
    let mut periods = 0;

    for pair in prices.rows.windows(2) {
      let (prev, curr) = (&pair[0], &pair[1]);
      let row = prev
        .iter()
        .zip(curr.iter())
        .map(|(p0, p1)| match (p0, p1) {
          (Some(p0), Some(p1)) if *p0 > 0.0 && *p1 > 0.0 => Some(p1 / p0 - 1.0),
          _ => None,
        })
        .collect::<Option<Vec<f64>>>();

      if let Some(row) = row {
        data.extend(row);
        periods += 1;
      }
    }

    if periods == 0 {
      return Err(PortfolioError::InsufficientData(format!(
        "no complete return periods in {} price rows",
        prices.len()
      )));
    }

    Self::new(
      prices.assets.clone(),
      DMatrix::from_row_slice(periods, n, &data),
    )
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn matrix(&self) -> &DMatrix<f64> {
    &self.returns
  }

  pub fn n_assets(&self) -> usize {
    self.returns.ncols()
  }

  pub fn n_periods(&self) -> usize {
    self.returns.nrows()
  }

  /// Column means over the last `window` periods (all periods if fewer).
  pub fn tail_mean(&self, window: usize) -> DVector<f64> {
    let t = self.n_periods();
    let start = t.saturating_sub(window);
    let tail = self.returns.rows(start, t - start);
    DVector::from_iterator(self.n_assets(), tail.column_iter().map(|c| c.mean()))
  }

  /// Per-period return of a fixed-weight portfolio, `R w`.
  pub fn portfolio_returns(&self, weights: &DVector<f64>) -> DVector<f64> {
    &self.returns * weights
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  fn names(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn returns_have_one_row_fewer_than_prices() {
    let prices = PriceTable::from_columns(
      names(&["A", "B"]),
      &[vec![100.0, 110.0, 99.0], vec![50.0, 50.0, 55.0]],
    )
    .unwrap();
    let series = ReturnSeries::from_prices(&prices).unwrap();

    assert_eq!(series.n_periods(), 2);
    assert_abs_diff_eq!(series.matrix()[(0, 0)], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(series.matrix()[(1, 0)], -0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(series.matrix()[(1, 1)], 0.1, epsilon = 1e-12);
  }

  #[test]
  fn periods_touching_a_gap_are_dropped() {
    let prices = PriceTable::new(
      names(&["A", "B"]),
      vec![
        vec![Some(100.0), Some(10.0)],
        vec![Some(101.0), None],
        vec![Some(102.0), Some(11.0)],
        vec![Some(103.0), Some(12.0)],
      ],
    )
    .unwrap();
    let series = ReturnSeries::from_prices(&prices).unwrap();

    assert_eq!(series.n_periods(), 1);
    assert_abs_diff_eq!(series.matrix()[(0, 1)], 1.0 / 11.0, epsilon = 1e-12);
    assert!(series.matrix().iter().all(|r| r.is_finite()));
  }

  #[test]
  fn dated_rows_are_sorted() {
    let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
    let prices = PriceTable::with_dates(
      names(&["A"]),
      vec![d(3), d(1), d(2)],
      vec![vec![Some(4.0)], vec![Some(1.0)], vec![Some(2.0)]],
    )
    .unwrap();

    assert_eq!(prices.dates().unwrap(), &[d(1), d(2), d(3)]);
    let series = ReturnSeries::from_prices(&prices).unwrap();
    assert_abs_diff_eq!(series.matrix()[(0, 0)], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(series.matrix()[(1, 0)], 1.0, epsilon = 1e-12);
  }

  #[test]
  fn tail_mean_uses_the_last_rows() {
    let returns = DMatrix::from_column_slice(4, 1, &[1.0, 2.0, 3.0, 4.0]);
    let series = ReturnSeries::new(names(&["A"]), returns).unwrap();

    assert_abs_diff_eq!(series.tail_mean(2)[0], 3.5, epsilon = 1e-12);
    assert_abs_diff_eq!(series.tail_mean(12)[0], 2.5, epsilon = 1e-12);
  }

  #[test]
  fn rejects_bad_tables() {
    assert!(matches!(
      PriceTable::new(vec![], vec![]),
      Err(PortfolioError::EmptyUniverse)
    ));
    assert!(matches!(
      PriceTable::new(names(&["A", "A"]), vec![]),
      Err(PortfolioError::AssetMismatch(_))
    ));
    assert!(matches!(
      PriceTable::new(names(&["A", "B"]), vec![vec![Some(1.0)]]),
      Err(PortfolioError::InvalidInput(_))
    ));

    let single = PriceTable::from_columns(names(&["A"]), &[vec![1.0]]).unwrap();
    assert!(matches!(
      ReturnSeries::from_prices(&single),
      Err(PortfolioError::InsufficientData(_))
    ));
  }
}
