//! # Input / Output
//!
//! $$
//! \text{CSV} \to \text{PriceTable},\qquad \text{Portfolio} \to \text{ASSET: amount}
//! $$
//!
//! File loaders for prices, market capitalisations and view statements, and
//! the plain-text allocation export.

use std::fs;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use csv::Trim;
use tracing::info;

use crate::quant::portfolio::MarketWeights;
use crate::quant::portfolio::PortfolioReport;
use crate::quant::portfolio::PriceTable;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load a price table with header `date,<ASSET>,…`. Empty cells are missing
/// quotes. Rows are sorted by date.
pub fn load_prices(path: impl AsRef<Path>) -> Result<PriceTable> {
  let path = path.as_ref();
  let mut reader = ReaderBuilder::new()
    .trim(Trim::All)
    .from_path(path)
    .with_context(|| format!("Failed to open price file: {}", path.display()))?;

  let headers = reader
    .headers()
    .with_context(|| format!("Failed to read header of {}", path.display()))?
    .clone();
  if headers.len() < 2 {
    bail!(
      "price file {} needs a date column and at least one asset column",
      path.display()
    );
  }
  let assets = headers.iter().skip(1).map(str::to_string).collect::<Vec<_>>();

  let mut dates = Vec::new();
  let mut rows = Vec::new();
  for (i, record) in reader.records().enumerate() {
    // Line 1 is the header.
    let line = i + 2;
    let record = record.with_context(|| format!("{}:{line}: malformed row", path.display()))?;

    let date = NaiveDate::parse_from_str(&record[0], DATE_FORMAT).with_context(|| {
      format!(
        "{}:{line}: invalid date {:?}, expected YYYY-MM-DD",
        path.display(),
        &record[0]
      )
    })?;

    let prices = record
      .iter()
      .skip(1)
      .map(|cell| {
        if cell.is_empty() {
          Ok(None)
        } else {
          cell
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("{}:{line}: invalid price {cell:?}", path.display()))
        }
      })
      .collect::<Result<Vec<_>>>()?;

    dates.push(date);
    rows.push(prices);
  }

  let table = PriceTable::with_dates(assets, dates, rows)
    .with_context(|| format!("Invalid price table in {}", path.display()))?;
  info!(
    path = %path.display(),
    assets = table.assets().len(),
    rows = table.len(),
    "loaded prices"
  );
  Ok(table)
}

/// Load market capitalisations from a two-column file with a header row.
pub fn load_market_caps(path: impl AsRef<Path>) -> Result<MarketWeights> {
  let path = path.as_ref();
  let mut reader = ReaderBuilder::new()
    .trim(Trim::All)
    .from_path(path)
    .with_context(|| format!("Failed to open market cap file: {}", path.display()))?;

  let mut caps = Vec::new();
  for (i, record) in reader.records().enumerate() {
    let line = i + 2;
    let record = record.with_context(|| format!("{}:{line}: malformed row", path.display()))?;
    if record.len() != 2 {
      bail!(
        "{}:{line}: expected `asset,market_cap`, got {} fields",
        path.display(),
        record.len()
      );
    }
    let cap = record[1]
      .parse::<f64>()
      .with_context(|| format!("{}:{line}: invalid market cap {:?}", path.display(), &record[1]))?;
    caps.push((record[0].to_string(), cap));
  }

  info!(path = %path.display(), assets = caps.len(), "loaded market caps");
  Ok(MarketWeights::from_caps(caps))
}

/// Read view statements, one per line.
pub fn load_views(path: impl AsRef<Path>) -> Result<Vec<String>> {
  let path = path.as_ref();
  let text = fs::read_to_string(path)
    .with_context(|| format!("Failed to read view file: {}", path.display()))?;
  Ok(text.lines().map(str::to_string).collect())
}

/// Write the `ASSET: amount` export, creating parent directories as needed.
pub fn write_export(path: impl AsRef<Path>, report: &PortfolioReport<'_>) -> Result<()> {
  let path = path.as_ref();
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)
      .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
  }
  fs::write(path, report.export_text())
    .with_context(|| format!("Failed to write export file: {}", path.display()))?;
  info!(path = %path.display(), "wrote allocation export");
  Ok(())
}

#[cfg(test)]
mod tests {
  use nalgebra::DVector;
  use tempfile::tempdir;

  use super::*;
  use crate::quant::portfolio::Diagnostics;
  use crate::quant::portfolio::FrontierSolution;
  use crate::quant::portfolio::Portfolio;
  use crate::quant::portfolio::ReturnMethod;

  #[test]
  fn prices_are_sorted_and_gaps_kept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prices.csv");
    fs::write(
      &path,
      "date,AAA,BBB\n2024-03-01,11.0,21.0\n2024-01-01,10.0,\n2024-02-01, 10.5 ,20.5\n",
    )
    .unwrap();

    let table = load_prices(&path).unwrap();

    assert_eq!(table.assets(), ["AAA", "BBB"]);
    let dates = table.dates().unwrap();
    assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(dates[2], NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert_eq!(table.rows()[0], vec![Some(10.0), None]);
    assert_eq!(table.rows()[1], vec![Some(10.5), Some(20.5)]);
  }

  #[test]
  fn bad_cells_name_the_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prices.csv");
    fs::write(&path, "date,AAA\n2024-01-01,10.0\n2024-02-01,ten\n").unwrap();

    let err = format!("{:#}", load_prices(&path).unwrap_err());
    assert!(err.contains(":3:"), "{err}");
    assert!(err.contains("ten"), "{err}");

    fs::write(&path, "date,AAA\n01/02/2024,10.0\n").unwrap();
    assert!(load_prices(&path).is_err());
  }

  #[test]
  fn duplicate_assets_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prices.csv");
    fs::write(&path, "date,AAA,AAA\n2024-01-01,10.0,11.0\n").unwrap();

    assert!(load_prices(&path).is_err());
  }

  #[test]
  fn market_caps_follow_asset_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("caps.csv");
    fs::write(&path, "asset,market_cap\nBBB,300\nAAA,100\n").unwrap();

    let caps = load_market_caps(&path).unwrap();
    let w = caps
      .normalized(&["AAA".to_string(), "BBB".to_string()])
      .unwrap();
    assert_eq!(w, DVector::from_vec(vec![0.25, 0.75]));
  }

  #[test]
  fn views_keep_line_numbers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("views.txt");
    fs::write(&path, "AAA 0.1 up\n\n# note\nAAA 0.02 over BBB\n").unwrap();

    let lines = load_views(&path).unwrap();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[3], "AAA 0.02 over BBB");
  }

  #[test]
  fn export_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("nested").join("portfolio.txt");
    let assets = vec!["AAA".to_string(), "BBB".to_string()];
    let weights = DVector::from_vec(vec![0.4, 0.6]);
    let solution = FrontierSolution {
      portfolio: Portfolio::from_weights(&assets, &weights, 500.0),
      weights,
      max_sharpe: 1.0,
      target_return: 0.01,
      achieved_return: 0.01,
      risk: 0.01,
      curve: vec![(0.01, 0.01)],
      attempted_points: 1,
      diagnostics: Diagnostics::default(),
    };

    write_export(&path, &PortfolioReport::new(ReturnMethod::Historic, &solution)).unwrap();

    assert_eq!(
      fs::read_to_string(&path).unwrap(),
      "AAA: 200.00\nBBB: 300.00\n"
    );
  }
}
