//! # Investor Views
//!
//! $$
//! P\,\mu = Q
//! $$
//!
//! Parses absolute and relative view statements into the pick matrix `P` and
//! the view vector `Q` used by Black-Litterman.
//!
//! ```text
//! AAA 0.10 up
//! AAA 0.05 over BBB ; 0.5
//! ```

use std::fmt::Display;
use std::str::FromStr;

use nalgebra::DMatrix;
use nalgebra::DVector;
use tracing::debug;

use super::types::Diagnostic;
use super::types::Diagnostics;
use crate::error::PortfolioError;
use crate::error::Result;

/// How invalid view lines are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewPolicy {
  /// Skip the line and record a diagnostic.
  #[default]
  Lenient,
  /// Abort the whole parse on the first invalid line.
  Strict,
}

impl FromStr for ViewPolicy {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "lenient" => Ok(Self::Lenient),
      "strict" => Ok(Self::Strict),
      other => Err(format!("unknown view policy {other:?}")),
    }
  }
}

/// A single investor view.
#[derive(Clone, Debug, PartialEq)]
pub enum View {
  /// `asset` returns `magnitude`, signed by direction.
  Absolute {
    asset: usize,
    magnitude: f64,
    up: bool,
    confidence: Option<f64>,
  },
  /// `outperformer` beats `underperformer` by `magnitude`.
  Relative {
    outperformer: usize,
    underperformer: usize,
    magnitude: f64,
    confidence: Option<f64>,
  },
}

impl View {
  pub fn magnitude(&self) -> f64 {
    match self {
      View::Absolute { magnitude, .. } | View::Relative { magnitude, .. } => *magnitude,
    }
  }

  /// Pick-matrix row of this view over `n_assets` assets.
  pub fn pick_row(&self, n_assets: usize) -> DVector<f64> {
    let mut row = DVector::zeros(n_assets);
    match *self {
      View::Absolute {
        asset,
        up,
        confidence,
        ..
      } => {
        let c = confidence.unwrap_or(1.0);
        row[asset] = if up { c } else { -c };
      }
      View::Relative {
        outperformer,
        underperformer,
        confidence,
        ..
      } => {
        let c = confidence.unwrap_or(1.0);
        row[outperformer] = c;
        row[underperformer] = -c;
      }
    }
    row
  }
}

/// Views accepted by [`ViewParser::parse`] and their matrix form.
#[derive(Clone, Debug)]
pub struct ParsedViews {
  /// View magnitudes, length `k`.
  pub q: DVector<f64>,
  /// Pick matrix, `k × N`.
  pub p: DMatrix<f64>,
  pub views: Vec<View>,
  /// One entry per rejected line.
  pub diagnostics: Diagnostics,
}

impl ParsedViews {
  /// No views over `n_assets` assets.
  pub fn empty(n_assets: usize) -> Self {
    Self {
      q: DVector::zeros(0),
      p: DMatrix::zeros(0, n_assets),
      views: Vec::new(),
      diagnostics: Diagnostics::default(),
    }
  }

  pub fn len(&self) -> usize {
    self.views.len()
  }

  pub fn is_empty(&self) -> bool {
    self.views.is_empty()
  }
}

/// Line-oriented view parser bound to an asset universe.
#[derive(Clone, Debug)]
pub struct ViewParser<'a> {
  assets: &'a [String],
  policy: ViewPolicy,
  require_confidence: bool,
}

impl<'a> ViewParser<'a> {
  pub fn new(assets: &'a [String]) -> Self {
    Self {
      assets,
      policy: ViewPolicy::default(),
      require_confidence: false,
    }
  }

  pub fn with_policy(mut self, policy: ViewPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Reject views without a `; <confidence>` tag. Any invalid line is then fatal.
  pub fn require_confidence(mut self, required: bool) -> Self {
    self.require_confidence = required;
    self
  }

  fn is_strict(&self) -> bool {
    self.require_confidence || self.policy == ViewPolicy::Strict
  }

  /// Parse every line. Blank lines and `#` comments are ignored.
  pub fn parse<I, S>(&self, lines: I) -> Result<ParsedViews>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut views = Vec::new();
    let mut diagnostics = Diagnostics::default();

    for (idx, raw) in lines.into_iter().enumerate() {
      let text = raw.as_ref().trim();
      if text.is_empty() || text.starts_with('#') {
        continue;
      }

      match self.parse_line(text) {
        Ok(view) => {
          debug!(line = idx + 1, view = text, "accepted view");
          views.push(view);
        }
        Err(reason) if self.is_strict() => {
          return Err(PortfolioError::InvalidView {
            line: idx + 1,
            text: text.to_string(),
            reason,
          });
        }
        Err(reason) => diagnostics.record(Diagnostic::SkippedView {
          line: idx + 1,
          text: text.to_string(),
          reason,
        }),
      }
    }

    let n = self.assets.len();
    let q = DVector::from_iterator(views.len(), views.iter().map(View::magnitude));
    let mut p = DMatrix::zeros(views.len(), n);
    for (k, view) in views.iter().enumerate() {
      p.set_row(k, &view.pick_row(n).transpose());
    }

    Ok(ParsedViews {
      q,
      p,
      views,
      diagnostics,
    })
  }

  fn parse_line(&self, text: &str) -> std::result::Result<View, String> {
    let (body, confidence) = match text.split_once(';') {
      Some((body, tag)) => (body, Some(parse_number(tag.trim(), "confidence")?)),
      None => (text, None),
    };

    match confidence {
      Some(c) if c <= 0.0 => return Err(format!("confidence must be positive, got {c}")),
      None if self.require_confidence => return Err("missing confidence tag".into()),
      _ => {}
    }

    let toks = body.split_whitespace().collect::<Vec<_>>();
    if toks.len() < 3 {
      return Err(format!("expected at least 3 tokens, got {}", toks.len()));
    }

    let first = self.asset_index(toks[0])?;
    let magnitude = parse_number(toks[1], "magnitude")?;

    match toks[2] {
      dir @ ("up" | "down") => {
        expect_tokens(&toks, 3)?;
        Ok(View::Absolute {
          asset: first,
          magnitude,
          up: dir == "up",
          confidence,
        })
      }
      dir @ ("over" | "under") => {
        expect_tokens(&toks, 4)?;
        let second = self.asset_index(toks[3])?;
        if first == second {
          return Err(format!("relative view compares {} with itself", toks[0]));
        }
        let (outperformer, underperformer) = if dir == "over" {
          (first, second)
        } else {
          (second, first)
        };
        Ok(View::Relative {
          outperformer,
          underperformer,
          magnitude,
          confidence,
        })
      }
      other => Err(format!(
        "unknown direction {other:?}, expected up, down, over or under"
      )),
    }
  }

  fn asset_index(&self, token: &str) -> std::result::Result<usize, String> {
    self
      .assets
      .iter()
      .position(|a| a == token)
      .ok_or_else(|| format!("unknown asset {token}"))
  }
}

fn parse_number(token: &str, what: impl Display) -> std::result::Result<f64, String> {
  match token.parse::<f64>() {
    Ok(v) if v.is_finite() => Ok(v),
    _ => Err(format!("{what} {token:?} is not a finite number")),
  }
}

fn expect_tokens(toks: &[&str], n: usize) -> std::result::Result<(), String> {
  if toks.len() == n {
    Ok(())
  } else {
    Err(format!(
      "{} view takes {n} tokens, got {}",
      toks[2],
      toks.len()
    ))
  }
}
