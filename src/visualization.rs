//! # Visualization
//!
//! $$
//! \{(\sigma_k^2, r_k)\}_{k=1}^K \mapsto \text{frontier chart},\qquad
//! C, P \in \mathbb R^{n_\sigma \times n_S} \mapsto \text{heatmaps}
//! $$
//!
//! Plotly charts of the efficient frontier and of option value grids.
use std::fs;
use std::path::Path;

use anyhow::Context;
use ndarray::Array2;
use plotly::HeatMap;
use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;
use plotly::color::NamedColor;
use plotly::common::Anchor;
use plotly::common::ColorBar;
use plotly::common::Font;
use plotly::common::Line;
use plotly::common::Marker;
use plotly::common::MarkerSymbol;
use plotly::common::Mode;
use plotly::common::Title;
use plotly::layout::Annotation;
use plotly::layout::Axis;
use plotly::layout::GridPattern;
use plotly::layout::LayoutGrid;
use plotly::layout::Margin;
use tracing::info;

use crate::quant::portfolio::FrontierSolution;
use crate::quant::pricing::OptionGrid;

pub struct FrontierPlotter {
  title: String,
  line_width: f64,
  height: usize,
}

impl Default for FrontierPlotter {
  fn default() -> Self {
    Self::new()
  }
}

impl FrontierPlotter {
  pub fn new() -> Self {
    Self {
      title: "Efficient Frontier".into(),
      line_width: 2.0,
      height: 600,
    }
  }

  pub fn title(mut self, title: &str) -> Self {
    self.title = title.into();
    self
  }

  pub fn line_width(mut self, w: f64) -> Self {
    self.line_width = w;
    self
  }

  pub fn height(mut self, h: usize) -> Self {
    self.height = h;
    self
  }

  /// Feasible sweep points as a line, the selected point as a marker.
  pub fn plot(&self, solution: &FrontierSolution) -> Plot {
    let (risk, ret): (Vec<f64>, Vec<f64>) = solution.curve.iter().copied().unzip();

    let mut plot = Plot::new();
    plot.set_layout(
      Layout::new()
        .title(Title::from(self.title.as_str()))
        .auto_size(true)
        .height(self.height)
        .margin(Margin::new().left(64).right(24).top(72).bottom(56))
        .x_axis(Axis::new().title(Title::from("Risk (variance)")))
        .y_axis(Axis::new().title(Title::from("Expected return"))),
    );

    plot.add_trace(
      Scatter::new(risk, ret)
        .mode(Mode::Lines)
        .line(Line::new().width(self.line_width))
        .name("frontier")
        .hover_template("risk: %{x:.6f}<br>return: %{y:.6f}<extra></extra>"),
    );
    plot.add_trace(
      Scatter::new(vec![solution.risk], vec![solution.target_return])
        .mode(Mode::Markers)
        .marker(
          Marker::new()
            .size(14)
            .symbol(MarkerSymbol::Star)
            .color(NamedColor::Crimson),
        )
        .name(format!("max ratio {:.4}", solution.max_sharpe).as_str())
        .hover_template("risk: %{x:.6f}<br>return: %{y:.6f}<extra></extra>"),
    );

    plot
  }
}

/// Call and put heatmaps side by side; x is spot, y is volatility.
pub fn option_grid_plot(grid: &OptionGrid, title: &str) -> Plot {
  let spots = grid.spots.to_vec();
  let vols = grid.vols.to_vec();
  let rows = |values: &Array2<f64>| {
    values
      .rows()
      .into_iter()
      .map(|r| r.to_vec())
      .collect::<Vec<_>>()
  };

  let annotations = [("Call", "x"), ("Put", "x2")]
    .into_iter()
    .map(|(name, xa)| {
      let ya = xa.replace('x', "y");
      Annotation::new()
        .text(format!("<b>{name}</b>"))
        .x_ref(format!("{xa} domain"))
        .y_ref(format!("{ya} domain"))
        .x(0.5)
        .y(1.06)
        .x_anchor(Anchor::Center)
        .y_anchor(Anchor::Bottom)
        .font(Font::new().size(13))
        .show_arrow(false)
    })
    .collect::<Vec<_>>();

  let mut plot = Plot::new();
  plot.set_layout(
    Layout::new()
      .title(Title::from(title))
      .auto_size(true)
      .height(560)
      .margin(Margin::new().left(64).right(24).top(96).bottom(56))
      .annotations(annotations)
      .grid(
        LayoutGrid::new()
          .rows(1)
          .columns(2)
          .x_gap(0.18)
          .pattern(GridPattern::Independent),
      )
      .x_axis(Axis::new().title(Title::from("Spot")))
      .y_axis(Axis::new().title(Title::from("Volatility")))
      .x_axis2(Axis::new().title(Title::from("Spot")))
      .y_axis2(Axis::new().title(Title::from("Volatility"))),
  );

  plot.add_trace(
    HeatMap::new(spots.clone(), vols.clone(), rows(&grid.calls))
      .name("call")
      .color_bar(ColorBar::new().x(0.42))
      .x_axis("x")
      .y_axis("y"),
  );
  plot.add_trace(
    HeatMap::new(spots, vols, rows(&grid.puts))
      .name("put")
      .color_bar(ColorBar::new().x(1.0))
      .x_axis("x2")
      .y_axis("y2"),
  );

  plot
}

/// Write a standalone HTML page, creating parent directories as needed.
pub fn save_html(plot: &Plot, path: impl AsRef<Path>) -> anyhow::Result<()> {
  let path = path.as_ref();
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)
      .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
  }
  fs::write(path, plot.to_html())
    .with_context(|| format!("Failed to write plot: {}", path.display()))?;
  info!(path = %path.display(), "wrote plot");
  Ok(())
}
