use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::ValueEnum;
use frontier_rs::config::RunConfig;
use frontier_rs::io;
use frontier_rs::quant::portfolio::MarketInputs;
use frontier_rs::quant::portfolio::PortfolioEngine;
use frontier_rs::quant::portfolio::PortfolioReport;
use frontier_rs::quant::pricing::OptionContract;
use frontier_rs::quant::pricing::OptionPricer;
use frontier_rs::quant::pricing::value_grid;
use frontier_rs::visualization::FrontierPlotter;
use frontier_rs::visualization::option_grid_plot;
use frontier_rs::visualization::save_html;
use prettytable::Table;
use prettytable::format;
use prettytable::row;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Task {
  PortfolioOptimization,
  OptionsPricing,
}

/// Mean-variance portfolio optimization and vanilla option valuation
#[derive(Parser, Debug)]
#[command(name = "frontier")]
#[command(version, about, long_about = None)]
struct Args {
  /// Run configuration (TOML)
  #[arg(short, long, value_name = "FILE")]
  config: PathBuf,

  /// Task to run
  #[arg(short, long, value_enum, default_value_t = Task::PortfolioOptimization)]
  task: Task,

  /// Skip writing HTML charts
  #[arg(long)]
  no_plot: bool,

  /// Solve sweep points on the current thread
  #[arg(long)]
  sequential: bool,

  /// Log filter used when RUST_LOG is unset
  #[arg(long, default_value = "info")]
  log_level: String,
}

fn init_tracing(log_level: &str) {
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
    .with(tracing_subscriber::fmt::layer())
    .init();
}

fn main() -> Result<()> {
  let args = Args::parse();
  init_tracing(&args.log_level);

  let config = RunConfig::load(&args.config)?;
  info!(config = %args.config.display(), task = ?args.task, "starting");

  match args.task {
    Task::PortfolioOptimization => optimize_portfolio(&config, &args),
    Task::OptionsPricing => price_options(&config, &args),
  }
}

fn optimize_portfolio(config: &RunConfig, args: &Args) -> Result<()> {
  let (mut engine_config, mut diagnostics) = config.engine_config()?;
  if args.sequential {
    engine_config.frontier.parallel = false;
  }

  let prices_path = config
    .data
    .prices
    .as_ref()
    .context("data.prices is required for portfolio optimization")?;
  let prices = io::load_prices(prices_path)?;

  let mut inputs = MarketInputs::default();
  if let Some(path) = config.data.views.as_ref() {
    inputs.view_lines = io::load_views(path)?;
  }
  if let Some(path) = config.data.market_caps.as_ref() {
    inputs.market_caps = Some(io::load_market_caps(path)?);
  }

  let run = PortfolioEngine::new(engine_config)
    .run(&prices, &inputs)
    .context("portfolio optimization failed")?;
  diagnostics.extend(run.diagnostics.clone());

  let report = PortfolioReport::from_run(&run);
  println!("{report}");
  info!(
    feasible = run.solution.feasible_points(),
    attempted = run.solution.attempted_points,
    diagnostics = diagnostics.len(),
    "optimization finished"
  );

  if let Some(path) = config.output.export_file.as_ref() {
    io::write_export(path, &report)?;
  }
  if !args.no_plot {
    if let Some(path) = config.output.plot_file.as_ref() {
      let plot = FrontierPlotter::new().title(&report.title()).plot(&run.solution);
      save_html(&plot, path)?;
    }
  }
  Ok(())
}

fn price_options(config: &RunConfig, args: &Args) -> Result<()> {
  let options = &config.options;
  let pricer = options.pricer();
  let template = options.template();

  let mut table = Table::new();
  table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
  table.set_titles(row!["Volatility", r->"ATM Call", r->"ATM Put"]);
  for sigma in options.vols() {
    let at_the_money = OptionContract { sigma, ..template };
    let (call, put) = pricer.calculate_call_put(&at_the_money)?;
    table.add_row(row![
      format!("{sigma:.4}"),
      r->format!("{call:.4}"),
      r->format!("{put:.4}")
    ]);
  }
  println!(" -=-=-=- {} ({:?}) -=-=-=- ", pricer.title(), options.style);
  println!(
    "Strike: {:.2}; Maturity: {:.4}; Rate: {:.4}",
    options.strike, options.tau, options.rate
  );
  table.printstd();

  if !args.no_plot {
    if let Some(path) = config.output.grid_plot_file.as_ref() {
      let grid = value_grid(&*pricer, &options.spots(), &options.vols(), &template)?;
      save_html(&option_grid_plot(&grid, pricer.title()), path)?;
    }
  }
  Ok(())
}
