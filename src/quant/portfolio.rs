//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Mean-variance optimization: return and risk estimation, investor views,
//! and the efficient-frontier sweep that picks the best return-to-risk point.

pub mod data;
pub mod engine;
pub mod frontier;
pub mod qp;
pub mod report;
pub mod returns;
pub mod risk;
pub mod types;
pub mod views;

pub use data::PriceTable;
pub use data::ReturnSeries;
pub use engine::MarketInputs;
pub use engine::PortfolioEngine;
pub use engine::PortfolioEngineConfig;
pub use engine::PortfolioRun;
pub use frontier::FrontierConfig;
pub use frontier::FrontierOptimizer;
pub use frontier::Penalty;
pub use frontier::SweepVariant;
pub use frontier::TargetConstraint;
pub use qp::ClarabelSolver;
pub use qp::QpSolution;
pub use qp::QpSolver;
pub use qp::QpStatus;
pub use qp::QuadraticProgram;
pub use report::PortfolioReport;
pub use returns::ExpectedReturns;
pub use returns::MarketWeights;
pub use returns::ReturnInputs;
pub use returns::ReturnMethod;
pub use returns::estimate_returns;
pub use risk::RiskMatrix;
pub use risk::RiskMethod;
pub use risk::estimate_risk;
pub use types::Allocation;
pub use types::Diagnostic;
pub use types::Diagnostics;
pub use types::FrontierPoint;
pub use types::FrontierSolution;
pub use types::Portfolio;
pub use views::ParsedViews;
pub use views::View;
pub use views::ViewParser;
pub use views::ViewPolicy;
