//! # frontier-rs
//!
//! $$
//! \min_{\mathbf{w}}\ \mathbf{w}^\top \Sigma \mathbf{w} + \lambda\,\mathcal{P}(\mathbf{w})
//! \quad\text{s.t.}\quad \mu^\top \mathbf{w} \ge r,\ \ \mathbf{1}^\top \mathbf{w} = 1
//! $$
//!
//! Mean-variance portfolio optimization. Expected returns come from historic
//! means, CAPM or a Black-Litterman posterior; the efficient frontier is traced
//! by sweeping target returns and the best return-to-risk point is selected.
//! A small option valuation utility (binomial tree and Black-Scholes) lives
//! in [`quant::pricing`].

pub mod config;
pub mod error;
pub mod io;
pub mod quant;
pub mod visualization;

pub use error::PortfolioError;
pub use error::Result;
