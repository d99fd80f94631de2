//! # Quadratic Programming
//!
//! $$
//! \min_x\ \tfrac12 x^\top P x + q^\top x \quad \text{s.t.}\quad A_{eq} x = b_{eq},\ \ A_{in} x \le b_{in}
//! $$
//!
//! Dense convex QP handed to the Clarabel interior-point solver.

use clarabel::algebra::CscMatrix;
use clarabel::solver::DefaultSettings;
use clarabel::solver::DefaultSolver;
use clarabel::solver::IPSolver;
use clarabel::solver::SolverStatus;
use clarabel::solver::SupportedConeT;
use nalgebra::DMatrix;
use nalgebra::DVector;
use tracing::warn;

use crate::error::PortfolioError;
use crate::error::Result;

/// A convex QP with equality rows and one-sided inequality rows.
#[derive(Clone, Debug)]
pub struct QuadraticProgram {
  /// Symmetric PSD cost matrix, `n × n`.
  pub p: DMatrix<f64>,
  /// Linear cost, length `n`.
  pub q: DVector<f64>,
  /// Equality rows, `m_eq × n`.
  pub a_eq: DMatrix<f64>,
  pub b_eq: DVector<f64>,
  /// Inequality rows `A_in x ≤ b_in`, `m_in × n`.
  pub a_in: DMatrix<f64>,
  pub b_in: DVector<f64>,
}

impl QuadraticProgram {
  pub fn new(
    p: DMatrix<f64>,
    q: DVector<f64>,
    (a_eq, b_eq): (DMatrix<f64>, DVector<f64>),
    (a_in, b_in): (DMatrix<f64>, DVector<f64>),
  ) -> Result<Self> {
    let n = q.len();
    if p.shape() != (n, n)
      || a_eq.shape() != (b_eq.len(), n)
      || a_in.shape() != (b_in.len(), n)
    {
      return Err(PortfolioError::InvalidInput(format!(
        "inconsistent QP dimensions: P {:?}, q {n}, A_eq {:?}, b_eq {}, A_in {:?}, b_in {}",
        p.shape(),
        a_eq.shape(),
        b_eq.len(),
        a_in.shape(),
        b_in.len()
      )));
    }
    let mut data = p
      .iter()
      .chain(q.iter())
      .chain(a_eq.iter())
      .chain(b_eq.iter())
      .chain(a_in.iter())
      .chain(b_in.iter());
    if data.any(|v| !v.is_finite()) {
      return Err(PortfolioError::InvalidInput(
        "QP data contains non-finite values".into(),
      ));
    }

    Ok(Self {
      p,
      q,
      a_eq,
      b_eq,
      a_in,
      b_in,
    })
  }

  pub fn n_vars(&self) -> usize {
    self.q.len()
  }

  /// `½ xᵀPx + qᵀx`.
  pub fn objective(&self, x: &DVector<f64>) -> f64 {
    0.5 * x.dot(&(&self.p * x)) + self.q.dot(x)
  }
}

/// Termination status of a QP solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QpStatus {
  Solved,
  PrimalInfeasible,
  MaxIterations,
  NumericalError,
}

impl From<SolverStatus> for QpStatus {
  fn from(status: SolverStatus) -> Self {
    match status {
      SolverStatus::Solved => QpStatus::Solved,
      SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
        QpStatus::PrimalInfeasible
      }
      SolverStatus::MaxIterations | SolverStatus::MaxTime => QpStatus::MaxIterations,
      _ => QpStatus::NumericalError,
    }
  }
}

#[derive(Clone, Debug)]
pub struct QpSolution {
  pub status: QpStatus,
  /// Primal solution; only meaningful when `status` is `Solved`.
  pub x: DVector<f64>,
  pub iterations: u32,
}

impl QpSolution {
  fn failed(status: QpStatus, n: usize) -> Self {
    Self {
      status,
      x: DVector::zeros(n),
      iterations: 0,
    }
  }
}

/// Black-box convex QP solver.
pub trait QpSolver: Send + Sync {
  fn solve(&self, qp: &QuadraticProgram) -> QpSolution;
}

/// [`QpSolver`] backed by Clarabel.
///
/// Equality rows go to a zero cone and inequality rows to a nonnegative cone
/// on the slack `b_in − A_in x`.
#[derive(Clone, Debug)]
pub struct ClarabelSolver {
  settings: DefaultSettings<f64>,
}

impl Default for ClarabelSolver {
  fn default() -> Self {
    Self::new(DefaultSettings {
      verbose: false,
      ..DefaultSettings::default()
    })
  }
}

impl ClarabelSolver {
  pub fn new(settings: DefaultSettings<f64>) -> Self {
    Self { settings }
  }

  pub fn settings(&self) -> &DefaultSettings<f64> {
    &self.settings
  }
}

impl QpSolver for ClarabelSolver {
  fn solve(&self, qp: &QuadraticProgram) -> QpSolution {
    let n = qp.n_vars();
    let m_eq = qp.b_eq.len();
    let m_in = qp.b_in.len();

    let p = upper_triangle_csc(&qp.p);
    let mut a = DMatrix::zeros(m_eq + m_in, n);
    a.view_mut((0, 0), (m_eq, n)).copy_from(&qp.a_eq);
    a.view_mut((m_eq, 0), (m_in, n)).copy_from(&qp.a_in);
    let a = dense_csc(&a);
    let b = qp.b_eq.iter().chain(qp.b_in.iter()).copied().collect::<Vec<_>>();

    let mut cones = Vec::with_capacity(2);
    if m_eq > 0 {
      cones.push(SupportedConeT::ZeroConeT(m_eq));
    }
    if m_in > 0 {
      cones.push(SupportedConeT::NonnegativeConeT(m_in));
    }

    let mut solver = match DefaultSolver::new(
      &p,
      qp.q.as_slice(),
      &a,
      &b,
      &cones,
      self.settings.clone(),
    ) {
      Ok(solver) => solver,
      Err(err) => {
        warn!(error = ?err, "failed to set up QP");
        return QpSolution::failed(QpStatus::NumericalError, n);
      }
    };
    solver.solve();

    let solution = &solver.solution;
    QpSolution {
      status: solution.status.into(),
      x: DVector::from_column_slice(&solution.x),
      iterations: solution.iterations,
    }
  }
}

/// Column-compressed copy of the upper triangle of a symmetric matrix.
fn upper_triangle_csc(m: &DMatrix<f64>) -> CscMatrix<f64> {
  compress(m, |i, j| i <= j)
}

fn dense_csc(m: &DMatrix<f64>) -> CscMatrix<f64> {
  compress(m, |_, _| true)
}

fn compress(m: &DMatrix<f64>, keep: impl Fn(usize, usize) -> bool) -> CscMatrix<f64> {
  let (rows, cols) = m.shape();
  let mut colptr = Vec::with_capacity(cols + 1);
  let mut rowval = Vec::new();
  let mut nzval = Vec::new();

  colptr.push(0);
  for j in 0..cols {
    for i in 0..rows {
      let v = m[(i, j)];
      if v != 0.0 && keep(i, j) {
        rowval.push(i);
        nzval.push(v);
      }
    }
    colptr.push(nzval.len());
  }

  CscMatrix::new(rows, cols, colptr, rowval, nzval)
}
