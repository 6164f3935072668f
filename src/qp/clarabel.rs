//! # Clarabel Backend
//!
//! $$
//! Ax + s = b, \quad s \in \mathcal{K} = \{0\}^{m_{eq}} \times \mathbb{R}^{m_{ineq}}_{+}
//! $$
//!
//! [`QpSolverExt`] implementation backed by the Clarabel interior-point
//! solver. Equalities map to the zero cone, inequalities to the nonnegative
//! cone.

use clarabel::algebra::CscMatrix;
use clarabel::solver::DefaultSettingsBuilder;
use clarabel::solver::DefaultSolver;
use clarabel::solver::IPSolver;
use clarabel::solver::NonnegativeConeT;
use clarabel::solver::SolverStatus;
use clarabel::solver::SupportedConeT;
use clarabel::solver::ZeroConeT;
use ndarray::Array1;
use ndarray::Array2;

use crate::error::QpError;
use crate::qp::QpProblem;
use crate::qp::QpSolution;
use crate::qp::QpSolverExt;

const CSC_DROP_TOLERANCE: f64 = 1e-12;

/// Clarabel-backed QP solver.
#[derive(Clone, Copy, Debug)]
pub struct ClarabelQpSolver {
  /// Interior-point iteration cap per solve.
  pub max_iter: u32,
}

impl Default for ClarabelQpSolver {
  fn default() -> Self {
    Self { max_iter: 200 }
  }
}

fn dense_to_csc(m: &Array2<f64>) -> CscMatrix {
  let (rows, cols) = m.dim();
  let mut colptr = Vec::with_capacity(cols + 1);
  let mut rowval = Vec::new();
  let mut nzval = Vec::new();

  colptr.push(0);
  for j in 0..cols {
    for i in 0..rows {
      let v = m[[i, j]];
      if v.abs() > CSC_DROP_TOLERANCE {
        rowval.push(i);
        nzval.push(v);
      }
    }
    colptr.push(rowval.len());
  }

  CscMatrix::new(rows, cols, colptr, rowval, nzval)
}

impl QpSolverExt for ClarabelQpSolver {
  fn solve(&self, problem: &QpProblem) -> Result<QpSolution, QpError> {
    let n = problem.n();
    let m_eq = problem.a_eq.nrows();
    let m_ineq = problem.a_ineq.nrows();

    let p = dense_to_csc(&problem.q);
    let q: Vec<f64> = problem.c.to_vec();

    let mut a_dense = Array2::<f64>::zeros((m_eq + m_ineq, n));
    if m_eq > 0 {
      a_dense
        .slice_mut(ndarray::s![..m_eq, ..])
        .assign(&problem.a_eq);
    }
    if m_ineq > 0 {
      a_dense
        .slice_mut(ndarray::s![m_eq.., ..])
        .assign(&problem.a_ineq);
    }
    let a = dense_to_csc(&a_dense);

    let mut b = problem.b_eq.to_vec();
    b.extend(problem.b_ineq.iter().copied());

    let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
    if m_eq > 0 {
      cones.push(ZeroConeT(m_eq));
    }
    if m_ineq > 0 {
      cones.push(NonnegativeConeT(m_ineq));
    }

    let settings = DefaultSettingsBuilder::default()
      .max_iter(self.max_iter)
      .verbose(false)
      .build()
      .map_err(|e| QpError::NumericalFailure(format!("settings: {e}")))?;

    let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings)
      .map_err(|e| QpError::NumericalFailure(format!("setup: {e:?}")))?;
    solver.solve();

    match solver.solution.status {
      SolverStatus::Solved | SolverStatus::AlmostSolved => Ok(QpSolution {
        x: Array1::from_vec(solver.solution.x.clone()),
        objective: solver.solution.obj_val,
      }),
      SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
        Err(QpError::Infeasible)
      }
      SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => Err(
        QpError::NumericalFailure("dual infeasible (objective unbounded below)".to_string()),
      ),
      status => Err(QpError::NumericalFailure(format!(
        "solver stopped with status {status:?}"
      ))),
    }
  }
}
