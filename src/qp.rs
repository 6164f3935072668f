//! # Quadratic Programming
//!
//! $$
//! \min_{x} \ \tfrac{1}{2}x^\top Q x + c^\top x
//! \quad \text{s.t.} \quad A_{eq}x = b_{eq}, \ A_{ineq}x \le b_{ineq}
//! $$
//!
//! Solver-agnostic QP contract. The frontier engine only depends on
//! [`QpSolverExt`], so any backend (or a mock in tests) can be injected.

pub mod clarabel;

use ndarray::Array1;
use ndarray::Array2;

use crate::error::QpError;

/// One dense quadratic program with linear equality and inequality
/// constraints (`A_ineq x <= b_ineq`).
#[derive(Clone, Debug)]
pub struct QpProblem {
  /// Symmetric PSD quadratic form.
  pub q: Array2<f64>,
  /// Linear cost. Zero for variance minimization.
  pub c: Array1<f64>,
  pub a_eq: Array2<f64>,
  pub b_eq: Array1<f64>,
  pub a_ineq: Array2<f64>,
  pub b_ineq: Array1<f64>,
}

impl QpProblem {
  /// Number of decision variables.
  pub fn n(&self) -> usize {
    self.q.nrows()
  }
}

/// Minimizer and objective value of a solved QP.
#[derive(Clone, Debug)]
pub struct QpSolution {
  pub x: Array1<f64>,
  pub objective: f64,
}

/// Contract for an external quadratic-programming capability.
///
/// Implementations must report infeasibility and numerical breakdown through
/// [`QpError`] instead of panicking; both are routine outcomes of a frontier
/// sweep.
pub trait QpSolverExt {
  fn solve(&self, problem: &QpProblem) -> Result<QpSolution, QpError>;
}
