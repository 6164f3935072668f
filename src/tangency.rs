//! # Tangency
//!
//! $$
//! \mathbf{w}^\* = \arg\max_{\mathbf{w}} \frac{\mu^\top\mathbf{w} - r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Maximum-Sharpe selection on a solved frontier. Two strategies: a scan
//! over frontier points and a direct solve (closed form with shorting, an
//! auxiliary QP under the no-short constraint). Both agree within tolerance
//! wherever both apply.

use nalgebra::DMatrix;
use nalgebra::DVector;
use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;

use crate::error::FrontierError;
use crate::frontier::Frontier;
use crate::frontier::FrontierPoint;
use crate::frontier::RISK_FLOOR;
use crate::moments::MomentEstimate;
use crate::qp::QpProblem;
use crate::qp::QpSolverExt;

/// How the maximum-Sharpe point is located.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TangencyStrategy {
  /// Solve for the tangency weights directly; falls back to the scan when
  /// the direct form does not apply.
  Direct,
  /// Rank every feasible frontier point by Sharpe ratio.
  #[default]
  Scan,
}

/// The maximum-Sharpe frontier point and its Sharpe ratio.
#[derive(Clone, Debug)]
pub struct TangencyPortfolio {
  pub point: FrontierPoint,
  pub sharpe: f64,
}

/// Locates the tangency portfolio for one frontier.
pub struct TangencySelector<'a, S: QpSolverExt> {
  solver: &'a S,
}

impl<'a, S: QpSolverExt> TangencySelector<'a, S> {
  #[must_use]
  pub fn new(solver: &'a S) -> Self {
    Self { solver }
  }

  /// Pick the maximum-Sharpe point using the requested strategy.
  pub fn select(
    &self,
    frontier: &Frontier,
    moments: &MomentEstimate,
    risk_free: f64,
    no_short: bool,
    strategy: TangencyStrategy,
  ) -> Result<TangencyPortfolio, FrontierError> {
    match strategy {
      TangencyStrategy::Scan => self.scan(frontier, risk_free),
      TangencyStrategy::Direct => match self.direct(moments, risk_free, no_short) {
        Some(tangency) => Ok(tangency),
        None => {
          debug!(no_short, "direct tangency unavailable, scanning the frontier");
          self.scan(frontier, risk_free)
        }
      },
    }
  }

  /// Maximize Sharpe over every feasible frontier point.
  ///
  /// When every Sharpe ratio is negative the least-negative point is
  /// returned; the ratio stays well-defined and comparable there. Points at
  /// or below the risk floor have no finite Sharpe ratio and are excluded,
  /// so a frontier made up only of degenerate zero-risk points is
  /// [`FrontierError::NoFeasibleTangency`], same as an empty one.
  pub fn scan(
    &self,
    frontier: &Frontier,
    risk_free: f64,
  ) -> Result<TangencyPortfolio, FrontierError> {
    frontier
      .points
      .iter()
      .filter(|p| p.feasible && p.risk > RISK_FLOOR)
      .map(|p| (p, (p.target_return - risk_free) / p.risk))
      .max_by(|a, b| a.1.total_cmp(&b.1))
      .map(|(point, sharpe)| TangencyPortfolio {
        point: point.clone(),
        sharpe,
      })
      .ok_or(FrontierError::NoFeasibleTangency)
  }

  /// Direct tangency weights, or `None` when the direct form does not apply
  /// (singular covariance, or no asset beats the risk-free rate).
  fn direct(
    &self,
    moments: &MomentEstimate,
    risk_free: f64,
    no_short: bool,
  ) -> Option<TangencyPortfolio> {
    let excess = moments.mean.mapv(|m| m - risk_free);
    let weights = if no_short {
      self.direct_long_only(moments, &excess)?
    } else {
      self.direct_unconstrained(moments, &excess)?
    };

    let expected = moments.mean.dot(&weights);
    let variance = weights.dot(&moments.covariance.dot(&weights)).max(0.0);
    let risk = variance.sqrt();
    if risk <= RISK_FLOOR {
      return None;
    }
    let sharpe = (expected - risk_free) / risk;

    Some(TangencyPortfolio {
      point: FrontierPoint {
        target_return: expected,
        weights,
        risk,
        feasible: true,
        efficient: true,
      },
      sharpe,
    })
  }

  /// Closed form `w ∝ Σ⁻¹(μ − r_f 1)` normalized to the budget.
  fn direct_unconstrained(
    &self,
    moments: &MomentEstimate,
    excess: &Array1<f64>,
  ) -> Option<Array1<f64>> {
    let n = excess.len();
    let sigma = DMatrix::from_fn(n, n, |i, j| {
      0.5 * (moments.covariance[[i, j]] + moments.covariance[[j, i]])
    });
    let rhs = DVector::from_fn(n, |i, _| excess[i]);

    let x = sigma
      .clone()
      .cholesky()
      .map(|c| c.solve(&rhs))
      .or_else(|| sigma.lu().solve(&rhs))?;
    let total: f64 = x.iter().sum();
    if total <= RISK_FLOOR {
      // Aggregate excess return is non-positive; the normalized direction
      // would land on the inefficient branch.
      return None;
    }

    Some(Array1::from_iter(x.iter().map(|v| v / total)))
  }

  /// Auxiliary QP `min w'Σw s.t. (μ − r_f)'w = 1, w ≥ 0`, normalized back to
  /// the budget.
  fn direct_long_only(
    &self,
    moments: &MomentEstimate,
    excess: &Array1<f64>,
  ) -> Option<Array1<f64>> {
    if !excess.iter().any(|&e| e > 0.0) {
      return None;
    }

    let n = excess.len();
    let mut a_eq = Array2::<f64>::zeros((1, n));
    a_eq.row_mut(0).assign(excess);

    let problem = QpProblem {
      q: 0.5 * (&moments.covariance + &moments.covariance.t()),
      c: Array1::zeros(n),
      a_eq,
      b_eq: Array1::from_elem(1, 1.0),
      a_ineq: Array2::<f64>::eye(n) * -1.0,
      b_ineq: Array1::zeros(n),
    };

    let solution = self.solver.solve(&problem).ok()?;
    let total: f64 = solution.x.sum();
    if total <= RISK_FLOOR {
      return None;
    }

    Some(solution.x / total)
  }
}
