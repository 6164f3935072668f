//! # Frontier
//!
//! $$
//! \min_{\mathbf{w}} \ \tfrac{1}{2}\mathbf{w}^\top \Sigma \mathbf{w}
//! \quad \text{s.t.} \quad \mathbf{1}^\top\mathbf{w} = 1, \ \mu^\top\mathbf{w} = r, \ \mathbf{w} \ge 0
//! $$
//!
//! Single-point frontier solves and the target-return sweep that assembles a
//! full efficient frontier for one set of window moments.

use ndarray::Array1;
use ndarray::Array2;
use ndarray_stats::QuantileExt;
use rayon::prelude::*;
use tracing::debug;
use tracing::warn;

use crate::error::FrontierError;
use crate::error::QpError;
use crate::moments::MomentEstimate;
use crate::qp::QpProblem;
use crate::qp::QpSolverExt;

/// Risk below this floor is treated as degenerate for ratio purposes.
pub(crate) const RISK_FLOOR: f64 = 1e-12;

/// One solved portfolio on the risk/return plane.
#[derive(Clone, Debug)]
pub struct FrontierPoint {
  /// Expected portfolio return this point was solved for.
  pub target_return: f64,
  pub weights: Array1<f64>,
  /// Portfolio standard deviation `sqrt(w' Σ w)`.
  pub risk: f64,
  pub feasible: bool,
  /// False on the lower branch below the minimum-variance return.
  pub efficient: bool,
}

/// Tagged outcome of one target-return solve. Infeasibility and numerical
/// breakdown are data, not control flow.
#[derive(Clone, Debug)]
pub enum SolveOutcome {
  Feasible(FrontierPoint),
  Infeasible,
  NumericalFailure(String),
}

/// Efficient frontier for one window and constraint regime, ordered by
/// ascending target return. Inefficient points are tagged, never discarded.
#[derive(Clone, Debug)]
pub struct Frontier {
  pub min_variance: FrontierPoint,
  pub points: Vec<FrontierPoint>,
}

impl Frontier {
  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  /// Points on the efficient (upper) branch.
  pub fn efficient_points(&self) -> impl Iterator<Item = &FrontierPoint> {
    self.points.iter().filter(|p| p.efficient)
  }
}

fn symmetrized(covariance: &Array2<f64>) -> Array2<f64> {
  0.5 * (covariance + &covariance.t())
}

/// Formulates and solves one mean-variance QP through an injected backend.
#[derive(Clone, Copy, Debug)]
pub struct FrontierSolver<'a, S: QpSolverExt> {
  solver: &'a S,
}

impl<'a, S: QpSolverExt> FrontierSolver<'a, S> {
  #[must_use]
  pub fn new(solver: &'a S) -> Self {
    Self { solver }
  }

  /// Solve for the minimum-variance weights at an optional target return.
  ///
  /// Risk is computed directly as `sqrt(w' Σ w)`, which equals
  /// `sqrt(2 * objective)` for the zero-cost QP.
  pub fn solve_point(
    &self,
    moments: &MomentEstimate,
    target_return: Option<f64>,
    no_short: bool,
  ) -> SolveOutcome {
    let n = moments.mean.len();
    let q = symmetrized(&moments.covariance);

    let m_eq = if target_return.is_some() { 2 } else { 1 };
    let mut a_eq = Array2::<f64>::zeros((m_eq, n));
    let mut b_eq = Array1::<f64>::zeros(m_eq);
    a_eq.row_mut(0).fill(1.0);
    b_eq[0] = 1.0;
    if let Some(r) = target_return {
      a_eq.row_mut(1).assign(&moments.mean);
      b_eq[1] = r;
    }

    let (a_ineq, b_ineq) = if no_short {
      (Array2::<f64>::eye(n) * -1.0, Array1::<f64>::zeros(n))
    } else {
      (Array2::<f64>::zeros((0, n)), Array1::<f64>::zeros(0))
    };

    let problem = QpProblem {
      q: q.clone(),
      c: Array1::zeros(n),
      a_eq,
      b_eq,
      a_ineq,
      b_ineq,
    };

    match self.solver.solve(&problem) {
      Ok(solution) => {
        let weights = solution.x;
        let variance = weights.dot(&q.dot(&weights)).max(0.0);
        let target = target_return.unwrap_or_else(|| moments.mean.dot(&weights));
        SolveOutcome::Feasible(FrontierPoint {
          target_return: target,
          weights,
          risk: variance.sqrt(),
          feasible: true,
          efficient: true,
        })
      }
      Err(QpError::Infeasible) => SolveOutcome::Infeasible,
      Err(QpError::NumericalFailure(msg)) => SolveOutcome::NumericalFailure(msg),
    }
  }
}

/// Sweep configuration.
#[derive(Clone, Copy, Debug)]
pub struct FrontierSweepConfig {
  /// Number of evenly spaced target returns between the bounds.
  pub grid_size: usize,
  /// Upper-bound multiple of `max(μ)` when shorting is allowed; with a
  /// no-short constraint the best single-asset return bounds the frontier
  /// instead.
  pub short_upper_multiple: f64,
  /// Targets closer than this are treated as duplicates.
  pub target_tolerance: f64,
}

impl Default for FrontierSweepConfig {
  fn default() -> Self {
    Self {
      grid_size: 100,
      short_upper_multiple: 2.0,
      target_tolerance: 1e-9,
    }
  }
}

/// Builds a complete [`Frontier`] by sweeping a target-return grid.
pub struct FrontierSweep<'a, S: QpSolverExt + Sync> {
  solver: &'a S,
  config: FrontierSweepConfig,
}

impl<'a, S: QpSolverExt + Sync> FrontierSweep<'a, S> {
  #[must_use]
  pub fn new(solver: &'a S, config: FrontierSweepConfig) -> Self {
    Self { solver, config }
  }

  /// Sweep the attainable return range for one set of window moments.
  ///
  /// Grid points are solved independently in parallel and joined by grid
  /// index; infeasible and numerically failed points are dropped, the latter
  /// logged distinctly. Zero surviving points is [`FrontierError::EmptyFrontier`].
  pub fn build(
    &self,
    moments: &MomentEstimate,
    no_short: bool,
  ) -> Result<Frontier, FrontierError> {
    if self.config.grid_size == 0 {
      return Err(FrontierError::InvalidConfig(
        "grid_size must be positive".to_string(),
      ));
    }

    let point_solver = FrontierSolver::new(self.solver);
    let min_variance = match point_solver.solve_point(moments, None, no_short) {
      SolveOutcome::Feasible(point) => point,
      SolveOutcome::Infeasible => {
        warn!(no_short, "minimum-variance problem infeasible");
        return Err(FrontierError::EmptyFrontier);
      }
      SolveOutcome::NumericalFailure(msg) => {
        warn!(no_short, %msg, "minimum-variance solve failed numerically");
        return Err(FrontierError::EmptyFrontier);
      }
    };

    let lower = min_variance.target_return;
    let max_mu = moments.mean.max().copied().unwrap_or(f64::NEG_INFINITY);
    let upper = if no_short {
      max_mu
    } else {
      self.config.short_upper_multiple * max_mu
    };
    let upper = upper.max(lower);

    let grid: Vec<f64> = Array1::linspace(lower, upper, self.config.grid_size).to_vec();
    let outcomes: Vec<SolveOutcome> = grid
      .par_iter()
      .map(|&r| point_solver.solve_point(moments, Some(r), no_short))
      .collect();

    let mut points = Vec::with_capacity(outcomes.len());
    let mut infeasible = 0usize;
    let mut numerical = 0usize;
    for outcome in outcomes {
      match outcome {
        SolveOutcome::Feasible(point) => points.push(point),
        SolveOutcome::Infeasible => infeasible += 1,
        SolveOutcome::NumericalFailure(msg) => {
          numerical += 1;
          debug!(%msg, "grid point dropped after numerical failure");
        }
      }
    }
    if infeasible > 0 {
      debug!(infeasible, no_short, "infeasible grid points dropped");
    }
    if numerical > 0 {
      warn!(
        numerical, no_short,
        "grid points failed numerically; covariance may be ill-conditioned"
      );
    }
    if points.is_empty() {
      return Err(FrontierError::EmptyFrontier);
    }

    points.sort_by(|a, b| a.target_return.total_cmp(&b.target_return));
    points.dedup_by(|a, b| (a.target_return - b.target_return).abs() <= self.config.target_tolerance);

    for point in &mut points {
      point.efficient = point.target_return >= lower - self.config.target_tolerance;
    }

    let mut running_risk = min_variance.risk;
    for point in points.iter().filter(|p| p.efficient) {
      if point.risk < running_risk - 1e-8 {
        warn!(
          target_return = point.target_return,
          risk = point.risk,
          "risk decreased along the efficient branch"
        );
      }
      running_risk = running_risk.max(point.risk);
    }

    Ok(Frontier {
      min_variance,
      points,
    })
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use approx::assert_relative_eq;
  use ndarray::array;

  use super::*;
  use crate::qp::clarabel::ClarabelQpSolver;
  use crate::qp::QpSolution;

  fn two_asset_moments() -> MomentEstimate {
    MomentEstimate {
      mean: array![0.10, 0.05],
      covariance: array![[0.04, 0.0], [0.0, 0.01]],
      observations: 60,
    }
  }

  fn unwrap_feasible(outcome: SolveOutcome) -> FrontierPoint {
    match outcome {
      SolveOutcome::Feasible(point) => point,
      other => panic!("expected feasible point, got {other:?}"),
    }
  }

  #[test]
  fn minimum_variance_is_inverse_variance_weighted() {
    let solver = ClarabelQpSolver::default();
    let point = unwrap_feasible(
      FrontierSolver::new(&solver).solve_point(&two_asset_moments(), None, false),
    );

    assert_relative_eq!(point.weights[0], 0.2, epsilon = 1e-4);
    assert_relative_eq!(point.weights[1], 0.8, epsilon = 1e-4);
    assert_relative_eq!(point.risk, 0.008_f64.sqrt(), epsilon = 1e-4);
  }

  #[test]
  fn identical_assets_split_evenly() {
    let moments = MomentEstimate {
      mean: array![0.08, 0.08, 0.08],
      covariance: Array2::eye(3) * 0.02,
      observations: 60,
    };
    let solver = ClarabelQpSolver::default();
    let point = unwrap_feasible(FrontierSolver::new(&solver).solve_point(&moments, None, true));

    for i in 0..3 {
      assert_relative_eq!(point.weights[i], 1.0 / 3.0, epsilon = 1e-4);
    }
  }

  #[test]
  fn target_above_best_asset_is_infeasible_without_shorting() {
    let solver = ClarabelQpSolver::default();
    let outcome = FrontierSolver::new(&solver).solve_point(&two_asset_moments(), Some(0.12), true);

    assert!(matches!(outcome, SolveOutcome::Infeasible));
  }

  #[test]
  fn resolving_reproduces_weights() {
    let solver = ClarabelQpSolver::default();
    let frontier_solver = FrontierSolver::new(&solver);
    let first = unwrap_feasible(frontier_solver.solve_point(&two_asset_moments(), Some(0.08), false));
    let second =
      unwrap_feasible(frontier_solver.solve_point(&two_asset_moments(), Some(0.08), false));

    for i in 0..2 {
      assert_abs_diff_eq!(first.weights[i], second.weights[i], epsilon = 1e-9);
    }
  }

  #[test]
  fn sweep_honors_budget_and_ordering() {
    let solver = ClarabelQpSolver::default();
    let sweep = FrontierSweep::new(&solver, FrontierSweepConfig::default());
    let frontier = sweep.build(&two_asset_moments(), false).unwrap();

    assert!(!frontier.is_empty());
    for pair in frontier.points.windows(2) {
      assert!(pair[0].target_return <= pair[1].target_return);
    }
    for point in &frontier.points {
      let total: f64 = point.weights.sum();
      assert_abs_diff_eq!(total, 1.0, epsilon = 1e-5);
    }
  }

  #[test]
  fn sweep_risk_is_monotone_on_the_efficient_branch() {
    let solver = ClarabelQpSolver::default();
    let sweep = FrontierSweep::new(&solver, FrontierSweepConfig::default());
    let frontier = sweep.build(&two_asset_moments(), false).unwrap();

    assert_relative_eq!(
      frontier.min_variance.risk,
      0.008_f64.sqrt(),
      epsilon = 1e-4
    );
    let mut previous = frontier.min_variance.risk;
    for point in frontier.efficient_points() {
      assert!(point.risk >= previous - 1e-6);
      previous = previous.max(point.risk);
    }
    // No feasible point anywhere on the frontier beats the minimum-variance
    // risk.
    for point in &frontier.points {
      assert!(point.risk >= frontier.min_variance.risk - 1e-6);
    }
  }

  #[test]
  fn no_short_sweep_keeps_weights_nonnegative() {
    let solver = ClarabelQpSolver::default();
    let sweep = FrontierSweep::new(&solver, FrontierSweepConfig::default());
    let frontier = sweep.build(&two_asset_moments(), true).unwrap();

    for point in &frontier.points {
      for &w in &point.weights {
        assert!(w >= -1e-6);
      }
    }
  }

  #[test]
  fn correlated_pair_matches_closed_form_minimum_variance() {
    // w1 = (σ2² − σ12) / (σ1² + σ2² − 2σ12)
    let moments = MomentEstimate {
      mean: array![0.09, 0.06],
      covariance: array![[0.04, 0.012], [0.012, 0.09]],
      observations: 60,
    };
    let solver = ClarabelQpSolver::default();
    let point = unwrap_feasible(FrontierSolver::new(&solver).solve_point(&moments, None, false));

    let expected = (0.09 - 0.012) / (0.04 + 0.09 - 2.0 * 0.012);
    assert_relative_eq!(point.weights[0], expected, epsilon = 1e-4);
  }

  struct FixedSolver {
    solution: Option<Array1<f64>>,
  }

  impl QpSolverExt for FixedSolver {
    fn solve(&self, _problem: &QpProblem) -> Result<QpSolution, QpError> {
      match &self.solution {
        Some(x) => Ok(QpSolution {
          x: x.clone(),
          objective: 0.0,
        }),
        None => Err(QpError::Infeasible),
      }
    }
  }

  #[test]
  fn injected_solver_drives_point_construction() {
    let solver = FixedSolver {
      solution: Some(array![0.25, 0.75]),
    };
    let point = unwrap_feasible(FrontierSolver::new(&solver).solve_point(
      &two_asset_moments(),
      None,
      false,
    ));

    let expected_var: f64 = 0.25 * 0.25 * 0.04 + 0.75 * 0.75 * 0.01;
    assert_relative_eq!(point.risk, expected_var.sqrt(), epsilon = 1e-12);
    assert_relative_eq!(point.target_return, 0.25 * 0.10 + 0.75 * 0.05, epsilon = 1e-12);
  }

  #[test]
  fn all_infeasible_grid_is_an_empty_frontier() {
    let solver = FixedSolver { solution: None };
    let sweep = FrontierSweep::new(&solver, FrontierSweepConfig::default());

    assert!(matches!(
      sweep.build(&two_asset_moments(), false),
      Err(FrontierError::EmptyFrontier)
    ));
  }

  // Solves the unconstrained problem but reports numerical breakdown for
  // any target above the cutoff.
  struct ShakySolver {
    solution: Array1<f64>,
    target_cutoff: f64,
  }

  impl QpSolverExt for ShakySolver {
    fn solve(&self, problem: &QpProblem) -> Result<QpSolution, QpError> {
      if problem.b_eq.len() > 1 && problem.b_eq[1] > self.target_cutoff {
        return Err(QpError::NumericalFailure("factorization stalled".to_string()));
      }
      Ok(QpSolution {
        x: self.solution.clone(),
        objective: 0.0,
      })
    }
  }

  #[test]
  fn numerical_failures_drop_points_without_aborting_the_sweep() {
    let solver = ShakySolver {
      solution: array![0.25, 0.75],
      target_cutoff: 0.15,
    };
    let config = FrontierSweepConfig::default();
    let frontier = FrontierSweep::new(&solver, config).build(&two_asset_moments(), false).unwrap();

    assert!(!frontier.is_empty());
    assert!(frontier.len() < config.grid_size);
    for point in &frontier.points {
      assert!(point.target_return <= 0.15 + 1e-12);
    }
  }

  #[test]
  fn all_numerical_failures_yield_empty_frontier() {
    // The minimum-variance solve carries no target row, so it survives while
    // every grid point breaks down.
    let solver = ShakySolver {
      solution: array![0.25, 0.75],
      target_cutoff: f64::NEG_INFINITY,
    };
    let sweep = FrontierSweep::new(&solver, FrontierSweepConfig::default());

    assert!(matches!(
      sweep.build(&two_asset_moments(), false),
      Err(FrontierError::EmptyFrontier)
    ));
  }

  #[test]
  fn zero_grid_size_is_a_fatal_config_error() {
    let solver = ClarabelQpSolver::default();
    let config = FrontierSweepConfig {
      grid_size: 0,
      ..Default::default()
    };
    let sweep = FrontierSweep::new(&solver, config);

    assert!(matches!(
      sweep.build(&two_asset_moments(), false),
      Err(FrontierError::InvalidConfig(_))
    ));
  }
}
