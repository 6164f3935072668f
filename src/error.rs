//! # Errors
//!
//! $$
//! \text{Outcome} \in \{\text{Solved}, \text{Infeasible}, \text{NumericalFailure}\}
//! $$
//!
//! Error taxonomy for the frontier engine. Per-point and per-window failures
//! are recoverable and surface as partial results; only configuration errors
//! are fatal.

use thiserror::Error;

/// Run-level failures of the frontier engine.
#[derive(Debug, Error)]
pub enum FrontierError {
  /// The estimation window holds fewer usable observations than `assets + 1`.
  #[error("insufficient data: {observations} usable observations for {assets} assets")]
  InsufficientData { observations: usize, assets: usize },
  /// A sweep produced zero feasible grid points.
  #[error("frontier sweep produced no feasible point")]
  EmptyFrontier,
  /// No frontier point was available to rank by Sharpe ratio.
  #[error("no feasible frontier point to rank for tangency")]
  NoFeasibleTangency,
  /// Setup-time configuration error. The only fatal variant.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
}

/// Signals returned by a quadratic-programming backend for a single solve.
///
/// Both variants are expected outcomes of a target-return sweep, not crashes:
/// infeasible targets are dropped, numerical failures are dropped and logged
/// distinctly since they hint at an ill-conditioned covariance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QpError {
  /// The constraint set admits no feasible point.
  #[error("quadratic program is infeasible")]
  Infeasible,
  /// Non-convergence, unboundedness or a non-PSD quadratic form.
  #[error("quadratic program failed numerically: {0}")]
  NumericalFailure(String),
}
