//! # Markowitz Rolling Frontier Engine
//!
//! `frontier_rs` computes mean-variance efficient frontiers from asset
//! return statistics, with and without a no-short-sale constraint, and
//! repeats the computation over rolling historical windows to track how the
//! tangency portfolio drifts over time.
//!
//! ## Modules
//!
//! | Module       | Description                                                              |
//! |--------------|--------------------------------------------------------------------------|
//! | [`data`]     | Asset universe and return-matrix containers.                             |
//! | [`moments`]  | Annualized mean/covariance estimation per window.                        |
//! | [`qp`]       | Solver-agnostic quadratic-programming contract and the Clarabel backend. |
//! | [`frontier`] | Single-point frontier solves and the target-return sweep.                |
//! | [`tangency`] | Maximum-Sharpe selection, direct and scan strategies.                    |
//! | [`rolling`]  | Rolling-window orchestration across both constraint regimes.             |
//! | [`error`]    | Error taxonomy; per-point failures are data, not crashes.                |
//!
//! ## Parallelism
//!
//! Grid-point solves within a sweep and windows within a rolling run are
//! mutually independent and execute on `rayon`; outputs are joined by index
//! so ordering never depends on completion order.
//!
//! ## Example
//!
//! ```rust
//! use frontier_rs::{ClarabelQpSolver, RollingConfig, RollingEngine};
//!
//! let engine = RollingEngine::new(RollingConfig::default(), ClarabelQpSolver::default())?;
//! let run = engine.run(&returns, None)?;
//! let weights = run.tangency_weight_series(true);
//! ```

pub mod data;
pub mod error;
pub mod frontier;
pub mod moments;
pub mod qp;
pub mod rolling;
pub mod tangency;

pub use data::AssetUniverse;
pub use data::ReturnMatrix;
pub use error::FrontierError;
pub use error::QpError;
pub use frontier::Frontier;
pub use frontier::FrontierPoint;
pub use frontier::FrontierSolver;
pub use frontier::FrontierSweep;
pub use frontier::FrontierSweepConfig;
pub use frontier::SolveOutcome;
pub use moments::CovariancePolicy;
pub use moments::MomentEstimate;
pub use moments::MomentEstimator;
pub use qp::clarabel::ClarabelQpSolver;
pub use qp::QpProblem;
pub use qp::QpSolution;
pub use qp::QpSolverExt;
pub use rolling::FrontierOutcome;
pub use rolling::RollingConfig;
pub use rolling::RollingEngine;
pub use rolling::RollingResult;
pub use rolling::RollingRun;
pub use rolling::WindowSpec;
pub use tangency::TangencyPortfolio;
pub use tangency::TangencySelector;
pub use tangency::TangencyStrategy;
