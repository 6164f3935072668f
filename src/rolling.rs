//! # Rolling
//!
//! $$
//! W_k = [k \cdot s, \ k \cdot s + \ell), \quad k = 0, 1, \dots
//! $$
//!
//! Rolling-window orchestration: per window, estimate moments, sweep the
//! frontier and select the tangency portfolio for both constraint regimes.
//! Windows are independent pure computations and run in parallel; results
//! are joined by window index, never by completion order.

use ndarray::s;
use ndarray::Array1;
use rayon::prelude::*;
use tracing::warn;

use crate::data::AssetUniverse;
use crate::data::ReturnMatrix;
use crate::error::FrontierError;
use crate::frontier::Frontier;
use crate::frontier::FrontierSweep;
use crate::frontier::FrontierSweepConfig;
use crate::moments::CovariancePolicy;
use crate::moments::MomentEstimate;
use crate::moments::MomentEstimator;
use crate::qp::QpSolverExt;
use crate::tangency::TangencyPortfolio;
use crate::tangency::TangencySelector;
use crate::tangency::TangencyStrategy;

/// Configuration for a rolling frontier run.
#[derive(Clone, Debug)]
pub struct RollingConfig {
  /// Observations per year, e.g. 252 for daily or 12 for monthly data.
  pub periods_per_year: usize,
  /// Target-return grid size per sweep.
  pub grid_size: usize,
  pub window_length_years: usize,
  pub window_step_years: usize,
  /// Frontier upper-bound multiple of `max(μ)` when shorting is allowed.
  pub short_upper_multiple: f64,
  pub covariance_policy: CovariancePolicy,
  /// Annual risk-free rate used when no per-period series is supplied.
  pub risk_free: f64,
  pub tangency_strategy: TangencyStrategy,
}

impl Default for RollingConfig {
  fn default() -> Self {
    Self {
      periods_per_year: 252,
      grid_size: 100,
      window_length_years: 5,
      window_step_years: 1,
      short_upper_multiple: 2.0,
      covariance_policy: CovariancePolicy::default(),
      risk_free: 0.0,
      tangency_strategy: TangencyStrategy::default(),
    }
  }
}

impl RollingConfig {
  /// Setup-time validation. These are the only fatal errors of a run.
  pub fn validate(&self) -> Result<(), FrontierError> {
    if self.periods_per_year == 0 {
      return Err(FrontierError::InvalidConfig(
        "periods_per_year must be positive".to_string(),
      ));
    }
    if self.grid_size == 0 {
      return Err(FrontierError::InvalidConfig(
        "grid_size must be positive".to_string(),
      ));
    }
    if self.window_length_years == 0 {
      return Err(FrontierError::InvalidConfig(
        "window_length_years must be positive".to_string(),
      ));
    }
    if self.window_step_years == 0 {
      return Err(FrontierError::InvalidConfig(
        "window_step_years must be positive".to_string(),
      ));
    }
    if !(self.short_upper_multiple.is_finite() && self.short_upper_multiple > 0.0) {
      return Err(FrontierError::InvalidConfig(
        "short_upper_multiple must be positive and finite".to_string(),
      ));
    }
    Ok(())
  }
}

/// Row range of one estimation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSpec {
  pub index: usize,
  pub start: usize,
  pub end: usize,
}

/// Frontier and tangency for one window under one constraint regime.
#[derive(Clone, Debug)]
pub struct FrontierOutcome {
  pub frontier: Frontier,
  pub tangency: TangencyPortfolio,
}

/// Per-window result. `None` fields are the sentinel for a window or
/// variant that failed with a recoverable error.
#[derive(Clone, Debug)]
pub struct RollingResult {
  pub window: WindowSpec,
  pub moments: Option<MomentEstimate>,
  /// Shorting allowed.
  pub unconstrained: Option<FrontierOutcome>,
  /// No-short constraint active.
  pub long_only: Option<FrontierOutcome>,
}

/// Chronologically ordered output of a rolling run.
#[derive(Clone, Debug)]
pub struct RollingRun {
  pub assets: AssetUniverse,
  pub results: Vec<RollingResult>,
}

impl RollingRun {
  /// Tangency weight vectors per window, `None` where a sentinel was
  /// recorded.
  pub fn tangency_weight_series(&self, no_short: bool) -> Vec<Option<Array1<f64>>> {
    self
      .results
      .iter()
      .map(|result| {
        let outcome = if no_short {
          &result.long_only
        } else {
          &result.unconstrained
        };
        outcome.as_ref().map(|o| o.tangency.point.weights.clone())
      })
      .collect()
  }
}

/// Drives moment estimation, frontier sweeps and tangency selection across
/// rolling windows.
pub struct RollingEngine<S: QpSolverExt + Sync> {
  config: RollingConfig,
  solver: S,
}

impl<S: QpSolverExt + Sync> RollingEngine<S> {
  /// Construct an engine, rejecting invalid configuration up front.
  pub fn new(config: RollingConfig, solver: S) -> Result<Self, FrontierError> {
    config.validate()?;
    Ok(Self { config, solver })
  }

  pub fn config(&self) -> &RollingConfig {
    &self.config
  }

  /// Run the full rolling computation, earliest window first.
  ///
  /// When `risk_free` is supplied the window moments are estimated on excess
  /// returns and Sharpe ratios are taken against zero; otherwise the scalar
  /// config rate applies to raw returns.
  pub fn run(
    &self,
    returns: &ReturnMatrix,
    risk_free: Option<&Array1<f64>>,
  ) -> Result<RollingRun, FrontierError> {
    if let Some(series) = risk_free {
      if series.len() != returns.n_periods() {
        return Err(FrontierError::InvalidConfig(format!(
          "risk-free series has {} entries for {} return periods",
          series.len(),
          returns.n_periods()
        )));
      }
    }

    let windows = self.windows(returns.n_periods());
    let results: Vec<RollingResult> = windows
      .into_par_iter()
      .map(|window| self.run_window(returns, risk_free, window))
      .collect();

    Ok(RollingRun {
      assets: returns.assets().clone(),
      results,
    })
  }

  fn windows(&self, n_periods: usize) -> Vec<WindowSpec> {
    let length = self.config.window_length_years * self.config.periods_per_year;
    let step = self.config.window_step_years * self.config.periods_per_year;

    let mut out = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;
    while start + length <= n_periods {
      out.push(WindowSpec {
        index,
        start,
        end: start + length,
      });
      start += step;
      index += 1;
    }
    out
  }

  fn run_window(
    &self,
    returns: &ReturnMatrix,
    risk_free: Option<&Array1<f64>>,
    window: WindowSpec,
  ) -> RollingResult {
    let estimator = MomentEstimator::new(self.config.periods_per_year, self.config.covariance_policy);
    let slice = returns.window(window.start, window.end);
    let rf_slice = risk_free.map(|series| series.slice(s![window.start..window.end]));
    // With excess-return moments the Sharpe reference rate is zero.
    let sharpe_rate = if risk_free.is_some() {
      0.0
    } else {
      self.config.risk_free
    };

    let moments = match estimator.estimate(slice, rf_slice) {
      Ok(moments) => moments,
      Err(err) => {
        warn!(window = window.index, %err, "window skipped");
        return RollingResult {
          window,
          moments: None,
          unconstrained: None,
          long_only: None,
        };
      }
    };

    let unconstrained = self.run_variant(&moments, sharpe_rate, false, window.index);
    let long_only = self.run_variant(&moments, sharpe_rate, true, window.index);

    RollingResult {
      window,
      moments: Some(moments),
      unconstrained,
      long_only,
    }
  }

  fn run_variant(
    &self,
    moments: &MomentEstimate,
    risk_free: f64,
    no_short: bool,
    window_index: usize,
  ) -> Option<FrontierOutcome> {
    let sweep_config = FrontierSweepConfig {
      grid_size: self.config.grid_size,
      short_upper_multiple: self.config.short_upper_multiple,
      ..Default::default()
    };
    let sweep = FrontierSweep::new(&self.solver, sweep_config);
    let frontier = match sweep.build(moments, no_short) {
      Ok(frontier) => frontier,
      Err(err) => {
        warn!(window = window_index, no_short, %err, "variant recorded as absent");
        return None;
      }
    };

    let selector = TangencySelector::new(&self.solver);
    match selector.select(
      &frontier,
      moments,
      risk_free,
      no_short,
      self.config.tangency_strategy,
    ) {
      Ok(tangency) => Some(FrontierOutcome { frontier, tangency }),
      Err(err) => {
        warn!(window = window_index, no_short, %err, "variant recorded as absent");
        None
      }
    }
  }
}
