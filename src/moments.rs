//! # Moments
//!
//! $$
//! \hat{\mu} = \frac{p}{|W|}\sum_{t \in W} r_t, \qquad
//! \hat{\Sigma} = \frac{p}{|W|-1}\sum_{t \in W} (r_t-\bar{r})(r_t-\bar{r})^\top
//! $$
//!
//! Annualized mean vector and covariance matrix for one estimation window,
//! with a configurable missing-data policy.

use impl_new_derive::ImplNew;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::ArrayView2;

use crate::error::FrontierError;

/// How observations with missing entries enter the covariance estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CovariancePolicy {
  /// Use only rows where every asset has a finite observation.
  #[default]
  DropIncompleteRows,
  /// Estimate each pair over the rows where both assets are observed.
  PairwiseComplete,
}

/// Annualized window moments. Covariance is symmetric by construction but
/// not guaranteed positive-definite.
#[derive(Clone, Debug)]
pub struct MomentEstimate {
  pub mean: Array1<f64>,
  pub covariance: Array2<f64>,
  /// Usable observation count behind the estimate.
  pub observations: usize,
}

/// Sample moment estimator for one observation window.
#[derive(ImplNew, Clone, Copy, Debug)]
pub struct MomentEstimator {
  /// Annualization factor, e.g. 252 for daily data.
  pub periods_per_year: usize,
  /// Missing-data handling for the covariance estimate.
  pub policy: CovariancePolicy,
}

impl MomentEstimator {
  /// Estimate annualized moments over a window of per-period returns.
  ///
  /// When `risk_free` is given it is subtracted per period from every asset
  /// column, so the resulting moments describe excess returns. Fails with
  /// [`FrontierError::InsufficientData`] when usable observations < n + 1.
  pub fn estimate(
    &self,
    window: ArrayView2<'_, f64>,
    risk_free: Option<ArrayView1<'_, f64>>,
  ) -> Result<MomentEstimate, FrontierError> {
    let (t, n) = window.dim();
    if n == 0 {
      return Err(FrontierError::InvalidConfig(
        "moment estimation over an empty asset universe".to_string(),
      ));
    }
    if self.periods_per_year == 0 {
      return Err(FrontierError::InvalidConfig(
        "periods_per_year must be positive".to_string(),
      ));
    }
    if let Some(rf) = &risk_free {
      if rf.len() != t {
        return Err(FrontierError::InvalidConfig(format!(
          "risk-free series has {} entries for a {}-row window",
          rf.len(),
          t
        )));
      }
    }

    let mut data = window.to_owned();
    if let Some(rf) = risk_free {
      for (mut row, &r) in data.outer_iter_mut().zip(rf.iter()) {
        row.mapv_inplace(|v| v - r);
      }
    }

    match self.policy {
      CovariancePolicy::DropIncompleteRows => self.estimate_complete(&data),
      CovariancePolicy::PairwiseComplete => self.estimate_pairwise(&data),
    }
  }

  fn estimate_complete(&self, data: &Array2<f64>) -> Result<MomentEstimate, FrontierError> {
    let (t, n) = data.dim();
    let rows: Vec<usize> = (0..t)
      .filter(|&i| data.row(i).iter().all(|v| v.is_finite()))
      .collect();
    let usable = rows.len();
    if usable < n + 1 {
      return Err(FrontierError::InsufficientData {
        observations: usable,
        assets: n,
      });
    }

    let mut mean = Array1::<f64>::zeros(n);
    for &i in &rows {
      mean += &data.row(i);
    }
    mean /= usable as f64;

    let mut cov = Array2::<f64>::zeros((n, n));
    for &i in &rows {
      let d = &data.row(i) - &mean;
      for a in 0..n {
        for b in a..n {
          cov[[a, b]] += d[a] * d[b];
        }
      }
    }

    let scale = self.periods_per_year as f64;
    let denom = (usable - 1) as f64;
    for a in 0..n {
      for b in a..n {
        let v = cov[[a, b]] / denom * scale;
        cov[[a, b]] = v;
        cov[[b, a]] = v;
      }
    }
    mean *= scale;

    Ok(MomentEstimate {
      mean,
      covariance: cov,
      observations: usable,
    })
  }

  fn estimate_pairwise(&self, data: &Array2<f64>) -> Result<MomentEstimate, FrontierError> {
    let (t, n) = data.dim();
    let scale = self.periods_per_year as f64;

    let mut cov = Array2::<f64>::zeros((n, n));
    let mut min_pairwise = t;

    for a in 0..n {
      for b in a..n {
        let mut sum_a = 0.0;
        let mut sum_b = 0.0;
        let mut count = 0usize;
        for i in 0..t {
          let x = data[[i, a]];
          let y = data[[i, b]];
          if x.is_finite() && y.is_finite() {
            sum_a += x;
            sum_b += y;
            count += 1;
          }
        }
        min_pairwise = min_pairwise.min(count);
        if count >= 2 {
          // Pairwise means, so each pair is centered on its own sample.
          let mean_a = sum_a / count as f64;
          let mean_b = sum_b / count as f64;
          let mut acc = 0.0;
          for i in 0..t {
            let x = data[[i, a]];
            let y = data[[i, b]];
            if x.is_finite() && y.is_finite() {
              acc += (x - mean_a) * (y - mean_b);
            }
          }
          let v = acc / (count - 1) as f64 * scale;
          cov[[a, b]] = v;
          cov[[b, a]] = v;
        }
      }
    }

    if min_pairwise < n + 1 {
      return Err(FrontierError::InsufficientData {
        observations: min_pairwise,
        assets: n,
      });
    }

    let mut mean = Array1::<f64>::zeros(n);
    for j in 0..n {
      let mut sum = 0.0;
      let mut count = 0usize;
      for &v in data.column(j) {
        if v.is_finite() {
          sum += v;
          count += 1;
        }
      }
      mean[j] = sum / count as f64 * scale;
    }

    Ok(MomentEstimate {
      mean,
      covariance: cov,
      observations: min_pairwise,
    })
  }
}
