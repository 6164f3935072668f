//! # Data
//!
//! $$
//! R \in \mathbb{R}^{T \times n}, \quad R_{t,i} = \text{return of asset } i \text{ in period } t
//! $$
//!
//! Asset universe and return-matrix containers consumed by the frontier
//! engine. Missing observations are `f64::NAN`; how they are handled is the
//! moment estimator's concern.

use ndarray::s;
use ndarray::Array2;
use ndarray::ArrayView2;

use crate::error::FrontierError;

/// Ordered set of asset identifiers, fixed for the lifetime of a computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetUniverse {
  ids: Vec<String>,
}

impl AssetUniverse {
  #[must_use]
  pub fn new(ids: Vec<String>) -> Self {
    Self { ids }
  }

  /// Build a universe from string-like labels.
  pub fn from_labels<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      ids: labels.into_iter().map(Into::into).collect(),
    }
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }

  pub fn ids(&self) -> &[String] {
    &self.ids
  }

  /// Column index of an asset identifier, if present.
  pub fn position(&self, id: &str) -> Option<usize> {
    self.ids.iter().position(|x| x == id)
  }
}

/// T×n return observations, rows chronological, columns aligned to an
/// [`AssetUniverse`].
#[derive(Clone, Debug)]
pub struct ReturnMatrix {
  assets: AssetUniverse,
  values: Array2<f64>,
}

impl ReturnMatrix {
  /// Wrap a return matrix, checking column alignment against the universe.
  pub fn new(assets: AssetUniverse, values: Array2<f64>) -> Result<Self, FrontierError> {
    if values.ncols() != assets.len() {
      return Err(FrontierError::InvalidConfig(format!(
        "return matrix has {} columns for {} assets",
        values.ncols(),
        assets.len()
      )));
    }
    Ok(Self { assets, values })
  }

  pub fn n_assets(&self) -> usize {
    self.assets.len()
  }

  pub fn n_periods(&self) -> usize {
    self.values.nrows()
  }

  pub fn assets(&self) -> &AssetUniverse {
    &self.assets
  }

  pub fn values(&self) -> ArrayView2<'_, f64> {
    self.values.view()
  }

  /// View of rows `[start, end)`, clamped to the available history.
  pub fn window(&self, start: usize, end: usize) -> ArrayView2<'_, f64> {
    let t = self.values.nrows();
    let end = end.min(t);
    let start = start.min(end);
    self.values.slice(s![start..end, ..])
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  #[test]
  fn universe_preserves_order_and_lookup() {
    let universe = AssetUniverse::from_labels(["EQT", "BND", "CMD"]);

    assert_eq!(universe.len(), 3);
    assert_eq!(universe.ids()[1], "BND");
    assert_eq!(universe.position("CMD"), Some(2));
    assert_eq!(universe.position("FX"), None);
  }

  #[test]
  fn return_matrix_rejects_misaligned_columns() {
    let universe = AssetUniverse::from_labels(["EQT", "BND"]);
    let values = array![[0.01, 0.02, 0.03]];

    assert!(matches!(
      ReturnMatrix::new(universe, values),
      Err(FrontierError::InvalidConfig(_))
    ));
  }

  #[test]
  fn window_clamps_to_history() {
    let universe = AssetUniverse::from_labels(["EQT"]);
    let values = array![[0.01], [0.02], [0.03]];
    let returns = ReturnMatrix::new(universe, values).unwrap();

    let view = returns.window(1, 10);
    assert_eq!(view.nrows(), 2);
    assert_eq!(view[[0, 0]], 0.02);
  }
}
