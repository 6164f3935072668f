use anyhow::Result;
use ndarray::Array2;
use ndarray_rand::RandomExt;
use rand_distr::Normal;

use frontier_rs::AssetUniverse;
use frontier_rs::ClarabelQpSolver;
use frontier_rs::ReturnMatrix;
use frontier_rs::RollingConfig;
use frontier_rs::RollingEngine;

fn main() -> Result<()> {
  // Synthetic daily returns for a four-asset universe; a real harness would
  // feed parsed price history here instead.
  let assets = AssetUniverse::from_labels(["EQT", "BND", "CMD", "FX"]);
  let t = 252 * 8;
  let params = [
    (0.00045, 0.011),
    (0.00012, 0.0035),
    (0.00028, 0.014),
    (0.00005, 0.006),
  ];

  let mut values = Array2::<f64>::zeros((t, assets.len()));
  for (j, &(drift, vol)) in params.iter().enumerate() {
    let column = ndarray::Array1::random(t, Normal::new(drift, vol)?);
    values.column_mut(j).assign(&column);
  }
  let returns = ReturnMatrix::new(assets, values)?;

  let config = RollingConfig {
    window_length_years: 5,
    window_step_years: 1,
    risk_free: 0.02,
    ..Default::default()
  };
  let engine = RollingEngine::new(config, ClarabelQpSolver::default())?;
  let run = engine.run(&returns, None)?;

  for result in &run.results {
    println!(
      "\nWindow {} [{}, {})",
      result.window.index, result.window.start, result.window.end
    );
    for (label, outcome) in [
      ("unconstrained", &result.unconstrained),
      ("long-only", &result.long_only),
    ] {
      match outcome {
        Some(o) => {
          println!(
            "  {label}: sharpe {:.3}, return {:.3}, risk {:.3}",
            o.tangency.sharpe, o.tangency.point.target_return, o.tangency.point.risk
          );
          for (id, w) in run.assets.ids().iter().zip(o.tangency.point.weights.iter()) {
            println!("    {id}: {w:+.4}");
          }
        }
        None => println!("  {label}: no result"),
      }
    }
  }

  Ok(())
}
