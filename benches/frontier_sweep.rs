use std::hint::black_box;
use std::time::Instant;

use ndarray::Array1;
use ndarray::Array2;

use frontier_rs::ClarabelQpSolver;
use frontier_rs::FrontierSweep;
use frontier_rs::FrontierSweepConfig;
use frontier_rs::MomentEstimate;

fn median_ms(samples: &mut [f64]) -> f64 {
  samples.sort_by(f64::total_cmp);
  samples[samples.len() / 2]
}

fn synthetic_moments(n: usize) -> MomentEstimate {
  let mean = Array1::from_shape_fn(n, |i| 0.03 + 0.09 * (i as f64 / n as f64));
  let mut covariance = Array2::<f64>::zeros((n, n));
  for i in 0..n {
    for j in 0..n {
      let rho = 0.3_f64.powi((i as i32 - j as i32).abs());
      let vol_i = 0.1 + 0.2 * (i as f64 / n as f64);
      let vol_j = 0.1 + 0.2 * (j as f64 / n as f64);
      covariance[[i, j]] = rho * vol_i * vol_j;
    }
  }
  MomentEstimate {
    mean,
    covariance,
    observations: 252,
  }
}

fn run_case(n_assets: usize, grid_size: usize, no_short: bool, warmup: usize, runs: usize) {
  let solver = ClarabelQpSolver::default();
  let config = FrontierSweepConfig {
    grid_size,
    ..Default::default()
  };
  let sweep = FrontierSweep::new(&solver, config);
  let moments = synthetic_moments(n_assets);

  for _ in 0..warmup {
    let _ = black_box(sweep.build(&moments, no_short));
  }

  let mut samples = Vec::with_capacity(runs);
  for _ in 0..runs {
    let start = Instant::now();
    let frontier = sweep.build(&moments, no_short).expect("sweep failed");
    black_box(frontier);
    samples.push(start.elapsed().as_secs_f64() * 1e3);
  }

  let label = if no_short { "long-only" } else { "long-short" };
  println!(
    "{label:>10} | n={n_assets:<3} grid={grid_size:<5} | median={:>8.2} ms",
    median_ms(&mut samples)
  );
}

fn main() {
  println!("Frontier sweep benchmark");
  println!();

  for &grid_size in &[50usize, 100, 250, 500] {
    run_case(10, grid_size, false, 2, 9);
    run_case(10, grid_size, true, 2, 9);
  }
  run_case(50, 100, true, 2, 9);
}
