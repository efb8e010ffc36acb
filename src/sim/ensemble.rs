use anyhow::anyhow;
use tracing::info;

use crate::config::SimConfig;
use crate::sim::driver::Simulation;
use crate::sim::stats::RunSummary;

/// Run `runs` independent simulations on scoped threads.
///
/// Run `i` is seeded with `base_seed + i`, where the base is the configured
/// seed or a fresh random one. Each thread owns its own book, generator and
/// history. Summaries come back in seed order.
pub fn run_ensemble(config: &SimConfig, runs: usize) -> anyhow::Result<Vec<RunSummary>> {
    let base_seed = config.seed.unwrap_or_else(rand::random);
    info!(runs, base_seed, "Starting ensemble");

    let joined = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = (0..runs)
            .map(|i| {
                let run_config = SimConfig { seed: Some(base_seed.wrapping_add(i as u64)), ..config.clone() };
                scope.spawn(move |_| -> anyhow::Result<RunSummary> {
                    let mut simulation = Simulation::new(&run_config)?;
                    Ok(simulation.run()?)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect::<Vec<_>>()
    })
    .map_err(|_| anyhow!("ensemble scope panicked"))?;

    joined
        .into_iter()
        .map(|run| run.map_err(|_| anyhow!("ensemble run panicked")).and_then(|summary| summary))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_are_independent_and_ordered() {
        let config = SimConfig { seed: Some(100), end_time: 2_000, ..SimConfig::default() };
        let summaries = run_ensemble(&config, 3).unwrap();
        assert_eq!(summaries.iter().map(|s| s.seed).collect::<Vec<_>>(), vec![100, 101, 102]);

        // Each run matches a standalone run with the same seed
        let solo = Simulation::new(&SimConfig { seed: Some(101), ..config.clone() }).unwrap().run().unwrap();
        assert_eq!(summaries[1], solo);
    }

    #[test]
    fn test_invalid_settings_surface_as_error() {
        let config = SimConfig { seed: Some(1), limit_order_rate: -1.0, ..SimConfig::default() };
        assert!(run_ensemble(&config, 2).is_err());
    }
}
