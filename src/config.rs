// src/config.rs

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Work budget for the full-multigrid driver.
///
/// The solver is a fixed-work method: it never measures a residual norm to
/// decide when to stop, it just performs the configured amount of work.
/// Larger budgets buy accuracy; the defaults reproduce the classic FMG
/// schedule (one pre/post sweep, one V-cycle per level, one application per
/// time step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Relaxation sweeps before the coarse-grid correction in each V-cycle.
    pub pre_sweeps: usize,
    /// Relaxation sweeps after the coarse-grid correction in each V-cycle.
    pub post_sweeps: usize,
    /// V-cycles run at each level during the FMG ascent.
    pub cycles_per_level: usize,
    /// Applications of the whole FMG driver per physical time step
    /// (`step` only). An external accuracy knob, not a convergence loop.
    pub outer_sweeps: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pre_sweeps: 1,
            post_sweeps: 1,
            cycles_per_level: 1,
            outer_sweeps: 1,
        }
    }
}

impl SolverConfig {
    /// Configure via environment variables, so experiments don't need to
    /// plumb settings through the surrounding simulation:
    ///
    ///   POREMG_PRE_SWEEPS=<n>
    ///   POREMG_POST_SWEEPS=<n>
    ///   POREMG_CYCLES_PER_LEVEL=<n>
    ///   POREMG_OUTER_SWEEPS=<n>
    pub fn from_env() -> Self {
        fn get_usize(name: &str) -> Option<usize> {
            std::env::var(name)
                .ok()
                .and_then(|s| s.trim().parse::<usize>().ok())
        }

        let mut cfg = Self::default();
        if let Some(v) = get_usize("POREMG_PRE_SWEEPS") {
            cfg.pre_sweeps = v;
        }
        if let Some(v) = get_usize("POREMG_POST_SWEEPS") {
            cfg.post_sweeps = v;
        }
        if let Some(v) = get_usize("POREMG_CYCLES_PER_LEVEL") {
            cfg.cycles_per_level = v.max(1);
        }
        if let Some(v) = get_usize("POREMG_OUTER_SWEEPS") {
            cfg.outer_sweeps = v.max(1);
        }
        cfg
    }

    /// Write the configuration as `solver_config.json` into `out_dir`,
    /// for run provenance.
    pub fn write_to_dir(&self, out_dir: &Path) -> std::io::Result<()> {
        let path = out_dir.join("solver_config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_fmg_schedule() {
        let cfg = SolverConfig::default();
        assert_eq!(cfg.pre_sweeps, 1);
        assert_eq!(cfg.post_sweeps, 1);
        assert_eq!(cfg.cycles_per_level, 1);
        assert_eq!(cfg.outer_sweeps, 1);
    }

    #[test]
    fn serde_round_trip() {
        let cfg = SolverConfig {
            pre_sweeps: 2,
            post_sweeps: 3,
            cycles_per_level: 4,
            outer_sweeps: 5,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn write_to_dir_produces_readable_json() {
        let dir = std::env::temp_dir().join("pore_mg_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let cfg = SolverConfig::default();
        cfg.write_to_dir(&dir).unwrap();
        let text = std::fs::read_to_string(dir.join("solver_config.json")).unwrap();
        let back: SolverConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
