// src/solver.rs
//
// Grid-level hierarchy and the full-multigrid (FMG) driver.
//
// One solve owns its entire hierarchy: every per-level buffer is allocated
// when the hierarchy is built and dropped with it when the solve returns.
// Levels are stored coarsest-first; level 0 always has n = 3.
//
// The driver is fixed-work: it restricts coefficients and forcing to every
// level once, direct-solves the 3-point grid, then walks up the hierarchy,
// prolongating each coarse solution as the next level's initial guess and
// running the configured number of V-cycles there. There is no residual
// stopping criterion; accuracy is bought with the work budget in
// `SolverConfig`.

use log::debug;
use thiserror::Error;

use crate::boundary::{self, BoundaryPolicy};
use crate::config::SolverConfig;
use crate::field::Field;
use crate::grid::{self, Grid};
use crate::relax;
use crate::transfer;

#[derive(Debug, Error, PartialEq)]
pub enum SolveError {
    /// Grid size is not `2^m + 1` (m >= 1), so the coarsening sequence
    /// would not terminate at 3 points.
    #[error("grid size {n} is not of the form 2^m + 1 with m >= 1")]
    InvalidGridSize { n: usize },

    #[error("time step must be positive and finite, got {dt}")]
    InvalidTimeStep { dt: f64 },

    #[error("spacing along axis {axis} must be positive and finite, got {h}")]
    InvalidSpacing { axis: usize, h: f64 },

    /// Diffusivity must be non-negative everywhere.
    #[error("coefficient field for axis {axis} is negative at flat index {index} ({value})")]
    NegativeCoefficient {
        axis: usize,
        index: usize,
        value: f64,
    },

    #[error("field has {got} points per axis, grid expects {expected}")]
    ShapeMismatch { expected: usize, got: usize },
}

/// Dirichlet source selection when re-imposing a level's boundary: the
/// stored (restricted caller) values during the FMG ascent, zero on
/// coarse-grid correction equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BcSource {
    Stored,
    Zero,
}

/// One grid level: the solution, per-axis coefficient fields, forcing,
/// residual and prolongation scratch, and the Dirichlet boundary source.
/// All buffers are exclusively owned by the level.
#[derive(Debug)]
pub struct Level<const D: usize> {
    pub grid: Grid<D>,
    pub u: Field<D>,
    pub k: [Field<D>; D],
    pub f: Field<D>,
    pub res: Field<D>,
    pub tmp: Field<D>,
    pub bc: Field<D>,
}

impl<const D: usize> Level<D> {
    fn new(grid: Grid<D>) -> Self {
        let n = grid.n;
        Self {
            grid,
            u: Field::new(n),
            k: std::array::from_fn(|_| Field::new(n)),
            f: Field::new(n),
            res: Field::new(n),
            tmp: Field::new(n),
            bc: Field::new(n),
        }
    }
}

/// The full coarsened hierarchy for one solve, coarsest level first.
#[derive(Debug)]
pub struct Hierarchy<const D: usize> {
    levels: Vec<Level<D>>,
    dt: f64,
    policy: BoundaryPolicy<D>,
}

impl<const D: usize> Hierarchy<D> {
    /// Validate the inputs and build every level: the finest level clones
    /// the caller's fields, and each coarser level restricts the boundary
    /// source, the per-axis coefficients, and the forcing from the level
    /// above.
    pub fn build(
        grid: &Grid<D>,
        u: &Field<D>,
        k: &[Field<D>; D],
        f: &Field<D>,
        dt: f64,
        policy: &BoundaryPolicy<D>,
    ) -> Result<Self, SolveError> {
        let n_levels = validate(grid, u, k, f, dt)?;

        let mut finest = Level::new(*grid);
        finest.u = u.clone();
        finest.bc = u.clone();
        finest.k = k.clone();
        finest.f = f.clone();

        let mut levels = Vec::with_capacity(n_levels);
        levels.push(finest);

        let mut fine_idx = 0;
        loop {
            let coarse = {
                let fine = &levels[fine_idx];
                if fine.grid.n == 3 {
                    break;
                }
                let mut c = Level::new(fine.grid.coarsen());
                transfer::restrict(&fine.bc, &mut c.bc);
                for a in 0..D {
                    transfer::restrict(&fine.k[a], &mut c.k[a]);
                }
                transfer::restrict(&fine.f, &mut c.f);
                c
            };
            levels.push(coarse);
            fine_idx += 1;
        }
        levels.reverse();

        debug!(
            "built {}-level hierarchy, finest n = {} ({}D)",
            levels.len(),
            grid.n,
            D
        );

        Ok(Self {
            levels,
            dt,
            policy: *policy,
        })
    }

    pub fn finest(&self) -> &Level<D> {
        &self.levels[self.levels.len() - 1]
    }

    fn relax_level(&mut self, l: usize, sweeps: usize, bc: BcSource) {
        let dt = self.dt;
        let policy = self.policy;
        let level = &mut self.levels[l];
        let bc_field = match bc {
            BcSource::Stored => Some(&level.bc),
            BcSource::Zero => None,
        };
        for _ in 0..sweeps {
            relax::relax_sweep(
                &mut level.u,
                &level.k,
                &level.f,
                &level.grid.h,
                dt,
                &policy,
                bc_field,
            );
        }
    }

    /// One recursive correction cycle rooted at level `l`:
    /// relax, residual, restrict, recurse (or direct-solve at n = 3),
    /// prolong-and-add, relax.
    fn v_cycle(&mut self, l: usize, bc: BcSource, cfg: &SolverConfig) {
        if l == 0 {
            let dt = self.dt;
            let policy = self.policy;
            let level = &mut self.levels[0];
            let bc_field = match bc {
                BcSource::Stored => Some(&level.bc),
                BcSource::Zero => None,
            };
            relax::solve_coarsest(
                &mut level.u,
                &level.k,
                &level.f,
                &level.grid.h,
                dt,
                &policy,
                bc_field,
            );
            return;
        }

        self.relax_level(l, cfg.pre_sweeps, bc);

        {
            let level = &mut self.levels[l];
            relax::residual(
                &mut level.res,
                &level.u,
                &level.k,
                &level.f,
                &level.grid.h,
                self.dt,
                &self.policy,
            );
        }

        // The coarser level's f and u are reused as the correction
        // equation: rhs = restricted residual, zero initial guess.
        {
            let (coarser, finer) = self.levels.split_at_mut(l);
            let coarse = &mut coarser[l - 1];
            let fine = &finer[0];
            transfer::restrict(&fine.res, &mut coarse.f);
            coarse.u.fill(0.0);
        }

        self.v_cycle(l - 1, BcSource::Zero, cfg);

        {
            let (coarser, finer) = self.levels.split_at_mut(l);
            let coarse = &coarser[l - 1];
            let fine = &mut finer[0];
            transfer::prolong_add(&coarse.u, &mut fine.u, &mut fine.tmp);
        }

        self.relax_level(l, cfg.post_sweeps, bc);
    }

    /// The FMG ascent: direct-solve the coarsest grid, then for each finer
    /// level prolong the coarser solution as the initial guess, re-impose
    /// the level's boundary, and run the configured V-cycles.
    pub fn solve(&mut self, cfg: &SolverConfig) {
        let cycles = cfg.cycles_per_level.max(1);

        {
            let dt = self.dt;
            let policy = self.policy;
            let level = &mut self.levels[0];
            relax::solve_coarsest(
                &mut level.u,
                &level.k,
                &level.f,
                &level.grid.h,
                dt,
                &policy,
                Some(&level.bc),
            );
        }

        for l in 1..self.levels.len() {
            {
                let (coarser, finer) = self.levels.split_at_mut(l);
                let coarse = &coarser[l - 1];
                let fine = &mut finer[0];
                transfer::prolong(&coarse.u, &mut fine.u);
            }
            {
                let policy = self.policy;
                let level = &mut self.levels[l];
                boundary::impose(&mut level.u, &policy, Some(&level.bc));
            }
            for _ in 0..cycles {
                self.v_cycle(l, BcSource::Stored, cfg);
            }
            debug!(
                "fmg level {} (n = {}): ran {} v-cycle(s)",
                l, self.levels[l].grid.n, cycles
            );
        }
    }
}

fn validate<const D: usize>(
    grid: &Grid<D>,
    u: &Field<D>,
    k: &[Field<D>; D],
    f: &Field<D>,
    dt: f64,
) -> Result<usize, SolveError> {
    let n_levels =
        grid::num_levels(grid.n).ok_or(SolveError::InvalidGridSize { n: grid.n })?;

    if !dt.is_finite() || dt <= 0.0 {
        return Err(SolveError::InvalidTimeStep { dt });
    }
    for (axis, &h) in grid.h.iter().enumerate() {
        if !h.is_finite() || h <= 0.0 {
            return Err(SolveError::InvalidSpacing { axis, h });
        }
    }

    for field in [u, f] {
        if field.n != grid.n {
            return Err(SolveError::ShapeMismatch {
                expected: grid.n,
                got: field.n,
            });
        }
    }
    for (axis, ka) in k.iter().enumerate() {
        if ka.n != grid.n {
            return Err(SolveError::ShapeMismatch {
                expected: grid.n,
                got: ka.n,
            });
        }
        if let Some(index) = ka.data.iter().position(|&v| v < 0.0) {
            return Err(SolveError::NegativeCoefficient {
                axis,
                index,
                value: ka.data[index],
            });
        }
    }

    Ok(n_levels)
}

/// Full-multigrid solve of one implicit-diffusion system.
///
/// `u` enters holding the previous field (its boundary entries are the
/// Dirichlet source for every level) and leaves holding the new field.
/// Always completes for valid inputs; never signals a numerical failure.
pub fn full_multigrid<const D: usize>(
    grid: &Grid<D>,
    u: &mut Field<D>,
    k: &[Field<D>; D],
    f: &Field<D>,
    dt: f64,
    policy: &BoundaryPolicy<D>,
    cfg: &SolverConfig,
) -> Result<(), SolveError> {
    let mut hier = Hierarchy::build(grid, u, k, f, dt, policy)?;
    hier.solve(cfg);
    u.data.copy_from_slice(&hier.finest().u.data);
    Ok(())
}

/// Forcing for one implicit time step: `f = -rate/dt - u_prev/dt`, with
/// `rate` the deposition-induced source at each point.
pub fn build_forcing<const D: usize>(
    rate: &Field<D>,
    u_prev: &Field<D>,
    dt: f64,
) -> Field<D> {
    debug_assert_eq!(rate.n, u_prev.n);
    let mut f = Field::new(rate.n);
    for ((dst, &r), &u) in f.data.iter_mut().zip(&rate.data).zip(&u_prev.data) {
        *dst = -r / dt - u / dt;
    }
    f
}

/// Advance the pressure field by one physical time step: derive the forcing
/// from the sedimentation rate and the previous field, then apply the FMG
/// driver `outer_sweeps` times.
pub fn step<const D: usize>(
    grid: &Grid<D>,
    u: &mut Field<D>,
    k: &[Field<D>; D],
    rate: &Field<D>,
    dt: f64,
    policy: &BoundaryPolicy<D>,
    cfg: &SolverConfig,
) -> Result<(), SolveError> {
    let f = build_forcing(rate, u, dt);
    for _ in 0..cfg.outer_sweeps.max(1) {
        full_multigrid(grid, u, k, &f, dt, policy, cfg)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_levels_descend_to_three_points() {
        let grid = Grid::<1>::new(17, [1.0]);
        let u = Field::from_fn(17, |_| 2.0);
        let k = [Field::from_fn(17, |_| 1.0)];
        let f = Field::new(17);
        let hier =
            Hierarchy::build(&grid, &u, &k, &f, 1.0, &BoundaryPolicy::all_fixed()).unwrap();

        let sizes: Vec<usize> = hier.levels.iter().map(|lv| lv.grid.n).collect();
        assert_eq!(sizes, vec![3, 5, 9, 17]);
        assert_eq!(hier.levels[0].grid.h, [8.0]);

        // Constant coefficient and boundary fields restrict to constants.
        for lv in &hier.levels {
            assert!(lv.k[0].data.iter().all(|&v| (v - 1.0).abs() < 1e-15));
            assert!(lv.bc.data.iter().all(|&v| (v - 2.0).abs() < 1e-15));
        }
    }

    #[test]
    fn invalid_grid_sizes_are_rejected() {
        for n in [4, 6, 7, 10] {
            let grid = Grid::<1>::new(n, [1.0]);
            let u = Field::new(n);
            let k = [Field::new(n)];
            let f = Field::new(n);
            let err = Hierarchy::build(&grid, &u, &k, &f, 1.0, &BoundaryPolicy::all_fixed())
                .unwrap_err();
            assert_eq!(err, SolveError::InvalidGridSize { n });
        }
    }

    #[test]
    fn bad_time_step_spacing_and_coefficients_are_rejected() {
        let grid = Grid::<1>::new(5, [1.0]);
        let u = Field::new(5);
        let k = [Field::new(5)];
        let f = Field::new(5);
        let policy = BoundaryPolicy::all_fixed();

        let err = Hierarchy::build(&grid, &u, &k, &f, 0.0, &policy).unwrap_err();
        assert_eq!(err, SolveError::InvalidTimeStep { dt: 0.0 });

        let bad_grid = Grid::<1>::new(5, [-1.0]);
        let err = Hierarchy::build(&bad_grid, &u, &k, &f, 1.0, &policy).unwrap_err();
        assert_eq!(err, SolveError::InvalidSpacing { axis: 0, h: -1.0 });

        let mut bad_k = [Field::<1>::from_fn(5, |_| 1.0)];
        bad_k[0][[3]] = -0.25;
        let err = Hierarchy::build(&grid, &u, &bad_k, &f, 1.0, &policy).unwrap_err();
        assert_eq!(
            err,
            SolveError::NegativeCoefficient {
                axis: 0,
                index: 3,
                value: -0.25
            }
        );

        let short_u = Field::<1>::new(3);
        let err = Hierarchy::build(&grid, &short_u, &k, &f, 1.0, &policy).unwrap_err();
        assert_eq!(err, SolveError::ShapeMismatch { expected: 5, got: 3 });
    }

    #[test]
    fn forcing_combines_rate_and_previous_field() {
        let rate = Field::<1>::from_fn(5, |p| p[0] as f64);
        let u_prev = Field::<1>::from_fn(5, |_| 10.0);
        let f = build_forcing(&rate, &u_prev, 2.0);
        for i in 0..5 {
            assert!((f[[i]] - (-(i as f64) / 2.0 - 5.0)).abs() < 1e-15);
        }
    }

    #[test]
    fn coarsest_grid_is_solved_directly() {
        // n = 3 hierarchy has one level; FMG degenerates to the closed-form
        // solve of the single interior unknown.
        let grid = Grid::<1>::new(3, [1.0]);
        let mut u = Field::<1>::new(3);
        u[[0]] = 0.0;
        u[[2]] = 2.0;
        let k = [Field::from_fn(3, |_| 1.0)];
        let f = Field::new(3);
        full_multigrid(
            &grid,
            &mut u,
            &k,
            &f,
            1.0,
            &BoundaryPolicy::all_fixed(),
            &SolverConfig::default(),
        )
        .unwrap();

        // u1 = (u0*k1 + u2*k2)/(k1 + k2 + h^2/dt) = 2/3.
        assert!((u[[1]] - 2.0 / 3.0).abs() < 1e-14);
        assert_eq!(u[[0]], 0.0);
        assert_eq!(u[[2]], 2.0);
    }
}
