// src/relax.rs
//
// Pointwise operators for the discretized implicit diffusion equation
//
//   (1/dt - div(k grad)) u = -f
//
// on a single grid level. Coefficients are staggered per axis: `k[a][p]` is
// the conductivity of the face between `p - e_a` and `p`, so the flux
// divergence at `p` uses `k[a][p]` and `k[a][p + e_a]`.
//
// In 1D the update reduces to
//   u[i] = ((u[i-1]*k[i] + u[i+1]*k[i+1])/h^2 - f[i]) * h^2 / (k[i+1] + k[i] + h^2/dt)
// and the 2D/3D forms are the same update summed over axes.

use crate::boundary::{self, BoundaryPolicy, FaceRule};
use crate::field::{walk, Field};

/// One lexicographic Gauss–Seidel sweep over every interior point, followed
/// by re-imposing the boundary. Boundary points are never advanced by the
/// interior stencil.
///
/// `bc` is the Dirichlet source for fixed faces; `None` pins fixed faces to
/// zero (coarse-grid correction equations).
pub fn relax_sweep<const D: usize>(
    u: &mut Field<D>,
    k: &[Field<D>; D],
    f: &Field<D>,
    h: &[f64; D],
    dt: f64,
    policy: &BoundaryPolicy<D>,
    bc: Option<&Field<D>>,
) {
    let n = u.n;
    walk::<D>(1, n - 1, |p| {
        let mut num = 0.0;
        let mut den = 1.0 / dt;
        for a in 0..D {
            let inv_h2 = 1.0 / (h[a] * h[a]);
            let mut lo = p;
            lo[a] -= 1;
            let mut hi = p;
            hi[a] += 1;
            let k_lo = k[a][p];
            let k_hi = k[a][hi];
            num += (u[lo] * k_lo + u[hi] * k_hi) * inv_h2;
            den += (k_lo + k_hi) * inv_h2;
        }
        u[p] = (num - f[p]) / den;
    });
    boundary::impose(u, policy, bc);
}

/// Defect `r = f - A(u)` at every interior point, with
///
///   A(u)[p] = sum_a (k_a[p] (u[p-e_a] - u[p]) + k_a[p+e_a] (u[p+e_a] - u[p])) / h_a^2
///             - u[p] / dt
///
/// so that the fixed point of `relax_sweep` is exactly `r = 0`. Boundary
/// entries carry the boundary forcing on fixed faces (assumed already
/// satisfied) and zero on open faces.
pub fn residual<const D: usize>(
    res: &mut Field<D>,
    u: &Field<D>,
    k: &[Field<D>; D],
    f: &Field<D>,
    h: &[f64; D],
    dt: f64,
    policy: &BoundaryPolicy<D>,
) {
    let n = u.n;
    walk::<D>(0, n, |p| {
        let mut on_open = false;
        let mut on_boundary = false;
        for a in 0..D {
            if let Some(side) = boundary::face_side(p[a], n) {
                on_boundary = true;
                if policy.rule(a, side) == FaceRule::Open {
                    on_open = true;
                }
            }
        }
        if on_boundary {
            res[p] = if on_open { 0.0 } else { f[p] };
            return;
        }

        let mut a_u = -u[p] / dt;
        for a in 0..D {
            let inv_h2 = 1.0 / (h[a] * h[a]);
            let mut lo = p;
            lo[a] -= 1;
            let mut hi = p;
            hi[a] += 1;
            a_u += (k[a][p] * (u[lo] - u[p]) + k[a][hi] * (u[hi] - u[p])) * inv_h2;
        }
        res[p] = f[p] - a_u;
    });
}

/// Closed-form solve on the terminal 3-point grid: after imposing the
/// boundary there is exactly one interior unknown, and a single relaxation
/// update solves it without iteration.
pub fn solve_coarsest<const D: usize>(
    u: &mut Field<D>,
    k: &[Field<D>; D],
    f: &Field<D>,
    h: &[f64; D],
    dt: f64,
    policy: &BoundaryPolicy<D>,
    bc: Option<&Field<D>>,
) {
    debug_assert_eq!(u.n, 3);
    boundary::impose(u, policy, bc);
    relax_sweep(u, k, f, h, dt, policy, bc);
}
