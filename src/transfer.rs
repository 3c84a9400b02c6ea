// src/transfer.rs
//
// Inter-grid transfer operators. A coarse point `p` maps to fine point
// `2p`; the coarsest grid has 3 points per axis.

use crate::field::{walk, Field};

/// Full-weighting restriction of `fine` into the next coarser grid.
///
/// Interior coarse points average the mapped fine point (weight 0.5) with
/// its face-adjacent fine neighbors (weight `0.5 / 2D`: 0.25 in 1D, 0.125
/// in 2D, 1/12 in 3D). Domain-boundary coarse points copy the mapped fine
/// value exactly; the stencil never reaches across the domain edge.
pub fn restrict<const D: usize>(fine: &Field<D>, coarse: &mut Field<D>) {
    let nc = coarse.n;
    debug_assert_eq!(fine.n, 2 * nc - 1);

    let w = 0.5 / (2 * D) as f64;
    walk::<D>(0, nc, |pc| {
        let pf = pc.map(|c| 2 * c);
        if pc.iter().any(|&c| c == 0 || c == nc - 1) {
            coarse[pc] = fine[pf];
        } else {
            let mut acc = 0.5 * fine[pf];
            for a in 0..D {
                let mut q = pf;
                q[a] -= 1;
                acc += w * fine[q];
                q[a] += 2;
                acc += w * fine[q];
            }
            coarse[pc] = acc;
        }
    });
}

/// Multilinear prolongation of `coarse` into the next finer grid,
/// overwriting `fine`.
///
/// Coarse values inject onto the even fine lattice; the remaining points
/// are filled by sequential per-axis averaging passes, which yields
/// linear / bilinear / trilinear interpolation in 1/2/3 dimensions.
pub fn prolong<const D: usize>(coarse: &Field<D>, fine: &mut Field<D>) {
    let nc = coarse.n;
    let nf = fine.n;
    debug_assert_eq!(nf, 2 * nc - 1);

    walk::<D>(0, nc, |pc| {
        fine[pc.map(|c| 2 * c)] = coarse[pc];
    });

    // Pass along axis `a` fills points with an odd coordinate on `a`; their
    // two neighbors along `a` are defined by the injection or by an earlier
    // pass (coordinates on later axes are still even).
    for a in 0..D {
        walk::<D>(0, nf, |p| {
            if p[a] % 2 == 1 && (a + 1..D).all(|b| p[b] % 2 == 0) {
                let mut lo = p;
                lo[a] -= 1;
                let mut hi = p;
                hi[a] += 1;
                let v = 0.5 * (fine[lo] + fine[hi]);
                fine[p] = v;
            }
        });
    }
}

/// Interpolate a coarse-grid correction and add it into `fine` in place.
/// `tmp` is level-owned scratch with the fine grid's shape.
pub fn prolong_add<const D: usize>(coarse: &Field<D>, fine: &mut Field<D>, tmp: &mut Field<D>) {
    prolong(coarse, tmp);
    for (dst, &c) in fine.data.iter_mut().zip(&tmp.data) {
        *dst += c;
    }
}
