// src/boundary.rs
//
// Boundary policy for the consolidation solver.
//
// The solver never advances boundary points through the interior stencil;
// after every relaxation sweep they are re-imposed from this policy:
//   - Fixed: Dirichlet, copied from a caller-held boundary source field
//     (the deep edge of a sediment column, held at hydrostatic pressure).
//   - Open : free-drainage surface, propagated by copying the adjacent
//     interior value rather than being pinned.

use crate::field::{walk, Field};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceRule {
    /// Dirichlet: boundary value copied from the stored boundary source.
    Fixed,
    /// Free/open: boundary value copies the adjacent interior value.
    Open,
}

/// Per-face boundary rules: `faces[axis][side]` with side 0 at index 0 and
/// side 1 at index `n - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPolicy<const D: usize> {
    pub faces: [[FaceRule; 2]; D],
}

impl<const D: usize> BoundaryPolicy<D> {
    /// Every face Dirichlet. Used for laterally confined test problems.
    pub fn all_fixed() -> Self {
        Self {
            faces: [[FaceRule::Fixed; 2]; D],
        }
    }

    /// Sediment-column default: the surface face (axis 0, index 0) is open,
    /// every other face is fixed.
    pub fn column() -> Self {
        let mut policy = Self::all_fixed();
        policy.faces[0][0] = FaceRule::Open;
        policy
    }

    #[inline]
    pub fn rule(&self, axis: usize, side: usize) -> FaceRule {
        self.faces[axis][side]
    }
}

/// Which face, if any, a lattice coordinate lies on.
#[inline]
pub(crate) fn face_side(c: usize, n: usize) -> Option<usize> {
    if c == 0 {
        Some(0)
    } else if c == n - 1 {
        Some(1)
    } else {
        None
    }
}

/// Re-impose boundary values on `u`.
///
/// Open faces copy the adjacent interior value; fixed faces copy from `bc`,
/// or zero when `bc` is `None` (coarse-grid correction equations). A point
/// shared between a fixed and an open face takes the fixed value.
pub fn impose<const D: usize>(
    u: &mut Field<D>,
    policy: &BoundaryPolicy<D>,
    bc: Option<&Field<D>>,
) {
    let n = u.n;
    walk::<D>(0, n, |p| {
        let mut open: Option<(usize, usize)> = None;
        let mut fixed = false;
        for a in 0..D {
            if let Some(side) = face_side(p[a], n) {
                match policy.rule(a, side) {
                    FaceRule::Fixed => fixed = true,
                    FaceRule::Open => open = Some((a, side)),
                }
            }
        }
        if fixed {
            u[p] = match bc {
                Some(src) => src[p],
                None => 0.0,
            };
        } else if let Some((a, side)) = open {
            let mut q = p;
            q[a] = if side == 0 { 1 } else { n - 2 };
            u[p] = u[q];
        }
    });
}
