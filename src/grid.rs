// src/grid.rs

/// Structured cubic grid: `n` points along each of `D` axes, with a
/// per-axis spacing. Multigrid coarsening requires `n = 2^m + 1`.
///
/// Axis 0 is the vertical (depth) axis by convention; in a sediment column
/// index 0 along axis 0 is the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid<const D: usize> {
    pub n: usize,
    pub h: [f64; D],
}

impl<const D: usize> Grid<D> {
    /// Create a grid with `n` points per axis and spacings `h`.
    pub fn new(n: usize, h: [f64; D]) -> Self {
        Self { n, h }
    }

    /// Total number of lattice points.
    pub fn n_points(&self) -> usize {
        self.n.pow(D as u32)
    }

    /// The next coarser grid: half the resolution, doubled spacing.
    pub fn coarsen(&self) -> Self {
        debug_assert!(is_valid_size(self.n) && self.n > 3);
        Self {
            n: (self.n + 1) / 2,
            h: self.h.map(|x| 2.0 * x),
        }
    }
}

/// Whether `n` has the `2^m + 1` form (m >= 1) required for coarsening.
pub fn is_valid_size(n: usize) -> bool {
    n >= 3 && (n - 1).is_power_of_two()
}

/// Number of multigrid levels for finest size `n`: `log2(n - 1)`.
/// `None` when `n` is not of the `2^m + 1` form.
pub fn num_levels(n: usize) -> Option<usize> {
    if is_valid_size(n) {
        Some((n - 1).trailing_zeros() as usize)
    } else {
        None
    }
}

/// Descending sequence of level sizes `n, (n+1)/2, .., 3`.
pub fn level_sizes(n: usize) -> Vec<usize> {
    debug_assert!(is_valid_size(n));
    let mut sizes = Vec::new();
    let mut m = n;
    loop {
        sizes.push(m);
        if m == 3 {
            break;
        }
        m = (m + 1) / 2;
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_sizes_are_powers_of_two_plus_one() {
        for m in 1..=8 {
            let n = (1usize << m) + 1;
            assert!(is_valid_size(n), "n = {} should be valid", n);
            assert_eq!(num_levels(n), Some(m));
        }
        for n in [0, 1, 2, 4, 6, 7, 10, 18] {
            assert!(!is_valid_size(n), "n = {} should be invalid", n);
            assert_eq!(num_levels(n), None);
        }
    }

    #[test]
    fn level_sizes_descend_to_three() {
        assert_eq!(level_sizes(3), vec![3]);
        assert_eq!(level_sizes(9), vec![9, 5, 3]);
        assert_eq!(level_sizes(257), vec![257, 129, 65, 33, 17, 9, 5, 3]);
        for m in 1..=8 {
            let n = (1usize << m) + 1;
            let sizes = level_sizes(n);
            assert_eq!(sizes.len(), num_levels(n).unwrap());
            assert_eq!(*sizes.last().unwrap(), 3);
            for w in sizes.windows(2) {
                assert_eq!(w[0], 2 * w[1] - 1);
            }
        }
    }

    #[test]
    fn coarsen_halves_resolution_and_doubles_spacing() {
        let g = Grid::<2>::new(9, [0.5, 2.0]);
        let c = g.coarsen();
        assert_eq!(c.n, 5);
        assert_eq!(c.h, [1.0, 4.0]);
        assert_eq!(g.n_points(), 81);
    }
}
