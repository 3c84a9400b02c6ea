// src/field.rs

/// Scalar field on a structured cubic lattice with `n` points per axis.
///
/// Storage is a flat row-major `Vec<f64>` of length `n^D`, axis `D - 1`
/// fastest. Each field is exclusively owned by the grid level that created
/// it; levels never alias each other's buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<const D: usize> {
    pub n: usize,
    pub data: Vec<f64>,
}

impl<const D: usize> Field<D> {
    /// Create a zero-filled field with `n` points per axis.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n.pow(D as u32)],
        }
    }

    /// Create a field by evaluating `f` at every lattice point.
    pub fn from_fn(n: usize, mut f: impl FnMut([usize; D]) -> f64) -> Self {
        let mut out = Self::new(n);
        walk::<D>(0, n, |p| {
            let id = out.idx(p);
            out.data[id] = f(p);
        });
        out
    }

    /// Convert lattice indices to a flat index into `data`.
    #[inline]
    pub fn idx(&self, p: [usize; D]) -> usize {
        let mut id = 0usize;
        for a in 0..D {
            debug_assert!(p[a] < self.n);
            id = id * self.n + p[a];
        }
        id
    }

    /// Set every point to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Max-norm over the whole field.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, &v| m.max(v.abs()))
    }
}

impl<const D: usize> std::ops::Index<[usize; D]> for Field<D> {
    type Output = f64;

    #[inline]
    fn index(&self, p: [usize; D]) -> &f64 {
        &self.data[self.idx(p)]
    }
}

impl<const D: usize> std::ops::IndexMut<[usize; D]> for Field<D> {
    #[inline]
    fn index_mut(&mut self, p: [usize; D]) -> &mut f64 {
        let id = self.idx(p);
        &mut self.data[id]
    }
}

/// Visit every lattice point with each coordinate in `lo..hi`, in
/// lexicographic order (axis `D - 1` fastest).
///
/// `walk(1, n - 1, ..)` visits the interior of an `n`-point grid;
/// `walk(0, n, ..)` visits the whole lattice. Relaxation relies on the
/// lexicographic order (Gauss–Seidel sweeps update in place).
pub fn walk<const D: usize>(lo: usize, hi: usize, mut visit: impl FnMut([usize; D])) {
    if hi <= lo {
        return;
    }
    let mut p = [lo; D];
    loop {
        visit(p);
        let mut a = D;
        loop {
            if a == 0 {
                return;
            }
            a -= 1;
            p[a] += 1;
            if p[a] < hi {
                break;
            }
            p[a] = lo;
        }
    }
}
