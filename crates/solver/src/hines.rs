//! Hines matrix: the cable-equation system on one neuron's compartment tree.
//!
//! With parent-before-child ordering the sparse symmetric-pattern matrix is
//! two arrays: the diagonal `ad` and the single off-diagonal `api[i]`
//! coupling compartment `i` to `parent[i]`. The backup arrays hold the
//! purely geometric contribution and are restored at the start of every
//! tick before the time-varying terms are added.

/// Tree-structured linear system storage for one neuron.
#[derive(Debug, Clone)]
pub struct HinesMatrix {
    /// Diagonal, time-varying.
    pub ad: Vec<f64>,
    /// Off-diagonal to the parent compartment (`api[0]` unused).
    pub api: Vec<f64>,
    /// Geometric diagonal, set once at initialisation.
    pub base_ad: Vec<f64>,
    /// Geometric off-diagonal.
    pub base_api: Vec<f64>,
    /// Parent compartment index, −1 for the soma; `parent[i] < i`.
    pub parent: Vec<i32>,
}

impl HinesMatrix {
    /// Zero-filled matrix over `parent` (the geometric part is written by
    /// the assembly pass).
    pub fn new(parent: &[i32]) -> Self {
        let n = parent.len();
        HinesMatrix {
            ad: vec![0.0; n],
            api: vec![0.0; n],
            base_ad: vec![0.0; n],
            base_api: vec![0.0; n],
            parent: parent.to_vec(),
        }
    }

    pub fn n_comp(&self) -> usize {
        self.ad.len()
    }

    /// Restore the geometric contribution.
    pub fn reset(&mut self) {
        self.ad.copy_from_slice(&self.base_ad);
        self.api.copy_from_slice(&self.base_api);
    }

    /// Solve `A·x = b` in place (`b` becomes `x`), destroying `ad`.
    ///
    /// Triangularize leaves-to-root, then forward-substitute root-to-leaves;
    /// O(n) with no fill-in thanks to the ordering invariant.
    pub fn solve(&mut self, b: &mut [f64]) {
        let n = self.n_comp();
        debug_assert_eq!(b.len(), n);

        for i in (1..n).rev() {
            let p = self.parent[i] as usize;
            debug_assert!(p < i);
            self.ad[p] -= self.api[i] * self.api[i] / self.ad[i];
            b[p] -= b[i] * self.api[i] / self.ad[i];
        }

        b[0] /= self.ad[0];
        for i in 1..n {
            let p = self.parent[i] as usize;
            b[i] = (b[i] - b[p] * self.api[i]) / self.ad[i];
        }
    }
}

/// One neuron's linear system: the matrix and its right-hand side (which
/// doubles as the solution vector).
#[derive(Debug, Clone)]
pub struct LinSys {
    pub h: HinesMatrix,
    pub b: Vec<f64>,
}

impl LinSys {
    pub fn new(parent: &[i32]) -> Self {
        LinSys {
            b: vec![0.0; parent.len()],
            h: HinesMatrix::new(parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dense reconstruction of the current `ad`/`api` state.
    fn dense(h: &HinesMatrix) -> Vec<Vec<f64>> {
        let n = h.n_comp();
        let mut a = vec![vec![0.0; n]; n];
        for i in 0..n {
            a[i][i] = h.ad[i];
            if h.parent[i] >= 0 {
                let p = h.parent[i] as usize;
                a[i][p] = h.api[i];
                a[p][i] = h.api[i];
            }
        }
        a
    }

    fn residual_inf(a: &[Vec<f64>], x: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(row, bi)| {
                let ax: f64 = row.iter().zip(x).map(|(aij, xj)| aij * xj).sum();
                (ax - bi).abs()
            })
            .fold(0.0, f64::max)
    }

    fn solve_and_check(parent: &[i32], diag: &[f64], off: &[f64], b: &[f64]) {
        let mut h = HinesMatrix::new(parent);
        h.ad.copy_from_slice(diag);
        h.api.copy_from_slice(off);
        let a = dense(&h);
        let mut x = b.to_vec();
        h.solve(&mut x);
        let r = residual_inf(&a, &x, b);
        assert!(r < 1e-9, "residual {r}");
    }

    #[test]
    fn single_compartment() {
        solve_and_check(&[-1], &[4.0], &[0.0], &[8.0]);
    }

    #[test]
    fn unbranched_cable() {
        solve_and_check(
            &[-1, 0, 1, 2],
            &[3.0, 3.5, 2.75, 4.0],
            &[0.0, 0.8, 0.9, 0.7],
            &[1.0, -2.0, 0.5, 3.25],
        );
    }

    #[test]
    fn branched_tree() {
        // Soma with two subtrees: 0 <- {1 <- 2, 3 <- {4, 5}}.
        solve_and_check(
            &[-1, 0, 1, 0, 3, 3],
            &[5.0, 4.0, 3.0, 4.5, 2.5, 2.25],
            &[0.0, 1.1, 0.7, 0.9, 0.6, 0.5],
            &[0.3, -1.0, 2.0, 0.0, 1.5, -0.75],
        );
    }

    #[test]
    fn reset_restores_the_geometric_part() {
        let mut h = HinesMatrix::new(&[-1, 0]);
        h.base_ad.copy_from_slice(&[2.0, 3.0]);
        h.base_api.copy_from_slice(&[0.0, 0.5]);
        h.reset();
        h.ad[0] += 10.0;
        let mut b = vec![1.0, 1.0];
        h.solve(&mut b);
        h.reset();
        assert_eq!(h.ad, vec![2.0, 3.0]);
        assert_eq!(h.api, vec![0.0, 0.5]);
    }
}
