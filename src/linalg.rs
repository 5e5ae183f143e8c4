// Dense linear algebra on ndarray: a Jacobi SVD and the least-squares solve built on it.
use ndarray::prelude::*;


static MAX_SWEEPS: usize = 60;
static ORTHOGONALITY_EPS: f64 = 1e-15;


/// Singular value decomposition of a matrix `a` with shape (m, n), as `(u, s, v)` such that
/// `a = u * diag(s) * v^T`.  `u` is (m, k), `s` has length k and `v` is (n, k), for k = min(m, n).
/// Singular values are not sorted.
pub fn svd(a: &Array2<f64>) -> (Array2<f64>, Array1<f64>, Array2<f64>) {
    if a.nrows() >= a.ncols() {
        jacobi_svd_tall(a)
    } else {
        // a^T = u' s v'^T, so a = v' s u'^T
        let (u, s, v) = jacobi_svd_tall(&a.t().to_owned());
        (v, s, u)
    }
}

/// One-sided (Hestenes) Jacobi SVD.  Requires at least as many rows as columns.
fn jacobi_svd_tall(a: &Array2<f64>) -> (Array2<f64>, Array1<f64>, Array2<f64>) {
    let ncols = a.ncols();
    let mut uu = a.to_owned();
    let mut vv = Array2::eye(ncols);

    for _ in 0..MAX_SWEEPS {
        let mut rotated = false;
        for pp in 0..ncols {
            for qq in (pp + 1)..ncols {
                let alpha = uu.column(pp).dot(&uu.column(pp));
                let beta = uu.column(qq).dot(&uu.column(qq));
                let gamma = uu.column(pp).dot(&uu.column(qq));
                if gamma == 0. || gamma.abs() <= ORTHOGONALITY_EPS * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;
                let zeta = (beta - alpha) / (2. * gamma);
                let tt = zeta.signum() / (zeta.abs() + (1. + zeta * zeta).sqrt());
                let cc = 1. / (1. + tt * tt).sqrt();
                let ss = cc * tt;
                rotate_columns(&mut uu, pp, qq, cc, ss);
                rotate_columns(&mut vv, pp, qq, cc, ss);
            }
        }
        if ! rotated {
            break;
        }
    }

    let sigma: Array1<f64> = (0..ncols).map(|jj| uu.column(jj).dot(&uu.column(jj)).sqrt())
        .collect();
    for jj in 0..ncols {
        if sigma[jj] > 0. {
            let scale = sigma[jj];
            uu.column_mut(jj).mapv_inplace(|xx| xx / scale);
        }
    }
    (uu, sigma, vv)
}

fn rotate_columns(mat: &mut Array2<f64>, pp: usize, qq: usize, cc: f64, ss: f64) {
    for ii in 0..mat.nrows() {
        let col_p = mat[[ii, pp]];
        let col_q = mat[[ii, qq]];
        mat[[ii, pp]] = cc * col_p - ss * col_q;
        mat[[ii, qq]] = ss * col_p + cc * col_q;
    }
}

/// The minimum-norm solution x minimising ||a x - b||.  Singular values below
/// `eps * max(m, n) * largest singular value` are treated as zero.
pub fn lstsq(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let mut xx = Array1::zeros(a.ncols());
    if a.nrows() == 0 || a.ncols() == 0 {
        return xx;
    }
    let (uu, sigma, vv) = svd(a);
    let sigma_max = sigma.iter().cloned().fold(0., f64::max);
    let cutoff = f64::EPSILON * a.nrows().max(a.ncols()) as f64 * sigma_max;
    for jj in 0..sigma.len() {
        if sigma[jj] > cutoff {
            let coef = uu.column(jj).dot(b) / sigma[jj];
            xx.scaled_add(coef, &vv.column(jj));
        }
    }
    xx
}


#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use super::*;

    fn reconstruct(uu: &Array2<f64>, sigma: &Array1<f64>, vv: &Array2<f64>) -> Array2<f64> {
        let scaled = uu * &sigma.view().insert_axis(Axis(0));
        scaled.dot(&vv.t())
    }

    #[test]
    fn test_svd_reconstructs() {
        let tall = array![
            [1., 2.],
            [3., 4.],
            [5., 6.],
        ];
        let (uu, sigma, vv) = svd(&tall);
        assert_eq!(uu.dim(), (3, 2));
        assert_eq!(vv.dim(), (2, 2));
        assert_abs_diff_eq!(reconstruct(&uu, &sigma, &vv), tall, epsilon = 1e-10);
        // u's columns are orthonormal
        assert_abs_diff_eq!(uu.t().dot(&uu), Array2::<f64>::eye(2), epsilon = 1e-10);

        let wide = tall.t().to_owned();
        let (uu, sigma, vv) = svd(&wide);
        assert_eq!(uu.dim(), (2, 2));
        assert_eq!(vv.dim(), (3, 2));
        assert_abs_diff_eq!(reconstruct(&uu, &sigma, &vv), wide, epsilon = 1e-10);
    }

    #[test]
    fn test_lstsq_exact() {
        let aa = array![
            [2., 0.],
            [0., 4.],
        ];
        assert_abs_diff_eq!(lstsq(&aa, &array![2., 2.]), array![1., 0.5], epsilon = 1e-12);
    }

    #[test]
    fn test_lstsq_overdetermined() {
        // best fit of a line through (0, 1), (1, 3), (2, 5), (3, 6)
        let aa = array![
            [1., 0.],
            [1., 1.],
            [1., 2.],
            [1., 3.],
        ];
        let bb = array![1., 3., 5., 6.];
        let xx = lstsq(&aa, &bb);
        assert_abs_diff_eq!(xx, array![1.2, 1.7], epsilon = 1e-10);
    }

    #[test]
    fn test_lstsq_minimum_norm() {
        let aa = array![[1., 1.]];
        assert_abs_diff_eq!(lstsq(&aa, &array![2.]), array![1., 1.], epsilon = 1e-12);

        // rank deficient: two identical columns share the weight
        let aa = array![
            [1., 1.],
            [1., 1.],
        ];
        assert_abs_diff_eq!(lstsq(&aa, &array![4., 6.]), array![2.5, 2.5], epsilon = 1e-10);
    }

    #[test]
    fn test_lstsq_empty() {
        let aa: Array2<f64> = Array2::zeros((2, 0));
        assert_eq!(lstsq(&aa, &array![1., 2.]).len(), 0);
        let aa: Array2<f64> = Array2::zeros((2, 3));
        assert_eq!(lstsq(&aa, &array![1., 2.]), Array1::<f64>::zeros(3));
    }
}
