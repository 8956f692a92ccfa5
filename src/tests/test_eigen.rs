use approx::assert_abs_diff_eq;
use rand::Rng;

use crate::eigen::{compute_eigendecomposition, compute_eigendecomposition_with, Eigendecomposition};
use crate::tests::test_helpers::{mat_mul, seeded_rng, transpose};
use crate::Matrix3;

fn assert_matrix_close(a: &Matrix3, b: &Matrix3, tol: f64) {
    for r in 0..3 {
        for c in 0..3 {
            assert_abs_diff_eq!(a[r][c], b[r][c], epsilon = tol);
        }
    }
}

fn assert_orthonormal(e: &Eigendecomposition) {
    let v = e.basis();
    let vtv = mat_mul(&transpose(&v), &v);
    let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    assert_matrix_close(&vtv, &identity, 1e-9);
}

fn random_symmetric(rng: &mut rand_chacha::ChaCha8Rng, scale: f64) -> Matrix3 {
    let mut m = [[0.0; 3]; 3];
    for r in 0..3 {
        for c in r..3 {
            let x = rng.random_range(-scale..scale);
            m[r][c] = x;
            m[c][r] = x;
        }
    }
    m
}

#[test]
fn test_diagonal_matrix() {
    let e = compute_eigendecomposition(&[[3.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]]);
    assert_abs_diff_eq!(e.eigenvalues[0], 3.0, epsilon = 1e-6);
    assert_abs_diff_eq!(e.eigenvalues[1], 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(e.eigenvalues[2], 1.0, epsilon = 1e-6);
    for k in 0..3 {
        // standard basis up to sign
        assert_abs_diff_eq!(e.eigenvectors[k][k].abs(), 1.0, epsilon = 1e-6);
    }
    assert_eq!(e.sweeps, 0);
}

#[test]
fn test_unsorted_diagonal_is_sorted() {
    let e = compute_eigendecomposition(&[[1.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 3.0]]);
    assert_eq!(e.eigenvalues, [5.0, 3.0, 1.0]);
    assert_abs_diff_eq!(e.eigenvectors[0][1].abs(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(e.eigenvectors[1][2].abs(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(e.eigenvectors[2][0].abs(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_known_coupled_matrix() {
    // eigenvalues 3 (along (1,1,0)/√2), 1 (along (1,-1,0)/√2) and 4 (along z)
    let e = compute_eigendecomposition(&[[2.0, 1.0, 0.0], [1.0, 2.0, 0.0], [0.0, 0.0, 4.0]]);
    assert_abs_diff_eq!(e.eigenvalues[0], 4.0, epsilon = 1e-9);
    assert_abs_diff_eq!(e.eigenvalues[1], 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(e.eigenvalues[2], 1.0, epsilon = 1e-9);

    let h = 1.0 / 2.0_f64.sqrt();
    let v1 = e.eigenvectors[1];
    assert_abs_diff_eq!((v1[0] * h + v1[1] * h).abs(), 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(e.eigenvectors[0][2].abs(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_reconstruction_random_matrices() {
    let mut rng = seeded_rng(101);
    for _ in 0..200 {
        let m = random_symmetric(&mut rng, 10.0);
        let e = compute_eigendecomposition(&m);
        assert_matrix_close(&e.reconstruct(), &m, 1e-6);
        assert_orthonormal(&e);
        assert!(e.eigenvalues[0] >= e.eigenvalues[1]);
        assert!(e.eigenvalues[1] >= e.eigenvalues[2]);
    }
}

#[test]
fn test_eigen_equation_holds() {
    let mut rng = seeded_rng(102);
    for _ in 0..50 {
        let m = random_symmetric(&mut rng, 3.0);
        let e = compute_eigendecomposition(&m);
        for k in 0..3 {
            let v = e.eigenvectors[k];
            for r in 0..3 {
                let mv: f64 = (0..3).map(|c| m[r][c] * v[c]).sum();
                assert_abs_diff_eq!(mv, e.eigenvalues[k] * v[r], epsilon = 1e-6);
            }
        }
    }
}

#[test]
fn test_covariance_like_matrices() {
    // near-singular: rank one plus tiny regularisation
    let u = [0.3, -0.5, 0.8];
    let mut m = [[0.0; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            m[r][c] = u[r] * u[c] + if r == c { 1e-6 } else { 0.0 };
        }
    }
    let e = compute_eigendecomposition(&m);
    assert_matrix_close(&e.reconstruct(), &m, 1e-6);
    assert_abs_diff_eq!(e.eigenvalues[0], 0.98 + 1e-6, epsilon = 1e-9);
    assert_abs_diff_eq!(e.eigenvalues[2], 1e-6, epsilon = 1e-9);
}

#[test]
fn test_only_upper_triangle_is_read() {
    let upper = [[2.0, 1.0, 0.5], [1.0, 3.0, -0.2], [0.5, -0.2, 1.0]];
    let mut skewed = upper;
    skewed[1][0] = 100.0;
    skewed[2][0] = -7.0;
    skewed[2][1] = 42.0;
    assert_eq!(
        compute_eigendecomposition(&upper),
        compute_eigendecomposition(&skewed)
    );
}

#[test]
fn test_repeated_eigenvalues() {
    let e = compute_eigendecomposition(&[[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]]);
    assert_eq!(e.eigenvalues, [2.0, 2.0, 2.0]);
    assert_orthonormal(&e);

    let zero = compute_eigendecomposition(&[[0.0; 3]; 3]);
    assert_eq!(zero.eigenvalues, [0.0, 0.0, 0.0]);
    assert_orthonormal(&zero);
}

#[test]
fn test_non_finite_entries_are_contained() {
    let e = compute_eigendecomposition(&[
        [f64::NAN, 1.0, 0.0],
        [1.0, 2.0, f64::INFINITY],
        [0.0, f64::INFINITY, 1.0],
    ]);
    assert!(e.eigenvalues.iter().all(|x| x.is_finite()));
    assert!(e.eigenvectors.iter().flatten().all(|x| x.is_finite()));
    assert_orthonormal(&e);
}

#[test]
fn test_zero_budget_returns_sorted_diagonal() {
    let m = [[1.0, 0.5, 0.0], [0.5, 3.0, 0.0], [0.0, 0.0, 2.0]];
    let e = compute_eigendecomposition_with(&m, 0, 1e-10);
    assert_eq!(e.sweeps, 0);
    assert_eq!(e.eigenvalues, [3.0, 2.0, 1.0]);
}

#[test]
fn test_deterministic() {
    let m = [[4.0, -1.0, 0.3], [-1.0, 2.0, 0.7], [0.3, 0.7, 5.0]];
    assert_eq!(compute_eigendecomposition(&m), compute_eigendecomposition(&m));
}
