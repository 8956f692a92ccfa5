use approx::assert_relative_eq;

use crate::similarity::{cosine_similarity, SimilarityMatrix};
use crate::tests::test_helpers::{gaussian_vectors, seeded_rng};

#[test]
fn test_cosine_basic_angles() {
    assert_relative_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0, epsilon = 1e-12);
    assert_relative_eq!(cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]), 1.0, epsilon = 1e-12);
    assert_relative_eq!(
        cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]),
        -1.0,
        epsilon = 1e-12
    );
    let s = cosine_similarity(&[1.0, 0.0], &[1.0, 1.0]);
    assert_relative_eq!(s, 1.0 / 2.0_f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn test_cosine_zero_vector_is_neutral() {
    assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
}

#[test]
fn test_cosine_degenerate_inputs_are_neutral() {
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    assert_eq!(cosine_similarity(&[f64::NAN, 1.0], &[1.0, 1.0]), 0.0);
    assert_eq!(cosine_similarity(&[1.0, 1.0], &[f64::INFINITY, 1.0]), 0.0);
}

#[test]
fn test_cosine_huge_magnitudes_do_not_overflow() {
    let a = [1e300, 1e300, 0.0];
    let b = [2e300, 2e300, 0.0];
    assert_relative_eq!(cosine_similarity(&a, &b), 1.0, epsilon = 1e-12);

    let c = [1e300, -1e300, 0.0];
    assert_relative_eq!(cosine_similarity(&a, &c), 0.0, epsilon = 1e-12);
}

#[test]
fn test_cosine_tiny_magnitudes() {
    let a = [1e-300, 2e-300];
    let b = [2e-300, 4e-300];
    assert_relative_eq!(cosine_similarity(&a, &b), 1.0, epsilon = 1e-12);
}

#[test]
fn test_cosine_always_in_range() {
    let mut rng = seeded_rng(7);
    let vectors = gaussian_vectors(&mut rng, 40, 12);
    for a in &vectors {
        for b in &vectors {
            let s = cosine_similarity(a, b);
            assert!((-1.0..=1.0).contains(&s), "similarity {s} out of range");
        }
    }
}

#[test]
fn test_matrix_symmetric_with_unit_diagonal() {
    let mut rng = seeded_rng(11);
    let vectors = gaussian_vectors(&mut rng, 9, 16);
    let m = SimilarityMatrix::compute(&vectors);

    assert_eq!(m.len(), 9);
    for i in 0..9 {
        assert_eq!(m.get(i, i), 1.0);
        for j in 0..9 {
            assert_eq!(m.get(i, j), m.get(j, i));
            if i != j {
                assert_eq!(m.get(i, j), cosine_similarity(&vectors[i], &vectors[j]));
            }
        }
    }
}

#[test]
fn test_matrix_zero_vectors_have_unit_diagonal_and_zero_off_diagonal() {
    let m = SimilarityMatrix::compute(&[vec![0.0; 4], vec![0.0; 4], vec![1.0, 0.0, 0.0, 0.0]]);
    assert_eq!(m.get(0, 0), 1.0);
    assert_eq!(m.get(0, 1), 0.0);
    assert_eq!(m.get(1, 2), 0.0);
}

#[test]
fn test_matrix_empty_and_stats() {
    let empty = SimilarityMatrix::compute(&[]);
    assert!(empty.is_empty());
    assert_eq!(empty.off_diagonal_stats(), (0.0, 0.0, 0.0));

    let m = SimilarityMatrix::compute(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]]);
    let (min, max, mean) = m.off_diagonal_stats();
    assert_relative_eq!(min, -1.0, epsilon = 1e-12);
    assert_relative_eq!(max, 0.0, epsilon = 1e-12);
    assert_relative_eq!(mean, -1.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn test_matrix_is_reproducible() {
    let mut rng = seeded_rng(3);
    let vectors = gaussian_vectors(&mut rng, 25, 64);
    assert_eq!(
        SimilarityMatrix::compute(&vectors),
        SimilarityMatrix::compute(&vectors)
    );
}
