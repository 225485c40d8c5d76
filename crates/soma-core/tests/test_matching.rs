use nalgebra::DMatrix;

use soma_core::search::match_components;

fn trace(kind: usize, t: usize, len: usize) -> f64 {
    let phase = std::f64::consts::TAU * t as f64 / len as f64;
    match kind {
        0 => phase.sin(),
        1 => phase.cos(),
        _ => t as f64 / len as f64,
    }
}

fn three_traces(len: usize) -> DMatrix<f64> {
    DMatrix::from_fn(3, len, |i, j| trace(i, j, len))
}

#[test]
fn test_identical_sets_score_one() {
    let a = three_traces(50);
    let matched = match_components(&a, &a).unwrap();

    assert!(matched.mean_correlation > 0.999);
    for (i, pair) in matched.pairs.iter().enumerate() {
        assert_eq!(pair.index_a, i);
        assert_eq!(pair.index_b, i);
        assert!(pair.correlation > 0.999);
    }
}

#[test]
fn test_matching_survives_permutation_scale_and_sign() {
    let len = 50;
    let a = three_traces(len);

    // b reorders a's rows and applies arbitrary affine distortions:
    // row 0 = -2 * ramp, row 1 = 0.5 * sin, row 2 = -cos.
    let b = DMatrix::from_fn(3, len, |i, j| match i {
        0 => -2.0 * trace(2, j, len),
        1 => 0.5 * trace(0, j, len),
        _ => -trace(1, j, len),
    });

    let matched = match_components(&a, &b).unwrap();
    assert!(matched.mean_correlation > 0.999, "mean = {}", matched.mean_correlation);

    let assignment: Vec<usize> = matched.pairs.iter().map(|p| p.index_b).collect();
    assert_eq!(assignment, vec![1, 2, 0]);
    for pair in &matched.pairs {
        assert!(pair.correlation > 0.999);
    }
}

#[test]
fn test_constant_trace_scores_zero() {
    let len = 20;
    let a = DMatrix::from_fn(2, len, |i, j| match i {
        0 => trace(0, j, len),
        _ => 1.0,
    });

    let matched = match_components(&a, &a).unwrap();
    assert!(matched.pairs[0].correlation > 0.999);
    assert_eq!(matched.pairs[1].correlation, 0.0);
}

#[test]
fn test_mismatched_sets_rejected() {
    let a = three_traces(50);

    let fewer = DMatrix::<f64>::zeros(2, 50);
    assert!(match_components(&a, &fewer).is_err());

    let shorter = DMatrix::<f64>::zeros(3, 30);
    assert!(match_components(&a, &shorter).is_err());

    let empty = DMatrix::<f64>::zeros(0, 50);
    assert!(match_components(&empty, &empty).is_err());
}
