//! Integration tests for braingsp-core.
//!
//! These tests walk the full pipeline:
//! adjacency → Laplacian → decomposition → surrogates → SDI → significance.

use braingsp_core::{
    GspError, Structure, Tail, TestMethod, compute_laplacian, create_surrogates, decompose,
    graph_filter, graph_fourier_transform, gsdi, median_cut, normalize_timeseries, random_sign,
    sc_informed, sc_uninformed, sdi, surrogate_sdi, symmetric_normalized, test_significance,
};
use ndarray::{Array2, Array3, ArrayD, Axis, IxDyn, Slice, array};

fn modular_graph() -> Array2<f64> {
    // Two triangles joined by one weak edge.
    let mut adj = Array2::<f64>::zeros((6, 6));
    for &(i, j, w) in &[
        (0, 1, 1.0),
        (0, 2, 0.8),
        (1, 2, 0.9),
        (3, 4, 1.0),
        (3, 5, 0.7),
        (4, 5, 1.1),
        (2, 3, 0.1),
    ] {
        adj[[i, j]] = w;
        adj[[j, i]] = w;
    }
    adj
}

fn synthetic_timeseries(n_nodes: usize, n_t: usize, phase: f64) -> Array2<f64> {
    Array2::from_shape_fn((n_nodes, n_t), |(n, t)| {
        ((n + 1) as f64 * 0.37 * t as f64 + phase).sin() + 0.2 * (t as f64 * 1.3 + n as f64).cos()
    })
}

#[test]
fn two_node_scenario() {
    let basis = decompose(&array![[1.0, -1.0], [-1.0, 1.0]]).unwrap();
    assert!(basis.eigenvalues[0].abs() < 1e-12);
    assert!((basis.eigenvalues[1] - 2.0).abs() < 1e-12);
    let inv_sqrt2 = 1.0 / 2.0f64.sqrt();
    assert!((basis.eigenvectors[[0, 0]].abs() - inv_sqrt2).abs() < 1e-12);
    assert!((basis.eigenvectors[[1, 0]].abs() - inv_sqrt2).abs() < 1e-12);

    let ts = array![[1.0, 2.0, 3.0, 4.0], [0.5, -1.0, 0.0, 2.5]];
    let surr = create_surrogates(&ts, &basis.eigenvectors, 3, Some(2), true).unwrap();
    assert_eq!(surr.shape(), &[2, 4, 4]);
    let last = surr.index_axis(Axis(2), 3);
    for (a, b) in last.iter().zip(ts.iter()) {
        assert!((a - b).abs() < 1e-6, "{a} vs {b}");
    }
}

#[test]
fn surrogates_reproducible_per_seed() {
    let lapl = compute_laplacian(&modular_graph()).unwrap();
    let ts = synthetic_timeseries(6, 30, 0.0);
    let a = sc_informed(&ts, Structure::laplacian(&lapl), 20, Some(42), true).unwrap();
    let b = sc_informed(&ts, Structure::laplacian(&lapl), 20, Some(42), true).unwrap();
    assert_eq!(a, b);
    let c = sc_informed(&ts, Structure::laplacian(&lapl), 20, Some(43), true).unwrap();
    assert_ne!(a, c);
}

#[test]
fn sign_flips_keep_reference_slice() {
    let basis = decompose(&symmetric_normalized(&modular_graph()).unwrap()).unwrap();
    let flipped = random_sign(&basis.eigenvectors, 8, Some(5), true).unwrap();
    assert_eq!(flipped.shape(), &[6, 6, 9]);
    assert_eq!(flipped.index_axis(Axis(2), 8), basis.eigenvectors.view().into_dyn());
    for i in 0..8 {
        let slice = flipped.index_axis(Axis(2), i);
        for (a, b) in slice.iter().zip(basis.eigenvectors.iter()) {
            assert_eq!(a.abs(), b.abs());
        }
    }
}

#[test]
fn surrogates_preserve_spectral_power() {
    let basis = decompose(&compute_laplacian(&modular_graph()).unwrap()).unwrap();
    let ts = synthetic_timeseries(6, 25, 0.4);
    let surr = create_surrogates(&ts, &basis.eigenvectors, 10, Some(7), false).unwrap();
    let coeff = graph_fourier_transform(&ts, &basis.eigenvectors, false).unwrap();
    for slice in surr.axis_iter(Axis(2)) {
        let sc = graph_fourier_transform(&slice, &basis.eigenvectors, false).unwrap();
        for (a, b) in sc.iter().zip(coeff.iter()) {
            assert!((a.abs() - b.abs()).abs() < 1e-9);
        }
    }
}

#[test]
fn uninformed_surrogates_have_expected_shape() {
    let lapl = symmetric_normalized(&modular_graph()).unwrap();
    let ts = Array3::from_shape_fn((6, 20, 3), |(n, t, s)| {
        ((n + s + 1) as f64 * 0.21 * t as f64).cos()
    });
    let surr = sc_uninformed(&ts, &lapl, 4, None, true).unwrap();
    assert_eq!(surr.shape(), &[6, 20, 3, 5]);
}

#[test]
fn rejects_unsupported_ranks_with_counts() {
    let basis = decompose(&compute_laplacian(&modular_graph()).unwrap()).unwrap();
    let ts4 = ArrayD::<f64>::zeros(IxDyn(&[6, 2, 2, 2]));
    let err = create_surrogates(&ts4, &basis.eigenvectors, 2, Some(1), true).unwrap_err();
    assert!(matches!(err, GspError::UnsupportedRank(_)));
    assert!(err.to_string().contains("timeseries of 4 dimensions"));

    let err = random_sign(&Array3::<f64>::zeros((2, 2, 2)), 2, Some(1), true).unwrap_err();
    assert!(err.to_string().contains("3 dimensions"));
}

#[test]
fn unknown_method_is_rejected() {
    let err = "Baobab".parse::<TestMethod>().unwrap_err();
    assert!(matches!(err, GspError::UnsupportedMethod(_)));
    assert!(err.to_string().contains("Other testing methods"));
}

#[test]
fn full_sdi_workflow() {
    let adj = modular_graph();
    let basis = decompose(&symmetric_normalized(&adj).unwrap()).unwrap();
    let n_sub = 4;
    let mut ts = Array3::<f64>::zeros((6, 40, n_sub));
    for s in 0..n_sub {
        ts.index_axis_mut(Axis(2), s)
            .assign(&synthetic_timeseries(6, 40, s as f64 * 0.5));
    }
    let ts = normalize_timeseries(&ts).unwrap();

    let coeff = graph_fourier_transform(&ts.index_axis(Axis(2), 0), &basis.eigenvectors, false)
        .unwrap();
    let cut = median_cut(&coeff, &basis.eigenvectors).unwrap();
    assert!(cut.n_low >= 1 && cut.n_low <= 6);

    let lo = graph_filter(&ts, &basis.eigenvectors, &cut.low).unwrap();
    let hi = graph_filter(&ts, &basis.eigenvectors, &cut.high).unwrap();
    let observed = sdi(&lo, &hi, false).unwrap();
    assert_eq!(observed.shape(), &[6, n_sub]);
    assert_eq!(gsdi(&observed).unwrap().shape(), &[6]);

    let surr = sc_informed(&ts, Structure::from(&basis), 50, Some(42), true).unwrap();
    let null = surrogate_sdi(&surr, &basis.eigenvectors, &cut.low, &cut.high, false).unwrap();
    assert_eq!(null.shape(), &[6, n_sub, 51]);

    let freq = test_significance(&null, None, TestMethod::Frequentist, Tail::Two, 0.05).unwrap();
    assert_eq!(freq.p_values.shape(), &[6, n_sub]);
    assert!(freq.p_values.iter().all(|&p| (0.0..=1.0).contains(&p)));

    let group = test_significance(&null, None, TestMethod::Bernoulli, Tail::Two, 0.05).unwrap();
    assert_eq!(group.significant.shape(), &[6]);
    let masked = group.masked(&observed).unwrap();
    assert_eq!(masked.shape(), &[6]);

    // Supplying the stacked reference explicitly gives the same ranking.
    let explicit = test_significance(
        &null.slice_axis(Axis(2), Slice::from(0..50)),
        Some(null.index_axis(Axis(2), 50)),
        TestMethod::Frequentist,
        Tail::Two,
        0.05,
    )
    .unwrap();
    for (a, b) in explicit.p_values.iter().zip(freq.p_values.iter()) {
        assert_eq!(a, b);
    }
}
