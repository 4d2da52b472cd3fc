//! Connectivity and structural decoupling metrics.

use ndarray::{Array1, Array2, ArrayBase, ArrayD, ArrayView2, Axis, Data, Dimension, IxDyn};

use crate::error::{GspError, Result, fmt_shape};
use crate::operations::graph_filter;
use crate::transform::basis_view;

/// Node-by-node Pearson correlation over time.
///
/// `(N, T)` gives `(N, N)`; `(N, T, S)` gives `(N, N, S)`. Constant nodes have
/// zero correlation with everything, themselves included.
pub fn functional_connectivity<S, D>(timeseries: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let ts = timeseries.view().into_dyn();
    match ts.ndim() {
        2 => {
            let mtx = ts
                .into_dimensionality::<ndarray::Ix2>()
                .map_err(|e| GspError::Shape(format!("timeseries: {e}")))?;
            Ok(pearson(mtx).into_dyn())
        }
        3 => {
            let (n, _, n_sub) = (ts.shape()[0], ts.shape()[1], ts.shape()[2]);
            let mut out = ArrayD::<f64>::zeros(IxDyn(&[n, n, n_sub]));
            for (subject, mut slot) in ts.axis_iter(Axis(2)).zip(out.axis_iter_mut(Axis(2))) {
                let mtx = subject
                    .into_dimensionality::<ndarray::Ix2>()
                    .map_err(|e| GspError::Shape(format!("timeseries: {e}")))?;
                slot.assign(&pearson(mtx));
            }
            Ok(out)
        }
        ndim => Err(GspError::UnsupportedRank(format!(
            "functional connectivity of a timeseries with {ndim} dimensions is not supported"
        ))),
    }
}

fn pearson(ts: ArrayView2<'_, f64>) -> Array2<f64> {
    let n_t = ts.ncols().max(1) as f64;
    let mean = ts.sum_axis(Axis(1)) / n_t;
    let centered = &ts - &mean.insert_axis(Axis(1));
    let norm: Array1<f64> = centered.map_axis(Axis(1), |row| row.dot(&row).sqrt());
    let cov = centered.dot(&centered.t());
    Array2::from_shape_fn(cov.dim(), |(i, j)| {
        let denom = norm[i] * norm[j];
        if denom > 0.0 { cov[[i, j]] / denom } else { 0.0 }
    })
}

// ---------------------------------------------------------------------------
// Structural decoupling
// ---------------------------------------------------------------------------

/// Structural decoupling index: `‖x_high‖ / ‖x_low‖` per node over time.
///
/// `(N, T)` inputs give `(N)`, `(N, T, S)` inputs give `(N, S)`. With `log2`
/// the ratio is returned on a base-2 logarithmic scale.
pub fn sdi<S1, D1, S2, D2>(
    ts_low: &ArrayBase<S1, D1>,
    ts_high: &ArrayBase<S2, D2>,
    log2: bool,
) -> Result<ArrayD<f64>>
where
    S1: Data<Elem = f64>,
    D1: Dimension,
    S2: Data<Elem = f64>,
    D2: Dimension,
{
    if ts_low.shape() != ts_high.shape() {
        return Err(GspError::Shape(format!(
            "low-frequency timeseries of shape {} and high-frequency timeseries of shape {} differ",
            fmt_shape(ts_low.shape()),
            fmt_shape(ts_high.shape())
        )));
    }
    if ts_low.ndim() < 2 || ts_low.ndim() > 3 {
        return Err(GspError::UnsupportedRank(format!(
            "structural decoupling of timeseries with {} dimensions is not supported",
            ts_low.ndim()
        )));
    }

    let low = ts_low.view().into_dyn();
    let high = ts_high.view().into_dyn();
    let norm_low = low.map_axis(Axis(1), |lane| lane.dot(&lane).sqrt());
    let norm_high = high.map_axis(Axis(1), |lane| lane.dot(&lane).sqrt());

    let zeros = norm_low.iter().filter(|&&v| v == 0.0).count();
    if zeros > 0 {
        return Err(GspError::DegenerateGraph(format!(
            "{zeros} node(s) have no low-frequency energy, decoupling is undefined"
        )));
    }
    let ratio = norm_high / norm_low;
    Ok(if log2 { ratio.mapv(f64::log2) } else { ratio })
}

/// Group-level SDI: the mean of a `(N, S)` SDI over subjects. A 1D SDI is
/// returned unchanged.
pub fn gsdi<S, D>(sdi: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let sdi = sdi.view().into_dyn();
    match sdi.ndim() {
        1 => Ok(sdi.to_owned()),
        2 => sdi
            .mean_axis(Axis(1))
            .ok_or_else(|| GspError::Shape("SDI has no subjects to average".into())),
        ndim => Err(GspError::UnsupportedRank(format!(
            "SDI has {ndim} dimensions, expected (nodes) or (nodes, subjects)"
        ))),
    }
}

/// SDI of every surrogate slice, stacked along a new last axis.
///
/// `surrogates` carries the surrogate index last, as produced by
/// [`crate::surrogates::create_surrogates`]. The result feeds straight into
/// [`crate::significance::test_significance`].
pub fn surrogate_sdi<S1, D1, S2, D2, S3, D3, S4, D4>(
    surrogates: &ArrayBase<S1, D1>,
    eigenvectors: &ArrayBase<S2, D2>,
    low: &ArrayBase<S3, D3>,
    high: &ArrayBase<S4, D4>,
    log2: bool,
) -> Result<ArrayD<f64>>
where
    S1: Data<Elem = f64>,
    D1: Dimension,
    S2: Data<Elem = f64>,
    D2: Dimension,
    S3: Data<Elem = f64>,
    D3: Dimension,
    S4: Data<Elem = f64>,
    D4: Dimension,
{
    let surr = surrogates.view().into_dyn();
    if surr.ndim() < 3 || surr.ndim() > 4 {
        return Err(GspError::UnsupportedRank(format!(
            "surrogate array has {} dimensions, expected (nodes, time, [subjects,] surrogates)",
            surr.ndim()
        )));
    }
    let evec = basis_view(eigenvectors)?;
    let low = basis_view(low)?;
    let high = basis_view(high)?;

    let last = Axis(surr.ndim() - 1);
    let n_surr = surr.len_of(last);
    log::debug!("computing SDI for {n_surr} surrogate slice(s)");

    let mut slices = Vec::with_capacity(n_surr);
    for slice in surr.axis_iter(last) {
        let lo = graph_filter(&slice, &evec, &low)?;
        let hi = graph_filter(&slice, &evec, &high)?;
        slices.push(sdi(&lo, &hi, log2)?.insert_axis(Axis(slice.ndim() - 1)));
    }
    let views: Vec<_> = slices.iter().map(|s| s.view()).collect();
    ndarray::concatenate(Axis(surr.ndim() - 2), &views)
        .map_err(|e| GspError::Shape(format!("stacking surrogate SDI: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomposition::decompose;
    use crate::laplacian::compute_laplacian;
    use crate::operations::median_cut;
    use crate::surrogates::create_surrogates;
    use crate::transform::graph_fourier_transform;
    use ndarray::{Array3, array};

    #[test]
    fn test_fc_perfect_correlations() {
        let ts = array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [3.0, 2.0, 1.0]];
        let fc = functional_connectivity(&ts).unwrap();
        assert_eq!(fc.shape(), &[3, 3]);
        assert!((fc[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((fc[[0, 2]] + 1.0).abs() < 1e-12);
        for i in 0..3 {
            assert!((fc[[i, i]] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_fc_constant_node_is_zero() {
        let ts = array![[1.0, 2.0, 3.0], [5.0, 5.0, 5.0]];
        let fc = functional_connectivity(&ts).unwrap();
        assert_eq!(fc[[0, 1]], 0.0);
        assert_eq!(fc[[1, 1]], 0.0);
    }

    #[test]
    fn test_fc_subject_batch() {
        let ts = Array3::from_shape_fn((3, 6, 2), |(n, t, s)| ((n + 1) * t) as f64 + (s * n) as f64);
        let fc = functional_connectivity(&ts).unwrap();
        assert_eq!(fc.shape(), &[3, 3, 2]);
    }

    #[test]
    fn test_sdi_ratio_and_log() {
        let low = array![[3.0, 4.0], [1.0, 0.0]];
        let high = array![[6.0, 8.0], [0.0, 2.0]];
        let ratio = sdi(&low, &high, false).unwrap();
        assert_eq!(ratio, array![2.0, 2.0].into_dyn());
        let logged = sdi(&low, &high, true).unwrap();
        assert!((logged[[0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sdi_subject_axis() {
        let low = Array3::from_elem((2, 4, 3), 1.0);
        let high = Array3::from_elem((2, 4, 3), 0.5);
        let out = sdi(&low, &high, false).unwrap();
        assert_eq!(out.shape(), &[2, 3]);
        assert!(out.iter().all(|&v| (v - 0.5).abs() < 1e-12));
        let group = gsdi(&out).unwrap();
        assert_eq!(group.shape(), &[2]);
    }

    #[test]
    fn test_sdi_zero_low_energy() {
        let low = array![[0.0, 0.0], [1.0, 1.0]];
        let err = sdi(&low, &low, false).unwrap_err();
        assert!(matches!(err, GspError::DegenerateGraph(_)));
    }

    #[test]
    fn test_sdi_shape_mismatch() {
        let err = sdi(&Array2::<f64>::ones((2, 3)), &Array2::<f64>::ones((2, 4)), false).unwrap_err();
        assert!(matches!(err, GspError::Shape(_)));
    }

    #[test]
    fn test_surrogate_sdi_last_slice_is_observed() {
        let adj = array![
            [0.0, 1.0, 0.5, 0.0],
            [1.0, 0.0, 1.0, 0.2],
            [0.5, 1.0, 0.0, 1.0],
            [0.0, 0.2, 1.0, 0.0]
        ];
        let basis = decompose(&compute_laplacian(&adj).unwrap()).unwrap();
        let ts = Array2::from_shape_fn((4, 12), |(n, t)| ((n + 1) as f64 * t as f64 * 0.7).sin() + n as f64);
        let coeff = graph_fourier_transform(&ts, &basis.eigenvectors, false).unwrap();
        let cut = median_cut(&coeff, &basis.eigenvectors).unwrap();

        let surr = create_surrogates(&ts, &basis.eigenvectors, 5, Some(3), true).unwrap();
        let stacked = surrogate_sdi(&surr, &basis.eigenvectors, &cut.low, &cut.high, false).unwrap();
        assert_eq!(stacked.shape(), &[4, 6]);

        let lo = graph_filter(&ts, &basis.eigenvectors, &cut.low).unwrap();
        let hi = graph_filter(&ts, &basis.eigenvectors, &cut.high).unwrap();
        let observed = sdi(&lo, &hi, false).unwrap();
        for n in 0..4 {
            assert!((stacked[[n, 5]] - observed[[n]]).abs() < 1e-6);
        }
    }
}
