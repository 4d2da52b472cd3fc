//! Timeseries preparation and spectral filtering.
//!
//! All operations take node-first arrays: `(N, T)` timeseries or `(N, T, S)`
//! subject batches.

use ndarray::{
    Array1, Array2, ArrayBase, ArrayD, ArrayView2, ArrayViewD, Axis, Data, Dimension, Ix2,
};
use serde::Serialize;

use crate::error::{GspError, Result, fmt_shape};
use crate::transform::{basis_view, forward, inverse};

/// Z-score every node along the time axis.
///
/// Uses the population standard deviation. Nodes with zero variance become
/// all zeros.
pub fn normalize_timeseries<S, D>(timeseries: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let ts = timeseries.view().into_dyn();
    check_rank("timeseries", &ts)?;
    let t_axis = Axis(1);
    let n_t = ts.shape()[1];
    if n_t == 0 {
        return Err(GspError::Shape("timeseries has no timepoints".into()));
    }

    let mut out = ts.to_owned();
    for mut lane in out.lanes_mut(t_axis) {
        let mean = lane.sum() / n_t as f64;
        let var = lane.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n_t as f64;
        let std = var.sqrt();
        if std > 0.0 {
            lane.mapv_inplace(|v| (v - mean) / std);
        } else {
            lane.fill(0.0);
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Median cut
// ---------------------------------------------------------------------------

/// Low- and high-frequency halves of an eigenvector basis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedianCut {
    /// Basis with every column above the cut zeroed.
    pub low: Array2<f64>,
    /// Basis with every column up to and including the cut zeroed.
    pub high: Array2<f64>,
    /// Number of columns kept in `low`.
    pub n_low: usize,
    /// Mean spectral power per eigenvector.
    pub power: Array1<f64>,
}

/// Split a basis where the cumulative spectral power reaches half its total.
///
/// `coefficients` are graph Fourier coefficients `(N, T)` or `(N, T, S)`;
/// power is averaged over time and subjects. The cut index is the first
/// eigenvector whose cumulative power is closest to half the total.
pub fn median_cut<S1, D1, S2, D2>(
    coefficients: &ArrayBase<S1, D1>,
    eigenvectors: &ArrayBase<S2, D2>,
) -> Result<MedianCut>
where
    S1: Data<Elem = f64>,
    D1: Dimension,
    S2: Data<Elem = f64>,
    D2: Dimension,
{
    let coeff = coefficients.view().into_dyn();
    check_rank("spectral coefficients", &coeff)?;
    let evec = basis_view(eigenvectors)?;
    if coeff.shape()[0] != evec.ncols() {
        return Err(GspError::Shape(format!(
            "coefficients of shape {} do not match eigenvector matrix of shape {}",
            fmt_shape(coeff.shape()),
            fmt_shape(evec.shape())
        )));
    }

    let per_node = coeff.mapv(|c| c * c);
    let samples = per_node.len() / per_node.shape()[0].max(1);
    if samples == 0 {
        return Err(GspError::Shape("spectral coefficients have no samples".into()));
    }
    let power = Array1::from_iter(
        per_node
            .outer_iter()
            .map(|node| node.sum() / samples as f64),
    );
    let total = power.sum();
    if total <= 0.0 {
        return Err(GspError::DegenerateGraph(
            "median cut of a signal with zero spectral power".into(),
        ));
    }

    let half = total / 2.0;
    let mut cumulative = 0.0;
    let mut cut = 0;
    let mut best = f64::INFINITY;
    for (k, p) in power.iter().enumerate() {
        cumulative += p;
        let dist = (cumulative - half).abs();
        if dist < best {
            best = dist;
            cut = k;
        }
    }
    let n_low = cut + 1;
    log::debug!("median cut keeps {n_low} of {} eigenvectors in the low band", power.len());

    let mut low = evec.to_owned();
    let mut high = evec.to_owned();
    for (k, (mut lo, mut hi)) in low
        .axis_iter_mut(Axis(1))
        .zip(high.axis_iter_mut(Axis(1)))
        .enumerate()
    {
        if k < n_low {
            hi.fill(0.0);
        } else {
            lo.fill(0.0);
        }
    }

    Ok(MedianCut {
        low,
        high,
        n_low,
        power,
    })
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Filter `timeseries` through `filter_basis · (Vᵀ · x)`.
///
/// With `filter_basis` one of the halves of a [`MedianCut`] this isolates the
/// low- or high-frequency part of the signal.
pub fn graph_filter<S1, D1, S2, D2, S3, D3>(
    timeseries: &ArrayBase<S1, D1>,
    eigenvectors: &ArrayBase<S2, D2>,
    filter_basis: &ArrayBase<S3, D3>,
) -> Result<ArrayD<f64>>
where
    S1: Data<Elem = f64>,
    D1: Dimension,
    S2: Data<Elem = f64>,
    D2: Dimension,
    S3: Data<Elem = f64>,
    D3: Dimension,
{
    let ts = timeseries.view().into_dyn();
    check_rank("timeseries", &ts)?;
    let evec = basis_view(eigenvectors)?;
    let filter = basis_view(filter_basis)?;
    if filter.dim() != evec.dim() {
        return Err(GspError::Shape(format!(
            "filter basis of shape {} does not match eigenvector matrix of shape {}",
            fmt_shape(filter.shape()),
            fmt_shape(evec.shape())
        )));
    }

    if ts.ndim() == 2 {
        return filter_one(ts, evec, filter);
    }
    let mut out = ArrayD::<f64>::zeros(ts.raw_dim());
    for (subject, mut slot) in ts.axis_iter(Axis(2)).zip(out.axis_iter_mut(Axis(2))) {
        slot.assign(&filter_one(subject, evec, filter)?);
    }
    Ok(out)
}

fn filter_one(
    ts: ArrayViewD<'_, f64>,
    evec: ArrayView2<'_, f64>,
    filter: ArrayView2<'_, f64>,
) -> Result<ArrayD<f64>> {
    let ts = ts
        .into_dimensionality::<Ix2>()
        .map_err(|e| GspError::Shape(format!("timeseries: {e}")))?;
    let coeff = forward(ts, evec)?;
    Ok(inverse(coeff.view(), filter)?.into_dyn())
}

fn check_rank(name: &str, arr: &ArrayViewD<'_, f64>) -> Result<()> {
    if arr.ndim() < 2 || arr.ndim() > 3 {
        return Err(GspError::UnsupportedRank(format!(
            "{name} has {} dimensions, only (nodes, time) or (nodes, time, subjects) are supported",
            arr.ndim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomposition::decompose;
    use crate::laplacian::compute_laplacian;
    use crate::transform::graph_fourier_transform;
    use ndarray::{Array3, array};

    fn path_basis() -> Array2<f64> {
        let adj = array![
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0]
        ];
        decompose(&compute_laplacian(&adj).unwrap()).unwrap().eigenvectors
    }

    #[test]
    fn test_normalize_zero_mean_unit_std() {
        let ts = array![[1.0, 2.0, 3.0, 4.0], [10.0, 10.0, 10.0, 10.0]];
        let z = normalize_timeseries(&ts).unwrap();
        let row = z.index_axis(Axis(0), 0);
        assert!(row.sum().abs() < 1e-12);
        let var = row.iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert!((var - 1.0).abs() < 1e-12);
        // Constant node.
        assert!(z.index_axis(Axis(0), 1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_normalize_subject_batch() {
        let ts = Array3::from_shape_fn((3, 5, 2), |(n, t, s)| (n * 7 + t * t + s * 3) as f64);
        let z = normalize_timeseries(&ts).unwrap();
        assert_eq!(z.shape(), &[3, 5, 2]);
        for lane in z.lanes(Axis(1)) {
            assert!(lane.sum().abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize_rejects_1d() {
        let err = normalize_timeseries(&array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, GspError::UnsupportedRank(_)));
    }

    #[test]
    fn test_median_cut_splits_basis() {
        let evec = path_basis();
        // Power 4, 1, 1, 2 -> cumulative 4 is exactly half of 8.
        let coeff = array![[2.0, -2.0], [1.0, 1.0], [1.0, -1.0], [2.0f64.sqrt(), 2.0f64.sqrt()]];
        let cut = median_cut(&coeff, &evec).unwrap();
        assert_eq!(cut.n_low, 1);
        assert!((cut.power[0] - 4.0).abs() < 1e-12);
        for i in 0..4 {
            assert_eq!(cut.low[[i, 0]], evec[[i, 0]]);
            assert_eq!(cut.high[[i, 0]], 0.0);
            for k in 1..4 {
                assert_eq!(cut.low[[i, k]], 0.0);
                assert_eq!(cut.high[[i, k]], evec[[i, k]]);
            }
        }
        // The halves sum back to the basis.
        assert_eq!(&cut.low + &cut.high, evec);
    }

    #[test]
    fn test_median_cut_rejects_zero_power() {
        let err = median_cut(&Array2::<f64>::zeros((4, 3)), &path_basis()).unwrap_err();
        assert!(matches!(err, GspError::DegenerateGraph(_)));
    }

    #[test]
    fn test_filters_sum_to_signal() {
        let evec = path_basis();
        let ts = array![[1.0, 0.5, -1.0], [2.0, 0.0, 1.0], [0.0, 3.0, 1.0], [-1.0, 1.0, 2.0]];
        let coeff = graph_fourier_transform(&ts, &evec, false).unwrap();
        let cut = median_cut(&coeff, &evec).unwrap();
        let low = graph_filter(&ts, &evec, &cut.low).unwrap();
        let high = graph_filter(&ts, &evec, &cut.high).unwrap();
        let total = &low + &high;
        for (a, b) in total.iter().zip(ts.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_filter_subject_batch_matches_single() {
        let evec = path_basis();
        let ts = Array3::from_shape_fn((4, 3, 2), |(n, t, s)| ((n + 1) * (t + 2)) as f64 - s as f64);
        let out = graph_filter(&ts, &evec, &evec).unwrap();
        for s in 0..2 {
            let single = graph_filter(&ts.index_axis(Axis(2), s), &evec, &evec).unwrap();
            assert_eq!(out.index_axis(Axis(2), s), single);
        }
    }

    #[test]
    fn test_filter_rejects_mismatched_basis() {
        let err = graph_filter(&Array2::<f64>::zeros((4, 3)), &path_basis(), &Array2::<f64>::eye(3))
            .unwrap_err();
        assert!(matches!(err, GspError::Shape(_)));
    }

    #[test]
    fn test_filter_rejects_mismatched_nodes() {
        let evec = path_basis();
        let err = graph_filter(&Array2::<f64>::ones((3, 5)), &evec, &evec).unwrap_err();
        assert!(matches!(err, GspError::Shape(_)));
    }

    #[test]
    fn test_filter_with_full_basis_is_identity() {
        let evec = path_basis();
        let ts = array![[1.0, -2.0], [0.5, 0.0], [3.0, 1.0], [-1.0, 4.0]];
        let out = graph_filter(&ts, &evec, &evec).unwrap();
        assert_eq!(out.shape(), &[4, 2]);
        for (a, b) in out.iter().zip(ts.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
