//! Graph Fourier transform.
//!
//! With an orthonormal basis `V` the forward projection is `Vᵀ · x` and the
//! inverse reconstruction is `V · x̂`. One function serves both directions
//! through the `transpose` flag.

use ndarray::{Array2, ArrayBase, ArrayD, ArrayView2, Data, Dimension, Ix1, Ix2};

use crate::error::{GspError, Result, fmt_shape};

/// Project `signal` into (`transpose = false`) or out of (`transpose = true`)
/// the spectral domain spanned by the columns of `eigenvectors`.
///
/// `signal` is 1D `(N)` or 2D `(N, T)` with the node axis first; the result
/// has the same shape.
pub fn graph_fourier_transform<S1, D1, S2, D2>(
    signal: &ArrayBase<S1, D1>,
    eigenvectors: &ArrayBase<S2, D2>,
    transpose: bool,
) -> Result<ArrayD<f64>>
where
    S1: Data<Elem = f64>,
    D1: Dimension,
    S2: Data<Elem = f64>,
    D2: Dimension,
{
    if signal.ndim() > 2 || signal.ndim() == 0 {
        return Err(GspError::UnsupportedRank(format!(
            "graph Fourier transform signal has {} dimensions, only 1D or 2D signals are supported",
            signal.ndim()
        )));
    }
    let evec = basis_view(eigenvectors)?;
    let n_nodes = signal.shape()[0];
    if n_nodes != evec.nrows() {
        return Err(GspError::Shape(format!(
            "signal of shape {} has {n_nodes} nodes but the eigenvector matrix of shape {} has {}",
            fmt_shape(signal.shape()),
            fmt_shape(evec.shape()),
            evec.nrows()
        )));
    }

    let op = if transpose { evec } else { evec.reversed_axes() };
    let sig = signal.view();
    let out = if let Ok(vector) = sig.clone().into_dimensionality::<Ix1>() {
        op.dot(&vector).into_dyn()
    } else {
        let mtx = sig
            .into_dimensionality::<Ix2>()
            .map_err(|e| GspError::Shape(format!("signal: {e}")))?;
        op.dot(&mtx).into_dyn()
    };
    Ok(out)
}

/// Forward transform of a `(N, T)` signal: `Vᵀ · x`.
pub fn forward(signal: ArrayView2<'_, f64>, eigenvectors: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    check_nodes(signal.nrows(), eigenvectors.nrows())?;
    Ok(eigenvectors.t().dot(&signal))
}

/// Inverse transform of `(N, T)` spectral coefficients: `V · x̂`.
pub fn inverse(coefficients: ArrayView2<'_, f64>, eigenvectors: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    check_nodes(coefficients.nrows(), eigenvectors.ncols())?;
    Ok(eigenvectors.dot(&coefficients))
}

pub(crate) fn basis_view<S, D>(eigenvectors: &ArrayBase<S, D>) -> Result<ArrayView2<'_, f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if eigenvectors.ndim() != 2 {
        return Err(GspError::UnsupportedRank(format!(
            "eigenvector matrix has {} dimensions, a 2D basis is required",
            eigenvectors.ndim()
        )));
    }
    eigenvectors
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|e| GspError::Shape(format!("eigenvector matrix: {e}")))
}

fn check_nodes(signal_nodes: usize, basis_nodes: usize) -> Result<()> {
    if signal_nodes != basis_nodes {
        return Err(GspError::Shape(format!(
            "signal has {signal_nodes} nodes but the eigenvector basis has {basis_nodes}"
        )));
    }
    Ok(())
}
