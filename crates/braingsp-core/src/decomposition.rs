//! Symmetric eigendecomposition of graph Laplacians.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayBase, Data, Dimension};
use serde::Serialize;

use crate::error::{GspError, Result};
use crate::laplacian::square_matrix;

/// Eigenvalues in ascending order with their eigenvectors as columns.
///
/// Eigenvector signs are whatever the solver produced. Surrogate generation
/// randomizes exactly this degree of freedom, so signs are never normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EigenBasis {
    pub eigenvalues: Array1<f64>,
    pub eigenvectors: Array2<f64>,
}

impl EigenBasis {
    /// Number of graph nodes.
    pub fn n_nodes(&self) -> usize {
        self.eigenvalues.len()
    }
}

/// Decompose a symmetric matrix and sort eigenpairs by ascending eigenvalue.
///
/// The sort is stable, so tied eigenvalues keep the solver's order. That order
/// carries no meaning but is identical across repeated calls.
pub fn decompose<S, D>(laplacian: &ArrayBase<S, D>) -> Result<EigenBasis>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let lapl = square_matrix("laplacian", laplacian)?;
    let n = lapl.nrows();
    if n == 0 {
        return Err(GspError::Shape("laplacian is empty".into()));
    }

    let asym = lapl
        .indexed_iter()
        .map(|((i, j), &v)| (v - lapl[[j, i]]).abs())
        .fold(0.0, f64::max);
    if asym > 1e-8 {
        log::debug!("decomposing a non-symmetric matrix (max |L - Lᵀ| = {asym:.3e}), lower triangle is used");
    }

    let mtx = DMatrix::from_fn(n, n, |i, j| lapl[[i, j]]);
    let eigen = SymmetricEigen::try_new(mtx, f64::EPSILON, 0).ok_or_else(|| {
        GspError::Decomposition(format!("eigensolver did not converge for a {n}x{n} matrix"))
    })?;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[a]
            .partial_cmp(&eigen.eigenvalues[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let eigenvalues = Array1::from_iter(order.iter().map(|&k| eigen.eigenvalues[k]));
    let eigenvectors = Array2::from_shape_fn((n, n), |(i, j)| eigen.eigenvectors[(i, order[j])]);
    log::debug!(
        "decomposed {n} nodes, eigenvalue range [{:.4}, {:.4}]",
        eigenvalues.first().copied().unwrap_or(0.0),
        eigenvalues.last().copied().unwrap_or(0.0)
    );

    Ok(EigenBasis {
        eigenvalues,
        eigenvectors,
    })
}
