//! Graph Laplacians from structural connectivity.
//!
//! The unnormalized Laplacian is `D - A` with `D` the diagonal of row sums
//! (node strengths). The symmetric-normalized form scales every entry by
//! `1 / sqrt(d_i * d_j)`. Nodes with zero strength keep zero rows and
//! columns instead of producing NaN or infinity.

use ndarray::{Array2, ArrayBase, Axis, Data, Dimension, Ix2};

use crate::error::{GspError, Result, fmt_shape};

/// How negative structural weights are made non-negative before building a
/// Laplacian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeWeights {
    /// Replace every weight by its absolute value.
    #[default]
    Absolute,
    /// Set negative weights to zero.
    Remove,
    /// Min-max rescale all weights into `[0, 1]`.
    Rescale,
}

impl std::fmt::Display for NegativeWeights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absolute => write!(f, "absolute"),
            Self::Remove => write!(f, "remove"),
            Self::Rescale => write!(f, "rescale"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check that `mtx` is a 2D square matrix and return an owned copy.
pub(crate) fn square_matrix<S, D>(name: &str, mtx: &ArrayBase<S, D>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if mtx.ndim() != 2 {
        return Err(GspError::Shape(format!(
            "{name} must be a 2D matrix, but has {} dimensions",
            mtx.ndim()
        )));
    }
    let shape = mtx.shape();
    if shape[0] != shape[1] {
        return Err(GspError::Shape(format!(
            "{name} must be square, but has shape {}",
            fmt_shape(shape)
        )));
    }
    mtx.view()
        .into_dimensionality::<Ix2>()
        .map(|m| m.to_owned())
        .map_err(|e| GspError::Shape(format!("{name}: {e}")))
}

/// Row sums of a square matrix.
fn strengths(mtx: &Array2<f64>) -> Vec<f64> {
    mtx.sum_axis(Axis(1)).to_vec()
}

// ---------------------------------------------------------------------------
// Laplacians
// ---------------------------------------------------------------------------

/// Unnormalized graph Laplacian `D - A`.
///
/// Self-loops cancel out: `L_ii = d_i - a_ii`.
pub fn compute_laplacian<S, D>(adjacency: &ArrayBase<S, D>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let adj = square_matrix("adjacency matrix", adjacency)?;
    let degree = strengths(&adj);
    log::debug!("computing laplacian for {} nodes", degree.len());

    let mut lapl = -adj;
    for (i, d) in degree.iter().enumerate() {
        lapl[[i, i]] += d;
    }
    Ok(lapl)
}

/// Symmetric-normalized Laplacian `D^-1/2 (D - A) D^-1/2`.
///
/// Entries in the row or column of a zero-strength node stay zero.
pub fn symmetric_normalized<S, D>(adjacency: &ArrayBase<S, D>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let lapl = compute_laplacian(adjacency)?;
    let adj = square_matrix("adjacency matrix", adjacency)?;
    Ok(scale_by_strength(&lapl, &strengths(&adj)))
}

/// Symmetric-normalized adjacency `A_ij / sqrt(d_i * d_j)`.
pub fn normalize_adjacency<S, D>(adjacency: &ArrayBase<S, D>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let adj = square_matrix("adjacency matrix", adjacency)?;
    let degree = strengths(&adj);
    Ok(scale_by_strength(&adj, &degree))
}

fn scale_by_strength(mtx: &Array2<f64>, degree: &[f64]) -> Array2<f64> {
    let inv_sqrt: Vec<f64> = degree
        .iter()
        .map(|&d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 })
        .collect();
    let isolated = degree.iter().filter(|&&d| d <= 0.0).count();
    if isolated > 0 {
        log::warn!("{isolated} node(s) with zero strength left unnormalized");
    }
    Array2::from_shape_fn(mtx.dim(), |(i, j)| mtx[[i, j]] * inv_sqrt[i] * inv_sqrt[j])
}

/// Make structural weights non-negative.
pub fn handle_negative_weights<S, D>(
    adjacency: &ArrayBase<S, D>,
    mode: NegativeWeights,
) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let adj = square_matrix("adjacency matrix", adjacency)?;
    if adj.iter().all(|&w| w >= 0.0) {
        return Ok(adj);
    }
    log::info!("negative structural weights found, handling with mode '{mode}'");
    let out = match mode {
        NegativeWeights::Absolute => adj.mapv(f64::abs),
        NegativeWeights::Remove => adj.mapv(|w| w.max(0.0)),
        NegativeWeights::Rescale => {
            let min = adj.iter().copied().fold(f64::INFINITY, f64::min);
            let max = adj.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = max - min;
            if range > 0.0 {
                adj.mapv(|w| (w - min) / range)
            } else {
                Array2::zeros(adj.dim())
            }
        }
    };
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
