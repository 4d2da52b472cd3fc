//! Sign-flip surrogates in the graph spectral domain.
//!
//! A surrogate keeps the spectral coefficients of a signal but reconstructs
//! them through a basis whose eigenvectors had their signs flipped at random.
//! Structurally-informed surrogates use the true graph basis; structurally
//! uninformed ones use the basis of a degree-preserving configuration model.
//!
//! Every surrogate set carries `n_surr` randomized slices along its last axis
//! and, when stacked, one extra slice (index `n_surr`) reconstructed through
//! the unmodified basis.
//!
//! # Reproducibility
//!
//! Each call builds its own [`StdRng`] from the seed. Draw `i` consumes the
//! `i`-th consecutive block of that generator's stream, so identical seeds,
//! inputs and sizes give bit-identical surrogate sets.

use ndarray::{Array1, Array2, ArrayBase, ArrayD, ArrayViewD, Axis, Data, Dimension, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::decomposition::{EigenBasis, decompose};
use crate::error::{GspError, Result, fmt_shape};
use crate::laplacian::square_matrix;
use crate::transform::{basis_view, graph_fourier_transform};

/// Surrogates drawn when the caller does not choose.
pub const DEFAULT_N_SURR: usize = 1000;
/// Default seed for structurally-informed surrogates.
pub const DEFAULT_INFORMED_SEED: u64 = 42;
/// Default seed for structurally-uninformed surrogates.
pub const DEFAULT_UNINFORMED_SEED: u64 = 98;

/// Structural information a structurally-informed surrogate is built from.
#[derive(Debug, Clone)]
pub enum Structure<'a> {
    /// Eigenvector matrix, used as is.
    Eigenvectors(ArrayViewD<'a, f64>),
    /// Laplacian, decomposed before use.
    Laplacian(ArrayViewD<'a, f64>),
}

impl<'a> Structure<'a> {
    pub fn eigenvectors<S, D>(eigenvectors: &'a ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        Self::Eigenvectors(eigenvectors.view().into_dyn())
    }

    pub fn laplacian<S, D>(laplacian: &'a ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        Self::Laplacian(laplacian.view().into_dyn())
    }
}

impl<'a> From<&'a EigenBasis> for Structure<'a> {
    fn from(basis: &'a EigenBasis) -> Self {
        Self::eigenvectors(&basis.eigenvectors)
    }
}

// ---------------------------------------------------------------------------
// Sign flips
// ---------------------------------------------------------------------------

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Uniform draw in `[0, 1)`, rounded to 0 or 1, with 0 mapped to -1.
fn draw_signs(rng: &mut StdRng, n: usize) -> ArrayD<f64> {
    Array1::from_shape_fn(n, |_| {
        if rng.random::<f64>().round() == 0.0 {
            -1.0
        } else {
            1.0
        }
    })
    .into_dyn()
}

/// Randomly flip the signs of an eigenvector or of every column of a basis.
///
/// A 1D eigenvector gets one sign per entry; a 2D `(N, K)` basis gets one sign
/// per column. The output has shape `eigenvector.shape + (n_surr + stack)` and,
/// when `stack` is set, its last slice is the unmodified input.
pub fn random_sign<S, D>(
    eigenvector: &ArrayBase<S, D>,
    n_surr: usize,
    seed: Option<u64>,
    stack: bool,
) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let ndim = eigenvector.ndim();
    if ndim == 0 || ndim > 2 {
        return Err(GspError::UnsupportedRank(format!(
            "eigenvector array has {ndim} dimensions, only a single eigenvector (1D) \
             or an eigenvector matrix (2D) is supported"
        )));
    }

    let evec = eigenvector.view().into_dyn();
    let n_signs = evec.shape()[ndim - 1];
    let mut shape = evec.shape().to_vec();
    shape.push(n_surr + usize::from(stack));
    let mut flipped = ArrayD::<f64>::zeros(IxDyn(&shape));

    let mut rng = make_rng(seed);
    for i in 0..n_surr {
        let signs = draw_signs(&mut rng, n_signs);
        flipped.index_axis_mut(Axis(ndim), i).assign(&(&evec * &signs));
    }
    if stack {
        flipped.index_axis_mut(Axis(ndim), n_surr).assign(&evec);
    }
    Ok(flipped)
}

// ---------------------------------------------------------------------------
// Surrogate construction
// ---------------------------------------------------------------------------

/// Project `timeseries` on `eigenvectors`, then reconstruct the unchanged
/// coefficients through `n_surr` sign-flipped copies of the basis.
///
/// Supports `(N, T)` timeseries and subject batches `(N, T, S)` with a 2D
/// basis. Every subject is reconstructed through the same flipped bases.
pub fn create_surrogates<S1, D1, S2, D2>(
    timeseries: &ArrayBase<S1, D1>,
    eigenvectors: &ArrayBase<S2, D2>,
    n_surr: usize,
    seed: Option<u64>,
    stack: bool,
) -> Result<ArrayD<f64>>
where
    S1: Data<Elem = f64>,
    D1: Dimension,
    S2: Data<Elem = f64>,
    D2: Dimension,
{
    let ts_rank = timeseries.ndim();
    let evec_rank = eigenvectors.ndim();
    if ts_rank > 3 {
        return Err(GspError::UnsupportedRank(format!(
            "no surrogate solution implemented for timeseries of {ts_rank} dimensions"
        )));
    }
    if ts_rank < 2 || evec_rank != 2 {
        return Err(GspError::UnsupportedRank(format!(
            "no surrogate solution implemented for timeseries of {ts_rank} dimensions \
             and eigenvector matrix of {evec_rank} dimensions"
        )));
    }

    let evec = basis_view(eigenvectors)?;
    let ts = timeseries.view().into_dyn();
    if ts.shape()[0] != evec.nrows() {
        return Err(GspError::Shape(format!(
            "timeseries of shape {} does not match eigenvector matrix of shape {}",
            fmt_shape(ts.shape()),
            fmt_shape(evec.shape())
        )));
    }

    let n_out = n_surr + usize::from(stack);
    log::debug!(
        "creating {n_out} surrogate slice(s) for timeseries of shape {}",
        fmt_shape(ts.shape())
    );
    let flipped = random_sign(&evec, n_surr, seed, stack)?;

    let mut shape = ts.shape().to_vec();
    shape.push(n_out);
    let mut surr = ArrayD::<f64>::zeros(IxDyn(&shape));

    // Subject batches are walked as (N, T) slices along axis 2.
    let subjects: Vec<ArrayViewD<'_, f64>> = if ts_rank == 3 {
        ts.axis_iter(Axis(2)).collect()
    } else {
        vec![ts.view()]
    };
    for (s, subject) in subjects.iter().enumerate() {
        let coeff = graph_fourier_transform(subject, &evec, false)?;
        for i in 0..n_out {
            let basis = flipped.index_axis(Axis(2), i);
            let recon = graph_fourier_transform(&coeff, &basis, true)?;
            let mut slot = surr.index_axis_mut(Axis(ts_rank), i);
            if ts_rank == 3 {
                slot.index_axis_mut(Axis(2), s).assign(&recon);
            } else {
                slot.assign(&recon);
            }
        }
    }
    Ok(surr)
}

/// Structurally-informed surrogates: sign flips of the true graph basis.
///
/// A rank-3 timeseries with a trailing length-1 axis is squeezed to 2D first.
pub fn sc_informed<S, D>(
    timeseries: &ArrayBase<S, D>,
    structure: Structure<'_>,
    n_surr: usize,
    seed: Option<u64>,
    stack: bool,
) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let ts = squeeze_trailing(timeseries.view().into_dyn());
    check_timeseries_rank(&ts)?;
    log::info!("creating {n_surr} structurally-informed surrogate(s)");
    match structure {
        Structure::Eigenvectors(evec) => create_surrogates(&ts, &evec, n_surr, seed, stack),
        Structure::Laplacian(lapl) => {
            let basis = decompose(&lapl)?;
            create_surrogates(&ts, &basis.eigenvectors, n_surr, seed, stack)
        }
    }
}

/// Structurally-uninformed surrogates: sign flips of the basis of the
/// configuration-model null Laplacian built from `laplacian`.
pub fn sc_uninformed<S1, D1, S2, D2>(
    timeseries: &ArrayBase<S1, D1>,
    laplacian: &ArrayBase<S2, D2>,
    n_surr: usize,
    seed: Option<u64>,
    stack: bool,
) -> Result<ArrayD<f64>>
where
    S1: Data<Elem = f64>,
    D1: Dimension,
    S2: Data<Elem = f64>,
    D2: Dimension,
{
    let ts = squeeze_trailing(timeseries.view().into_dyn());
    check_timeseries_rank(&ts)?;
    log::info!("creating {n_surr} structurally-uninformed surrogate(s)");
    let null = configuration_model(laplacian)?;
    let basis = decompose(&null)?;
    create_surrogates(&ts, &basis.eigenvectors, n_surr, seed, stack)
}

/// Degree-preserving null Laplacian.
///
/// With `M = I - L` and `s` its row sums: `diag(s) - s sᵀ / sum(M)`.
pub fn configuration_model<S, D>(laplacian: &ArrayBase<S, D>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let lapl = square_matrix("laplacian", laplacian)?;
    let n = lapl.nrows();
    let symm_norm = Array2::<f64>::eye(n) - &lapl;
    let strength = symm_norm.sum_axis(Axis(1));
    let total = symm_norm.sum();
    if total.abs() < f64::EPSILON {
        return Err(GspError::DegenerateGraph(
            "configuration model needs a non-zero total strength".into(),
        ));
    }
    Ok(Array2::from_shape_fn((n, n), |(i, j)| {
        let diag = if i == j { strength[i] } else { 0.0 };
        diag - strength[i] * strength[j] / total
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Drop one trailing length-1 axis from timeseries of rank 3 or more.
fn squeeze_trailing(ts: ArrayViewD<'_, f64>) -> ArrayViewD<'_, f64> {
    let ndim = ts.ndim();
    if ndim > 2 && ts.shape()[ndim - 1] == 1 {
        ts.index_axis_move(Axis(ndim - 1), 0)
    } else {
        ts
    }
}

fn check_timeseries_rank(ts: &ArrayViewD<'_, f64>) -> Result<()> {
    if ts.ndim() < 2 || ts.ndim() > 3 {
        return Err(GspError::UnsupportedRank(format!(
            "timeseries has {} dimensions, only (nodes, time) or (nodes, time, subjects) \
             timeseries are supported",
            ts.ndim()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
