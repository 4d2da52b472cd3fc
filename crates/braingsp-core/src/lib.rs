//! # braingsp-core
//!
//! **Graph signal processing for brain timeseries on structural graphs.**
//!
//! `braingsp-core` builds graph Laplacians from structural connectivity,
//! decomposes them into an orthonormal spectral basis, projects node
//! timeseries in and out of the graph spectral domain, and tests observed
//! spectral metrics against sign-flip surrogate nulls.
//!
//! ## Quick Start
//!
//! ```no_run
//! use braingsp_core::{
//!     Tail, TestMethod, compute_laplacian, decompose, median_cut, graph_filter,
//!     graph_fourier_transform, sc_informed, sdi, surrogate_sdi, test_significance, Structure,
//! };
//! use ndarray::{Array2, array};
//!
//! let adjacency = array![[0.0, 1.0, 0.5], [1.0, 0.0, 1.0], [0.5, 1.0, 0.0]];
//! let timeseries = Array2::from_shape_fn((3, 50), |(n, t)| ((n + 1) as f64 * t as f64).sin());
//!
//! let basis = decompose(&compute_laplacian(&adjacency)?)?;
//! let coeff = graph_fourier_transform(&timeseries, &basis.eigenvectors, false)?;
//! let cut = median_cut(&coeff, &basis.eigenvectors)?;
//!
//! // Observed decoupling is the stacked last slice of the surrogate SDI.
//! let surr = sc_informed(&timeseries, Structure::from(&basis), 100, Some(42), true)?;
//! let null = surrogate_sdi(&surr, &basis.eigenvectors, &cut.low, &cut.high, true)?;
//! let result = test_significance(&null, None, TestMethod::Frequentist, Tail::Two, 0.05)?;
//! println!("{} significant node(s)", result.n_significant());
//!
//! let lo = graph_filter(&timeseries, &basis.eigenvectors, &cut.low)?;
//! let hi = graph_filter(&timeseries, &basis.eigenvectors, &cut.high)?;
//! let masked = result.masked(&sdi(&lo, &hi, true)?)?;
//! # let _ = masked;
//! # Ok::<(), braingsp_core::GspError>(())
//! ```
//!
//! ## Architecture
//!
//! Adjacency → Laplacian → Decomposition → Graph Fourier transform →
//! Surrogates → Significance
//!
//! Arrays are node-first: `(N, T)` timeseries, `(N, T, S)` subject batches,
//! and surrogate sets with the surrogate index on the last axis.
//!
//! Surrogate generation is deterministic for a given seed. Every call owns its
//! generator, so runs never share random state.

pub mod decomposition;
pub mod error;
pub mod laplacian;
pub mod metrics;
pub mod operations;
pub mod significance;
pub mod surrogates;
pub mod transform;

pub use decomposition::{EigenBasis, decompose};
pub use error::{GspError, Result};
pub use laplacian::{
    NegativeWeights, compute_laplacian, handle_negative_weights, normalize_adjacency,
    symmetric_normalized,
};
pub use metrics::{functional_connectivity, gsdi, sdi, surrogate_sdi};
pub use operations::{MedianCut, graph_filter, median_cut, normalize_timeseries};
pub use significance::{
    DEFAULT_ALPHA, SignificanceResult, Tail, TestMethod, empirical_p_values, test_significance,
};
pub use surrogates::{
    DEFAULT_INFORMED_SEED, DEFAULT_N_SURR, DEFAULT_UNINFORMED_SEED, Structure,
    configuration_model, create_surrogates, random_sign, sc_informed, sc_uninformed,
};
pub use transform::{forward, graph_fourier_transform, inverse};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
