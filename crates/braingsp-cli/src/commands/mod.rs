pub mod decompose;
pub mod laplacian;
pub mod sdi;
pub mod surrogates;

use std::path::Path;

use braingsp_core::{
    DEFAULT_INFORMED_SEED, DEFAULT_UNINFORMED_SEED, NegativeWeights, TestMethod,
    compute_laplacian, handle_negative_weights, symmetric_normalized,
};
use ndarray::Array2;
use serde::Serialize;

use crate::error::{CliError, Result};
use crate::io::{check_mtx_dim, load_txt};

/// Surrogate family generated from the structural graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurrogateKind {
    Informed,
    Uninformed,
}

impl SurrogateKind {
    /// Seed used when the caller does not pass one.
    pub fn default_seed(self) -> u64 {
        match self {
            Self::Informed => DEFAULT_INFORMED_SEED,
            Self::Uninformed => DEFAULT_UNINFORMED_SEED,
        }
    }
}

/// Parse a negative-weight handling mode.
pub fn parse_negative(s: &str) -> NegativeWeights {
    match s {
        "absolute" | "abs" => NegativeWeights::Absolute,
        "remove" | "zero" => NegativeWeights::Remove,
        "rescale" => NegativeWeights::Rescale,
        _ => {
            log::warn!("unknown negative-weight mode '{s}', using absolute");
            NegativeWeights::Absolute
        }
    }
}

/// Parse a surrogate kind.
pub fn parse_kind(s: &str) -> SurrogateKind {
    match s {
        "informed" | "sc_informed" => SurrogateKind::Informed,
        "uninformed" | "sc_uninformed" => SurrogateKind::Uninformed,
        _ => {
            log::warn!("unknown surrogate kind '{s}', using informed");
            SurrogateKind::Informed
        }
    }
}

/// Parse a significance-testing method. Unknown names are an error.
pub fn parse_method(s: &str) -> Result<TestMethod> {
    Ok(s.parse::<TestMethod>()?)
}

/// Load a structural connectivity matrix and build its Laplacian.
pub fn load_laplacian(path: &str, negative: NegativeWeights, normalize: bool) -> Result<Array2<f64>> {
    let sc = check_mtx_dim("structural connectivity", load_txt(path)?.into_dyn(), true)?;
    let sc = handle_negative_weights(&sc, negative)?;
    let lapl = if normalize {
        symmetric_normalized(&sc)?
    } else {
        compute_laplacian(&sc)?
    };
    log::info!(
        "built {} laplacian for {} nodes from {path}",
        if normalize { "normalized" } else { "unnormalized" },
        lapl.nrows()
    );
    Ok(lapl)
}

/// Write a serializable report as pretty JSON.
pub fn write_json<T: Serialize>(path: &str, report: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(report)?;
    std::fs::write(Path::new(path), text).map_err(|e| CliError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // parser tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_negative_variants() {
        assert_eq!(parse_negative("absolute"), NegativeWeights::Absolute);
        assert_eq!(parse_negative("zero"), NegativeWeights::Remove);
        assert_eq!(parse_negative("rescale"), NegativeWeights::Rescale);
        assert_eq!(parse_negative("bogus"), NegativeWeights::Absolute);
    }

    #[test]
    fn test_parse_kind_and_seed() {
        assert_eq!(parse_kind("uninformed"), SurrogateKind::Uninformed);
        assert_eq!(parse_kind("sc_informed"), SurrogateKind::Informed);
        assert_eq!(SurrogateKind::Informed.default_seed(), 42);
        assert_eq!(SurrogateKind::Uninformed.default_seed(), 98);
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("bernoulli").unwrap(), TestMethod::Bernoulli);
        let err = parse_method("Baobab").unwrap_err();
        assert!(err.to_string().contains("Other testing methods"));
    }

    // -----------------------------------------------------------------------
    // load_laplacian tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_load_laplacian_from_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sc.csv");
        std::fs::write(&path, "0,-2\n-2,0\n").unwrap();
        let lapl = load_laplacian(path.to_str().unwrap(), NegativeWeights::Absolute, false).unwrap();
        assert_eq!(lapl, ndarray::array![[2.0, -2.0], [-2.0, 2.0]]);
    }

    #[test]
    fn test_load_laplacian_rejects_non_square() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sc.csv");
        std::fs::write(&path, "0,1,2\n1,0,3\n").unwrap();
        let err = load_laplacian(path.to_str().unwrap(), NegativeWeights::Absolute, true).unwrap_err();
        assert!(err.to_string().contains("matrix has shape (2, 3)"));
    }
}
