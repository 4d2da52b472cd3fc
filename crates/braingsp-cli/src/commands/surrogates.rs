use braingsp_core::{NegativeWeights, Structure, sc_informed, sc_uninformed};
use ndarray::ArrayD;
use serde::Serialize;

use super::SurrogateKind;
use crate::error::Result;
use crate::io::{check_mtx_dim, load_txt};

pub struct SurrogatesCommandConfig<'a> {
    pub sc_path: &'a str,
    pub timeseries_path: &'a str,
    pub kind: SurrogateKind,
    pub n_surr: usize,
    pub seed: Option<u64>,
    pub normalize: bool,
    pub negative: NegativeWeights,
    pub output_path: &'a str,
}

#[derive(Serialize)]
struct SurrogateReport<'a> {
    kind: SurrogateKind,
    n_surr: usize,
    seed: u64,
    normalized_laplacian: bool,
    /// `(nodes, time, n_surr + 1)`; the last slice is the unrandomized signal.
    shape: &'a [usize],
    surrogates: &'a ArrayD<f64>,
}

pub fn run(cfg: SurrogatesCommandConfig<'_>) -> Result<()> {
    let lapl = super::load_laplacian(cfg.sc_path, cfg.negative, cfg.normalize)?;
    let ts = check_mtx_dim("timeseries", load_txt(cfg.timeseries_path)?.into_dyn(), false)?;
    let seed = cfg.seed.unwrap_or_else(|| cfg.kind.default_seed());

    let surr = match cfg.kind {
        SurrogateKind::Informed => {
            sc_informed(&ts, Structure::laplacian(&lapl), cfg.n_surr, Some(seed), true)?
        }
        SurrogateKind::Uninformed => sc_uninformed(&ts, &lapl, cfg.n_surr, Some(seed), true)?,
    };

    let report = SurrogateReport {
        kind: cfg.kind,
        n_surr: cfg.n_surr,
        seed,
        normalized_laplacian: cfg.normalize,
        shape: surr.shape(),
        surrogates: &surr,
    };
    super::write_json(cfg.output_path, &report)?;
    println!(
        "{} surrogate(s) of shape {:?} written to {}",
        cfg.n_surr,
        surr.shape(),
        cfg.output_path
    );
    Ok(())
}
