//! Structural decoupling workflow.
//!
//! Laplacian → decomposition → median cut → graph filtering → SDI →
//! surrogate SDI → significance → masked SDI.

use braingsp_core::{
    MedianCut, NegativeWeights, Structure, Tail, TestMethod, decompose, graph_filter,
    graph_fourier_transform, gsdi, median_cut, normalize_timeseries, sc_informed, sc_uninformed,
    sdi, surrogate_sdi, test_significance,
};
use ndarray::{Array2, ArrayD, Axis};
use serde::Serialize;

use super::SurrogateKind;
use crate::error::{CliError, Result};
use crate::io::{check_mtx_dim, export_mtx, load_txt};

pub struct SdiCommandConfig<'a> {
    pub sc_path: &'a str,
    /// One `(nodes, time)` file per subject.
    pub timeseries_paths: &'a [String],
    pub kind: SurrogateKind,
    pub n_surr: usize,
    pub seed: Option<u64>,
    pub method: TestMethod,
    pub tail: Tail,
    pub alpha: f64,
    /// SDI on a log2 scale, centered on zero.
    pub log2: bool,
    pub zscore: bool,
    pub normalize: bool,
    pub negative: NegativeWeights,
    pub output_prefix: &'a str,
    pub format: &'a str,
}

/// Settings echoed into the report.
#[derive(Serialize)]
struct RunSettings {
    kind: SurrogateKind,
    n_surr: usize,
    seed: u64,
    method: TestMethod,
    tail: Tail,
    alpha: f64,
    log2: bool,
    zscore: bool,
    normalized_laplacian: bool,
    negative_weights: NegativeWeights,
}

#[derive(Serialize)]
struct SdiReport {
    settings: RunSettings,
    n_nodes: usize,
    n_subjects: usize,
    n_timepoints: usize,
    /// Eigenvectors in the low-frequency band.
    n_low: usize,
    n_significant: usize,
    p_values: ArrayD<f64>,
    significant: ArrayD<bool>,
    group_sdi: ArrayD<f64>,
}

pub fn run(cfg: SdiCommandConfig<'_>) -> Result<()> {
    if linear_two_tailed(cfg.log2, cfg.tail) {
        log::warn!(
            "linear SDI is a positive ratio, a two-tailed test only flags values above the null; \
             drop --linear or pick --tail greater/less"
        );
    }
    let lapl = super::load_laplacian(cfg.sc_path, cfg.negative, cfg.normalize)?;
    let basis = decompose(&lapl)?;
    let evec = &basis.eigenvectors;

    let mut ts = load_subjects(cfg.timeseries_paths)?;
    if cfg.zscore {
        ts = normalize_timeseries(&ts)?;
    }
    let (n_nodes, n_timepoints) = (ts.shape()[0], ts.shape()[1]);
    let n_subjects = if ts.ndim() == 3 { ts.shape()[2] } else { 1 };
    log::info!("{n_subjects} subject(s), {n_nodes} nodes, {n_timepoints} timepoints");

    let cut = spectral_cut(&ts, evec)?;
    let lo = graph_filter(&ts, evec, &cut.low)?;
    let hi = graph_filter(&ts, evec, &cut.high)?;
    let observed = sdi(&lo, &hi, cfg.log2)?;

    let seed = cfg.seed.unwrap_or_else(|| cfg.kind.default_seed());
    let surr = match cfg.kind {
        SurrogateKind::Informed => {
            sc_informed(&ts, Structure::from(&basis), cfg.n_surr, Some(seed), true)?
        }
        SurrogateKind::Uninformed => sc_uninformed(&ts, &lapl, cfg.n_surr, Some(seed), true)?,
    };
    // Surrogates are filtered through the true graph's bands in both cases.
    let null = surrogate_sdi(&surr, evec, &cut.low, &cut.high, cfg.log2)?;
    let result = test_significance(&null, None, cfg.method, cfg.tail, cfg.alpha)?;
    let masked = result.masked(&observed)?;
    let group = gsdi(&observed)?;

    let prefix = cfg.output_prefix;
    let fmt = Some(cfg.format);
    let sdi_path = export_mtx(&observed, &format!("{prefix}_sdi"), fmt)?;
    let masked_path = export_mtx(&masked, &format!("{prefix}_sdi_masked"), fmt)?;
    if n_subjects > 1 {
        export_mtx(&group, &format!("{prefix}_gsdi"), fmt)?;
    }

    let report = SdiReport {
        settings: RunSettings {
            kind: cfg.kind,
            n_surr: cfg.n_surr,
            seed,
            method: cfg.method,
            tail: cfg.tail,
            alpha: cfg.alpha,
            log2: cfg.log2,
            zscore: cfg.zscore,
            normalized_laplacian: cfg.normalize,
            negative_weights: cfg.negative,
        },
        n_nodes,
        n_subjects,
        n_timepoints,
        n_low: cut.n_low,
        n_significant: result.n_significant(),
        p_values: result.p_values,
        significant: result.significant,
        group_sdi: group,
    };
    let report_path = format!("{prefix}_report.json");
    super::write_json(&report_path, &report)?;

    println!("Structural decoupling ({} method, alpha {})", cfg.method, cfg.alpha);
    println!("  low-frequency band: {} of {n_nodes} eigenvectors", cut.n_low);
    println!(
        "  significant: {}/{}",
        report.n_significant,
        report.significant.len()
    );
    println!("  SDI        {}", sdi_path.display());
    println!("  masked SDI {}", masked_path.display());
    println!("  report     {report_path}");
    Ok(())
}

/// Two-tailed tests compare magnitudes, which only works for SDI centered on zero.
fn linear_two_tailed(log2: bool, tail: Tail) -> bool {
    !log2 && tail == Tail::Two
}

/// Load one timeseries file per subject; several files stack into
/// `(nodes, time, subjects)`.
fn load_subjects(paths: &[String]) -> Result<ArrayD<f64>> {
    let mut subjects: Vec<Array2<f64>> = Vec::with_capacity(paths.len());
    for path in paths {
        let ts = check_mtx_dim("timeseries", load_txt(path)?.into_dyn(), false)?;
        if let Some(first) = subjects.first() {
            if first.dim() != ts.dim() {
                return Err(CliError::Matrix(format!(
                    "timeseries {path} has shape {:?}, expected {:?}",
                    ts.dim(),
                    first.dim()
                )));
            }
        }
        subjects.push(ts);
    }
    match subjects.len() {
        0 => Err(CliError::Matrix("no timeseries given".into())),
        1 => Ok(subjects.remove(0).into_dyn()),
        _ => {
            let views: Vec<_> = subjects.iter().map(|s| s.view()).collect();
            ndarray::stack(Axis(2), &views)
                .map(|a| a.into_dyn())
                .map_err(|e| CliError::Matrix(format!("stacking subjects: {e}")))
        }
    }
}

/// Median cut over the spectral power of every subject.
fn spectral_cut(ts: &ArrayD<f64>, evec: &Array2<f64>) -> Result<MedianCut> {
    let coeff = if ts.ndim() == 3 {
        let per_subject = ts
            .axis_iter(Axis(2))
            .map(|subject| graph_fourier_transform(&subject, evec, false))
            .collect::<braingsp_core::Result<Vec<_>>>()?;
        let views: Vec<_> = per_subject.iter().map(|c| c.view()).collect();
        ndarray::stack(Axis(2), &views)
            .map_err(|e| CliError::Matrix(format!("stacking spectral coefficients: {e}")))?
    } else {
        graph_fourier_transform(ts, evec, false)?
    };
    Ok(median_cut(&coeff, evec)?)
}
