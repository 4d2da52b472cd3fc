use braingsp_core::{NegativeWeights, decompose};

use crate::error::Result;
use crate::io::export_mtx;

pub struct DecomposeCommandConfig<'a> {
    pub sc_path: &'a str,
    pub normalize: bool,
    pub negative: NegativeWeights,
    pub output_prefix: &'a str,
    pub format: &'a str,
}

pub fn run(cfg: DecomposeCommandConfig<'_>) -> Result<()> {
    let lapl = super::load_laplacian(cfg.sc_path, cfg.negative, cfg.normalize)?;
    let basis = decompose(&lapl)?;

    let eigenval = export_mtx(
        &basis.eigenvalues,
        &format!("{}_eigenval", cfg.output_prefix),
        Some(cfg.format),
    )?;
    let eigenvec = export_mtx(
        &basis.eigenvectors,
        &format!("{}_eigenvec", cfg.output_prefix),
        Some(cfg.format),
    )?;

    println!("Decomposed {} nodes", basis.n_nodes());
    println!(
        "  eigenvalues  {:.4} .. {:.4}",
        basis.eigenvalues.first().copied().unwrap_or(0.0),
        basis.eigenvalues.last().copied().unwrap_or(0.0)
    );
    println!("  written to {} and {}", eigenval.display(), eigenvec.display());
    Ok(())
}
