use braingsp_core::NegativeWeights;

use crate::error::Result;
use crate::io::export_mtx;

pub struct LaplacianCommandConfig<'a> {
    pub sc_path: &'a str,
    pub normalize: bool,
    pub negative: NegativeWeights,
    pub output_path: &'a str,
}

pub fn run(cfg: LaplacianCommandConfig<'_>) -> Result<()> {
    let lapl = super::load_laplacian(cfg.sc_path, cfg.negative, cfg.normalize)?;
    let written = export_mtx(&lapl, cfg.output_path, None)?;
    println!(
        "Laplacian ({n}x{n}) written to {}",
        written.display(),
        n = lapl.nrows()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_txt;

    #[test]
    fn test_writes_laplacian() {
        let dir = tempfile::tempdir().unwrap();
        let sc = dir.path().join("sc.tsv");
        std::fs::write(&sc, "0\t1\t0\n1\t0\t1\n0\t1\t0\n").unwrap();
        let out = dir.path().join("lapl.1D");
        run(LaplacianCommandConfig {
            sc_path: sc.to_str().unwrap(),
            normalize: false,
            negative: NegativeWeights::Absolute,
            output_path: out.to_str().unwrap(),
        })
        .unwrap();
        let lapl = load_txt(&out).unwrap();
        assert_eq!(
            lapl,
            ndarray::array![[1.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 1.0]]
        );
    }
}
