//! Plain-text matrix input and output.
//!
//! Matrices are read from whitespace, comma or tab separated text and written
//! as `.1D` (space separated), `.csv` or `.tsv`.

use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayBase, ArrayD, Axis, Data, Dimension, Ix2};

use crate::error::{CliError, Result};

/// Extensions `export_mtx` can write.
pub const TEXT_EXTENSIONS: &[&str] = &[".1D", ".csv", ".tsv"];

/// Formats recognized by name but not written by this tool.
const UNSUPPORTED_EXTENSIONS: &[&str] = &[".nii.gz", ".nii", ".mat", ".xlsx", ".xls"];

const DEFAULT_EXTENSION: &str = ".csv";

/// Check whether `fname` ends with one of `exts`, ignoring case.
///
/// Returns the (optionally stripped) file name and whether an extension
/// matched. The first matching extension wins, so list compound extensions
/// such as `.nii.gz` before `.nii`.
pub fn check_ext<'a>(exts: &[&str], fname: &'a str, remove: bool) -> (&'a str, Option<String>) {
    for ext in exts {
        if ext.len() > fname.len() {
            continue;
        }
        let cut = fname.len() - ext.len();
        if !fname.is_char_boundary(cut) {
            continue;
        }
        if fname[cut..].eq_ignore_ascii_case(ext) {
            let stem = if remove { &fname[..cut] } else { fname };
            return (stem, Some((*ext).to_string()));
        }
    }
    (fname, None)
}

/// Validate a loaded matrix and return it as 2D.
///
/// Length-1 axes beyond the second are dropped and 1D data becomes a column
/// vector. With `square` set, non-square matrices are rejected.
pub fn check_mtx_dim(name: &str, data: ArrayD<f64>, square: bool) -> Result<Array2<f64>> {
    if data.is_empty() {
        return Err(CliError::Matrix(format!("{name} is empty")));
    }
    let mut data = data;
    while data.ndim() > 2 {
        match (2..data.ndim()).rev().find(|&ax| data.shape()[ax] == 1) {
            Some(ax) => data = data.index_axis_move(Axis(ax), 0),
            None => break,
        }
    }
    let mtx = match data.ndim() {
        0 => Array2::from_elem((1, 1), data.iter().next().copied().unwrap_or_default()),
        1 => {
            let n = data.len();
            data.into_shape_with_order((n, 1))
                .map_err(|e| CliError::Matrix(format!("{name}: {e}")))?
        }
        2 => data
            .into_dimensionality::<Ix2>()
            .map_err(|e| CliError::Matrix(format!("{name}: {e}")))?,
        ndim => {
            return Err(CliError::Matrix(format!(
                "{name} has {ndim} dimensions, only 1D or 2D matrices are supported"
            )));
        }
    };
    if square && mtx.nrows() != mtx.ncols() {
        return Err(CliError::Matrix(format!(
            "{name} must be square, but matrix has shape ({}, {})",
            mtx.nrows(),
            mtx.ncols()
        )));
    }
    Ok(mtx)
}

/// Load a numeric text matrix.
///
/// `#` starts a comment. `nan` and `inf` are rejected like any other
/// unparsable token. Files holding a single row or column load as a column
/// vector.
pub fn load_txt(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| CliError::io(&shown, e))?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(|t| match t.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(CliError::Parse {
                    path: shown.clone(),
                    line: idx + 1,
                    token: t.to_string(),
                }),
            })
            .collect::<Result<Vec<f64>>>()?;
        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(CliError::Matrix(format!(
                    "{shown}, line {}: found {} values, expected {}",
                    idx + 1,
                    row.len(),
                    first.len()
                )));
            }
        }
        rows.push(row);
    }

    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if n_rows == 0 || n_cols == 0 {
        return Err(CliError::Matrix(format!("{shown} is empty")));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let shape = if n_rows == 1 { (n_cols, 1) } else { (n_rows, n_cols) };
    log::debug!("loaded {shown} with shape {shape:?}");
    Array2::from_shape_vec(shape, flat).map_err(|e| CliError::Matrix(format!("{shown}: {e}")))
}

/// Write a 1D or 2D matrix as text and return the path written.
///
/// `ext` overrides the extension found in `fname`. Without either, `.csv`
/// is used. 1D data is written one value per line.
pub fn export_mtx<S, D>(data: &ArrayBase<S, D>, fname: &str, ext: Option<&str>) -> Result<PathBuf>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let (stem, found) = check_ext(UNSUPPORTED_EXTENSIONS, fname, false);
    if found.is_some() && ext.is_none() {
        return Err(CliError::UnsupportedFormat(stem.to_string()));
    }
    let (stem, found) = check_ext(TEXT_EXTENSIONS, fname, true);
    let ext = match ext.map(str::to_string).or(found) {
        Some(ext) => {
            let dotted = if ext.starts_with('.') { ext } else { format!(".{ext}") };
            match TEXT_EXTENSIONS.iter().find(|known| known.eq_ignore_ascii_case(&dotted)) {
                Some(known) => *known,
                None => return Err(CliError::UnsupportedFormat(format!("{stem}{dotted}"))),
            }
        }
        None => DEFAULT_EXTENSION,
    };
    let delimiter = match ext {
        ".csv" => ",",
        ".tsv" => "\t",
        _ => " ",
    };

    let view = data.view().into_dyn();
    let mtx = match view.ndim() {
        1 => view.insert_axis(Axis(1)),
        2 => view,
        ndim => {
            return Err(CliError::Matrix(format!(
                "cannot write a matrix with {ndim} dimensions, only 1D or 2D are supported"
            )));
        }
    };

    let mut out = String::new();
    for row in mtx.outer_iter() {
        let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        out.push_str(&fields.join(delimiter));
        out.push('\n');
    }
    let path = PathBuf::from(format!("{stem}{ext}"));
    std::fs::write(&path, out).map_err(|e| CliError::io(path.display().to_string(), e))?;
    log::info!("wrote {}", path.display());
    Ok(path)
}
