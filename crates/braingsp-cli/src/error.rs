use braingsp_core::GspError;

/// Errors surfaced by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Gsp(#[from] GspError),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}, line {line}: cannot parse '{token}' as a finite number")]
    Parse {
        path: String,
        line: usize,
        token: String,
    },

    /// Empty, ragged or wrongly shaped matrices.
    #[error("{0}")]
    Matrix(String),

    #[error("{0}: output is not supported")]
    UnsupportedFormat(String),

    #[error("cannot serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
