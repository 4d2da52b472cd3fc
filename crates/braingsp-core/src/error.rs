//! Error taxonomy for the core pipeline.
//!
//! Every fallible operation fails at the boundary of the offending call with a
//! message naming the argument at fault and, for rank problems, the observed
//! number of dimensions.

/// Errors raised by Laplacian construction, decomposition, transforms,
/// surrogate generation and significance testing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GspError {
    /// Non-square matrices, node-axis mismatches, incompatible statistic shapes.
    #[error("shape error: {0}")]
    Shape(String),

    /// Inputs with more (or fewer) dimensions than an operation supports.
    #[error("unsupported rank: {0}")]
    UnsupportedRank(String),

    /// Significance-testing method outside the closed [`crate::TestMethod`] set.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Graph or signal without the strength/energy an operation divides by.
    #[error("degenerate graph: {0}")]
    DegenerateGraph(String),

    /// Parameter outside its valid range, such as an alpha outside `(0, 1)`.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Eigensolver failed to converge.
    #[error("decomposition failed: {0}")]
    Decomposition(String),
}

pub type Result<T> = std::result::Result<T, GspError>;

/// Format a shape slice as `(2, 3, 4)`.
pub(crate) fn fmt_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    format!("({})", dims.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_shape() {
        assert_eq!(fmt_shape(&[2, 3, 4]), "(2, 3, 4)");
        assert_eq!(fmt_shape(&[5]), "(5)");
        assert_eq!(fmt_shape(&[]), "()");
    }

    #[test]
    fn test_display_keeps_detail() {
        let err = GspError::UnsupportedRank("eigenvector array has 4 dimensions".into());
        assert!(err.to_string().contains("has 4 dimensions"));
    }
}
