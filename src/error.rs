/// Convenience result type used across the crate.
pub type RasterResult<T> = Result<T, RasterError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    /// A requested or computed image size is degenerate or out of range.
    #[error("invalid size: {0}")]
    InvalidSize(String),

    /// A non-size parameter is out of its documented range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two buffers that must agree in pixel dimensions do not.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A pixel allocation could not be satisfied.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RasterError {
    /// Build a [`RasterError::InvalidSize`] value.
    pub fn invalid_size(msg: impl Into<String>) -> Self {
        Self::InvalidSize(msg.into())
    }

    /// Build a [`RasterError::InvalidParameter`] value.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Build a [`RasterError::DimensionMismatch`] value.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Build a [`RasterError::OutOfMemory`] value.
    pub fn out_of_memory(msg: impl Into<String>) -> Self {
        Self::OutOfMemory(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            RasterError::invalid_size("x")
                .to_string()
                .contains("invalid size:")
        );
        assert!(
            RasterError::invalid_parameter("x")
                .to_string()
                .contains("invalid parameter:")
        );
        assert!(
            RasterError::dimension_mismatch("x")
                .to_string()
                .contains("dimension mismatch:")
        );
        assert!(
            RasterError::out_of_memory("x")
                .to_string()
                .contains("out of memory:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = RasterError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
