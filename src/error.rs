pub type SwingsyncResult<T> = Result<T, SwingsyncError>;

/// One variant per pipeline phase, so a caller can tell which phase
/// rejected a build without parsing message text.
#[derive(thiserror::Error, Debug)]
pub enum SwingsyncError {
    #[error("invalid or corrupted video: {0}")]
    Decode(String),

    #[error("alignment error: {0}")]
    Alignment(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SwingsyncError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            SwingsyncError::decode("x")
                .to_string()
                .contains("invalid or corrupted video:")
        );
        assert!(
            SwingsyncError::alignment("x")
                .to_string()
                .contains("alignment error:")
        );
        assert!(
            SwingsyncError::encode("x")
                .to_string()
                .contains("encoding failed:")
        );
        assert!(
            SwingsyncError::validation("x")
                .to_string()
                .contains("validation error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = SwingsyncError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
