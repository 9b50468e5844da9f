pub type BlockreelResult<T> = Result<T, BlockreelError>;

#[derive(thiserror::Error, Debug)]
pub enum BlockreelError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("decode failure: {0}")]
    Decode(String),

    #[error("io failure: {0}")]
    Io(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlockreelError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            BlockreelError::config("x")
                .to_string()
                .contains("invalid configuration:")
        );
        assert!(
            BlockreelError::decode("x")
                .to_string()
                .contains("decode failure:")
        );
        assert!(BlockreelError::io("x").to_string().contains("io failure:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = BlockreelError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
