use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source truncated: need {needed} bytes at offset {offset}")]
    Truncated { offset: u64, needed: usize },
}
