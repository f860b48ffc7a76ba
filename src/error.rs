use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("binary mask is empty")]
    EmptyMask,

    #[error("mask buffer holds {actual} values, dims require {expected}")]
    MaskSizeMismatch { expected: usize, actual: usize },

    #[error("mask dims {actual:?} do not match session dims {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("mask height {height} is smaller than the number of sliding windows {windows}")]
    MaskTooShort { height: u32, windows: usize },

    #[error("invalid tracker config: {0}")]
    InvalidConfig(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
