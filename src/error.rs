use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unreadable or corrupt input, or an unwritable output file. `path` is
    /// `<memory>` for byte sources.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported audio format in {path}: {reason}")]
    UnsupportedFormat { path: String, reason: String },

    #[error("invalid band [{low}, {high}) for {bins} frequency bins")]
    InvalidRange { low: usize, high: usize, bins: usize },

    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("signal of {samples} samples is shorter than one frame ({frame_size})")]
    SignalTooShort { samples: usize, frame_size: usize },

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    /// A benchmark iteration produced a different matrix than the first.
    #[error("iteration {iteration} produced matrix {actual:016x}, expected {expected:016x}")]
    Nondeterministic { iteration: u32, expected: u64, actual: u64 },
}

impl Error {
    pub(crate) fn corrupt(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Io {
            path: path.into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, reason.to_string()),
        }
    }
}
