use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum TesseraError {
    IoError(std::io::Error),
    /// Malformed or truncated wire data. Decoding stops at the first one.
    FramingError(String),
    /// Input rejected before any byte was written.
    PreconditionError(String),
    /// A tile edit accessor used against the wrong modification kind.
    UsageError(String),
}

impl TesseraError {
    pub fn truncated(what: &str, needed: usize, remaining: usize) -> Self {
        TesseraError::FramingError(format!(
            "Not enough bytes to read {}: needed {}, {} remaining",
            what, needed, remaining
        ))
    }

    pub fn is_framing(&self) -> bool {
        matches!(self, TesseraError::FramingError(_))
    }
}

impl fmt::Display for TesseraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TesseraError::IoError(err) => write!(f, "IO error: {}", err),
            TesseraError::FramingError(msg) => write!(f, "Framing error: {}", msg),
            TesseraError::PreconditionError(msg) => write!(f, "Precondition violated: {}", msg),
            TesseraError::UsageError(msg) => write!(f, "Usage error: {}", msg),
        }
    }
}

impl Error for TesseraError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TesseraError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TesseraError {
    fn from(err: std::io::Error) -> Self {
        TesseraError::IoError(err)
    }
}
