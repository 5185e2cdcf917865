#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyingError {
    EmptyImage { role: &'static str },
    DimensionMismatch { expected: (u32, u32), actual: (u32, u32) },
    InvalidKernelSize(u8),
    InvalidHueTolerance(u8),
    InvalidThreadCount(usize),
}

impl std::fmt::Display for KeyingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyingError::EmptyImage { role } => {
                write!(f, "Empty {} image (width and height must be > 0)", role)
            }
            KeyingError::DimensionMismatch { expected, actual } => {
                write!(f, "Mask dimensions {}x{} do not match image dimensions {}x{}",
                    actual.0, actual.1, expected.0, expected.1)
            }
            KeyingError::InvalidKernelSize(k) => {
                write!(f, "Invalid structuring element size: {} (must be odd, 1-63)", k)
            }
            KeyingError::InvalidHueTolerance(t) => {
                write!(f, "Invalid hue tolerance: {} (must be at most 180)", t)
            }
            KeyingError::InvalidThreadCount(n) => {
                write!(f, "Invalid thread count: {} (must be > 0)", n)
            }
        }
    }
}

impl std::error::Error for KeyingError {}

pub type KeyingResult<T> = Result<T, KeyingError>;
