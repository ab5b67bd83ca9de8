/// Error kinds reported by buffers, tessellation and the draw boundary
use crate::buffer::AccessMode;

/// Result type for primitive operations
pub type Result<T> = std::result::Result<T, PrimError>;

#[derive(Debug, thiserror::Error)]
pub enum PrimError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Range {start}..{end} is outside buffer capacity {capacity}")]
    OutOfRange {
        start: usize,
        end: usize,
        capacity: usize,
    },

    #[error("Range {start}..{end} overlaps an existing lock")]
    AlreadyLocked { start: usize, end: usize },

    #[error("Buffer is not locked")]
    NotLocked,

    #[error("Vertex {index} is not accessible under a {access:?} lock")]
    AccessDenied { index: usize, access: AccessMode },

    #[error("Buffer is locked and cannot be used")]
    ResourceBusy,

    /// Failure reported by the rendering backend, passed through untouched.
    #[error("Device error: {0}")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PrimError {
    pub fn out_of_range(start: usize, end: usize, capacity: usize) -> Self {
        Self::OutOfRange {
            start,
            end,
            capacity,
        }
    }

    pub fn device<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Device(Box::new(err))
    }
}
