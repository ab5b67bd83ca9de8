/// primkit core - vertex buffers, transforms and primitive tessellation
///
/// This library is the stateless half of a primitive drawing stack: it owns
/// vertex storage and the lock protocol around it, composes 2D transforms,
/// and turns arcs, splines, ribbons and filled shapes into vertex ranges.
/// Issuing the actual draw is left to a `Dispatcher` implementation.

pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod geometry;
pub mod logging;
pub mod primitives;
pub mod tessellate;
pub mod transform;

// Re-export commonly used types
pub use buffer::{AccessMode, DestroyError, LockRange, StorageClass, UnlockPolicy, VertexBuffer};
pub use config::{PrimConfig, DEFAULT_QUALITY};
pub use dispatch::{Dispatcher, DrawContext, RecordingDispatcher, TextureHandle};
pub use error::{PrimError, Result};
pub use flags::{PrimFlag, PrimFlags};
pub use geometry::{Color, PrimitiveType, RawVertex, Vertex};
pub use primitives::Primitives;
pub use tessellate::{EllipticArc, Emitted};
pub use transform::Transform;
