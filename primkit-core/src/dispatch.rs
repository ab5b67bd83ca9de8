/// Boundary between the core and a rendering backend
///
/// The core validates buffer state and ranges, then hands the call to a
/// `Dispatcher`. Backend failures come back as `PrimError::Device` and are
/// returned to the caller untouched.
use crate::buffer::VertexBuffer;
use crate::config::PrimConfig;
use crate::error::{PrimError, Result};
use crate::flags::PrimFlag;
use crate::geometry::{PrimitiveType, Vertex};
use crate::transform::Transform;

/// Opaque texture handle owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// State threaded through every draw call: current transform and configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawContext {
    transform: Transform,
    config: PrimConfig,
}

impl DrawContext {
    pub fn new(config: PrimConfig) -> Self {
        Self {
            transform: Transform::identity(),
            config,
        }
    }

    pub fn use_transform(&mut self, transform: &Transform) {
        self.transform.copy_from(transform);
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn config(&self) -> &PrimConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PrimConfig {
        &mut self.config
    }

    pub fn get_prim_flag(&self, flag: PrimFlag) -> bool {
        self.config.get_flag(flag)
    }

    pub fn set_prim_flag(&mut self, flag: PrimFlag, value: bool) {
        self.config.set_flag(flag, value);
    }
}

/// A rendering backend
pub trait Dispatcher {
    /// Draws `[start, end)` of an unlocked buffer, returning vertices drawn.
    fn draw(
        &mut self,
        ctx: &DrawContext,
        buffer: &VertexBuffer,
        texture: Option<TextureHandle>,
        start: usize,
        end: usize,
        primitive: PrimitiveType,
    ) -> Result<usize>;

    /// Draws the vertices named by `indices`, returning vertices drawn.
    fn draw_indexed(
        &mut self,
        ctx: &DrawContext,
        buffer: &VertexBuffer,
        texture: Option<TextureHandle>,
        indices: &[usize],
        primitive: PrimitiveType,
    ) -> Result<usize>;
}

pub fn draw_prim<D: Dispatcher + ?Sized>(
    dispatcher: &mut D,
    ctx: &DrawContext,
    buffer: &VertexBuffer,
    texture: Option<TextureHandle>,
    start: usize,
    end: usize,
    primitive: PrimitiveType,
) -> Result<usize> {
    if buffer.is_locked() {
        return Err(PrimError::ResourceBusy);
    }
    if start > end || end > buffer.capacity() {
        return Err(PrimError::out_of_range(start, end, buffer.capacity()));
    }

    log::trace!("draw {:?} over {}..{}", primitive, start, end);
    dispatcher.draw(ctx, buffer, texture, start, end, primitive)
}

pub fn draw_indexed_prim<D: Dispatcher + ?Sized>(
    dispatcher: &mut D,
    ctx: &DrawContext,
    buffer: &VertexBuffer,
    texture: Option<TextureHandle>,
    indices: &[usize],
    vertex_count: usize,
    primitive: PrimitiveType,
) -> Result<usize> {
    if buffer.is_locked() {
        return Err(PrimError::ResourceBusy);
    }
    if vertex_count > indices.len() {
        return Err(PrimError::InvalidArgument(format!(
            "{} vertices requested from {} indices",
            vertex_count,
            indices.len()
        )));
    }

    let indices = &indices[..vertex_count];
    if let Some(&bad) = indices.iter().find(|&&index| index >= buffer.capacity()) {
        return Err(PrimError::out_of_range(bad, bad.saturating_add(1), buffer.capacity()));
    }

    log::trace!("draw indexed {:?} with {} indices", primitive, vertex_count);
    dispatcher.draw_indexed(ctx, buffer, texture, indices, primitive)
}

/// A draw call captured by `RecordingDispatcher`, with the context
/// transform already applied to its vertices
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub primitive: PrimitiveType,
    pub texture: Option<TextureHandle>,
    pub vertices: Vec<Vertex>,
    pub normals_forwarded: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RecordedDeviceError(pub String);

/// Backend that records draw calls instead of issuing them
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    calls: Vec<DrawCall>,
    fail_next: Option<String>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Makes the next draw fail with a device error carrying `message`.
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    fn record(
        &mut self,
        ctx: &DrawContext,
        texture: Option<TextureHandle>,
        vertices: Vec<Vertex>,
        primitive: PrimitiveType,
    ) -> Result<usize> {
        if let Some(message) = self.fail_next.take() {
            return Err(PrimError::device(RecordedDeviceError(message)));
        }

        let normals_forwarded = ctx.config().flags.wants_normals();
        let vertices: Vec<Vertex> = vertices
            .iter()
            .map(|vertex| {
                let mut out = ctx.transform().apply(vertex);
                if !normals_forwarded {
                    out.normal = vertex.normal;
                }
                out
            })
            .collect();

        let count = vertices.len();
        self.calls.push(DrawCall {
            primitive,
            texture,
            vertices,
            normals_forwarded,
        });
        Ok(count)
    }
}

impl Dispatcher for RecordingDispatcher {
    fn draw(
        &mut self,
        ctx: &DrawContext,
        buffer: &VertexBuffer,
        texture: Option<TextureHandle>,
        start: usize,
        end: usize,
        primitive: PrimitiveType,
    ) -> Result<usize> {
        let vertices = buffer.snapshot(start, end)?;
        self.record(ctx, texture, vertices, primitive)
    }

    fn draw_indexed(
        &mut self,
        ctx: &DrawContext,
        buffer: &VertexBuffer,
        texture: Option<TextureHandle>,
        indices: &[usize],
        primitive: PrimitiveType,
    ) -> Result<usize> {
        let all = buffer.snapshot(0, buffer.capacity())?;
        let vertices = indices.iter().map(|&index| all[index]).collect();
        self.record(ctx, texture, vertices, primitive)
    }
}
