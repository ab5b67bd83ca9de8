/// Vertex records and primitive topologies
use bytemuck::{Pod, Zeroable};
use nalgebra::{Point2, Point3, Vector2, Vector3};

/// RGBA color with every channel in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Channels are clamped into `[0, 1]`.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub const fn white() -> Self {
        Self {
            r: 1.0,
            g: 1.0,
            b: 1.0,
            a: 1.0,
        }
    }

    pub const fn black() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

/// A vertex with position, normal, color and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub color: Color,
    pub uv: Vector2<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
            ..Self::default()
        }
    }

    /// A vertex on the z = 0 plane facing the viewer.
    pub fn at(x: f32, y: f32) -> Self {
        Self::new(x, y, 0.0, 0.0, 0.0, 1.0)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.uv = Vector2::new(u, v);
        self
    }

    /// Planar position, dropping z.
    pub fn xy(&self) -> Point2<f32> {
        Point2::new(self.position.x, self.position.y)
    }

    pub fn to_raw(&self) -> RawVertex {
        RawVertex {
            position: [self.position.x, self.position.y, self.position.z],
            normal: [self.normal.x, self.normal.y, self.normal.z],
            color: [self.color.r, self.color.g, self.color.b, self.color.a],
            uv: [self.uv.x, self.uv.y],
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            normal: Vector3::z(),
            color: Color::default(),
            uv: Vector2::zeros(),
        }
    }
}

/// Upload layout for backends (48 bytes):
///
///  offset  0  position [f32; 3]
///  offset 12  normal   [f32; 3]
///  offset 24  color    [f32; 4]
///  offset 40  uv       [f32; 2]
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct RawVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

/// How a contiguous vertex range is interpreted at draw time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    LineList,
    LineStrip,
    LineLoop,
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveType {
    pub fn is_lines(self) -> bool {
        matches!(
            self,
            PrimitiveType::LineList | PrimitiveType::LineStrip | PrimitiveType::LineLoop
        )
    }

    /// Number of lines or triangles formed by `vertex_count` vertices.
    pub fn primitive_count(self, vertex_count: usize) -> usize {
        match self {
            PrimitiveType::LineList => vertex_count / 2,
            PrimitiveType::LineStrip => vertex_count.saturating_sub(1),
            PrimitiveType::LineLoop => {
                if vertex_count < 2 {
                    0
                } else {
                    vertex_count
                }
            }
            PrimitiveType::TriangleList => vertex_count / 3,
            PrimitiveType::TriangleStrip | PrimitiveType::TriangleFan => {
                vertex_count.saturating_sub(2)
            }
        }
    }
}
