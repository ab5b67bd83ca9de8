/// Curve and shape tessellation into vertex buffers
///
/// Every calculator samples its shape first, then emits the samples into the
/// destination range of a buffer. Nothing is kept between calls.
///
/// Outline layouts:
/// - `thickness == 0`: one vertex per sample, drawable as a line strip
/// - `thickness > 0`: an outer/inner pair per sample, drawable as a triangle strip
use nalgebra::{Point2, Vector2};

use crate::buffer::VertexBuffer;
use crate::error::{PrimError, Result};
use crate::geometry::PrimitiveType;
use crate::transform::Transform;

/// Sharpest join the ribbon miter is allowed to extend for.
const MIN_MITER_COS: f32 = 0.1;

/// An elliptical arc swept counter-clockwise from `start_theta`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticArc {
    pub center: Point2<f32>,
    pub radius_x: f32,
    pub radius_y: f32,
    pub start_theta: f32,
    pub delta_theta: f32,
}

impl EllipticArc {
    pub fn circle(cx: f32, cy: f32, r: f32) -> Self {
        Self::ellipse(cx, cy, r, r)
    }

    pub fn ellipse(cx: f32, cy: f32, rx: f32, ry: f32) -> Self {
        Self {
            center: Point2::new(cx, cy),
            radius_x: rx,
            radius_y: ry,
            start_theta: 0.0,
            delta_theta: std::f32::consts::TAU,
        }
    }

    pub fn with_sweep(mut self, start_theta: f32, delta_theta: f32) -> Self {
        self.start_theta = start_theta;
        self.delta_theta = delta_theta;
        self
    }

    pub fn point_at(&self, theta: f32) -> Point2<f32> {
        let (sin, cos) = theta.sin_cos();
        Point2::new(
            self.center.x + self.radius_x * cos,
            self.center.y + self.radius_y * sin,
        )
    }

    /// Outward unit normal at `theta`.
    pub fn normal_at(&self, theta: f32) -> Vector2<f32> {
        let (sin, cos) = theta.sin_cos();
        Vector2::new(self.radius_y * cos, self.radius_x * sin)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| Vector2::new(cos, sin))
    }
}

/// Range written by a calculator and how to draw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emitted {
    pub start: usize,
    pub count: usize,
    pub primitive: PrimitiveType,
}

impl Emitted {
    pub fn end(&self) -> usize {
        self.start + self.count
    }
}

/// A sampled point and the direction a thick outline expands along.
#[derive(Debug, Clone, Copy)]
struct Sample {
    point: Point2<f32>,
    offset: Vector2<f32>,
}

/// Vertices an outline of `samples` points occupies.
pub fn outline_vertex_count(samples: usize, thickness: f32) -> usize {
    if thickness > 0.0 {
        samples.saturating_mul(2)
    } else {
        samples
    }
}

pub fn calculate_arc(
    buffer: &VertexBuffer,
    arc: &EllipticArc,
    thickness: f32,
    dest_start: usize,
    segment_count: usize,
) -> Result<Emitted> {
    check_thickness(thickness)?;
    check_count("segment_count", segment_count, 1)?;
    check_destination(
        buffer,
        dest_start,
        outline_vertex_count(segment_count.saturating_add(1), thickness),
    )?;

    let step = arc.delta_theta / segment_count as f32;
    let samples: Vec<Sample> = (0..=segment_count)
        .map(|i| {
            let theta = arc.start_theta + step * i as f32;
            Sample {
                point: arc.point_at(theta),
                offset: arc.normal_at(theta),
            }
        })
        .collect();

    emit_outline(buffer, &samples, thickness, dest_start)
}

/// Cubic Bézier through four control points, sampled at evenly spaced `t`.
pub fn calculate_spline(
    buffer: &VertexBuffer,
    control_points: &[Point2<f32>; 4],
    thickness: f32,
    dest_start: usize,
    point_count: usize,
) -> Result<Emitted> {
    check_thickness(thickness)?;
    check_count("point_count", point_count, 2)?;
    check_destination(buffer, dest_start, outline_vertex_count(point_count, thickness))?;

    let [p0, p1, p2, p3] = *control_points;
    let last = (point_count - 1) as f32;

    let points: Vec<Point2<f32>> = (0..point_count)
        .map(|i| {
            let t = i as f32 / last;
            let u = 1.0 - t;
            let coords = p0.coords * (u * u * u)
                + p1.coords * (3.0 * u * u * t)
                + p2.coords * (3.0 * u * t * t)
                + p3.coords * (t * t * t);
            Point2::from(coords)
        })
        .collect();

    let samples: Vec<Sample> = points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let t = i as f32 / last;
            let u = 1.0 - t;
            let derivative = (p1 - p0) * (3.0 * u * u)
                + (p2 - p1) * (6.0 * u * t)
                + (p3 - p2) * (3.0 * t * t);
            let tangent = derivative
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(|| chord_direction(&points, i));
            Sample {
                point: *point,
                offset: perpendicular(tangent),
            }
        })
        .collect();

    emit_outline(buffer, &samples, thickness, dest_start)
}

/// Polyline of `segment_count` segments with mitered joins.
pub fn calculate_ribbon(
    buffer: &VertexBuffer,
    points: &[Point2<f32>],
    thickness: f32,
    dest_start: usize,
    segment_count: usize,
) -> Result<Emitted> {
    check_thickness(thickness)?;
    check_count("segment_count", segment_count, 1)?;
    if points.len() <= segment_count {
        return Err(PrimError::InvalidArgument(format!(
            "{} segments need {} points, got {}",
            segment_count,
            segment_count.saturating_add(1),
            points.len()
        )));
    }
    check_destination(
        buffer,
        dest_start,
        outline_vertex_count(segment_count + 1, thickness),
    )?;

    let points = &points[..=segment_count];
    let normals = segment_normals(points, false);

    let samples: Vec<Sample> = points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let offset = if i == 0 {
                normals[0]
            } else if i == segment_count {
                normals[segment_count - 1]
            } else {
                miter(normals[i - 1], normals[i])
            };
            Sample {
                point: *point,
                offset,
            }
        })
        .collect();

    emit_outline(buffer, &samples, thickness, dest_start)
}

/// Closed outline through `points`; the first point is repeated at the end.
pub fn calculate_polygon_outline(
    buffer: &VertexBuffer,
    points: &[Point2<f32>],
    thickness: f32,
    dest_start: usize,
) -> Result<Emitted> {
    check_thickness(thickness)?;
    check_count("polygon points", points.len(), 3)?;

    let n = points.len();
    let normals = segment_normals(points, true);

    let mut samples: Vec<Sample> = points
        .iter()
        .enumerate()
        .map(|(i, point)| Sample {
            point: *point,
            offset: miter(normals[(i + n - 1) % n], normals[i]),
        })
        .collect();
    samples.push(samples[0]);

    emit_outline(buffer, &samples, thickness, dest_start)
}

/// A single segment: a line list pair, or a quad strip when thick.
pub fn calculate_line(
    buffer: &VertexBuffer,
    from: Point2<f32>,
    to: Point2<f32>,
    thickness: f32,
    dest_start: usize,
) -> Result<Emitted> {
    let mut emitted = calculate_ribbon(buffer, &[from, to], thickness, dest_start, 1)?;
    if thickness == 0.0 {
        emitted.primitive = PrimitiveType::LineList;
    }
    Ok(emitted)
}

/// Center followed by a closed ring of `segment_count + 1` perimeter points.
pub fn calculate_filled_ellipse(
    buffer: &VertexBuffer,
    center: Point2<f32>,
    radius_x: f32,
    radius_y: f32,
    dest_start: usize,
    segment_count: usize,
) -> Result<Emitted> {
    check_count("segment_count", segment_count, 3)?;
    check_destination(buffer, dest_start, segment_count.saturating_add(2))?;

    let arc = EllipticArc::ellipse(center.x, center.y, radius_x, radius_y);
    let step = arc.delta_theta / segment_count as f32;
    let mut points = Vec::with_capacity(segment_count + 2);
    points.push(center);
    points.extend((0..=segment_count).map(|i| arc.point_at(step * i as f32)));

    emit_points(buffer, &points, dest_start, PrimitiveType::TriangleFan)
}

/// Axis-aligned rectangle as a four vertex fan.
pub fn calculate_filled_rectangle(
    buffer: &VertexBuffer,
    min: Point2<f32>,
    max: Point2<f32>,
    dest_start: usize,
) -> Result<Emitted> {
    let points = [
        min,
        Point2::new(max.x, min.y),
        max,
        Point2::new(min.x, max.y),
    ];
    emit_points(buffer, &points, dest_start, PrimitiveType::TriangleFan)
}

pub fn calculate_filled_triangle(
    buffer: &VertexBuffer,
    corners: &[Point2<f32>; 3],
    dest_start: usize,
) -> Result<Emitted> {
    emit_points(buffer, corners, dest_start, PrimitiveType::TriangleList)
}

/// Applies `transform` to the vertices in `[start, end)`.
pub fn transform_range(
    buffer: &VertexBuffer,
    transform: &Transform,
    start: usize,
    end: usize,
) -> Result<()> {
    let scope = buffer.write_scope(start, end)?;
    for index in start..end {
        let vertex = scope.get_vertex(index)?;
        scope.set_vertex(index, transform.apply(&vertex))?;
    }
    Ok(())
}

fn emit_outline(
    buffer: &VertexBuffer,
    samples: &[Sample],
    thickness: f32,
    dest_start: usize,
) -> Result<Emitted> {
    if thickness > 0.0 {
        let half = thickness / 2.0;
        let points: Vec<Point2<f32>> = samples
            .iter()
            .flat_map(|s| [s.point + s.offset * half, s.point - s.offset * half])
            .collect();
        emit_points(buffer, &points, dest_start, PrimitiveType::TriangleStrip)
    } else {
        let points: Vec<Point2<f32>> = samples.iter().map(|s| s.point).collect();
        emit_points(buffer, &points, dest_start, PrimitiveType::LineStrip)
    }
}

fn emit_points(
    buffer: &VertexBuffer,
    points: &[Point2<f32>],
    dest_start: usize,
    primitive: PrimitiveType,
) -> Result<Emitted> {
    let end = check_destination(buffer, dest_start, points.len())?;

    log::trace!(
        "emitting {} vertices at {} as {:?}",
        points.len(),
        dest_start,
        primitive
    );

    let scope = buffer.write_scope(dest_start, end)?;
    for (i, point) in points.iter().enumerate() {
        scope.set_position(dest_start + i, point.x, point.y, 0.0)?;
    }

    Ok(Emitted {
        start: dest_start,
        count: points.len(),
        primitive,
    })
}

/// Left-hand unit normal of every segment; `closed` adds the wrap segment.
fn segment_normals(points: &[Point2<f32>], closed: bool) -> Vec<Vector2<f32>> {
    let n = points.len();
    let segments = if closed { n } else { n - 1 };

    let mut normals: Vec<Vector2<f32>> = Vec::with_capacity(segments);
    for i in 0..segments {
        let direction = points[(i + 1) % n] - points[i];
        let normal = direction
            .try_normalize(f32::EPSILON)
            .map(perpendicular)
            .or_else(|| normals.last().copied())
            .unwrap_or_else(Vector2::zeros);
        normals.push(normal);
    }
    normals
}

/// Bisector of two segment normals, lengthened so the strip keeps its width.
fn miter(before: Vector2<f32>, after: Vector2<f32>) -> Vector2<f32> {
    match (before + after).try_normalize(f32::EPSILON) {
        Some(bisector) => {
            let cos = bisector.dot(&after).max(MIN_MITER_COS);
            bisector / cos
        }
        None => after,
    }
}

fn perpendicular(direction: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(-direction.y, direction.x)
}

/// Direction towards the neighbouring sample, for points with no tangent.
fn chord_direction(points: &[Point2<f32>], i: usize) -> Vector2<f32> {
    let chord = if i + 1 < points.len() {
        points[i + 1] - points[i]
    } else if i > 0 {
        points[i] - points[i - 1]
    } else {
        Vector2::zeros()
    };
    chord.try_normalize(f32::EPSILON).unwrap_or_else(Vector2::zeros)
}

/// End of a `count` vertex write at `dest_start`, if it fits in `buffer`.
fn check_destination(buffer: &VertexBuffer, dest_start: usize, count: usize) -> Result<usize> {
    let end = dest_start.saturating_add(count);
    if end > buffer.capacity() {
        return Err(PrimError::out_of_range(dest_start, end, buffer.capacity()));
    }
    Ok(end)
}

fn check_thickness(thickness: f32) -> Result<()> {
    if thickness.is_nan() || thickness < 0.0 {
        return Err(PrimError::InvalidArgument(format!(
            "thickness must be non-negative, got {}",
            thickness
        )));
    }
    Ok(())
}

fn check_count(what: &str, count: usize, min: usize) -> Result<()> {
    if count < min {
        return Err(PrimError::InvalidArgument(format!(
            "{} must be at least {}, got {}",
            what, min, count
        )));
    }
    Ok(())
}
